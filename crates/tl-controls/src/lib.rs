//! Control primitives for thermoloop.
//!
//! This crate holds everything that is pure control logic and independent of the
//! host runtime: the PID controller, the actuator command and its shared cell,
//! and the sampling types that travel from the sensor side to the controller.
//!
//! # Architecture
//!
//! - Controllers are configuration structs with a separate state struct; an
//!   update takes the old state by reference and returns the new state plus the
//!   clamped output
//! - Controllers operate in sampled/digital mode, one update per received sample
//! - The actuator command is the only value shared across execution contexts and
//!   is exposed through [`SharedActuator`], an atomic cell
//!
//! # Example
//!
//! ```
//! use tl_controls::{PidController, PidState};
//!
//! let pid = PidController::cooling();
//! let (state, output) = pid.update(&PidState::default(), 25.0, 30.0).unwrap();
//! assert_eq!(output, 23.0);
//! assert_eq!(state.integral, 5.0);
//! ```

pub mod actuator;
pub mod controller;
pub mod error;
pub mod sampled;

pub use actuator::{ActuatorCommand, SharedActuator};
pub use controller::{AntiWindup, PidController, PidState};
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleConfig, SensorSample};
