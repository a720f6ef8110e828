//! Closed-loop temperature control on host threads.
//!
//! Provides:
//! - Simulated thermal plant with seeded disturbance and sensor noise
//! - Bounded, drop-on-full sample channel with cancellable receive
//! - Periodic timer task driving the sampler
//! - Control task running the PID and publishing the actuator command
//! - Report sinks, loop statistics, YAML configuration and fatal halts

pub mod cancel;
pub mod channel;
pub mod config;
pub mod control_loop;
pub mod error;
pub mod fatal;
pub mod plant;
pub mod report;
pub mod sampler;
pub mod stats;
pub mod system;
pub mod task;
pub mod timer;

// Re-exports for public API
pub use cancel::{CancelToken, Shutdown};
pub use channel::{RecvOutcome, SampleReceiver, SampleSender, SendOutcome};
pub use config::SystemConfig;
pub use control_loop::{ControlLoop, LoopExit};
pub use error::{SimError, SimResult};
pub use fatal::FatalCondition;
pub use plant::{PlantConfig, PlantSimulator, PlantState, SharedPlant};
pub use report::{ControlReport, MemorySink, ReportFormat, ReportSink, TracingSink, WriterSink};
pub use sampler::Sampler;
pub use stats::{LoopStats, StatsSnapshot};
pub use system::{BANNER, ControlSystem, RunSummary, RunningSystem};
pub use task::{TaskHandle, TaskSpec};
pub use timer::PeriodicTimer;
