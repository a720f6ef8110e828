//! PID controller for the cooling actuator.
//!
//! The controller runs once per received sample (no `dt` scaling: the integral
//! is a plain running sum of errors and the derivative a plain first difference).
//!
//! Sign convention: `error = measured - setpoint`, so a plant hotter than the
//! target produces a positive error and drives cooling power up.
//!
//! Every update:
//! - accumulates the integral
//! - refreshes `last_error`, saturated or not
//! - clamps the output into `[out_min, out_max]`
//! - applies the configured [`AntiWindup`] policy when the raw output saturates

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use tl_core::ensure_finite;

/// Cooling-loop proportional gain.
pub const KP: f64 = 3.0;
/// Cooling-loop integral gain (per sample).
pub const KI: f64 = 0.1;
/// Cooling-loop derivative gain (per sample).
pub const KD: f64 = 1.5;
/// Cooling power lower limit (%).
pub const OUT_MIN: f64 = 0.0;
/// Cooling power upper limit (%).
pub const OUT_MAX: f64 = 100.0;

/// Policy applied to the integral when the raw output leaves the output range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiWindup {
    /// Accumulate first, then subtract this cycle's error back out if the output
    /// saturated. Net integral change over a saturated cycle is zero.
    #[default]
    UndoLastStep,
    /// Skip the accumulation only when the output saturated and the error pushes
    /// further into saturation. Errors that pull out of saturation still integrate.
    ConditionalIntegration,
}

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Integral behaviour under saturation.
    #[serde(default)]
    pub anti_windup: AntiWindup,
}

impl PidController {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    ///
    /// Gains must be finite and non-negative.
    pub fn new(kp: f64, ki: f64, kd: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        ensure_finite(kp, "kp")?;
        ensure_finite(ki, "ki")?;
        ensure_finite(kd, "kd")?;
        ensure_finite(out_min, "out_min")?;
        ensure_finite(out_max, "out_max")?;
        if kp < 0.0 || ki < 0.0 || kd < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "kp, ki and kd must be non-negative",
            });
        }
        if out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ki,
            kd,
            out_min,
            out_max,
            anti_windup: AntiWindup::default(),
        })
    }

    /// The cooling-loop tuning: KP=3.0, KI=0.1, KD=1.5, output in [0, 100].
    pub fn cooling() -> Self {
        Self {
            kp: KP,
            ki: KI,
            kd: KD,
            out_min: OUT_MIN,
            out_max: OUT_MAX,
            anti_windup: AntiWindup::UndoLastStep,
        }
    }

    /// Set the anti-windup policy.
    pub fn with_anti_windup(mut self, policy: AntiWindup) -> Self {
        self.anti_windup = policy;
        self
    }

    /// Re-check a controller that was built field-by-field (e.g. deserialized).
    pub fn validate(&self) -> ControlResult<()> {
        Self::new(self.kp, self.ki, self.kd, self.out_min, self.out_max).map(|_| ())
    }

    /// Compute controller output given setpoint and measurement.
    ///
    /// Returns the updated state and the output clamped to `[out_min, out_max]`.
    /// Non-finite inputs are rejected and leave the caller's state untouched.
    pub fn update(
        &self,
        state: &PidState,
        setpoint: f64,
        measured: f64,
    ) -> ControlResult<(PidState, f64)> {
        ensure_finite(setpoint, "setpoint")?;
        ensure_finite(measured, "measured")?;

        let error = measured - setpoint;
        let derivative = error - state.last_error;
        let p_term = self.kp * error;
        let d_term = self.kd * derivative;

        let mut integral = state.integral + error;
        let mut output_raw = p_term + self.ki * integral + d_term;

        match self.anti_windup {
            AntiWindup::UndoLastStep => {
                if output_raw < self.out_min || output_raw > self.out_max {
                    integral -= error;
                }
            }
            AntiWindup::ConditionalIntegration => {
                // Gains are non-negative, so the error sign is the direction
                // the integral pushes the output, even when ki is zero.
                let winding_up = (output_raw > self.out_max && error > 0.0)
                    || (output_raw < self.out_min && error < 0.0);
                if winding_up {
                    integral = state.integral;
                    output_raw = p_term + self.ki * integral + d_term;
                }
            }
        }

        // Finite inputs with finite gains can still overflow after a long
        // accumulation; refuse to hand out NaN/Inf as a command.
        let output_raw = ensure_finite(output_raw, "pid output")?;
        let output = output_raw.clamp(self.out_min, self.out_max);

        let new_state = PidState {
            integral,
            last_error: error,
        };

        Ok((new_state, output))
    }
}

impl Default for PidController {
    fn default() -> Self {
        Self::cooling()
    }
}

/// PID controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Running sum of errors.
    pub integral: f64,
    /// Error seen on the previous update.
    pub last_error: f64,
}
