//! Sampled execution primitives for the digital controller.
//!
//! The sensor is polled on a fixed period. Each reading is quantized to a whole
//! degree before it leaves the sampling context, so the controller only ever sees
//! integer temperatures. The quantization is lossy (sub-degree detail is dropped)
//! and truncates toward zero.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tl_core::ensure_finite;

/// Sample period used when none is configured.
pub const DEFAULT_PERIOD_MS: u64 = 1000;

/// Sample configuration for the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in milliseconds.
    pub period_ms: u64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Arguments
    ///
    /// * `period_ms` - Sample period in milliseconds (must be positive)
    pub fn new(period_ms: u64) -> ControlResult<Self> {
        if period_ms == 0 {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { period_ms })
    }

    /// Sample period.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

/// Quantized sensor reading handed from the sampler to the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SensorSample {
    raw: i32,
}

impl SensorSample {
    pub fn new(raw: i32) -> Self {
        Self { raw }
    }

    /// Truncate a sensor reading toward zero. Non-finite readings are rejected.
    pub fn quantize(reading: f64) -> ControlResult<Self> {
        let reading = ensure_finite(reading, "sensor reading")?;
        Ok(Self { raw: reading as i32 })
    }

    /// Whole-degree reading.
    pub fn raw(&self) -> i32 {
        self.raw
    }

    /// Reading as the controller's measurement input.
    pub fn as_measurement(&self) -> f64 {
        f64::from(self.raw)
    }
}

impl fmt::Display for SensorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
