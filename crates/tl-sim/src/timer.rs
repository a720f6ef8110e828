//! Auto-reloading periodic timer.
//!
//! The timer owns one task. Every `period` it invokes the callback in that task's
//! context; callbacks must return quickly and never block. The timer stops when
//! its [`CancelToken`] fires or when the callback returns an error.

use crate::cancel::CancelToken;
use crate::error::{SimError, SimResult};
use crate::task::{self, TaskHandle, TaskSpec};
use crossbeam_channel::{select, tick};
use std::time::Duration;
use tracing::{debug, error};

pub const TIMER_TASK_NAME: &str = "TempTimer";
/// Timer service priority, above the control task.
pub const TIMER_TASK_PRIORITY: u8 = 2;

pub struct PeriodicTimer;

impl PeriodicTimer {
    /// Start firing `callback` every `period`. The task returns the number of
    /// completed callbacks.
    pub fn spawn<F>(
        spec: TaskSpec,
        period: Duration,
        cancel: CancelToken,
        mut callback: F,
    ) -> SimResult<TaskHandle<SimResult<u64>>>
    where
        F: FnMut() -> SimResult<()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(SimError::InvalidArg {
                what: "timer period must be positive",
            });
        }
        let name = spec.name.clone();
        task::spawn(spec, move || {
            let ticker = tick(period);
            let mut fired = 0u64;
            loop {
                select! {
                    recv(ticker) -> _ => {
                        if cancel.is_cancelled() {
                            debug!(timer = %name, fired, "timer stopped");
                            return Ok(fired);
                        }
                        if let Err(e) = callback() {
                            error!(timer = %name, "timer callback failed: {e}");
                            return Err(e);
                        }
                        fired += 1;
                    }
                    recv(cancel.receiver()) -> _ => {
                        debug!(timer = %name, fired, "timer stopped");
                        return Ok(fired);
                    }
                }
            }
        })
    }
}
