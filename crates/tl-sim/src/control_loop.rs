//! Consumer side of the loop: the control task body.

use crate::cancel::CancelToken;
use crate::channel::{RecvOutcome, SampleReceiver};
use crate::error::SimResult;
use crate::report::{ControlReport, ReportSink};
use crate::stats::LoopStats;
use std::sync::Arc;
use std::time::Duration;
use tl_controls::{ActuatorCommand, PidController, PidState, SensorSample, SharedActuator};
use tracing::{debug, info};

/// Temperature the loop regulates to when none is configured (°C).
pub const DEFAULT_SETPOINT: f64 = 25.0;

/// Why [`ControlLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    /// The producer went away and the queue is empty.
    ChannelClosed,
}

pub struct ControlLoop {
    controller: PidController,
    state: PidState,
    setpoint: f64,
    actuator: SharedActuator,
    sink: Arc<dyn ReportSink>,
    stats: Arc<LoopStats>,
    recv_timeout: Option<Duration>,
}

impl ControlLoop {
    pub fn new(
        controller: PidController,
        setpoint: f64,
        actuator: SharedActuator,
        sink: Arc<dyn ReportSink>,
        stats: Arc<LoopStats>,
    ) -> SimResult<Self> {
        controller.validate()?;
        let setpoint = tl_core::ensure_finite(setpoint, "setpoint")?;
        Ok(Self {
            controller,
            state: PidState::default(),
            setpoint,
            actuator,
            sink,
            stats,
            recv_timeout: None,
        })
    }

    /// Bound each receive wait. Timeouts are logged and the loop keeps waiting.
    pub fn with_recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn state(&self) -> PidState {
        self.state
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Run one control cycle for `sample`: compute, publish, report.
    pub fn step(&mut self, sample: SensorSample) -> SimResult<ControlReport> {
        let (state, output) =
            self.controller
                .update(&self.state, self.setpoint, sample.as_measurement())?;
        let command = ActuatorCommand::new(output)?;
        self.state = state;
        self.actuator.store(command);
        self.stats.record_consumed();

        let report = ControlReport {
            temperature: sample.raw(),
            cooling_power: command.cooling_power(),
        };
        debug!(
            sample = sample.raw(),
            cooling_power = command.cooling_power(),
            integral = state.integral,
            "control cycle"
        );
        self.sink.report(&report);
        Ok(report)
    }

    /// Consume samples until cancelled or the channel closes.
    pub fn run(mut self, rx: SampleReceiver, cancel: CancelToken) -> SimResult<LoopExit> {
        info!(setpoint = self.setpoint, "control loop started");
        loop {
            match rx.recv_or_cancel(&cancel, self.recv_timeout) {
                RecvOutcome::Sample(sample) => {
                    self.step(sample)?;
                }
                RecvOutcome::TimedOut => {
                    debug!(timeout = ?self.recv_timeout, "no sample within timeout");
                }
                RecvOutcome::Cancelled => {
                    info!("control loop cancelled");
                    return Ok(LoopExit::Cancelled);
                }
                RecvOutcome::Closed => {
                    info!("sample channel closed");
                    return Ok(LoopExit::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Shutdown;
    use crate::channel;
    use crate::report::MemorySink;

    fn make_loop(sink: Arc<MemorySink>, actuator: SharedActuator) -> ControlLoop {
        ControlLoop::new(
            PidController::cooling(),
            DEFAULT_SETPOINT,
            actuator,
            sink,
            Arc::new(LoopStats::new()),
        )
        .unwrap()
    }

    #[test]
    fn step_publishes_and_reports() {
        let sink = Arc::new(MemorySink::new());
        let actuator = SharedActuator::default();
        let mut control = make_loop(sink.clone(), actuator.clone());

        let report = control.step(SensorSample::new(30)).unwrap();
        assert_eq!(report.cooling_power, 23.0);
        assert_eq!(actuator.load().cooling_power(), 23.0);
        assert_eq!(control.state().integral, 5.0);

        let report = control.step(SensorSample::new(30)).unwrap();
        assert_eq!(report.cooling_power, 16.0);
        assert_eq!(
            sink.reports().last().unwrap().to_string(),
            "Temperature received: 30 C - Cooling Power: 16.0%"
        );
    }

    #[test]
    fn rejects_non_finite_setpoint() {
        let result = ControlLoop::new(
            PidController::cooling(),
            f64::NAN,
            SharedActuator::default(),
            Arc::new(MemorySink::new()),
            Arc::new(LoopStats::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn run_drains_then_exits_on_close() {
        let sink = Arc::new(MemorySink::new());
        let control = make_loop(sink.clone(), SharedActuator::default());
        let (tx, rx) = channel::bounded(5).unwrap();
        for raw in [26, 27, 28] {
            tx.try_send(SensorSample::new(raw)).unwrap();
        }
        drop(tx);

        let shutdown = Shutdown::new();
        let exit = control.run(rx, shutdown.token()).unwrap();
        assert_eq!(exit, LoopExit::ChannelClosed);
        let temps: Vec<i32> = sink.reports().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![26, 27, 28]);
    }

    #[test]
    fn run_survives_timeouts_and_honours_cancel() {
        let sink = Arc::new(MemorySink::new());
        let control = make_loop(sink.clone(), SharedActuator::default())
            .with_recv_timeout(Some(Duration::from_millis(5)));
        let (tx, rx) = channel::bounded(5).unwrap();
        let shutdown = Shutdown::new();
        let token = shutdown.token();

        let handle = std::thread::spawn(move || control.run(rx, token));
        std::thread::sleep(Duration::from_millis(30));
        tx.try_send(SensorSample::new(25)).unwrap();
        while sink.is_empty() {
            std::thread::sleep(Duration::from_millis(2));
        }
        shutdown.trigger();

        assert_eq!(handle.join().unwrap().unwrap(), LoopExit::Cancelled);
        assert_eq!(sink.reports()[0].cooling_power, 0.0);
    }
}
