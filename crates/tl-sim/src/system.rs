//! Assembly of the closed loop: plant, sampler on a timer, control task.
//!
//! ```text
//!   timer task ── Sampler::tick ──► [bounded channel] ──► ControlLoop::run
//!        ▲                                                     │
//!        └──── PlantSimulator ◄──── SharedActuator ◄───────────┘
//! ```

use crate::cancel::Shutdown;
use crate::channel;
use crate::config::SystemConfig;
use crate::control_loop::{ControlLoop, LoopExit};
use crate::error::{SimError, SimResult};
use crate::plant::{PlantSimulator, PlantState, SharedPlant};
use crate::report::ReportSink;
use crate::sampler::Sampler;
use crate::stats::{LoopStats, StatsSnapshot};
use crate::task::{self, TaskHandle, TaskSpec};
use crate::timer::{PeriodicTimer, TIMER_TASK_NAME, TIMER_TASK_PRIORITY};
use std::sync::Arc;
use tl_controls::{ActuatorCommand, SharedActuator};
use tracing::{info, warn};

pub const BANNER: &str = "Temperature Monitoring & Control Simulation (PID Version)";

/// Outcome of a stopped system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub exit: LoopExit,
    /// Timer callbacks completed.
    pub ticks: u64,
    pub stats: StatsSnapshot,
    pub final_command: ActuatorCommand,
    pub final_plant: PlantState,
}

pub struct ControlSystem;

impl ControlSystem {
    /// Build every component from `config` and start both tasks.
    pub fn start(config: &SystemConfig, sink: Arc<dyn ReportSink>) -> SimResult<RunningSystem> {
        config.validate()?;
        info!("starting control system");

        let plant = PlantSimulator::new(config.plant.clone())?.into_shared();
        let actuator = SharedActuator::new(config.initial_command()?);
        let stats = Arc::new(LoopStats::new());
        let shutdown = Shutdown::new();
        let (tx, rx) = channel::bounded(config.channel_capacity)?;

        let control = ControlLoop::new(
            config.controller.clone(),
            config.setpoint,
            actuator.clone(),
            sink,
            Arc::clone(&stats),
        )?
        .with_recv_timeout(config.recv_timeout());

        let token = shutdown.token();
        let control_task = task::spawn(config.control_task.clone(), move || {
            control.run(rx, token)
        })?;

        let mut sampler = Sampler::new(
            Arc::clone(&plant),
            actuator.clone(),
            tx,
            Arc::clone(&stats),
        );
        let timer_spec = TaskSpec::new(TIMER_TASK_NAME).with_priority(TIMER_TASK_PRIORITY);
        let stopping = shutdown.token();
        let timer_task = match PeriodicTimer::spawn(
            timer_spec,
            config.sample.period(),
            shutdown.token(),
            move || match sampler.tick() {
                Ok(_) => Ok(()),
                // the control task drops its receiver once it sees the shutdown
                Err(SimError::ChannelClosed) if stopping.is_cancelled() => Ok(()),
                Err(e) => Err(e),
            },
        ) {
            Ok(handle) => handle,
            Err(e) => {
                shutdown.trigger();
                if let Err(join_err) = control_task.join() {
                    warn!("control task failed while aborting start: {join_err}");
                }
                return Err(e);
            }
        };

        info!(
            period_ms = config.sample.period_ms,
            capacity = config.channel_capacity,
            setpoint = config.setpoint,
            "control system running"
        );

        Ok(RunningSystem {
            shutdown,
            control_task,
            timer_task,
            actuator,
            plant,
            stats,
        })
    }
}

/// Handle to a started system. Dropping it without [`RunningSystem::stop`]
/// cancels both tasks but does not wait for them.
pub struct RunningSystem {
    shutdown: Shutdown,
    control_task: TaskHandle<SimResult<LoopExit>>,
    timer_task: TaskHandle<SimResult<u64>>,
    actuator: SharedActuator,
    plant: SharedPlant,
    stats: Arc<LoopStats>,
}

impl RunningSystem {
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// True once either task has returned on its own.
    pub fn has_stopped(&self) -> bool {
        self.control_task.is_finished() || self.timer_task.is_finished()
    }

    /// Cancel both tasks, wait for them and summarize the run.
    pub fn stop(self) -> SimResult<RunSummary> {
        self.shutdown.trigger();
        let ticks = self.timer_task.join()??;
        let exit = self.control_task.join()??;
        let final_plant = {
            let plant = self
                .plant
                .lock()
                .map_err(|_| SimError::Poisoned { what: "plant" })?;
            plant.state()
        };
        let summary = RunSummary {
            exit,
            ticks,
            stats: self.stats.snapshot(),
            final_command: self.actuator.load(),
            final_plant,
        };
        info!(
            ticks,
            consumed = summary.stats.consumed,
            dropped = summary.stats.dropped,
            "control system stopped"
        );
        Ok(summary)
    }
}
