//! Producer side of the loop, run from the periodic timer.

use crate::channel::{SampleSender, SendOutcome};
use crate::error::{SimError, SimResult};
use crate::plant::SharedPlant;
use crate::stats::LoopStats;
use std::sync::Arc;
use tl_controls::{SensorSample, SharedActuator};
use tracing::trace;

pub struct Sampler {
    plant: SharedPlant,
    actuator: SharedActuator,
    tx: SampleSender,
    stats: Arc<LoopStats>,
}

impl Sampler {
    pub fn new(
        plant: SharedPlant,
        actuator: SharedActuator,
        tx: SampleSender,
        stats: Arc<LoopStats>,
    ) -> Self {
        Self {
            plant,
            actuator,
            tx,
            stats,
        }
    }

    /// Advance the plant under the current command and enqueue the quantized
    /// reading. A full channel drops the reading.
    pub fn tick(&mut self) -> SimResult<SendOutcome> {
        let command = self.actuator.load();
        let reading = {
            let mut plant = self
                .plant
                .lock()
                .map_err(|_| SimError::Poisoned { what: "plant" })?;
            plant.advance(command)
        };
        let sample = SensorSample::quantize(reading)?;
        self.stats.record_produced();

        let outcome = self.tx.try_send(sample)?;
        match outcome {
            SendOutcome::Queued => trace!(sample = sample.raw(), "sample queued"),
            SendOutcome::Full => self.stats.record_dropped(),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{self, RecvOutcome};
    use crate::plant::{PlantConfig, PlantSimulator};
    use tl_controls::ActuatorCommand;
    use tl_core::{Tolerances, nearly_equal};

    fn quiet_plant(initial: f64) -> SharedPlant {
        PlantSimulator::new(PlantConfig {
            initial_temperature: initial,
            disturbance: 0.0,
            sensor_noise: 0.0,
            seed: Some(1),
            ..PlantConfig::default()
        })
        .unwrap()
        .into_shared()
    }

    #[test]
    fn tick_uses_current_command_and_truncates() {
        let plant = quiet_plant(30.0);
        let actuator = SharedActuator::new(ActuatorCommand::new(50.0).unwrap());
        let (tx, rx) = channel::bounded(5).unwrap();
        let stats = Arc::new(LoopStats::new());
        let mut sampler = Sampler::new(plant.clone(), actuator, tx, stats.clone());

        assert_eq!(sampler.tick().unwrap(), SendOutcome::Queued);
        // 30 - 0.5 + 0.2 = 29.7 -> 29
        assert_eq!(rx.recv(None), RecvOutcome::Sample(SensorSample::new(29)));
        let t = plant.lock().unwrap().temperature();
        assert!(nearly_equal(t, 29.7, Tolerances::default()));
        assert_eq!(stats.snapshot().produced, 1);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (tx, rx) = channel::bounded(5).unwrap();
        let stats = Arc::new(LoopStats::new());
        let mut sampler = Sampler::new(
            quiet_plant(25.0),
            SharedActuator::default(),
            tx,
            stats.clone(),
        );

        for _ in 0..5 {
            assert_eq!(sampler.tick().unwrap(), SendOutcome::Queued);
        }
        assert_eq!(sampler.tick().unwrap(), SendOutcome::Full);

        let snap = stats.snapshot();
        assert_eq!(snap.produced, 6);
        assert_eq!(snap.dropped, 1);
        assert_eq!(rx.len(), 5);

        // plant climbs 0.2 per tick from 25.0
        let mut drained = Vec::new();
        while let RecvOutcome::Sample(s) = rx.recv(Some(std::time::Duration::from_millis(10))) {
            drained.push(s.raw());
        }
        assert_eq!(drained.len(), 5);
        assert!(drained.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(drained[0], 25);
    }

    #[test]
    fn closed_channel_is_reported() {
        let (tx, rx) = channel::bounded(1).unwrap();
        drop(rx);
        let mut sampler = Sampler::new(
            quiet_plant(25.0),
            SharedActuator::default(),
            tx,
            Arc::new(LoopStats::new()),
        );
        assert!(matches!(sampler.tick(), Err(SimError::ChannelClosed)));
    }
}
