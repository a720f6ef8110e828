//! Cooling actuator command and the cell that carries it across contexts.
//!
//! The control task writes the command, the sampling context reads it when it
//! advances the plant. [`SharedActuator`] stores the `f64` bit pattern in an
//! `AtomicU64` with release stores and acquire loads, so a reader always
//! observes a complete value.

use crate::error::ControlResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tl_core::clamp_finite;

/// Commanded cooling power, always finite and within [0, 100] %.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
pub struct ActuatorCommand {
    cooling_power: f64,
}

impl ActuatorCommand {
    /// Lowest cooling power (%).
    pub const MIN: f64 = 0.0;
    /// Highest cooling power (%).
    pub const MAX: f64 = 100.0;

    /// Actuator off.
    pub const OFF: Self = Self { cooling_power: 0.0 };

    /// Build a command, clamping into range. Non-finite power is rejected.
    pub fn new(cooling_power: f64) -> ControlResult<Self> {
        let cooling_power = clamp_finite(cooling_power, Self::MIN, Self::MAX, "cooling power")?;
        Ok(Self { cooling_power })
    }

    /// Cooling power in percent.
    pub fn cooling_power(&self) -> f64 {
        self.cooling_power
    }

    /// Cooling power as a fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        self.cooling_power / Self::MAX
    }
}

impl<'de> Deserialize<'de> for ActuatorCommand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            cooling_power: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.cooling_power).map_err(serde::de::Error::custom)
    }
}

/// Cloneable handle to the actuator command shared by producer and consumer.
#[derive(Debug, Clone)]
pub struct SharedActuator {
    bits: Arc<AtomicU64>,
}

impl SharedActuator {
    pub fn new(initial: ActuatorCommand) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(initial.cooling_power.to_bits())),
        }
    }

    /// Current command.
    pub fn load(&self) -> ActuatorCommand {
        ActuatorCommand {
            cooling_power: f64::from_bits(self.bits.load(Ordering::Acquire)),
        }
    }

    /// Publish a new command.
    pub fn store(&self, command: ActuatorCommand) {
        self.bits
            .store(command.cooling_power.to_bits(), Ordering::Release);
    }
}

impl Default for SharedActuator {
    fn default() -> Self {
        Self::new(ActuatorCommand::OFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn command_is_clamped() {
        assert_eq!(ActuatorCommand::new(140.0).unwrap().cooling_power(), 100.0);
        assert_eq!(ActuatorCommand::new(-3.0).unwrap().cooling_power(), 0.0);
        assert_eq!(ActuatorCommand::new(42.5).unwrap().fraction(), 0.425);
    }

    #[test]
    fn command_rejects_non_finite() {
        assert!(ActuatorCommand::new(f64::NAN).is_err());
        assert!(ActuatorCommand::new(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn deserialize_goes_through_validation() {
        use serde::de::value::{Error, MapDeserializer};

        let entries = vec![("cooling_power", 250.0f64)];
        let de: MapDeserializer<'_, _, Error> = MapDeserializer::new(entries.into_iter());
        let cmd = ActuatorCommand::deserialize(de).unwrap();
        assert_eq!(cmd.cooling_power(), 100.0);
    }

    #[test]
    fn shared_cell_starts_at_initial_value() {
        assert_eq!(SharedActuator::default().load(), ActuatorCommand::OFF);
        let shared = SharedActuator::new(ActuatorCommand::new(25.0).unwrap());
        assert_eq!(shared.load().cooling_power(), 25.0);
    }

    #[test]
    fn shared_cell_visible_across_threads() {
        let shared = SharedActuator::default();
        let writer = shared.clone();

        let handle = thread::spawn(move || {
            for i in 0..=100 {
                writer.store(ActuatorCommand::new(i as f64).unwrap());
            }
        });

        // Every observed value must be one of the whole numbers the writer stored.
        for _ in 0..1000 {
            let seen = shared.load().cooling_power();
            assert!((0.0..=100.0).contains(&seen));
            assert_eq!(seen.fract(), 0.0);
        }

        handle.join().unwrap();
        assert_eq!(shared.load().cooling_power(), 100.0);
    }
}
