//! YAML configuration for the whole control system.
//!
//! Every field has a default, so an empty document is a valid configuration that
//! reproduces the reference loop: 25 °C setpoint, 1 s sampling, queue depth 5,
//! KP=3.0 KI=0.1 KD=1.5 and the cooling actuator starting at 0 %.

use crate::channel::DEFAULT_CAPACITY;
use crate::control_loop::DEFAULT_SETPOINT;
use crate::error::{SimError, SimResult};
use crate::plant::PlantConfig;
use crate::task::TaskSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tl_controls::{ActuatorCommand, PidController, SampleConfig};
use tl_core::ensure_within;

pub const CONTROL_TASK_NAME: &str = "ControlTask";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Target temperature (°C).
    pub setpoint: f64,
    pub sample: SampleConfig,
    pub channel_capacity: usize,
    /// Cooling power before the first control cycle (%).
    pub initial_cooling_power: f64,
    /// Bounded receive wait for the control task; `None` waits forever.
    pub recv_timeout_ms: Option<u64>,
    pub controller: PidController,
    pub plant: PlantConfig,
    pub control_task: TaskSpec,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            setpoint: DEFAULT_SETPOINT,
            sample: SampleConfig::default(),
            channel_capacity: DEFAULT_CAPACITY,
            initial_cooling_power: 0.0,
            recv_timeout_ms: None,
            controller: PidController::cooling(),
            plant: PlantConfig::default(),
            control_task: TaskSpec::new(CONTROL_TASK_NAME),
        }
    }
}

impl SystemConfig {
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        tl_core::ensure_finite(self.setpoint, "setpoint")?;
        SampleConfig::new(self.sample.period_ms)?;
        if self.channel_capacity == 0 {
            return Err(SimError::InvalidConfig {
                what: "channel_capacity must be positive".to_string(),
            });
        }
        ensure_within(
            self.initial_cooling_power,
            ActuatorCommand::MIN,
            ActuatorCommand::MAX,
            "initial_cooling_power",
        )?;
        if self.recv_timeout_ms == Some(0) {
            return Err(SimError::InvalidConfig {
                what: "recv_timeout_ms must be positive when set".to_string(),
            });
        }
        self.controller.validate()?;
        self.plant.validate()?;
        if self.control_task.stack_size == 0 {
            return Err(SimError::InvalidConfig {
                what: format!("task {} needs a non-zero stack_size", self.control_task.name),
            });
        }
        Ok(())
    }

    pub fn initial_command(&self) -> SimResult<ActuatorCommand> {
        Ok(ActuatorCommand::new(self.initial_cooling_power)?)
    }

    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_controls::AntiWindup;

    #[test]
    fn empty_document_is_reference_setup() {
        let config = SystemConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SystemConfig::default());
        assert_eq!(config.setpoint, 25.0);
        assert_eq!(config.sample.period_ms, 1000);
        assert_eq!(config.channel_capacity, 5);
        assert_eq!(config.controller.kp, 3.0);
        assert_eq!(config.controller.ki, 0.1);
        assert_eq!(config.controller.kd, 1.5);
        assert_eq!(config.control_task.name, "ControlTask");
        assert_eq!(config.recv_timeout(), None);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let text = r#"
setpoint: 22.5
sample:
  period_ms: 100
recv_timeout_ms: 2000
controller:
  kp: 2.0
  ki: 0.05
  kd: 0.0
  out_min: 0.0
  out_max: 100.0
  anti_windup: conditional_integration
plant:
  seed: 7
  sensor_noise: 0.0
"#;
        let config = SystemConfig::from_yaml_str(text).unwrap();
        assert_eq!(config.setpoint, 22.5);
        assert_eq!(config.sample.period_ms, 100);
        assert_eq!(config.recv_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.controller.anti_windup, AntiWindup::ConditionalIntegration);
        assert_eq!(config.plant.seed, Some(7));
        assert_eq!(config.plant.sensor_noise, 0.0);
        assert_eq!(config.plant.heat_bias, 0.2);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(SystemConfig::from_yaml_str("channel_capacity: 0").is_err());
        assert!(SystemConfig::from_yaml_str("sample: {period_ms: 0}").is_err());
        assert!(SystemConfig::from_yaml_str("initial_cooling_power: 120.0").is_err());
        assert!(SystemConfig::from_yaml_str("recv_timeout_ms: 0").is_err());
        assert!(SystemConfig::from_yaml_str("plant: {min_temperature: 50.0}").is_err());
        assert!(SystemConfig::from_yaml_str("plant: {disturbance: 1.0e308, seed: 1}").is_err());
        let negative_gain = "controller: {kp: 3.0, ki: -0.1, kd: 1.5, out_min: 0.0, out_max: 100.0}";
        assert!(SystemConfig::from_yaml_str(negative_gain).is_err());
        assert!(matches!(
            SystemConfig::from_yaml_str("setpoint: [1, 2]"),
            Err(SimError::Yaml(_))
        ));
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let config = SystemConfig {
            setpoint: 21.0,
            ..SystemConfig::default()
        };
        let text = config.to_yaml().unwrap();
        assert_eq!(SystemConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SystemConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
