//! Simulated thermal plant.
//!
//! One [`PlantSimulator::advance`] call moves the process one sample forward:
//! cooling pulls the temperature down in proportion to the commanded power, the
//! ambient bias pushes it up, a uniform disturbance is added and the result is
//! clamped to the plant bounds. The returned sensor reading carries its own
//! uniform noise and is not clamped.

use crate::error::{SimError, SimResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tl_controls::ActuatorCommand;
use tl_core::{ensure_finite, ensure_within};

/// Plant model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Temperature at construction (°C).
    pub initial_temperature: f64,
    /// Temperature drop per sample at 100 % cooling (°C).
    pub cool_rate: f64,
    /// Ambient heating per sample (°C).
    pub heat_bias: f64,
    /// Half-width of the uniform process disturbance (°C).
    pub disturbance: f64,
    /// Half-width of the uniform sensor noise (°C).
    pub sensor_noise: f64,
    /// Lower plant bound (°C).
    pub min_temperature: f64,
    /// Upper plant bound (°C).
    pub max_temperature: f64,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 25.0,
            cool_rate: 1.0,
            heat_bias: 0.2,
            disturbance: 0.3,
            sensor_noise: 0.5,
            min_temperature: 15.0,
            max_temperature: 40.0,
            seed: None,
        }
    }
}

impl PlantConfig {
    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.initial_temperature, "initial_temperature")?;
        ensure_finite(self.cool_rate, "cool_rate")?;
        ensure_finite(self.heat_bias, "heat_bias")?;
        ensure_finite(self.disturbance, "disturbance")?;
        ensure_finite(self.sensor_noise, "sensor_noise")?;
        ensure_finite(self.min_temperature, "min_temperature")?;
        ensure_finite(self.max_temperature, "max_temperature")?;
        if self.min_temperature >= self.max_temperature {
            return Err(SimError::InvalidArg {
                what: "min_temperature must be less than max_temperature",
            });
        }
        if self.initial_temperature < self.min_temperature
            || self.initial_temperature > self.max_temperature
        {
            return Err(SimError::InvalidArg {
                what: "initial_temperature must lie within the plant bounds",
            });
        }
        if self.cool_rate < 0.0 {
            return Err(SimError::InvalidArg {
                what: "cool_rate must be non-negative",
            });
        }
        // Half-widths are limited to half the plant span so the sampled
        // interval width stays finite.
        let span = ensure_finite(
            self.max_temperature - self.min_temperature,
            "temperature span",
        )?;
        ensure_within(self.disturbance, 0.0, span / 2.0, "disturbance")?;
        ensure_within(self.sensor_noise, 0.0, span / 2.0, "sensor_noise")?;
        Ok(())
    }
}

/// Observable plant state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantState {
    pub temperature: f64,
}

/// Plant shared between the sampling context and observers.
pub type SharedPlant = Arc<Mutex<PlantSimulator>>;

#[derive(Debug)]
pub struct PlantSimulator {
    config: PlantConfig,
    temperature: f64,
    rng: StdRng,
}

impl PlantSimulator {
    pub fn new(config: PlantConfig) -> SimResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            temperature: config.initial_temperature,
            config,
            rng,
        })
    }

    pub fn into_shared(self) -> SharedPlant {
        Arc::new(Mutex::new(self))
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn state(&self) -> PlantState {
        PlantState {
            temperature: self.temperature,
        }
    }

    /// Step the process under `command` and return a fresh, noisy sensor reading.
    pub fn advance(&mut self, command: ActuatorCommand) -> f64 {
        let cfg = &self.config;
        let mut t = self.temperature;
        t -= command.fraction() * cfg.cool_rate;
        t += cfg.heat_bias;
        t += uniform(&mut self.rng, cfg.disturbance);
        t = t.clamp(cfg.min_temperature, cfg.max_temperature);
        self.temperature = t;

        t + uniform(&mut self.rng, cfg.sensor_noise)
    }
}

/// Uniform sample in `[-half_width, half_width]`.
fn uniform(rng: &mut StdRng, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.gen_range(-half_width..=half_width)
    } else {
        0.0
    }
}
