//! Simulation configuration.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of simulated vehicles to spawn
    pub num_vehicles: usize,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Mean vehicle speed in m/s
    pub base_speed_mps: f64,

    /// Standard deviation of vehicle speed in m/s
    pub speed_std_mps: f64,

    /// Simulation duration in seconds
    pub max_duration_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_vehicles: 4,
            tick_rate_hz: 30,
            base_speed_mps: 30.0,
            speed_std_mps: 5.0,
            max_duration_secs: 10.0,
        }
    }
}

impl SimConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the vehicle loops cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_rate_hz == 0 {
            return Err(SimError::invalid("tick_rate_hz must be positive"));
        }
        if !self.base_speed_mps.is_finite() || self.base_speed_mps <= 0.0 {
            return Err(SimError::invalid(format!(
                "base_speed_mps must be positive, got {}",
                self.base_speed_mps
            )));
        }
        if !self.speed_std_mps.is_finite() || self.speed_std_mps < 0.0 {
            return Err(SimError::invalid(format!(
                "speed_std_mps must be non-negative, got {}",
                self.speed_std_mps
            )));
        }
        if !self.max_duration_secs.is_finite() || self.max_duration_secs < 0.0 {
            return Err(SimError::invalid(format!(
                "max_duration_secs must be non-negative, got {}",
                self.max_duration_secs
            )));
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.dt())
    }

    /// Whole ticks covered by `max_duration_secs`.
    pub fn total_ticks(&self) -> u64 {
        (self.max_duration_secs * self.tick_rate_hz as f64) as u64
    }
}
