//! Simulation runner: loads a track, spawns a fleet and drives it.

use crate::clock::{SimClock, SystemClock};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::fleet::spawn_fleet;
use crate::registry::{VehicleRegistry, VehicleState};
use racemap_core::{FinalizedTrack, PayloadReport, PipelineConfig, TrackSession};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub seed: u64,

    /// Track length in meters
    pub track_length_m: f64,

    pub closed: bool,

    /// Vehicle ticks executed across the fleet
    pub total_ticks: u64,

    /// Simulated (or wall) time covered, in seconds
    pub elapsed_secs: f64,

    /// Final vehicle states, sorted by id
    pub vehicles: Vec<VehicleState>,
}

/// A finalized track plus the fleet that drives on it.
pub struct Simulation {
    config: SimConfig,
    track: Arc<FinalizedTrack>,
    registry: VehicleRegistry,
    clock: Arc<dyn SimClock>,
}

impl Simulation {
    pub fn new(track: FinalizedTrack, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            track: Arc::new(track),
            registry: VehicleRegistry::new(),
            clock: Arc::new(SystemClock::new()),
        })
    }

    /// Parses a DMS track payload, finalizes it and builds a simulation.
    pub fn from_payload(
        payload: &str,
        pipeline: &PipelineConfig,
        config: SimConfig,
    ) -> Result<(Self, PayloadReport), SimError> {
        let mut session = TrackSession::from_config(pipeline);
        let report = session.load_payload(payload);
        let track = session.finalize(pipeline)?;
        Ok((Self::new(track, config)?, report))
    }

    /// Replaces the time source (e.g. a virtual clock in tests).
    pub fn with_clock(mut self, clock: Arc<dyn SimClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn track(&self) -> &Arc<FinalizedTrack> {
        &self.track
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs every vehicle on its own thread for `duration`, then stops them.
    pub fn run_threaded(&self, duration: Duration) -> Result<SimReport, SimError> {
        let fleet = spawn_fleet(&self.config, &self.track)?;
        let tick = self.config.tick_interval();
        info!(
            vehicles = fleet.len(),
            tick_rate_hz = self.config.tick_rate_hz,
            "Starting threaded simulation"
        );

        let start = self.clock.now();
        let mut handles = Vec::with_capacity(fleet.len());
        for vehicle in fleet {
            match vehicle.spawn(self.registry.clone(), Arc::clone(&self.clock), tick) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for handle in handles {
                        handle.stop_and_join();
                    }
                    return Err(e);
                }
            }
        }

        self.clock.sleep(duration);
        let total_ticks = handles.into_iter().map(|h| h.stop_and_join()).sum();
        let elapsed_secs = (self.clock.now() - start).as_secs_f64();

        let report = self.report(total_ticks, elapsed_secs);
        self.registry.clear();
        Ok(report)
    }

    /// Steps every vehicle `ticks` times on the calling thread.
    ///
    /// Fully deterministic for a given seed: vehicles advance in fleet order
    /// and timestamps come from the tick count, not the clock.
    pub fn run_stepped(&self, ticks: u64) -> Result<SimReport, SimError> {
        let mut fleet = spawn_fleet(&self.config, &self.track)?;
        let dt = self.config.dt();
        let start_ms = self.clock.unix_millis();

        for vehicle in &fleet {
            self.registry.register_simulated(vehicle.id(), Default::default());
            self.registry.update(vehicle.state(start_ms));
        }

        for tick in 1..=ticks {
            let time_ms = start_ms + (tick as f64 * dt * 1000.0) as i64;
            for vehicle in &mut fleet {
                self.registry.update(vehicle.step(dt, time_ms));
            }
            if tick % self.config.tick_rate_hz as u64 == 0 {
                debug!(tick, "Stepped simulation");
            }
        }

        let report = self.report(ticks * fleet.len() as u64, ticks as f64 * dt);
        self.registry.clear();
        Ok(report)
    }

    fn report(&self, total_ticks: u64, elapsed_secs: f64) -> SimReport {
        SimReport {
            seed: self.config.seed,
            track_length_m: self.track.length_meters(),
            closed: self.track.closed,
            total_ticks,
            elapsed_secs,
            vehicles: self.registry.snapshot(),
        }
    }
}
