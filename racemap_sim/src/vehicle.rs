//! Simulated vehicles driving along a finalized track.
//!
//! Each vehicle runs on its own thread, advancing its distance at a fixed
//! tick and publishing its state into the [`VehicleRegistry`]. The track is
//! shared read-only through an `Arc`, so the update loop never touches the
//! track-point lock.

use crate::clock::SimClock;
use crate::error::SimError;
use crate::registry::{VehicleRegistry, VehicleState};
use racemap_core::coords;
use racemap_core::FinalizedTrack;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Shared stop flag for one vehicle thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A vehicle moving at constant speed along a track.
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    id: String,
    speed_mps: f64,

    /// Distance along the track in normalized units
    distance: f64,

    track: Arc<FinalizedTrack>,
}

impl SimulatedVehicle {
    pub fn new(id: impl Into<String>, track: Arc<FinalizedTrack>, speed_mps: f64, start_distance: f64) -> Self {
        let distance = track.tracker.normalize_distance(start_distance);
        Self {
            id: id.into(),
            speed_mps,
            distance,
            track,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Advances by `dt` seconds and returns the new state.
    ///
    /// Closed tracks wrap around; open tracks stop at the end.
    pub fn step(&mut self, dt: f64, time_ms: i64) -> VehicleState {
        let advance = self.speed_mps * dt / self.track.origin.map_size;
        self.distance = self.track.tracker.normalize_distance(self.distance + advance);
        self.state(time_ms)
    }

    /// Current state without moving.
    pub fn state(&self, time_ms: i64) -> VehicleState {
        let tracker = &self.track.tracker;
        let normalized = tracker.position_at_distance(self.distance);
        let heading = tracker.heading_at_distance(self.distance);

        VehicleState {
            id: self.id.clone(),
            position: coords::unproject(normalized, &self.track.origin),
            normalized: Some(normalized),
            speed: self.speed_mps,
            course: course_degrees(heading.x, heading.y),
            time_ms,
            simulated: true,
            distance: Some(self.distance),
        }
    }

    /// Registers the vehicle and starts its update thread.
    ///
    /// The thread exits when its token is cancelled or the vehicle is
    /// removed from `registry`.
    pub fn spawn(
        self,
        registry: VehicleRegistry,
        clock: Arc<dyn SimClock>,
        tick: Duration,
    ) -> Result<SimHandle, SimError> {
        let token = CancelToken::new();
        let id = self.id.clone();
        registry.register_simulated(&id, token.clone());

        let thread_token = token.clone();
        let thread_registry = registry.clone();
        let join = thread::Builder::new()
            .name(format!("vehicle-{}", id))
            .spawn(move || run_vehicle(self, thread_registry, clock, tick, thread_token));

        let join = match join {
            Ok(join) => join,
            Err(e) => {
                registry.remove(&id);
                return Err(e.into());
            }
        };

        info!(id = %id, "Started simulated vehicle");
        Ok(SimHandle {
            id,
            token,
            join: Some(join),
        })
    }
}

/// Compass course in [0, 360) for a map-frame heading (x east, y north).
fn course_degrees(x: f64, y: f64) -> f64 {
    let course = x.atan2(y).to_degrees().rem_euclid(360.0);
    if course >= 360.0 {
        0.0
    } else {
        course
    }
}

fn run_vehicle(
    mut vehicle: SimulatedVehicle,
    registry: VehicleRegistry,
    clock: Arc<dyn SimClock>,
    tick: Duration,
    token: CancelToken,
) -> u64 {
    let dt = tick.as_secs_f64();
    let mut ticks = 0;

    while !token.is_cancelled() {
        let state = vehicle.step(dt, clock.unix_millis());
        if !registry.update(state) {
            break;
        }
        ticks += 1;
        if ticks % 100 == 0 {
            debug!(id = %vehicle.id, ticks, distance = vehicle.distance, "Vehicle tick");
        }
        clock.sleep(tick);
    }

    info!(id = %vehicle.id, ticks, "Simulated vehicle stopped");
    ticks
}

/// Handle to a running vehicle thread.
///
/// Dropping the handle detaches the thread; it keeps running until the
/// vehicle is removed from the registry.
#[derive(Debug)]
pub struct SimHandle {
    id: String,
    token: CancelToken,
    join: Option<JoinHandle<u64>>,
}

impl SimHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Signals the thread to stop without waiting.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancels the thread and waits for it, returning its tick count.
    pub fn stop_and_join(mut self) -> u64 {
        self.token.cancel();
        match self.join.take() {
            Some(join) => join.join().unwrap_or(0),
            None => 0,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use racemap_core::coords::anchor_origin;
    use racemap_core::types::default_tangent;
    use racemap_core::{FinalizedTrack, GeodeticPoint, NormalizedPoint, ProgressTracker, SplineSample};
    use std::sync::Arc;

    /// 100 m square loop (map_size 1000), counter-clockwise from the origin.
    pub fn square_track() -> Arc<FinalizedTrack> {
        let origin = anchor_origin(GeodeticPoint::new(52.0, -1.0), 1000.0);
        let positions = vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(0.1, 0.0),
            NormalizedPoint::new(0.1, 0.1),
            NormalizedPoint::new(0.0, 0.1),
            NormalizedPoint::new(0.0, 0.0),
        ];
        let samples = positions
            .iter()
            .map(|&p| SplineSample::new(p, default_tangent()))
            .collect();
        let tracker = ProgressTracker::from_positions(positions, true).unwrap();
        Arc::new(FinalizedTrack {
            origin,
            samples,
            tracker,
            closed: true,
        })
    }
}
