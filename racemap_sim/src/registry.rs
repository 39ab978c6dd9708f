//! Shared vehicle registry.
//!
//! Holds the latest state of every vehicle, live or simulated, behind its own
//! lock (never the track-point lock). Removing a simulated vehicle cancels
//! its update thread.

use crate::vehicle::CancelToken;
use racemap_core::{GeodeticPoint, NormalizedPoint, Origin, ParsedTelemetry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Latest known state of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub id: String,

    pub position: GeodeticPoint,

    /// Map-frame position, when an origin is known
    pub normalized: Option<NormalizedPoint>,

    /// m/s
    pub speed: f64,

    /// Degrees clockwise from north
    pub course: f64,

    /// Unix milliseconds
    pub time_ms: i64,

    pub simulated: bool,

    /// Distance along the track (normalized units), simulated vehicles only
    pub distance: Option<f64>,
}

impl VehicleState {
    /// Builds a state from a live telemetry fix.
    pub fn from_telemetry(fix: &ParsedTelemetry, origin: Option<&Origin>) -> Self {
        Self {
            id: fix.id.clone(),
            position: fix.position,
            normalized: origin.map(|origin| fix.normalized(origin)),
            speed: fix.speed.unwrap_or(0.0),
            course: fix.course.unwrap_or(0.0),
            time_ms: fix.time_ms,
            simulated: false,
            distance: None,
        }
    }
}

#[derive(Debug)]
struct RegistryEntry {
    state: Option<VehicleState>,
    cancel: Option<CancelToken>,
}

/// Thread-safe map of vehicle id → latest state.
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    entries: Arc<Mutex<HashMap<String, RegistryEntry>>>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserves a slot for a simulated vehicle before its thread starts.
    ///
    /// Re-registering an id cancels the thread that previously owned it, so
    /// at most one thread writes each entry.
    pub fn register_simulated(&self, id: &str, cancel: CancelToken) {
        let displaced = self.lock().insert(
            id.to_string(),
            RegistryEntry {
                state: None,
                cancel: Some(cancel),
            },
        );
        if let Some(old) = displaced.and_then(|entry| entry.cancel) {
            debug!(id, "Replaced simulated vehicle");
            old.cancel();
        }
    }

    /// Stores a simulated vehicle's new state.
    ///
    /// Returns false when the vehicle is no longer registered, which tells
    /// the update thread to stop.
    pub fn update(&self, state: VehicleState) -> bool {
        match self.lock().get_mut(&state.id) {
            Some(entry) => {
                entry.state = Some(state);
                true
            }
            None => false,
        }
    }

    /// Inserts or replaces a live vehicle's state.
    pub fn upsert_telemetry(&self, fix: &ParsedTelemetry, origin: Option<&Origin>) {
        let state = VehicleState::from_telemetry(fix, origin);
        let mut entries = self.lock();
        let entry = entries.entry(state.id.clone()).or_insert(RegistryEntry {
            state: None,
            cancel: None,
        });
        entry.state = Some(state);
    }

    /// Removes a vehicle, cancelling its update thread if it has one.
    pub fn remove(&self, id: &str) -> Option<VehicleState> {
        let entry = self.lock().remove(id)?;
        if let Some(cancel) = entry.cancel {
            cancel.cancel();
        }
        debug!(id, "Removed vehicle");
        entry.state
    }

    /// Removes every vehicle, cancelling all simulated ones.
    pub fn clear(&self) {
        let drained: Vec<RegistryEntry> = self.lock().drain().map(|(_, entry)| entry).collect();
        for cancel in drained.into_iter().filter_map(|entry| entry.cancel) {
            cancel.cancel();
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<VehicleState> {
        self.lock().get(id).and_then(|entry| entry.state.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies all known states, sorted by id.
    pub fn snapshot(&self) -> Vec<VehicleState> {
        let mut states: Vec<VehicleState> = self
            .lock()
            .values()
            .filter_map(|entry| entry.state.clone())
            .collect();
        states.sort_by(|a, b| a.id.cmp(&b.id));
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racemap_core::parse_telemetry_json;

    fn sim_state(id: &str) -> VehicleState {
        VehicleState {
            id: id.to_string(),
            position: GeodeticPoint::new(52.0, -1.0),
            normalized: Some(NormalizedPoint::zeros()),
            speed: 10.0,
            course: 90.0,
            time_ms: 0,
            simulated: true,
            distance: Some(0.0),
        }
    }

    #[test]
    fn test_update_requires_registration() {
        let registry = VehicleRegistry::new();
        assert!(!registry.update(sim_state("a")));

        registry.register_simulated("a", CancelToken::new());
        assert!(registry.contains("a"));
        assert!(registry.get("a").is_none());
        assert!(registry.update(sim_state("a")));
        assert_eq!(registry.get("a").unwrap().speed, 10.0);
    }

    #[test]
    fn test_remove_cancels_token() {
        let registry = VehicleRegistry::new();
        let token = CancelToken::new();
        registry.register_simulated("a", token.clone());
        registry.update(sim_state("a"));

        let removed = registry.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(token.is_cancelled());
        assert!(!registry.update(sim_state("a")));
    }

    #[test]
    fn test_reregister_cancels_displaced_token() {
        let registry = VehicleRegistry::new();
        let first = CancelToken::new();
        let second = CancelToken::new();

        registry.register_simulated("a", first.clone());
        registry.register_simulated("a", second.clone());

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_cancels_all() {
        let registry = VehicleRegistry::new();
        let tokens: Vec<_> = (0..3).map(|_| CancelToken::new()).collect();
        for (i, token) in tokens.iter().enumerate() {
            registry.register_simulated(&format!("v{}", i), token.clone());
        }
        registry.clear();
        assert!(registry.is_empty());
        assert!(tokens.iter().all(CancelToken::is_cancelled));
    }

    #[test]
    fn test_live_telemetry_upsert() {
        let registry = VehicleRegistry::new();
        let fix = parse_telemetry_json(
            r#"{"id":"A1","lat":407128000,"lon":-740060000,"time":1000,"speed":2500,"course":9000}"#,
        )
        .unwrap();

        registry.upsert_telemetry(&fix, None);
        let state = registry.get("A1").unwrap();
        assert!(!state.simulated);
        assert_eq!(state.speed, 25.0);
        assert_eq!(state.course, 90.0);
        assert!(state.normalized.is_none());

        // Removing a live vehicle has no thread to cancel
        assert!(registry.remove("A1").is_some());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let registry = VehicleRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register_simulated(id, CancelToken::new());
            registry.update(sim_state(id));
        }
        let ids: Vec<_> = registry.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
