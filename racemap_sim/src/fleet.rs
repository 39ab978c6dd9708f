//! Seeded fleet generation.
//!
//! All randomness comes from one ChaCha8 stream per seed, so the same seed
//! always yields the same vehicle ids, speeds and start offsets.

use crate::config::SimConfig;
use crate::error::SimError;
use crate::vehicle::SimulatedVehicle;
use racemap_core::FinalizedTrack;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use uuid::Uuid;

/// Slowest speed a sampled vehicle may have, in m/s.
pub const MIN_SPEED_MPS: f64 = 1.0;

/// Deterministic vehicle id for `index` within a fleet seeded with `seed`.
pub fn vehicle_id(seed: u64, index: usize) -> Uuid {
    let mixed = seed ^ (index as u64).wrapping_mul(0x9e3779b97f4a7c15);
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&mixed.to_le_bytes());
    bytes[8..16].copy_from_slice(&mixed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
    Uuid::from_bytes(bytes)
}

/// Samples `config.num_vehicles` vehicles spread around `track`.
///
/// Speeds are drawn from N(base_speed, speed_std) and floored at
/// [`MIN_SPEED_MPS`]; start offsets are uniform over the track length.
pub fn spawn_fleet(config: &SimConfig, track: &Arc<FinalizedTrack>) -> Result<Vec<SimulatedVehicle>, SimError> {
    config.validate()?;
    let speeds = Normal::new(config.base_speed_mps, config.speed_std_mps)
        .map_err(|e| SimError::invalid(format!("speed distribution: {}", e)))?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let total = track.tracker.total_length();

    let fleet = (0..config.num_vehicles)
        .map(|index| {
            let speed = speeds.sample(&mut rng).max(MIN_SPEED_MPS);
            let start = rng.gen_range(0.0..total);
            SimulatedVehicle::new(
                vehicle_id(config.seed, index).to_string(),
                Arc::clone(track),
                speed,
                start,
            )
        })
        .collect();
    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::test_support::square_track;
    use proptest::prelude::*;

    #[test]
    fn test_fleet_is_deterministic() {
        let track = square_track();
        let config = SimConfig::default();

        let a = spawn_fleet(&config, &track).unwrap();
        let b = spawn_fleet(&config, &track).unwrap();
        assert_eq!(a.len(), config.num_vehicles);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id(), y.id());
            assert_eq!(x.speed_mps(), y.speed_mps());
            assert_eq!(x.distance(), y.distance());
        }
    }

    #[test]
    fn test_seed_changes_fleet() {
        let track = square_track();
        let a = spawn_fleet(&SimConfig::default(), &track).unwrap();
        let b = spawn_fleet(&SimConfig { seed: 43, ..SimConfig::default() }, &track).unwrap();
        assert_ne!(a[0].id(), b[0].id());
        assert_ne!(a[0].speed_mps(), b[0].speed_mps());
    }

    #[test]
    fn test_zero_std_gives_base_speed() {
        let config = SimConfig {
            speed_std_mps: 0.0,
            ..SimConfig::default()
        };
        let fleet = spawn_fleet(&config, &square_track()).unwrap();
        assert!(fleet.iter().all(|v| v.speed_mps() == config.base_speed_mps));
    }

    #[test]
    fn test_ids_unique_within_fleet() {
        let ids: std::collections::HashSet<_> = (0..100).map(|i| vehicle_id(42, i)).collect();
        assert_eq!(ids.len(), 100);
    }

    proptest! {
        #[test]
        fn prop_fleet_within_track(seed in any::<u64>(), count in 0usize..20) {
            let track = square_track();
            let config = SimConfig { seed, num_vehicles: count, ..SimConfig::default() };
            let fleet = spawn_fleet(&config, &track).unwrap();

            prop_assert_eq!(fleet.len(), count);
            for vehicle in &fleet {
                prop_assert!(vehicle.speed_mps() >= MIN_SPEED_MPS);
                prop_assert!(vehicle.distance() >= 0.0);
                prop_assert!(vehicle.distance() < track.tracker.total_length());
            }
        }
    }
}
