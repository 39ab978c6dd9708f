//! The Progress Tracker - arc-length parameterization of a sampled centerline.
//!
//! Maps traveled distance (or a fraction of the lap) to a position on the
//! track. Only the forward direction exists: there is no lookup from an
//! arbitrary position back to progress.

use crate::error::ProgressError;
use crate::types::{default_tangent, NormalizedPoint, SplineSample};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Minimum usable total length (normalized units).
pub const MIN_TRACK_LENGTH: f64 = 1e-6;

/// Cumulative arc-length table over a sampled path.
///
/// Deserialization rebuilds the table from `positions`, so a decoded
/// tracker upholds the same checks as one built with
/// [`ProgressTracker::from_positions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackerPath")]
pub struct ProgressTracker {
    positions: Vec<NormalizedPoint>,

    /// `cumulative[i]` is the path length from sample 0 to sample i
    cumulative: Vec<f64>,

    closed: bool,
}

/// Serialized form accepted when decoding a tracker; the stored table is
/// ignored and recomputed.
#[derive(Deserialize)]
struct TrackerPath {
    positions: Vec<NormalizedPoint>,
    closed: bool,
}

impl TryFrom<TrackerPath> for ProgressTracker {
    type Error = ProgressError;

    fn try_from(path: TrackerPath) -> Result<Self, Self::Error> {
        Self::from_positions(path.positions, path.closed)
    }
}

impl ProgressTracker {
    /// Builds the table from spline samples.
    ///
    /// # Errors
    /// `ProgressError::TooShort` when the path is shorter than
    /// [`MIN_TRACK_LENGTH`] (which includes fewer than two samples), and
    /// `ProgressError::NonFinite` when any position is NaN or infinite.
    pub fn new(samples: &[SplineSample], closed: bool) -> Result<Self, ProgressError> {
        let positions: Vec<NormalizedPoint> = samples.iter().map(|s| s.position).collect();
        Self::from_positions(positions, closed)
    }

    /// Builds the table from raw positions.
    pub fn from_positions(positions: Vec<NormalizedPoint>, closed: bool) -> Result<Self, ProgressError> {
        let mut cumulative = Vec::with_capacity(positions.len());
        let mut total = 0.0;
        for (i, position) in positions.iter().enumerate() {
            if i > 0 {
                total += (position - positions[i - 1]).norm();
            }
            cumulative.push(total);
        }

        if !total.is_finite() {
            return Err(ProgressError::NonFinite(total));
        }
        if positions.len() < 2 || total < MIN_TRACK_LENGTH {
            return Err(ProgressError::TooShort(total));
        }

        Ok(Self {
            positions,
            cumulative,
            closed,
        })
    }

    /// Total path length (last table entry).
    pub fn total_length(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The cumulative arc-length table, aligned with the samples.
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative
    }

    /// Wraps (closed) or clamps (open) a distance into the valid range.
    pub fn normalize_distance(&self, distance: f64) -> f64 {
        let total = self.total_length();
        if self.closed {
            let wrapped = distance.rem_euclid(total);
            // rem_euclid can round up to `total` for tiny negative inputs
            if wrapped >= total {
                0.0
            } else {
                wrapped
            }
        } else {
            distance.clamp(0.0, total)
        }
    }

    /// Index `i >= 1` of the segment `(i - 1, i)` containing `distance`,
    /// plus the clamped fraction within it.
    fn locate(&self, distance: f64) -> (usize, f64) {
        let d = self.normalize_distance(distance);
        let index = self
            .cumulative
            .partition_point(|&length| length < d)
            .clamp(1, self.cumulative.len() - 1);

        let start = self.cumulative[index - 1];
        let length = self.cumulative[index] - start;
        let fraction = if length > 0.0 {
            ((d - start) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (index, fraction)
    }

    /// Position after traveling `distance` along the path from sample 0.
    pub fn position_at_distance(&self, distance: f64) -> NormalizedPoint {
        let (index, fraction) = self.locate(distance);
        let a = self.positions[index - 1];
        let b = self.positions[index];
        a + (b - a) * fraction
    }

    /// Position at `fraction` of the total length.
    pub fn position_at_fraction(&self, fraction: f64) -> NormalizedPoint {
        self.position_at_distance(fraction * self.total_length())
    }

    /// Unit direction of travel at `distance`.
    ///
    /// Zero-length segments fall back to `(1, 0)`.
    pub fn heading_at_distance(&self, distance: f64) -> Vector2<f64> {
        let (index, _) = self.locate(distance);
        let delta = self.positions[index] - self.positions[index - 1];
        let norm = delta.norm();
        if norm > f64::EPSILON {
            delta / norm
        } else {
            default_tangent()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::interpolate_centripetal;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> NormalizedPoint {
        NormalizedPoint::new(x, y)
    }

    fn square_loop() -> ProgressTracker {
        let points = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0)];
        ProgressTracker::from_positions(points, true).unwrap()
    }

    #[test]
    fn test_cumulative_table() {
        let tracker = square_loop();
        assert_eq!(tracker.cumulative_lengths(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(tracker.total_length(), 4.0);
    }

    #[test]
    fn test_interpolates_within_segment() {
        let tracker = square_loop();
        assert_relative_eq!(tracker.position_at_distance(0.5), p(0.5, 0.0));
        assert_relative_eq!(tracker.position_at_distance(2.25), p(0.75, 1.0));
        assert_relative_eq!(tracker.position_at_fraction(0.25), p(1.0, 0.0));
    }

    #[test]
    fn test_closed_track_wraps() {
        let tracker = square_loop();
        assert_relative_eq!(tracker.position_at_distance(4.0), p(0.0, 0.0));
        assert_relative_eq!(tracker.position_at_distance(4.5), p(0.5, 0.0));
        assert_relative_eq!(tracker.position_at_distance(-0.5), p(0.0, 0.5));
    }

    #[test]
    fn test_open_track_clamps() {
        let points = vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 3.0)];
        let tracker = ProgressTracker::from_positions(points, false).unwrap();
        assert_relative_eq!(tracker.position_at_distance(-1.0), p(0.0, 0.0));
        assert_relative_eq!(tracker.position_at_distance(5.0), p(2.0, 3.0));
        assert_relative_eq!(tracker.position_at_distance(100.0), p(2.0, 3.0));
    }

    #[test]
    fn test_zero_length_segments_are_skipped() {
        let points = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)];
        let tracker = ProgressTracker::from_positions(points, false).unwrap();
        assert_relative_eq!(tracker.position_at_distance(1.0), p(1.0, 0.0));
        assert_relative_eq!(tracker.position_at_distance(1.5), p(1.5, 0.0));
        assert_relative_eq!(tracker.heading_at_distance(1.5), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_heading() {
        let tracker = square_loop();
        assert_relative_eq!(tracker.heading_at_distance(1.5), Vector2::new(0.0, 1.0));
        assert_relative_eq!(tracker.heading_at_distance(3.5), Vector2::new(0.0, -1.0));
    }

    #[test]
    fn test_too_short_is_an_error() {
        assert!(matches!(
            ProgressTracker::from_positions(vec![p(1.0, 1.0), p(1.0, 1.0)], false),
            Err(ProgressError::TooShort(_))
        ));
        assert!(ProgressTracker::new(&[], true).is_err());
    }

    #[test]
    fn test_non_finite_positions_are_an_error() {
        assert!(matches!(
            ProgressTracker::from_positions(vec![p(f64::NAN, 0.0), p(1.0, 0.0)], false),
            Err(ProgressError::NonFinite(_))
        ));
        assert!(matches!(
            ProgressTracker::from_positions(vec![p(0.0, 0.0), p(f64::INFINITY, 0.0)], true),
            Err(ProgressError::NonFinite(_))
        ));
    }

    #[test]
    fn test_deserialize_rebuilds_table() {
        let tracker = square_loop();
        let json = serde_json::to_string(&tracker).unwrap();
        let decoded: ProgressTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, tracker);

        // A stale table in the payload is recomputed from the positions
        let stale = r#"{"positions":[[0.0,0.0],[3.0,4.0]],"cumulative":[0.0,1.0],"closed":false}"#;
        let decoded: ProgressTracker = serde_json::from_str(stale).unwrap();
        assert_eq!(decoded.total_length(), 5.0);
    }

    #[test]
    fn test_deserialize_rejects_empty_path() {
        let empty = r#"{"positions":[],"cumulative":[],"closed":false}"#;
        assert!(serde_json::from_str::<ProgressTracker>(empty).is_err());
    }

    #[test]
    fn test_endpoints_match_samples() {
        let points = vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        let samples = interpolate_centripetal(&points, 4, 0.5);
        let open = ProgressTracker::new(&samples, false).unwrap();
        assert_eq!(open.position_at_distance(0.0), samples[0].position);
        assert_relative_eq!(open.position_at_distance(open.total_length()), samples[8].position);

        let closed = ProgressTracker::new(&samples, true).unwrap();
        assert_eq!(closed.position_at_distance(closed.total_length()), samples[0].position);
    }

    proptest! {
        #[test]
        fn prop_table_is_monotonic(
            raw in prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), 2..30),
            d in -50.0f64..50.0,
            closed in any::<bool>(),
        ) {
            let points: Vec<_> = raw.into_iter().map(|(x, y)| p(x, y)).collect();
            if let Ok(tracker) = ProgressTracker::from_positions(points, closed) {
                let table = tracker.cumulative_lengths();
                prop_assert_eq!(table[0], 0.0);
                prop_assert!(table.windows(2).all(|w| w[0] <= w[1]));
                prop_assert_eq!(table[table.len() - 1], tracker.total_length());
                let position = tracker.position_at_distance(d);
                prop_assert!(position.x.is_finite() && position.y.is_finite());
            }
        }
    }
}
