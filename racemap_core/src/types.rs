//! Core value types shared across the pipeline.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A point in the normalized map frame.
///
/// One unit corresponds to `Origin::map_size` meters.
pub type NormalizedPoint = Vector2<f64>;

/// Distance (normalized units) below which a track's first and last points
/// are considered the same, i.e. the track is a closed loop.
pub const CLOSURE_THRESHOLD: f64 = 0.01;

/// Latitude/longitude in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeodeticPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// UTM zone identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    /// Zone number 1..=60
    pub number: u8,

    /// True for the northern hemisphere (no false northing)
    pub northern: bool,

    /// Latitude band letter (`C`..`X`, or `A`/`Z` beyond the UTM range)
    pub band: char,
}

impl UtmZone {
    /// Longitude of the zone's central meridian, in degrees.
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

impl Default for UtmZone {
    fn default() -> Self {
        Self {
            number: 31,
            northern: true,
            band: 'N',
        }
    }
}

impl std::fmt::Display for UtmZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, self.band)
    }
}

/// Easting/northing in meters within a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub easting: f64,
    pub northing: f64,
    pub zone: UtmZone,
}

impl PlanarPoint {
    pub fn new(easting: f64, northing: f64, zone: UtmZone) -> Self {
        Self {
            easting,
            northing,
            zone,
        }
    }

    /// The degraded-mode substitute for a failed projection.
    pub fn zero(zone: UtmZone) -> Self {
        Self::new(0.0, 0.0, zone)
    }

    /// Easting/northing as a vector (meters).
    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.easting, self.northing)
    }
}

/// The anchor of the local map frame.
///
/// Created from the first waypoint of a track session and immutable until
/// the session starts a new track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// The anchoring waypoint
    pub geodetic: GeodeticPoint,

    /// Projection of the anchor; its zone is the zone of the whole track
    pub planar: PlanarPoint,

    /// Meters represented by one normalized unit
    pub map_size: f64,
}

impl Origin {
    pub fn zone(&self) -> UtmZone {
        self.planar.zone
    }
}

/// A resampled centerline point with its direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplineSample {
    pub position: NormalizedPoint,

    /// Unit tangent, except where the degenerate-tangent fallback applied
    pub tangent: Vector2<f64>,
}

impl SplineSample {
    pub fn new(position: NormalizedPoint, tangent: Vector2<f64>) -> Self {
        Self { position, tangent }
    }
}

/// Default direction used when no tangent can be derived.
pub fn default_tangent() -> Vector2<f64> {
    Vector2::new(1.0, 0.0)
}

/// True when the first and last points are within [`CLOSURE_THRESHOLD`].
///
/// Sequences with fewer than two points are never closed.
pub fn is_closed(points: &[NormalizedPoint]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 => {
            (last - first).norm() < CLOSURE_THRESHOLD
        }
        _ => false,
    }
}
