//! Error types for the RaceMap track pipeline.
//!
//! None of these are fatal: callers either substitute a fallback value
//! (projection), skip the offending input (waypoints, telemetry), or treat
//! the derived artifact as unavailable (progress, finalization).

use thiserror::Error;

/// Errors raised by the UTM projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Latitude or longitude is NaN or infinite
    #[error("Non-finite coordinate ({lat}, {lon})")]
    NonFinite { lat: f64, lon: f64 },

    /// Latitude outside [-90, 90]
    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    /// Zone number outside 1..=60
    #[error("Invalid UTM zone: {0}")]
    InvalidZone(u8),

    /// Easting or northing is NaN or infinite
    #[error("Non-finite planar point ({easting}, {northing})")]
    NonFinitePlanar { easting: f64, northing: f64 },
}

/// Errors raised while parsing a waypoint line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaypointError {
    /// The line is blank
    #[error("Empty waypoint line")]
    Empty,

    /// Wrong number of numeric fields for a DMS pair
    #[error("Expected 6 numeric fields, found {0}")]
    FieldCount(usize),

    /// A field did not parse as a number
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Minutes or seconds outside [0, 60)
    #[error("Minutes/seconds out of range in {0}")]
    InvalidMinutesSeconds(String),

    /// Resulting latitude/longitude outside the valid range
    #[error("Coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Errors raised while decoding a telemetry payload.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Payload is not valid JSON or misses a required field
    #[error("Malformed telemetry payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `id` is present but empty
    #[error("Telemetry payload has an empty id")]
    EmptyId,
}

/// Errors raised when building a progress tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    /// Total path length below the usable minimum
    #[error("Track too short for progress lookup: length {0}")]
    TooShort(f64),

    /// A position is NaN or infinite, so no length can be measured
    #[error("Track length is not finite: {0}")]
    NonFinite(f64),
}

/// Errors raised when a pipeline configuration is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// JSON could not be decoded
    #[error("Malformed pipeline config: {0}")]
    Malformed(String),

    /// A parameter is outside its valid range
    #[error("Invalid pipeline config: {field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors raised when finalizing a track session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// No origin has been anchored yet
    #[error("Track has no origin")]
    NoOrigin,

    /// Not enough points survived simplification to build a spline
    #[error("Track has {0} usable points, need at least 2")]
    NotEnoughPoints(usize),

    /// The spline produced no usable arc length
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// The pipeline configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}
