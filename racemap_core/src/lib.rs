//! RaceMap Core - Track Geometry Pipeline
//!
//! Turns a sparse sequence of geodetic waypoints into everything needed to
//! draw a track and move vehicles along it:
//! 1. **Coordinates**: WGS84 → UTM → normalized map frame around a session origin
//! 2. **Simplification**: distance filter, Douglas-Peucker, moving average
//! 3. **Spline**: centripetal Catmull-Rom (Barry-Goldman) with analytic tangents
//! 4. **Mesh**: mitered constant-width triangle strip
//! 5. **Progress**: arc-length table for distance → position lookup

pub mod config;
pub mod coords;
pub mod error;
pub mod mesh;
pub mod progress;
pub mod simplify;
pub mod spline;
pub mod telemetry;
pub mod track;
pub mod types;
pub mod waypoint;

// Re-export key types for convenience
pub use config::{PipelineConfig, SplineMode};
pub use error::{ConfigError, ProgressError, ProjectionError, TelemetryError, TrackError, WaypointError};
pub use mesh::{generate_strip, StripMesh};
pub use progress::ProgressTracker;
pub use spline::{interpolate_centripetal, interpolate_rounded_polyline};
pub use telemetry::{parse_telemetry_json, FixType, ParsedTelemetry, TelemetryMessage};
pub use track::{FinalizedTrack, GeometryCache, PayloadReport, TrackGeometry, TrackSession, TrackWriter};
pub use types::{GeodeticPoint, NormalizedPoint, Origin, PlanarPoint, SplineSample, UtmZone};
