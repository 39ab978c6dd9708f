//! Track session: the shared point store and its derived geometry.
//!
//! Producers (interactive input, network ingestion) append points through a
//! [`TrackWriter`] under the session lock. The consumer copies a snapshot,
//! releases the lock, and only then runs the pipeline:
//!
//! ```text
//!  producer ──push──► Mutex<Vec<NormalizedPoint>> ──snapshot──► consumer
//!                                                                   │
//!                        simplify → spline ─┬─► StripMesh           │
//!                                           └─► ProgressTracker ◄───┘
//! ```

use crate::config::PipelineConfig;
use crate::coords;
use crate::error::{TrackError, WaypointError};
use crate::mesh::{generate_strip, StripMesh};
use crate::progress::ProgressTracker;
use crate::simplify::simplify;
use crate::spline::interpolate;
use crate::types::{is_closed, GeodeticPoint, NormalizedPoint, Origin, SplineSample};
use crate::waypoint::{parse_dms_pair, parse_waypoint_line, payload_lines, Waypoint};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

type SharedPoints = Arc<Mutex<Vec<NormalizedPoint>>>;

fn lock(points: &SharedPoints) -> MutexGuard<'_, Vec<NormalizedPoint>> {
    // A producer that panicked mid-push leaves a valid Vec behind
    points.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable producer handle onto a session's point sequence.
#[derive(Debug, Clone)]
pub struct TrackWriter {
    points: SharedPoints,
}

impl TrackWriter {
    pub fn push(&self, point: NormalizedPoint) {
        lock(&self.points).push(point);
    }

    pub fn extend(&self, points: impl IntoIterator<Item = NormalizedPoint>) {
        lock(&self.points).extend(points);
    }

    pub fn len(&self) -> usize {
        lock(&self.points).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of loading a multi-line track payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadReport {
    pub accepted: usize,
    pub rejected: Vec<(usize, WaypointError)>,
}

/// A track-authoring session.
///
/// Owns the [`Origin`] of the map frame (anchored on the first geodetic
/// waypoint) and the raw centerline points.
#[derive(Debug)]
pub struct TrackSession {
    origin: Option<Origin>,
    map_size: f64,
    points: SharedPoints,
}

impl TrackSession {
    pub fn new(map_size: f64) -> Self {
        Self {
            origin: None,
            map_size,
            points: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.map_size)
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn writer(&self) -> TrackWriter {
        TrackWriter {
            points: Arc::clone(&self.points),
        }
    }

    /// Discards all points and the origin.
    pub fn begin_new_track(&mut self) {
        lock(&self.points).clear();
        if self.origin.take().is_some() {
            info!("Started new track, origin discarded");
        }
    }

    /// Appends an already-normalized point.
    pub fn push_normalized(&self, point: NormalizedPoint) {
        lock(&self.points).push(point);
    }

    /// Appends a geodetic waypoint, anchoring the origin if this is the first.
    ///
    /// Points are projected into the origin's UTM zone.
    pub fn push_geodetic(&mut self, point: GeodeticPoint) -> NormalizedPoint {
        let origin = match self.origin {
            Some(origin) => origin,
            None => {
                let origin = coords::anchor_origin(point, self.map_size);
                info!(lat = point.lat, lon = point.lon, zone = %origin.zone(), "Anchored track origin");
                self.origin = Some(origin);
                origin
            }
        };

        let normalized = coords::project(point, &origin);
        self.push_normalized(normalized);
        normalized
    }

    /// Applies one line of waypoint input.
    pub fn apply_line(&mut self, line: &str) -> Result<NormalizedPoint, WaypointError> {
        match parse_waypoint_line(line)? {
            Waypoint::Normalized(point) => {
                self.push_normalized(point);
                Ok(point)
            }
            Waypoint::Geodetic(point) => Ok(self.push_geodetic(point)),
        }
    }

    /// Loads a multi-line DMS payload; malformed lines are logged and skipped.
    pub fn load_payload(&mut self, payload: &str) -> PayloadReport {
        let mut report = PayloadReport::default();
        for (line_no, line) in payload_lines(payload) {
            match parse_dms_pair(line) {
                Ok(point) => {
                    self.push_geodetic(point);
                    report.accepted += 1;
                }
                Err(err) => {
                    warn!(line = line_no + 1, %err, "Skipping malformed waypoint");
                    report.rejected.push((line_no + 1, err));
                }
            }
        }
        report
    }

    /// Copies the current points; the lock is held only for the copy.
    pub fn snapshot(&self) -> Vec<NormalizedPoint> {
        lock(&self.points).clone()
    }

    pub fn point_count(&self) -> usize {
        lock(&self.points).len()
    }

    pub fn is_closed(&self) -> bool {
        is_closed(&self.snapshot())
    }

    /// Signal for renderers: more than one point and a closed loop.
    pub fn is_loaded(&self) -> bool {
        let points = self.snapshot();
        points.len() > 1 && is_closed(&points)
    }

    /// Freezes the current points into an immutable, shareable track.
    pub fn finalize(&self, config: &PipelineConfig) -> Result<FinalizedTrack, TrackError> {
        config.validate()?;
        let origin = self.origin.ok_or(TrackError::NoOrigin)?;
        let geometry = TrackGeometry::build(&self.snapshot(), config);
        if geometry.simplified.len() < 2 {
            return Err(TrackError::NotEnoughPoints(geometry.simplified.len()));
        }

        let tracker = ProgressTracker::new(&geometry.samples, geometry.closed)?;
        info!(
            samples = geometry.samples.len(),
            length = tracker.total_length(),
            closed = geometry.closed,
            "Finalized track"
        );

        Ok(FinalizedTrack {
            origin,
            samples: geometry.samples,
            tracker,
            closed: geometry.closed,
        })
    }
}

/// Everything derived from one snapshot of the track points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackGeometry {
    pub simplified: Vec<NormalizedPoint>,
    pub samples: Vec<SplineSample>,
    pub mesh: StripMesh,
    pub closed: bool,
}

impl TrackGeometry {
    /// Runs simplify → spline → mesh over `points`.
    pub fn build(points: &[NormalizedPoint], config: &PipelineConfig) -> Self {
        let simplified = simplify(points, config);
        let samples = interpolate(&simplified, config);
        let mesh = generate_strip(&samples, config.track_width);
        Self {
            closed: is_closed(points),
            simplified,
            samples,
            mesh,
        }
    }
}

/// Recomputes [`TrackGeometry`] only when the session's points change.
#[derive(Debug, Default)]
pub struct GeometryCache {
    source: Vec<NormalizedPoint>,
    geometry: TrackGeometry,
    valid: bool,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns up-to-date geometry for `session`, rebuilding if needed.
    pub fn refresh(&mut self, session: &TrackSession, config: &PipelineConfig) -> &TrackGeometry {
        let snapshot = session.snapshot();
        if !self.valid || snapshot != self.source {
            debug!(points = snapshot.len(), "Rebuilding track geometry");
            self.geometry = TrackGeometry::build(&snapshot, config);
            self.source = snapshot;
            self.valid = true;
        }
        &self.geometry
    }

    /// Forces a rebuild on the next refresh (e.g. after a config change).
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }
}

/// An immutable track, shared by simulated vehicles.
#[derive(Debug, Clone)]
pub struct FinalizedTrack {
    pub origin: Origin,
    pub samples: Vec<SplineSample>,
    pub tracker: ProgressTracker,
    pub closed: bool,
}

impl FinalizedTrack {
    /// Total length in meters.
    pub fn length_meters(&self) -> f64 {
        self.tracker.total_length() * self.origin.map_size
    }
}
