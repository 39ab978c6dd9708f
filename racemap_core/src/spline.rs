//! The Spline Interpolator - dense, tangent-annotated resampling of a
//! control polyline.
//!
//! Two modes:
//! - **Centripetal Catmull-Rom** ([`interpolate_centripetal`]), evaluated with
//!   the Barry-Goldman pyramid. Tangents come from differentiating the same
//!   three-level blend analytically, so they do not depend on sample density.
//! - **Rounded polyline** ([`interpolate_rounded_polyline`]): straight edges
//!   joined by quadratic Bézier corners, with native support for closed loops.

use crate::config::{PipelineConfig, SplineMode};
use crate::types::{default_tangent, is_closed, NormalizedPoint, SplineSample};
use nalgebra::Vector2;

/// Squared knot distance below which the term is clamped to 1.
const MIN_KNOT_DISTANCE_SQ: f64 = 1e-4;

/// Tangent magnitude below which the previous tangent is reused.
const MIN_TANGENT_NORM: f64 = 1e-6;

/// Normalizes `tangent`, falling back to `previous` (or `(1, 0)`).
fn resolve_tangent(tangent: Vector2<f64>, previous: Option<Vector2<f64>>) -> Vector2<f64> {
    let norm = tangent.norm();
    if norm < MIN_TANGENT_NORM {
        previous.unwrap_or_else(default_tangent)
    } else {
        tangent / norm
    }
}

/// Knot increment between two control points.
fn knot_interval(a: NormalizedPoint, b: NormalizedPoint, alpha: f64) -> f64 {
    let mut d2 = (b - a).norm_squared();
    if d2 < MIN_KNOT_DISTANCE_SQ {
        d2 = 1.0;
    }
    d2.powf(alpha * 0.5)
}

/// One knot-parameterized Catmull-Rom segment running from `p[1]` to `p[2]`.
#[derive(Debug, Clone, Copy)]
struct CentripetalSegment {
    p: [NormalizedPoint; 4],
    t: [f64; 4],
}

impl CentripetalSegment {
    fn new(p0: NormalizedPoint, p1: NormalizedPoint, p2: NormalizedPoint, p3: NormalizedPoint, alpha: f64) -> Self {
        let t0 = 0.0;
        let t1 = t0 + knot_interval(p0, p1, alpha);
        let t2 = t1 + knot_interval(p1, p2, alpha);
        let t3 = t2 + knot_interval(p2, p3, alpha);
        Self {
            p: [p0, p1, p2, p3],
            t: [t0, t1, t2, t3],
        }
    }

    /// Linear blend of `a` and `b` over the knot span `[ta, tb]` at `t`,
    /// together with its derivative given the derivatives of `a` and `b`.
    fn blend(
        a: (Vector2<f64>, Vector2<f64>),
        b: (Vector2<f64>, Vector2<f64>),
        ta: f64,
        tb: f64,
        t: f64,
    ) -> (Vector2<f64>, Vector2<f64>) {
        let span = tb - ta;
        let wa = (tb - t) / span;
        let wb = (t - ta) / span;
        let value = a.0 * wa + b.0 * wb;
        let derivative = (b.0 - a.0) / span + a.1 * wa + b.1 * wb;
        (value, derivative)
    }

    /// Position and (unnormalized) derivative at parameter `t`.
    fn evaluate(&self, t: f64) -> (NormalizedPoint, Vector2<f64>) {
        let [t0, t1, t2, t3] = self.t;
        // Control points are constant: zero velocity
        let zero = Vector2::zeros();
        let [p0, p1, p2, p3] = self.p.map(|p| (p, zero));

        let a1 = Self::blend(p0, p1, t0, t1, t);
        let a2 = Self::blend(p1, p2, t1, t2, t);
        let a3 = Self::blend(p2, p3, t2, t3, t);

        let b1 = Self::blend(a1, a2, t0, t2, t);
        let b2 = Self::blend(a2, a3, t1, t3, t);

        Self::blend(b1, b2, t1, t2, t)
    }
}

/// Centripetal Catmull-Rom resampling with analytic tangents.
///
/// Produces `points_per_segment` samples per segment, starting exactly on the
/// segment's first control point, plus one final sample on the last control
/// point: `(points.len() - 1) * points_per_segment + 1` samples in total.
/// Returns an empty vector for fewer than two points or zero samples per
/// segment.
pub fn interpolate_centripetal(
    points: &[NormalizedPoint],
    points_per_segment: usize,
    alpha: f64,
) -> Vec<SplineSample> {
    let n = points.len();
    if n < 2 || points_per_segment == 0 {
        return Vec::new();
    }

    let mut samples = Vec::with_capacity((n - 1) * points_per_segment + 1);
    let mut previous: Option<Vector2<f64>> = None;

    for i in 0..n - 1 {
        let p1 = points[i];
        let p2 = points[i + 1];
        let p0 = if i == 0 { p1 - (p2 - p1) } else { points[i - 1] };
        let p3 = if i + 2 < n { points[i + 2] } else { p2 + (p2 - p1) };

        let segment = CentripetalSegment::new(p0, p1, p2, p3, alpha);
        let (t1, t2) = (segment.t[1], segment.t[2]);

        for k in 0..points_per_segment {
            let t = t1 + (t2 - t1) * k as f64 / points_per_segment as f64;
            let (position, derivative) = segment.evaluate(t);
            let tangent = resolve_tangent(derivative, previous);
            previous = Some(tangent);
            samples.push(SplineSample::new(position, tangent));
        }
    }

    samples.push(SplineSample::new(
        points[n - 1],
        previous.unwrap_or_else(default_tangent),
    ));

    samples
}

/// Unit direction from `from` to `to`, or zero for coincident points.
fn direction(from: NormalizedPoint, to: NormalizedPoint) -> (Vector2<f64>, f64) {
    let delta = to - from;
    let length = delta.norm();
    if length < f64::EPSILON {
        (Vector2::zeros(), 0.0)
    } else {
        (delta / length, length)
    }
}

/// Straight edges joined by quadratic Bézier corners.
///
/// At each vertex the corner starts `radius` back along the incoming edge and
/// ends `radius` along the outgoing edge, with the vertex as control point.
/// The radius is clamped to half of each adjacent edge. A rounded corner
/// emits `segments_per_corner + 1` samples; a radius of 0 (or zero
/// `segments_per_corner`) keeps the vertex as a single sample. Closed input
/// (first and last point within the closure threshold) rounds every vertex,
/// wrapping around, and repeats the first sample at the end.
pub fn interpolate_rounded_polyline(
    points: &[NormalizedPoint],
    radius: f64,
    segments_per_corner: usize,
) -> Vec<SplineSample> {
    if points.len() < 2 {
        return Vec::new();
    }

    let closed = is_closed(points) && points.len() > 3;
    // The closing point duplicates the first one
    let vertices = if closed { &points[..points.len() - 1] } else { points };
    let n = vertices.len();

    let mut samples: Vec<SplineSample> = Vec::new();
    let mut previous: Option<Vector2<f64>> = None;
    let mut emit = |samples: &mut Vec<SplineSample>, position: NormalizedPoint, tangent: Vector2<f64>| {
        let tangent = resolve_tangent(tangent, previous);
        previous = Some(tangent);
        samples.push(SplineSample::new(position, tangent));
    };

    for i in 0..n {
        let corner = vertices[i];
        let (prev, next) = if closed {
            (vertices[(i + n - 1) % n], vertices[(i + 1) % n])
        } else if i == 0 {
            emit(&mut samples, corner, direction(corner, vertices[1]).0);
            continue;
        } else if i == n - 1 {
            emit(&mut samples, corner, direction(vertices[n - 2], corner).0);
            continue;
        } else {
            (vertices[i - 1], vertices[i + 1])
        };

        // dir_in points back toward the predecessor
        let (dir_in, len_in) = direction(corner, prev);
        let (dir_out, len_out) = direction(corner, next);
        let r = radius.max(0.0).min(len_in * 0.5).min(len_out * 0.5);

        if r <= 0.0 || segments_per_corner == 0 {
            emit(&mut samples, corner, dir_out - dir_in);
            continue;
        }

        let start = corner + dir_in * r;
        let end = corner + dir_out * r;
        for s in 0..=segments_per_corner {
            let t = s as f64 / segments_per_corner as f64;
            let u = 1.0 - t;
            let position = start * (u * u) + corner * (2.0 * u * t) + end * (t * t);
            let tangent = (corner - start) * (2.0 * u) + (end - corner) * (2.0 * t);
            emit(&mut samples, position, tangent);
        }
    }

    if closed {
        if let Some(first) = samples.first().copied() {
            samples.push(first);
        }
    }

    samples
}

/// Resamples `points` with the configured spline mode.
pub fn interpolate(points: &[NormalizedPoint], config: &PipelineConfig) -> Vec<SplineSample> {
    match config.spline_mode {
        SplineMode::Centripetal => {
            interpolate_centripetal(points, config.points_per_segment, config.alpha)
        }
        SplineMode::Rounded => {
            interpolate_rounded_polyline(points, config.corner_radius, config.segments_per_corner)
        }
    }
}
