//! The Path Simplifier - reduces and cleans raw waypoint sequences before
//! spline fitting.
//!
//! The two reductions ([`filter_by_min_distance`], [`simplify_douglas_peucker`])
//! return a subsequence of their input that always keeps the first and last
//! point. [`smooth_moving_average`] produces new, averaged points.

use crate::config::PipelineConfig;
use crate::types::NormalizedPoint;

/// Greedy distance filter.
///
/// Keeps the first point, then every point at least `min_distance` from the
/// last kept one. The final input point is always retained: if the filter
/// would drop it, it takes the place of the last kept point.
pub fn filter_by_min_distance(points: &[NormalizedPoint], min_distance: f64) -> Vec<NormalizedPoint> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let mut kept = vec![first];
    for point in &points[1..] {
        let previous = kept[kept.len() - 1];
        if (point - previous).norm() >= min_distance {
            kept.push(*point);
        }
    }

    if points.len() > 1 && kept[kept.len() - 1] != last {
        if kept.len() > 1 {
            let end = kept.len() - 1;
            kept[end] = last;
        } else {
            kept.push(last);
        }
    }

    kept
}

/// Perpendicular distance from `point` to the line through `start` and `end`.
///
/// Falls back to the distance from `start` when the chord has no length.
pub fn perpendicular_distance(point: NormalizedPoint, start: NormalizedPoint, end: NormalizedPoint) -> f64 {
    let chord = end - start;
    let length = chord.norm();
    if length < f64::EPSILON {
        return (point - start).norm();
    }
    let offset = point - start;
    (chord.x * offset.y - chord.y * offset.x).abs() / length
}

/// Douglas-Peucker reduction.
///
/// Uses an explicit stack of open intervals instead of recursion, so very
/// long inputs cannot exhaust the call stack.
pub fn simplify_douglas_peucker(points: &[NormalizedPoint], tolerance: f64) -> Vec<NormalizedPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_distance {
                max_distance = d;
                max_index = i;
            }
        }

        if max_distance > tolerance {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

/// Centered moving average over `±window_size / 2` neighbours.
///
/// The window narrows at the ends instead of wrapping. Inputs shorter than
/// `window_size` are returned unchanged.
pub fn smooth_moving_average(points: &[NormalizedPoint], window_size: usize) -> Vec<NormalizedPoint> {
    if points.len() < window_size {
        return points.to_vec();
    }

    let half = window_size / 2;
    (0..points.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(points.len() - 1);
            let sum = points[lo..=hi]
                .iter()
                .fold(NormalizedPoint::zeros(), |acc, point| acc + point);
            sum / (hi - lo + 1) as f64
        })
        .collect()
}

/// Runs the configured stages: distance filter, Douglas-Peucker, smoothing.
pub fn simplify(points: &[NormalizedPoint], config: &PipelineConfig) -> Vec<NormalizedPoint> {
    let mut result = if config.min_distance > 0.0 {
        filter_by_min_distance(points, config.min_distance)
    } else {
        points.to_vec()
    };

    if config.dp_tolerance > 0.0 {
        result = simplify_douglas_peucker(&result, config.dp_tolerance);
    }

    if config.smoothing_window > 1 {
        result = smooth_moving_average(&result, config.smoothing_window);
    }

    result
}
