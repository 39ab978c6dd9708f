//! The Strip Mesher - turns a tangent-annotated centerline into a
//! constant-width road ribbon.
//!
//! Interior vertices are offset along the miter (the bisector of the two
//! adjacent segment normals) so the ribbon keeps its width through corners.

use crate::types::{NormalizedPoint, SplineSample};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Lower bound on the miter/normal cosine.
const MIN_MITER_COS: f64 = 0.1;

/// Maximum offset length as a multiple of the half width.
const MITER_LIMIT: f64 = 2.0;

/// Double-sided ribbon mesh, ordered as a triangle strip.
///
/// Vertices alternate left, right, left, right... with one pair per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripMesh {
    pub vertices: Vec<NormalizedPoint>,
}

impl StripMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// `(left, right)` vertex pairs in sample order.
    pub fn pairs(&self) -> impl Iterator<Item = (NormalizedPoint, NormalizedPoint)> + '_ {
        self.vertices.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Triangle-list indices equivalent to the strip, two triangles per quad,
    /// all with the same winding.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let pairs = self.vertices.len() / 2;
        let mut indices = Vec::with_capacity(pairs.saturating_sub(1) * 6);
        for i in 0..pairs.saturating_sub(1) {
            let left = (2 * i) as u32;
            let right = left + 1;
            let next_left = left + 2;
            let next_right = left + 3;
            indices.extend_from_slice(&[left, right, next_left, next_left, right, next_right]);
        }
        indices
    }
}

/// Left-hand normal of a direction.
fn left_normal(direction: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-direction.y, direction.x)
}

/// Left normal of the segment `from → to`, if it has a length.
fn segment_normal(from: NormalizedPoint, to: NormalizedPoint) -> Option<Vector2<f64>> {
    let delta = to - from;
    let length = delta.norm();
    (length > f64::EPSILON).then(|| left_normal(delta / length))
}

/// Builds the ribbon for `samples` with total `width`.
///
/// Always emits `2 * samples.len()` vertices, or none for fewer than two
/// samples.
pub fn generate_strip(samples: &[SplineSample], width: f64) -> StripMesh {
    if samples.len() < 2 {
        return StripMesh::default();
    }

    let half_width = width * 0.5;
    let last = samples.len() - 1;
    let mut vertices = Vec::with_capacity(samples.len() * 2);

    for (i, sample) in samples.iter().enumerate() {
        let normal = left_normal(sample.tangent);

        let offset = if i == 0 || i == last {
            normal * half_width
        } else {
            let prev = segment_normal(samples[i - 1].position, sample.position).unwrap_or(normal);
            let next = segment_normal(sample.position, samples[i + 1].position).unwrap_or(normal);
            let bisector = prev + next;
            let miter = if bisector.norm() > f64::EPSILON {
                bisector.normalize()
            } else {
                normal
            };

            let length = (half_width / miter.dot(&normal).max(MIN_MITER_COS))
                .min(MITER_LIMIT * half_width);
            miter * length
        };

        vertices.push(sample.position + offset);
        vertices.push(sample.position - offset);
    }

    StripMesh { vertices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::interpolate_centripetal;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample(x: f64, y: f64, tx: f64, ty: f64) -> SplineSample {
        SplineSample::new(NormalizedPoint::new(x, y), Vector2::new(tx, ty).normalize())
    }

    #[test]
    fn test_straight_strip() {
        let samples = vec![sample(0.0, 0.0, 1.0, 0.0), sample(1.0, 0.0, 1.0, 0.0), sample(2.0, 0.0, 1.0, 0.0)];
        let mesh = generate_strip(&samples, 2.0);
        assert_eq!(mesh.vertex_count(), 6);
        for (i, (left, right)) in mesh.pairs().enumerate() {
            assert_relative_eq!(left, NormalizedPoint::new(i as f64, 1.0), epsilon = 1e-12);
            assert_relative_eq!(right, NormalizedPoint::new(i as f64, -1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_right_angle_miter() {
        // Tangent along the bisector: miter and normal agree, no stretch
        let samples = vec![sample(0.0, 0.0, 1.0, 0.0), sample(1.0, 0.0, 1.0, 1.0), sample(1.0, 1.0, 0.0, 1.0)];
        let mesh = generate_strip(&samples, 2.0);
        let (left, right) = mesh.pairs().nth(1).unwrap();
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(left, NormalizedPoint::new(1.0 - h, h), epsilon = 1e-9);
        assert_relative_eq!(right, NormalizedPoint::new(1.0 + h, -h), epsilon = 1e-9);
    }

    #[test]
    fn test_miter_scales_by_tangent_normal() {
        // Tangent still along the incoming edge: offset is stretched by 1/cos(45°)
        let samples = vec![sample(0.0, 0.0, 1.0, 0.0), sample(1.0, 0.0, 1.0, 0.0), sample(1.0, 1.0, 0.0, 1.0)];
        let mesh = generate_strip(&samples, 2.0);
        let (left, right) = mesh.pairs().nth(1).unwrap();
        assert_relative_eq!(left, NormalizedPoint::new(0.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(right, NormalizedPoint::new(2.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_hairpin_offset_is_capped() {
        let samples = vec![sample(0.0, 0.0, 1.0, 0.0), sample(1.0, 0.0, 1.0, 0.0), sample(0.0, 0.001, -1.0, 0.0)];
        let mesh = generate_strip(&samples, 1.0);
        let (left, right) = mesh.pairs().nth(1).unwrap();
        let center = samples[1].position;
        assert!((left - center).norm() <= 1.0 + 1e-12);
        assert!((right - center).norm() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_too_few_samples() {
        assert!(generate_strip(&[], 1.0).is_empty());
        assert!(generate_strip(&[sample(0.0, 0.0, 1.0, 0.0)], 1.0).is_empty());
    }

    #[test]
    fn test_triangle_indices() {
        let samples = vec![sample(0.0, 0.0, 1.0, 0.0), sample(1.0, 0.0, 1.0, 0.0), sample(2.0, 0.0, 1.0, 0.0)];
        let mesh = generate_strip(&samples, 1.0);
        assert_eq!(mesh.triangle_indices(), vec![0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5]);
    }

    proptest! {
        #[test]
        fn prop_vertex_count(
            raw in prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), 2..15),
            n in 1usize..8,
            width in 0.01f64..2.0,
        ) {
            let points: Vec<_> = raw.into_iter().map(|(x, y)| NormalizedPoint::new(x, y)).collect();
            let samples = interpolate_centripetal(&points, n, 0.5);
            let mesh = generate_strip(&samples, width);
            prop_assert_eq!(mesh.vertex_count(), 2 * samples.len());
            for v in &mesh.vertices {
                prop_assert!(v.x.is_finite() && v.y.is_finite());
            }
        }
    }
}
