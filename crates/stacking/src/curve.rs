//! Curve sampling interface consumed by the stack generator.
//!
//! The generator never owns or edits curves. It samples positions and
//! tangents at native parameters, reads the curve's global transform and asks
//! for an arc-length table. Hosts implement [`Curve`] for their spline type;
//! [`PolylineCurve`] covers the simple case.

use std::fmt::Debug;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::arc_length::ArcLengthTable;
use crate::validation::StackError;

/// Shared handle to a curve. Two handles are the same curve when they point
/// to the same allocation. Curves are shared with the host, which may read
/// them from other threads.
pub type CurveRef = Arc<dyn Curve>;

/// A parametric curve the stack can follow.
///
/// The native parameter `t` runs from 0 at the start to 1 at the end, but is
/// not required to be proportional to arc length. Implementations should
/// extrapolate along the end tangents for `t` outside `[0, 1]`.
pub trait Curve: Debug + Send + Sync {
    /// Transform from curve space to global space
    fn global_transform(&self) -> Mat4;

    /// Position at native parameter `t`, in curve space
    fn sample_point(&self, t: f32) -> Vec3;

    /// Unit tangent at native parameter `t`, in curve space
    fn sample_tangent(&self, t: f32) -> Vec3;

    /// Counter that changes whenever the curve's shape changes.
    ///
    /// Arc-length tables built for an older revision are rebuilt.
    fn revision(&self) -> u64 {
        0
    }

    /// Build an arc-length table with `samples` segments.
    ///
    /// The default samples [`Curve::sample_point`] uniformly in `t`; curves
    /// with an analytic length may override it.
    fn sample_arc_length_table(&self, samples: usize) -> Result<ArcLengthTable, StackError> {
        ArcLengthTable::sample(self, samples)
    }
}

/// Piecewise linear curve through a list of points.
///
/// Every segment covers an equal share of the native parameter range no
/// matter how long it is, so `t` is only proportional to arc length when all
/// segments have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineCurve {
    points: Vec<Vec3>,
    transform: Mat4,
    revision: u64,
}

impl PolylineCurve {
    /// Create a polyline through `points` with an identity global transform
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            transform: Mat4::IDENTITY,
            revision: 0,
        }
    }

    /// Set the global transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Control points
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Replace the control points
    pub fn set_points(&mut self, points: Vec<Vec3>) {
        self.points = points;
        self.revision += 1;
    }

    /// Replace the global transform
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.revision += 1;
    }

    /// Number of line segments
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Segment containing `t` and the local parameter within it.
    ///
    /// Parameters before the start or past the end land on the first or last
    /// segment with a local parameter outside `[0, 1]`.
    fn locate(&self, t: f32) -> Option<(Vec3, Vec3, f32)> {
        let segments = self.segment_count();
        if segments == 0 {
            return None;
        }

        let scaled = t * segments as f32;
        let index = (scaled.floor().max(0.0) as usize).min(segments - 1);
        let local = scaled - index as f32;

        Some((self.points[index], self.points[index + 1], local))
    }
}

impl Curve for PolylineCurve {
    fn global_transform(&self) -> Mat4 {
        self.transform
    }

    fn sample_point(&self, t: f32) -> Vec3 {
        match self.locate(t) {
            Some((start, end, local)) => start.lerp(end, local),
            None => self.points.first().copied().unwrap_or(Vec3::ZERO),
        }
    }

    fn sample_tangent(&self, t: f32) -> Vec3 {
        match self.locate(t) {
            Some((start, end, _)) => (end - start).normalize_or_zero(),
            None => Vec3::ZERO,
        }
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bent_line() -> PolylineCurve {
        // 10 units along X, then 20 more
        PolylineCurve::new(vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(30.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_polyline_endpoints() {
        let curve = bent_line();
        assert_eq!(curve.sample_point(0.0), Vec3::ZERO);
        assert_eq!(curve.sample_point(1.0), Vec3::new(30.0, 0.0, 0.0));
    }

    #[test]
    fn test_polyline_parameter_is_per_segment() {
        let curve = bent_line();
        // Halfway in t is the joint, a third of the way in length
        assert_eq!(curve.sample_point(0.5), Vec3::new(10.0, 0.0, 0.0));
        assert!((curve.sample_point(0.75).x - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_polyline_extrapolates_past_ends() {
        let curve = bent_line();
        assert!((curve.sample_point(1.25).x - 40.0).abs() < 1e-5);
        assert!((curve.sample_point(-0.25).x + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_polyline_tangent() {
        let curve = PolylineCurve::new(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)]);
        assert_eq!(curve.sample_tangent(0.3), Vec3::Z);
    }

    #[test]
    fn test_polyline_edits_bump_revision() {
        let mut curve = bent_line();
        assert_eq!(curve.revision(), 0);
        curve.set_points(vec![Vec3::ZERO, Vec3::X]);
        curve.set_transform(Mat4::from_translation(Vec3::Y));
        assert_eq!(curve.revision(), 2);
        assert_eq!(curve.segment_count(), 1);
    }

    #[test]
    fn test_single_point_polyline() {
        let curve = PolylineCurve::new(vec![Vec3::ONE]);
        assert_eq!(curve.sample_point(0.7), Vec3::ONE);
        assert_eq!(curve.sample_tangent(0.7), Vec3::ZERO);
    }

    #[test]
    fn test_curve_handles_are_thread_safe() {
        fn shareable<T: Send + Sync>(_: &T) {}

        let curve: CurveRef = Arc::new(PolylineCurve::new(vec![Vec3::ZERO, Vec3::X]));
        shareable(&curve);

        let handle = Arc::clone(&curve);
        let length = std::thread::spawn(move || handle.sample_point(1.0).length())
            .join()
            .unwrap();
        assert_eq!(length, 1.0);
    }
}
