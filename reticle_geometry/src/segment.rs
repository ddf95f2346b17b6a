// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segment helpers for multi-segment probes.
//!
//! A polyline probe (for example a curved teleport arc) is tested one segment
//! at a time. Each segment behaves like a ray that is cut off at the
//! segment's end point.

use glam::{Affine3A, Vec3};

use crate::Ray3;

/// A straight segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment3 {
    /// Start point.
    pub start: Vec3,
    /// End point.
    pub end: Vec3,
}

impl Segment3 {
    /// Create a segment.
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Unit direction from start to end; zero for degenerate segments.
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Ray starting at `start` and pointing toward `end`.
    pub fn as_ray(&self) -> Ray3 {
        Ray3::new(self.start, self.end - self.start)
    }

    /// Point at `distance` from `start`, clamped to the segment.
    pub fn at_distance(&self, distance: f32) -> Vec3 {
        let len = self.length();
        if len <= 0.0 {
            return self.start;
        }
        self.start.lerp(self.end, (distance / len).clamp(0.0, 1.0))
    }

    /// Closest point on the segment to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let v = self.end - self.start;
        let len2 = v.length_squared();
        let t = if len2 > 0.0 {
            (point - self.start).dot(v) / len2
        } else {
            0.0
        };
        self.start + v * t.clamp(0.0, 1.0)
    }

    /// Transform both end points.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        Self {
            start: transform.transform_point3(self.start),
            end: transform.transform_point3(self.end),
        }
    }
}

/// Build world-space segments from polyline points in a local frame.
///
/// Consecutive points form segments; fewer than two points yield no segments.
pub fn polyline_segments<'a>(
    points: &'a [Vec3],
    transform: &'a Affine3A,
) -> impl Iterator<Item = Segment3> + 'a {
    points
        .windows(2)
        .map(move |w| Segment3::new(w[0], w[1]).transformed(transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn closest_point_clamps_to_end_points() {
        let s = Segment3::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(s.closest_point(Vec3::new(5.0, 3.0, 0.0)), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(s.closest_point(Vec3::new(-5.0, 3.0, 0.0)), Vec3::ZERO);
        assert_eq!(s.closest_point(Vec3::new(15.0, 0.0, 0.0)), s.end);
    }

    #[test]
    fn at_distance_is_clamped() {
        let s = Segment3::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(s.at_distance(1.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(s.at_distance(9.0), s.end);
    }

    #[test]
    fn polyline_yields_one_segment_per_pair() {
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
        let tf = Affine3A::from_translation(Vec3::Z);
        let segs: Vec<_> = polyline_segments(&points, &tf).collect();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].start, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(segs[1].end, Vec3::new(1.0, 1.0, 1.0));
    }
}
