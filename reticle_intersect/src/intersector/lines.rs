// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use glam::Vec3;
use reticle_geometry::segment::{Segment3, polyline_segments};
use smallvec::SmallVec;

use super::{
    IntersectError, Intersector, PointerCapture, captured_intersection, check_capture_kind,
    hit_intersection,
};
use crate::intersection::{Intersection, IntersectionDetails, IntersectorKind};
use crate::order::{BestHit, Candidate, HitSort};
use crate::scene::{RawHit, SceneGraph};
use crate::types::{EventTarget, PointerSample, Pose};

/// Options for [`LinesIntersector`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinesOptions {
    /// Hits whose accumulated distance is below this are ignored.
    pub min_distance: f32,
}

impl LinesOptions {
    /// Set the minimum accumulated hit distance.
    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct SegmentHit {
    raw: RawHit,
    line_index: usize,
    distance_on_line: f32,
}

/// Multi-segment probe, for example a curved teleport arc.
///
/// The polyline is given in the device's local frame and follows the device
/// pose. Each segment is raycast in order; a hit's distance is the length of
/// all earlier segments plus the distance along its own segment, so hits on
/// different segments compare on one scale.
#[derive(Clone, Debug)]
pub struct LinesIntersector<K> {
    options: LinesOptions,
    points: Vec<Vec3>,
    pose: Option<Pose>,
    segments: Vec<Segment3>,
    best: BestHit<K, SegmentHit>,
    hits: SmallVec<[RawHit; 4]>,
}

impl<K> LinesIntersector<K> {
    /// Create a lines intersector over local polyline `points`.
    pub fn new(points: Vec<Vec3>, options: LinesOptions) -> Self {
        Self {
            options,
            points,
            pose: None,
            segments: Vec::new(),
            best: BestHit::default(),
            hits: SmallVec::new(),
        }
    }

    /// Replace the local polyline; takes effect on the next prepare.
    pub fn set_points(&mut self, points: Vec<Vec3>) {
        self.points = points;
    }

    /// Local polyline points.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// World-space segments of the last prepared sample.
    pub fn segments(&self) -> &[Segment3] {
        &self.segments
    }

    fn build_segments(&mut self, pose: Pose) {
        let transform = pose.affine();
        self.segments.clear();
        self.segments
            .extend(polyline_segments(&self.points, &transform));
    }
}

impl<K: Copy> Intersector<K> for LinesIntersector<K> {
    fn kind(&self) -> IntersectorKind {
        IntersectorKind::Lines
    }

    fn is_ready(&self) -> bool {
        self.pose.is_some() && !self.segments.is_empty()
    }

    fn prepare_intersection(&mut self, sample: &PointerSample) -> bool {
        self.best.clear();
        self.pose = sample.pose;
        match sample.pose {
            Some(pose) => self.build_segments(pose),
            None => self.segments.clear(),
        }
        self.is_ready()
    }

    fn execute_intersection(
        &mut self,
        scene: &dyn SceneGraph<K>,
        node: K,
        order: Option<i32>,
        sort: &HitSort<K>,
    ) {
        let mut prior = 0.0;
        for (line_index, segment) in self.segments.iter().enumerate() {
            let length = segment.length();
            self.hits.clear();
            scene.raycast(node, &segment.as_ray(), &mut self.hits);
            for raw in self.hits.drain(..) {
                if raw.distance > length {
                    continue;
                }
                let distance = prior + raw.distance;
                if distance < self.options.min_distance {
                    continue;
                }
                let candidate = Candidate {
                    target: EventTarget::Node(node),
                    distance,
                    order,
                };
                let hit = SegmentHit {
                    raw,
                    line_index,
                    distance_on_line: raw.distance,
                };
                self.best.offer(candidate, hit, sort);
            }
            prior += length;
        }
    }

    fn finalize_intersection(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K> {
        let pose = self.pose.unwrap_or(Pose::IDENTITY);
        match self.best.take() {
            Some((candidate, hit)) => hit_intersection(
                scene,
                &candidate,
                &hit.raw,
                pose,
                IntersectionDetails::Lines {
                    line_index: hit.line_index,
                    distance_on_line: hit.distance_on_line,
                },
            ),
            None => {
                let (line_index, last) = match self.segments.last() {
                    Some(s) => (self.segments.len() - 1, *s),
                    None => (0, Segment3::new(pose.position, pose.position)),
                };
                Intersection::void(
                    last.end,
                    pose,
                    IntersectionDetails::Lines {
                        line_index,
                        distance_on_line: last.length(),
                    },
                )
            }
        }
    }

    fn intersect_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        capture: &PointerCapture<K>,
    ) -> Result<Intersection<K>, IntersectError> {
        check_capture_kind(capture, IntersectorKind::Lines)?;
        let IntersectionDetails::Lines {
            line_index,
            distance_on_line,
        } = capture.intersection.details
        else {
            return Err(IntersectError::CaptureMismatch {
                expected: IntersectorKind::Lines,
                captured: capture.intersection.details.kind(),
            });
        };
        let Some(pose) = self.pose else {
            return Err(IntersectError::NotPrepared);
        };
        let Some(last) = self.segments.len().checked_sub(1) else {
            return Err(IntersectError::NotPrepared);
        };
        // The polyline may have lost points since the capture; use the last segment then.
        let line_index = line_index.min(last);
        let segment = self.segments[line_index];
        let prior: f32 = self.segments[..line_index].iter().map(Segment3::length).sum();
        let point = segment.start + segment.direction() * distance_on_line;
        Ok(captured_intersection(
            scene,
            capture,
            point,
            prior + distance_on_line,
            pose,
            IntersectionDetails::Lines {
                line_index,
                distance_on_line,
            },
        ))
    }
}
