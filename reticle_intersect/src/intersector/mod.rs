// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersector strategies.
//!
//! An [`Intersector`] owns the probing geometry of one pointer. Per frame:
//!
//! 1. [`prepare_intersection`](Intersector::prepare_intersection) builds the
//!    probe from a [`PointerSample`] and reports readiness.
//! 2. Traversal calls [`execute_intersection`](Intersector::execute_intersection)
//!    for every candidate node; the intersector keeps the best hit under the
//!    shared [`HitSort`] rule.
//! 3. [`finalize_intersection`](Intersector::finalize_intersection) turns the
//!    best hit into an [`Intersection`], or a void one.
//!
//! While a capture is held, step 2 and 3 are replaced by
//! [`intersect_pointer_capture`](Intersector::intersect_pointer_capture),
//! which only re-derives the captured point from the new probe.

use glam::Vec3;
use reticle_geometry::Plane3;

use crate::intersection::{Intersection, IntersectionDetails, IntersectorKind};
use crate::order::{Candidate, HitSort};
use crate::scene::{RawHit, SceneGraph, target_transform};
use crate::types::{EventTarget, PointerSample, Pose};

mod camera_ray;
mod lines;
mod ray;
mod sphere;

pub use camera_ray::CameraRayIntersector;
pub use lines::{LinesIntersector, LinesOptions};
pub use ray::{RayIntersector, RayOptions};
pub use sphere::{SphereIntersector, SphereOptions};

/// Errors raised by intersectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntersectError {
    /// A capture recorded by one intersector variant was replayed by another.
    #[error("pointer capture recorded by a {captured:?} intersector cannot be replayed by a {expected:?} intersector")]
    CaptureMismatch {
        /// Variant asked to replay the capture.
        expected: IntersectorKind,
        /// Variant that recorded it.
        captured: IntersectorKind,
    },
    /// Capture replay was requested before a successful `prepare_intersection`.
    #[error("intersector has not been prepared with a sample")]
    NotPrepared,
}

/// A held pointer capture: the captured target and the intersection at capture time.
///
/// The captured face is also kept in the target's local space, so replays
/// follow the target when the application moves it during a drag.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerCapture<K> {
    /// Captured target; may be an ancestor of the originally hit node.
    pub target: EventTarget<K>,
    /// Intersection when the capture was taken.
    pub intersection: Intersection<K>,
    /// Point on the captured face, in the target's local space.
    pub local_face_point: Vec3,
    /// Normal of the captured face in the target's local space; absent for volume hits.
    pub local_face_normal: Option<Vec3>,
}

impl<K: Copy> PointerCapture<K> {
    /// Capture `intersection` for `target`, anchoring the hit face to the
    /// target's current world transform.
    pub fn new(
        scene: &dyn SceneGraph<K>,
        target: EventTarget<K>,
        intersection: Intersection<K>,
    ) -> Self {
        let world = target_transform(scene, target);
        let local_face_point = world.inverse().transform_point3(intersection.point_on_face);
        // Normals map back through the transpose of the linear part.
        let local_face_normal = intersection
            .normal
            .map(|n| world.matrix3.transpose().mul_vec3(n).normalize_or_zero());
        Self {
            target,
            intersection,
            local_face_point,
            local_face_normal,
        }
    }

    /// The captured face under the target's current world transform, as a
    /// plane. `None` for volume hits.
    pub fn face_plane(&self, scene: &dyn SceneGraph<K>) -> Option<Plane3> {
        let normal = self.local_face_normal?;
        let world = target_transform(scene, self.target);
        let normal = world
            .matrix3
            .inverse()
            .transpose()
            .mul_vec3(normal)
            .normalize_or_zero();
        Some(Plane3::from_normal_and_point(
            normal,
            world.transform_point3(self.local_face_point),
        ))
    }
}

/// Strategy turning pointer samples into one intersection per frame.
pub trait Intersector<K: Copy> {
    /// Which variant this is.
    fn kind(&self) -> IntersectorKind;

    /// Whether the last [`prepare_intersection`](Self::prepare_intersection) succeeded.
    fn is_ready(&self) -> bool;

    /// Build the probe for `sample` and reset the running best.
    ///
    /// Returns `false` when the sample lacks what this intersector needs
    /// (for example a device pose), leaving the intersector not ready.
    fn prepare_intersection(&mut self, sample: &PointerSample) -> bool;

    /// Test one node and keep the hit if it beats the running best.
    fn execute_intersection(
        &mut self,
        scene: &dyn SceneGraph<K>,
        node: K,
        order: Option<i32>,
        sort: &HitSort<K>,
    );

    /// Convert the running best into an intersection, or a void one.
    fn finalize_intersection(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K>;

    /// Recompute the captured intersection against the prepared probe.
    ///
    /// No traversal happens; the offset between probe and target recorded at
    /// capture time is preserved.
    fn intersect_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        capture: &PointerCapture<K>,
    ) -> Result<Intersection<K>, IntersectError>;
}

/// Fail with [`IntersectError::CaptureMismatch`] unless `capture` came from `expected`.
pub(crate) fn check_capture_kind<K>(
    capture: &PointerCapture<K>,
    expected: IntersectorKind,
) -> Result<(), IntersectError> {
    let captured = capture.intersection.details.kind();
    if captured == expected {
        Ok(())
    } else {
        Err(IntersectError::CaptureMismatch { expected, captured })
    }
}

/// Build an intersection from the winning raw hit.
pub(crate) fn hit_intersection<K: Copy>(
    scene: &dyn SceneGraph<K>,
    candidate: &Candidate<K>,
    raw: &RawHit,
    pose: Pose,
    details: IntersectionDetails,
) -> Intersection<K> {
    let local_point = target_transform(scene, candidate.target)
        .inverse()
        .transform_point3(raw.point);
    Intersection {
        target: candidate.target,
        distance: candidate.distance,
        point: raw.point,
        point_on_face: raw.point,
        local_point,
        normal: raw.normal,
        face_index: raw.face_index,
        instance_id: raw.instance_id,
        pointer_position: pose.position,
        pointer_quaternion: pose.orientation,
        pointer_events_order: candidate.order,
        details,
    }
}

/// Captured point carried along with the device: the offset from device to
/// point recorded at capture time, rotated by the device's change in orientation.
pub(crate) fn carry_offset<K>(captured: &Intersection<K>, pose: Pose) -> Vec3 {
    let delta = pose.orientation * captured.pointer_quaternion.inverse();
    pose.position + delta * (captured.point - captured.pointer_position)
}

/// Assemble a replayed capture intersection targeting the captured target.
///
/// `point_on_face` is `point` projected onto the captured face as it is
/// placed now, and the normal is refreshed from the same transform.
pub(crate) fn captured_intersection<K: Copy>(
    scene: &dyn SceneGraph<K>,
    capture: &PointerCapture<K>,
    point: Vec3,
    distance: f32,
    pose: Pose,
    details: IntersectionDetails,
) -> Intersection<K> {
    let captured = &capture.intersection;
    let local_point = target_transform(scene, capture.target)
        .inverse()
        .transform_point3(point);
    let face = capture.face_plane(scene);
    Intersection {
        target: capture.target,
        distance,
        point,
        point_on_face: face.map_or(point, |plane| plane.project_point(point)),
        local_point,
        normal: face.map(|plane| plane.normal),
        face_index: captured.face_index,
        instance_id: captured.instance_id,
        pointer_position: pose.position,
        pointer_quaternion: pose.orientation,
        pointer_events_order: captured.pointer_events_order,
        details,
    }
}
