// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame hit result.
//!
//! An [`Intersection`] is what an intersector commits after traversal: the
//! winning target together with the device pose that produced it. Pointers
//! keep the last one for hover tracking and copy it into every event they
//! emit. When nothing is hit, [`Intersection::void`] stands in, placed at
//! [`VOID_DISTANCE`] along the probe so drags into empty space still have a
//! point to report.

use glam::{Quat, Vec3};

use crate::order::Candidate;
use crate::types::{EventTarget, Pose};

/// Distance assigned to void intersections.
pub const VOID_DISTANCE: f32 = 10_000_000.0;

/// Which intersector produced an intersection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntersectorKind {
    /// Single ray from a device pose.
    Ray,
    /// Sphere around a device pose.
    Sphere,
    /// Polyline of segments.
    Lines,
    /// Ray through a screen position of a camera.
    CameraRay,
}

/// Variant-specific data, including what capture replay needs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IntersectionDetails {
    /// Produced by the ray intersector.
    Ray,
    /// Produced by the sphere intersector.
    Sphere,
    /// Produced by the lines intersector.
    Lines {
        /// Index of the segment that hit.
        line_index: usize,
        /// Distance from that segment's start to the hit.
        distance_on_line: f32,
    },
    /// Produced by the camera-ray intersector.
    CameraRay {
        /// Depth of the hit in front of the camera's view plane.
        distance_view_plane: f32,
        /// World-space ray direction.
        direction: Vec3,
    },
}

impl IntersectionDetails {
    /// Intersector that produces this variant.
    pub fn kind(&self) -> IntersectorKind {
        match self {
            Self::Ray => IntersectorKind::Ray,
            Self::Sphere => IntersectorKind::Sphere,
            Self::Lines { .. } => IntersectorKind::Lines,
            Self::CameraRay { .. } => IntersectorKind::CameraRay,
        }
    }
}

/// One committed hit.
///
/// Every frame yields exactly one intersection per ready pointer: either a
/// node hit or a void intersection at [`VOID_DISTANCE`].
#[derive(Clone, Debug, PartialEq)]
pub struct Intersection<K> {
    /// Hit node, or [`EventTarget::Void`].
    pub target: EventTarget<K>,
    /// Distance in the producing intersector's metric.
    ///
    /// Live hits and capture replays share the metric of their variant:
    /// - ray and camera ray: along the ray from its origin;
    /// - lines: length of all earlier segments plus the distance along the
    ///   hitting one;
    /// - sphere: from the sphere center to the hit point.
    ///
    /// Only distances of the same variant are comparable.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// Hit point on the plane of the hit face; drives captured drags.
    pub point_on_face: Vec3,
    /// Hit point in the target's local space.
    pub local_point: Vec3,
    /// World-space surface normal, absent for volume hits.
    pub normal: Option<Vec3>,
    /// Face index, if the surface has faces.
    pub face_index: Option<u32>,
    /// Instance index for instanced geometry.
    pub instance_id: Option<u32>,
    /// Position of the probing device.
    pub pointer_position: Vec3,
    /// Orientation of the probing device.
    pub pointer_quaternion: Quat,
    /// Resolved order of the target.
    pub pointer_events_order: Option<i32>,
    /// Variant-specific data.
    pub details: IntersectionDetails,
}

impl<K: Copy> Intersection<K> {
    /// Void intersection at `point` for a probe at `pose`.
    pub fn void(point: Vec3, pose: Pose, details: IntersectionDetails) -> Self {
        Self {
            target: EventTarget::Void,
            distance: VOID_DISTANCE,
            point,
            point_on_face: point,
            local_point: point,
            normal: None,
            face_index: None,
            instance_id: None,
            pointer_position: pose.position,
            pointer_quaternion: pose.orientation,
            pointer_events_order: None,
            details,
        }
    }

    /// Whether nothing was hit.
    pub fn is_void(&self) -> bool {
        self.target.is_void()
    }

    /// Pose of the probing device at hit time.
    pub fn pointer_pose(&self) -> Pose {
        Pose::new(self.pointer_position, self.pointer_quaternion)
    }

    /// Ordering view of this intersection.
    pub fn candidate(&self) -> Candidate<K> {
        Candidate {
            target: self.target,
            distance: self.distance,
            order: self.pointer_events_order,
        }
    }
}
