// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::Affine3A;
use reticle_geometry::{Aabb3, Sphere3};

use super::{
    IntersectError, Intersector, PointerCapture, captured_intersection, carry_offset,
    check_capture_kind, hit_intersection,
};
use crate::intersection::{Intersection, IntersectionDetails, IntersectorKind};
use crate::order::{BestHit, Candidate, HitSort};
use crate::scene::{NodeGeometry, RawHit, SceneGraph};
use crate::types::{EventTarget, PointerSample, Pose};

/// Options for [`SphereIntersector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereOptions {
    /// Probe radius in world units.
    pub radius: f32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self { radius: 0.07 }
    }
}

impl SphereOptions {
    /// Set the probe radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// Touch and grab probe: a sphere centered on the device position.
///
/// Each candidate is rejected by its world-space bounding sphere first, then
/// the closest point of its local bounding box to the probe center is
/// measured in world space. Instanced nodes are tested per instance.
/// Sphere hits have no normal.
#[derive(Clone, Debug)]
pub struct SphereIntersector<K> {
    options: SphereOptions,
    pose: Option<Pose>,
    sphere: Option<Sphere3>,
    best: BestHit<K, RawHit>,
}

impl<K> SphereIntersector<K> {
    /// Create a sphere intersector.
    pub fn new(options: SphereOptions) -> Self {
        Self {
            options,
            pose: None,
            sphere: None,
            best: BestHit::default(),
        }
    }

    /// Current options.
    pub fn options(&self) -> &SphereOptions {
        &self.options
    }

    /// World-space probe of the last prepared sample.
    pub fn sphere(&self) -> Option<&Sphere3> {
        self.sphere.as_ref()
    }
}

/// Closest point of a transformed box within the probe, if any.
fn test_box(sphere: &Sphere3, transform: &Affine3A, bounds: &Aabb3, instance: Option<u32>) -> Option<RawHit> {
    if !bounds
        .bounding_sphere()
        .transformed(transform)
        .intersects_sphere(sphere)
    {
        return None;
    }
    let local_center = transform.inverse().transform_point3(sphere.center);
    let point = transform.transform_point3(bounds.closest_point(local_center));
    let distance = point.distance(sphere.center);
    (distance <= sphere.radius).then_some(RawHit {
        distance,
        point,
        normal: None,
        face_index: None,
        instance_id: instance,
    })
}

impl<K: Copy> Intersector<K> for SphereIntersector<K> {
    fn kind(&self) -> IntersectorKind {
        IntersectorKind::Sphere
    }

    fn is_ready(&self) -> bool {
        self.sphere.is_some()
    }

    fn prepare_intersection(&mut self, sample: &PointerSample) -> bool {
        self.best.clear();
        self.pose = sample.pose;
        self.sphere = sample
            .pose
            .map(|pose| Sphere3::new(pose.position, self.options.radius));
        self.sphere.is_some()
    }

    fn execute_intersection(
        &mut self,
        scene: &dyn SceneGraph<K>,
        node: K,
        order: Option<i32>,
        sort: &HitSort<K>,
    ) {
        let Some(sphere) = self.sphere else { return };
        let Some(geometry) = scene.geometry(node) else {
            return;
        };
        let world = scene.world_transform(node);
        let mut offer = |raw: RawHit| {
            let candidate = Candidate {
                target: EventTarget::Node(node),
                distance: raw.distance,
                order,
            };
            self.best.offer(candidate, raw, sort);
        };
        match geometry {
            NodeGeometry::Mesh { bounds } => {
                if let Some(raw) = test_box(&sphere, &world, &bounds, None) {
                    offer(raw);
                }
            }
            NodeGeometry::Instanced { bounds, instances } => {
                for (index, instance) in (0_u32..).zip(instances) {
                    if let Some(raw) = test_box(&sphere, &(world * *instance), &bounds, Some(index)) {
                        offer(raw);
                    }
                }
            }
            NodeGeometry::Custom => {
                if let Some(raw) = scene.spherecast(node, &sphere) {
                    offer(raw);
                }
            }
        }
    }

    fn finalize_intersection(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K> {
        let pose = self.pose.unwrap_or(Pose::IDENTITY);
        match self.best.take() {
            Some((candidate, raw)) => {
                hit_intersection(scene, &candidate, &raw, pose, IntersectionDetails::Sphere)
            }
            None => Intersection::void(pose.position, pose, IntersectionDetails::Sphere),
        }
    }

    fn intersect_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        capture: &PointerCapture<K>,
    ) -> Result<Intersection<K>, IntersectError> {
        check_capture_kind(capture, IntersectorKind::Sphere)?;
        let Some(pose) = self.pose else {
            return Err(IntersectError::NotPrepared);
        };
        let point = carry_offset(&capture.intersection, pose);
        Ok(captured_intersection(
            scene,
            capture,
            point,
            point.distance(pose.position),
            pose,
            IntersectionDetails::Sphere,
        ))
    }
}
