// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::Vec3;
use reticle_geometry::Ray3;
use smallvec::SmallVec;

use super::{
    IntersectError, Intersector, PointerCapture, captured_intersection, carry_offset,
    check_capture_kind, hit_intersection,
};
use crate::intersection::{Intersection, IntersectionDetails, IntersectorKind, VOID_DISTANCE};
use crate::order::{BestHit, Candidate, HitSort};
use crate::scene::{RawHit, SceneGraph};
use crate::types::{EventTarget, PointerSample, Pose};

/// Options for [`RayIntersector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayOptions {
    /// Hits closer than this are ignored, so the emitting device does not hit itself.
    pub min_distance: f32,
    /// Ray direction in the device's local frame.
    pub direction: Vec3,
}

impl Default for RayOptions {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            direction: Vec3::NEG_Z,
        }
    }
}

impl RayOptions {
    /// Set the minimum hit distance.
    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Set the local ray direction.
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }
}

/// Casts a single ray from the device pose, for controllers and hand rays.
///
/// ```
/// use glam::{Quat, Vec3};
/// use reticle_intersect::intersector::{Intersector, RayIntersector, RayOptions};
/// use reticle_intersect::{PointerSample, Pose};
///
/// let mut ray = RayIntersector::<u32>::new(RayOptions::default());
/// assert!(!ray.prepare_intersection(&PointerSample::new(0)));
/// assert!(ray.prepare_intersection(&PointerSample::at_pose(0, Pose::new(Vec3::Z, Quat::IDENTITY))));
/// assert!(ray.is_ready());
/// ```
#[derive(Clone, Debug)]
pub struct RayIntersector<K> {
    options: RayOptions,
    pose: Option<Pose>,
    ray: Option<Ray3>,
    best: BestHit<K, RawHit>,
    hits: SmallVec<[RawHit; 4]>,
}

impl<K> RayIntersector<K> {
    /// Create a ray intersector.
    pub fn new(options: RayOptions) -> Self {
        Self {
            options,
            pose: None,
            ray: None,
            best: BestHit::default(),
            hits: SmallVec::new(),
        }
    }

    /// Current options.
    pub fn options(&self) -> &RayOptions {
        &self.options
    }

    /// World-space ray of the last prepared sample.
    pub fn ray(&self) -> Option<&Ray3> {
        self.ray.as_ref()
    }
}

impl<K: Copy> Intersector<K> for RayIntersector<K> {
    fn kind(&self) -> IntersectorKind {
        IntersectorKind::Ray
    }

    fn is_ready(&self) -> bool {
        self.ray.is_some()
    }

    fn prepare_intersection(&mut self, sample: &PointerSample) -> bool {
        self.best.clear();
        self.pose = sample.pose;
        self.ray = sample
            .pose
            .map(|pose| Ray3::new(pose.position, pose.orientation * self.options.direction));
        self.ray.is_some()
    }

    fn execute_intersection(
        &mut self,
        scene: &dyn SceneGraph<K>,
        node: K,
        order: Option<i32>,
        sort: &HitSort<K>,
    ) {
        let Some(ray) = self.ray else { return };
        self.hits.clear();
        scene.raycast(node, &ray, &mut self.hits);
        for raw in self.hits.drain(..) {
            if raw.distance < self.options.min_distance {
                continue;
            }
            let candidate = Candidate {
                target: EventTarget::Node(node),
                distance: raw.distance,
                order,
            };
            self.best.offer(candidate, raw, sort);
        }
    }

    fn finalize_intersection(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K> {
        let pose = self.pose.unwrap_or(Pose::IDENTITY);
        match self.best.take() {
            Some((candidate, raw)) => {
                hit_intersection(scene, &candidate, &raw, pose, IntersectionDetails::Ray)
            }
            None => {
                let point = self
                    .ray
                    .map_or(pose.position, |ray| ray.at(VOID_DISTANCE));
                Intersection::void(point, pose, IntersectionDetails::Ray)
            }
        }
    }

    fn intersect_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        capture: &PointerCapture<K>,
    ) -> Result<Intersection<K>, IntersectError> {
        check_capture_kind(capture, IntersectorKind::Ray)?;
        let (Some(pose), Some(ray)) = (self.pose, self.ray) else {
            return Err(IntersectError::NotPrepared);
        };
        // The carried point turns with the device, so it stays on the ray.
        let point = carry_offset(&capture.intersection, pose);
        Ok(captured_intersection(
            scene,
            capture,
            point,
            ray.project_distance(point),
            pose,
            IntersectionDetails::Ray,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_scene::BoxScene;
    use glam::{Affine3A, Quat};

    fn looking_down_z(z: f32) -> PointerSample {
        PointerSample::at_pose(0, Pose::new(Vec3::new(0.0, 0.0, z), Quat::IDENTITY))
    }

    #[test]
    fn keeps_nearest_hit() {
        let mut scene = BoxScene::new();
        let far = scene.add_box(0, Vec3::new(0.0, 0.0, -5.0), 1.0);
        let near = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut ray = RayIntersector::new(RayOptions::default());
        assert!(ray.prepare_intersection(&looking_down_z(5.0)));
        for n in [far, near] {
            ray.execute_intersection(&scene, n, None, &HitSort::Default);
        }
        let hit = ray.finalize_intersection(&scene);
        assert_eq!(hit.target, EventTarget::Node(near));
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!(hit.local_point.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-5));
        assert_eq!(hit.normal, Some(Vec3::Z));
    }

    #[test]
    fn min_distance_skips_close_hits() {
        let mut scene = BoxScene::new();
        let n = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut ray = RayIntersector::new(RayOptions::default().with_min_distance(10.0));
        ray.prepare_intersection(&looking_down_z(5.0));
        ray.execute_intersection(&scene, n, None, &HitSort::Default);
        let hit = ray.finalize_intersection(&scene);
        assert!(hit.is_void());
        assert_eq!(hit.distance, VOID_DISTANCE);
        assert!((hit.point.z - (5.0 - VOID_DISTANCE)).abs() < 1.0);
    }

    #[test]
    fn capture_keeps_offset_off_target() {
        let mut scene = BoxScene::new();
        let n = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut ray = RayIntersector::new(RayOptions::default());
        ray.prepare_intersection(&looking_down_z(5.0));
        ray.execute_intersection(&scene, n, None, &HitSort::Default);
        let first = ray.finalize_intersection(&scene);
        let capture = PointerCapture::new(&scene, first.target, first);

        // Move far to the side; the ray no longer touches the box.
        ray.prepare_intersection(&PointerSample::at_pose(
            1,
            Pose::new(Vec3::new(10.0, 0.0, 5.0), Quat::IDENTITY),
        ));
        let moved = ray
            .intersect_pointer_capture(&scene, &capture)
            .expect("same variant");
        assert_eq!(moved.target, EventTarget::Node(n));
        assert!(moved.point.abs_diff_eq(Vec3::new(10.0, 0.0, 0.5), 1e-5));
        assert!(moved.point_on_face.abs_diff_eq(Vec3::new(10.0, 0.0, 0.5), 1e-5));
        assert!(moved.local_point.abs_diff_eq(Vec3::new(10.0, 0.0, 0.5), 1e-5));
    }

    #[test]
    fn captured_face_follows_turns_and_target_moves() {
        let mut scene = BoxScene::new();
        let n = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut ray = RayIntersector::new(RayOptions::default());
        ray.prepare_intersection(&looking_down_z(5.0));
        ray.execute_intersection(&scene, n, None, &HitSort::Default);
        let first = ray.finalize_intersection(&scene);
        let capture = PointerCapture::new(&scene, first.target, first);

        // A quarter turn swings the carried point off the face plane.
        let turn = Quat::from_rotation_y(core::f32::consts::FRAC_PI_2);
        ray.prepare_intersection(&PointerSample::at_pose(
            1,
            Pose::new(Vec3::new(0.0, 0.0, 5.0), turn),
        ));
        let turned = ray
            .intersect_pointer_capture(&scene, &capture)
            .expect("same variant");
        assert!(turned.point.abs_diff_eq(Vec3::new(-4.5, 0.0, 5.0), 1e-4));
        assert!(turned.point_on_face.abs_diff_eq(Vec3::new(-4.5, 0.0, 0.5), 1e-4));
        assert!((turned.distance - 4.5).abs() < 1e-4);

        // The application drags the box toward the device.
        scene.nodes[n as usize].world = Affine3A::from_translation(Vec3::new(0.0, 0.0, 2.0));
        ray.prepare_intersection(&looking_down_z(5.0));
        let moved = ray
            .intersect_pointer_capture(&scene, &capture)
            .expect("same variant");
        assert!(moved.point.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-5));
        assert!(moved.point_on_face.abs_diff_eq(Vec3::new(0.0, 0.0, 2.5), 1e-5));
        assert_eq!(moved.normal, Some(Vec3::Z));
        assert!(moved.local_point.abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-5));
    }

    #[test]
    fn capture_before_prepare_fails() {
        let mut ray = RayIntersector::<u32>::new(RayOptions::default());
        let scene = BoxScene::new();
        let capture = PointerCapture::new(
            &scene,
            EventTarget::Void,
            Intersection::void(Vec3::ZERO, Pose::IDENTITY, IntersectionDetails::Ray),
        );
        assert_eq!(
            ray.intersect_pointer_capture(&scene, &capture),
            Err(IntersectError::NotPrepared)
        );
    }
}
