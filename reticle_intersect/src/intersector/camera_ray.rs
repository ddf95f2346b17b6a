// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use reticle_geometry::{Plane3, Ray3};
use smallvec::SmallVec;

use super::{
    IntersectError, Intersector, PointerCapture, captured_intersection, check_capture_kind,
    hit_intersection,
};
use crate::intersection::{Intersection, IntersectionDetails, IntersectorKind, VOID_DISTANCE};
use crate::order::{BestHit, Candidate, HitSort};
use crate::scene::{RawHit, SceneGraph};
use crate::types::{Camera, EventTarget, PointerSample, Pose};

/// Ray through a screen position, for mice and touch screens over a canvas.
///
/// The probe comes from [`PointerSample::camera`] and
/// [`PointerSample::screen`] (normalized device coordinates). Capture replay
/// intersects the new ray with the plane parallel to the camera's view plane
/// at the captured depth, so drags continue off the target and off canvas.
#[derive(Clone, Debug)]
pub struct CameraRayIntersector<K> {
    camera: Option<Camera>,
    ray: Option<Ray3>,
    best: BestHit<K, RawHit>,
    hits: SmallVec<[RawHit; 4]>,
}

impl<K> Default for CameraRayIntersector<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> CameraRayIntersector<K> {
    /// Create a camera-ray intersector.
    pub fn new() -> Self {
        Self {
            camera: None,
            ray: None,
            best: BestHit::default(),
            hits: SmallVec::new(),
        }
    }

    /// World-space ray of the last prepared sample.
    pub fn ray(&self) -> Option<&Ray3> {
        self.ray.as_ref()
    }

    fn pose(&self) -> Pose {
        match (self.camera, self.ray) {
            (Some(camera), Some(ray)) => Pose::new(ray.origin, camera.pose().orientation),
            _ => Pose::IDENTITY,
        }
    }

    fn details(&self, camera: &Camera, ray: &Ray3, point: glam::Vec3) -> IntersectionDetails {
        IntersectionDetails::CameraRay {
            distance_view_plane: camera.view_depth(point),
            direction: ray.direction,
        }
    }
}

impl<K: Copy> Intersector<K> for CameraRayIntersector<K> {
    fn kind(&self) -> IntersectorKind {
        IntersectorKind::CameraRay
    }

    fn is_ready(&self) -> bool {
        self.ray.is_some()
    }

    fn prepare_intersection(&mut self, sample: &PointerSample) -> bool {
        self.best.clear();
        match (sample.camera, sample.screen) {
            (Some(camera), Some(screen)) => {
                self.camera = Some(camera);
                self.ray = Some(camera.ray_from_ndc(screen));
            }
            _ => {
                self.camera = None;
                self.ray = None;
            }
        }
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
            let candidate = Candidate {
                target: EventTarget::Node(node),
                distance: raw.distance,
                order,
            };
            self.best.offer(candidate, raw, sort);
        }
    }

    fn finalize_intersection(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K> {
        let pose = self.pose();
        let (Some(camera), Some(ray)) = (self.camera, self.ray) else {
            self.best.clear();
            return Intersection::void(
                pose.position,
                pose,
                IntersectionDetails::CameraRay {
                    distance_view_plane: VOID_DISTANCE,
                    direction: pose.forward(),
                },
            );
        };
        match self.best.take() {
            Some((candidate, raw)) => {
                let details = self.details(&camera, &ray, raw.point);
                hit_intersection(scene, &candidate, &raw, pose, details)
            }
            None => {
                let point = ray.at(VOID_DISTANCE);
                Intersection::void(point, pose, self.details(&camera, &ray, point))
            }
        }
    }

    fn intersect_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        capture: &PointerCapture<K>,
    ) -> Result<Intersection<K>, IntersectError> {
        check_capture_kind(capture, IntersectorKind::CameraRay)?;
        let IntersectionDetails::CameraRay {
            distance_view_plane,
            ..
        } = capture.intersection.details
        else {
            return Err(IntersectError::CaptureMismatch {
                expected: IntersectorKind::CameraRay,
                captured: capture.intersection.details.kind(),
            });
        };
        let (Some(camera), Some(ray)) = (self.camera, self.ray) else {
            return Err(IntersectError::NotPrepared);
        };
        let forward = camera.forward();
        let view_plane =
            Plane3::from_normal_and_point(forward, camera.position() + forward * distance_view_plane);
        let point = match view_plane.intersect_line(ray.origin, ray.direction) {
            Some(t) if t.is_finite() => ray.at(t),
            _ => ray.at(distance_view_plane),
        };
        let pose = self.pose();
        Ok(captured_intersection(
            scene,
            capture,
            point,
            ray.project_distance(point),
            pose,
            IntersectionDetails::CameraRay {
                distance_view_plane,
                direction: ray.direction,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_scene::BoxScene;
    use glam::{Affine3A, Vec3};
    use kurbo::Point;

    fn camera() -> Camera {
        Camera::perspective(
            Affine3A::from_translation(Vec3::new(0.0, 0.0, 10.0)),
            core::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn needs_camera_and_screen() {
        let mut cr = CameraRayIntersector::<u32>::new();
        assert!(!cr.prepare_intersection(&PointerSample::new(0).with_camera(camera())));
        assert!(cr.prepare_intersection(&PointerSample::on_screen(0, camera(), Point::ZERO)));
    }

    #[test]
    fn hit_records_view_depth() {
        let mut scene = BoxScene::new();
        let n = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut cr = CameraRayIntersector::new();
        cr.prepare_intersection(&PointerSample::on_screen(0, camera(), Point::ZERO));
        cr.execute_intersection(&scene, n, None, &HitSort::Default);
        let hit = cr.finalize_intersection(&scene);
        assert_eq!(hit.target, EventTarget::Node(n));
        let IntersectionDetails::CameraRay {
            distance_view_plane,
            direction,
        } = hit.details
        else {
            panic!("expected camera-ray details");
        };
        assert!((distance_view_plane - 9.5).abs() < 1e-4);
        assert!(direction.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn capture_drags_on_view_plane() {
        let mut scene = BoxScene::new();
        let n = scene.add_box(0, Vec3::ZERO, 1.0);
        let mut cr = CameraRayIntersector::new();
        cr.prepare_intersection(&PointerSample::on_screen(0, camera(), Point::ZERO));
        cr.execute_intersection(&scene, n, None, &HitSort::Default);
        let first = cr.finalize_intersection(&scene);
        let capture = PointerCapture::new(&scene, first.target, first);

        // Far right edge of the screen, and beyond it.
        for x in [1.0, 3.0] {
            cr.prepare_intersection(&PointerSample::on_screen(1, camera(), Point::new(x, 0.0)));
            let moved = cr
                .intersect_pointer_capture(&scene, &capture)
                .expect("same variant");
            assert_eq!(moved.target, EventTarget::Node(n));
            assert!((moved.point.z - 0.5).abs() < 1e-3);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Test values are small."
            )]
            let expected_x = 9.5 * x as f32;
            assert!((moved.point.x - expected_x).abs() < 1e-2);
        }
    }

    #[test]
    fn rejects_foreign_capture() {
        let scene = BoxScene::new();
        let mut cr = CameraRayIntersector::<u32>::new();
        cr.prepare_intersection(&PointerSample::on_screen(0, camera(), Point::ZERO));
        let capture = PointerCapture::new(
            &scene,
            EventTarget::Void,
            Intersection::void(Vec3::ZERO, Pose::IDENTITY, IntersectionDetails::Sphere),
        );
        assert!(matches!(
            cr.intersect_pointer_capture(&scene, &capture),
            Err(IntersectError::CaptureMismatch { .. })
        ));
    }
}
