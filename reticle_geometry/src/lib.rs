// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry-level probe primitives and precise hit tests in 3D.
//!
//! This crate provides the small, reusable pieces a pointer engine needs to
//! probe a 3D scene: rays, spheres, segments, planes, and axis-aligned boxes,
//! plus narrow-phase hit tests for a handful of local shapes. It is
//! intentionally decoupled from any particular scene graph or event router.
//!
//! # Typical usage
//!
//! - Transform the probe (for example a world-space [`Ray3`]) into a node's
//!   local space with [`Ray3::transformed`].
//! - Call [`PreciseHitTest::raycast_local`] on the node's shape.
//! - Map the returned [`LocalHit`] back to world space and measure the
//!   world-space distance there. Local distances are not comparable across
//!   nodes with different scales.
//!
//! # Key types
//!
//! - [`Ray3`], [`Sphere3`], [`Plane3`], [`Aabb3`] and [`segment::Segment3`]:
//!   probe and bounding primitives.
//! - [`PreciseHitTest`]: implemented by shapes that can answer "where does this
//!   local-space ray hit me?" queries.
//! - [`Shape`]: a closed set of the built-in shapes for scenes that do not
//!   carry their own geometry types.
//!
//! ## Shapes and scope
//!
//! - [`Aabb3`]: solid box, hit from outside or inside.
//! - [`Sphere3`]: solid sphere.
//! - [`Quad`]: double-sided rectangle in the local XY plane, facing +Z.
//!
//! Triangle meshes are left to the host renderer; hosts implement
//! [`PreciseHitTest`] for their own mesh types.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use glam::{Affine3A, Vec2, Vec3};

/// Segment helpers for multi-segment probes.
pub mod segment;

/// A ray with a normalized direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray3 {
    /// Ray origin.
    pub origin: Vec3,
    /// Unit-length direction.
    pub direction: Vec3,
}

impl Ray3 {
    /// Create a ray, normalizing `direction`.
    ///
    /// A zero direction yields a zero direction; such a ray never hits anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine transform, renormalizing the direction.
    ///
    /// Parameters along the transformed ray are measured in the target space;
    /// they are only comparable with world distances when `transform` has unit scale.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        Self::new(
            transform.transform_point3(self.origin),
            transform.transform_vector3(self.direction),
        )
    }

    /// Distance along the ray to the orthogonal projection of `point`.
    pub fn project_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.direction)
    }
}

/// A sphere, used both as a probe and as a bounding volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere3 {
    /// Sphere center.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

impl Sphere3 {
    /// Create a sphere.
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether `point` lies inside or on the sphere.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Whether the sphere overlaps another sphere.
    pub fn intersects_sphere(&self, other: &Self) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }

    /// Whether the sphere overlaps a box.
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        self.contains_point(aabb.closest_point(self.center))
    }

    /// Conservative world-space bounding sphere after applying `transform`.
    ///
    /// Non-uniform scale is handled by using the largest axis scale.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        let m = transform.matrix3;
        let scale = m
            .x_axis
            .length_squared()
            .max(m.y_axis.length_squared())
            .max(m.z_axis.length_squared())
            .sqrt();
        Self {
            center: transform.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }

    fn raycast(&self, ray: &Ray3) -> Option<LocalHit> {
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        let far = -b + root;
        // Inside the sphere the exit point is reported, mirroring the box test.
        let t = if near >= 0.0 { near } else { far };
        if t < 0.0 {
            return None;
        }
        let point = ray.at(t);
        Some(LocalHit {
            distance: t,
            point,
            normal: (point - self.center).normalize_or_zero(),
            face_index: None,
        })
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// Create a box from two corners, in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box centered at `center` with the given full `size`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    /// Box center.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `point` lies inside or on the box.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Closest point on or inside the box to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Smallest sphere containing the box.
    pub fn bounding_sphere(&self) -> Sphere3 {
        Sphere3::new(self.center(), self.size().length() * 0.5)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transform the box and return a conservative axis-aligned box in the target space.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        let center = transform.transform_point3(self.center());
        let half = self.size() * 0.5;
        let m = transform.matrix3;
        let extent =
            Vec3::from(m.x_axis.abs() * half.x + m.y_axis.abs() * half.y + m.z_axis.abs() * half.z);
        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    fn raycast(&self, ray: &Ray3) -> Option<LocalHit> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        let t_near = t0.min(t1);
        let t_far = t0.max(t1);
        let enter = t_near.max_element();
        let exit = t_far.min_element();
        if exit < 0.0 || enter > exit {
            return None;
        }
        let (t, axis_t, outward) = if enter >= 0.0 {
            (enter, t_near, false)
        } else {
            (exit, t_far, true)
        };
        let axis = (0..3).find(|&i| axis_t[i] == t).unwrap_or(0);
        let toward = ray.direction[axis] > 0.0;
        // Entry faces oppose the ray; exit faces (origin inside) follow it.
        let positive = if outward { toward } else { !toward };
        let mut normal = Vec3::ZERO;
        normal[axis] = if positive { 1.0 } else { -1.0 };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Axis index is in 0..3."
        )]
        let face_index = (axis * 2 + usize::from(!positive)) as u32;
        Some(LocalHit {
            distance: t,
            point: ray.at(t),
            normal,
            face_index: Some(face_index),
        })
    }
}

/// An infinite plane `normal · p + constant = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane3 {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub constant: f32,
}

impl Plane3 {
    /// Plane through `point` with the given normal (normalized here).
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    /// Signed distance from the plane to `point`.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance_to_point(point)
    }

    /// Parameter `t` where the infinite line `origin + direction * t` crosses the plane.
    ///
    /// Negative values are returned as-is so callers can intersect "backwards";
    /// `None` means the line is parallel to the plane.
    pub fn intersect_line(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let denom = self.normal.dot(direction);
        if denom == 0.0 {
            return None;
        }
        Some(-(self.normal.dot(origin) + self.constant) / denom)
    }
}

/// Double-sided rectangle in the local XY plane, centered at the origin and facing +Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    /// Half width and half height.
    pub half_extents: Vec2,
}

impl Quad {
    /// Create a quad with full `width` and `height`.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(width * 0.5, height * 0.5),
        }
    }

    fn raycast(&self, ray: &Ray3) -> Option<LocalHit> {
        if ray.direction.z == 0.0 {
            return None;
        }
        let t = -ray.origin.z / ray.direction.z;
        if t < 0.0 {
            return None;
        }
        let point = ray.at(t);
        if point.x < -self.half_extents.x
            || point.x > self.half_extents.x
            || point.y < -self.half_extents.y
            || point.y > self.half_extents.y
        {
            return None;
        }
        let normal = if ray.direction.z > 0.0 { Vec3::NEG_Z } else { Vec3::Z };
        Some(LocalHit {
            distance: t,
            point,
            normal,
            face_index: Some(0),
        })
    }
}

/// Result of a precise local-space test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalHit {
    /// Parameter along the local ray.
    pub distance: f32,
    /// Hit point in local coordinates.
    pub point: Vec3,
    /// Surface normal in local coordinates, facing the probe.
    pub normal: Vec3,
    /// Face identifier, when the shape has faces.
    pub face_index: Option<u32>,
}

/// Trait for precise 3D hit testing in local coordinates.
pub trait PreciseHitTest {
    /// Nearest hit of `ray` (already in local space) against the shape.
    fn raycast_local(&self, ray: &Ray3) -> Option<LocalHit>;

    /// Local bounding box, used for broad-phase rejection and sphere probes.
    fn local_bounds(&self) -> Aabb3;
}

impl PreciseHitTest for Aabb3 {
    fn raycast_local(&self, ray: &Ray3) -> Option<LocalHit> {
        self.raycast(ray)
    }

    fn local_bounds(&self) -> Aabb3 {
        *self
    }
}

impl PreciseHitTest for Sphere3 {
    fn raycast_local(&self, ray: &Ray3) -> Option<LocalHit> {
        self.raycast(ray)
    }

    fn local_bounds(&self) -> Aabb3 {
        let r = Vec3::splat(self.radius);
        Aabb3::new(self.center - r, self.center + r)
    }
}

impl PreciseHitTest for Quad {
    fn raycast_local(&self, ray: &Ray3) -> Option<LocalHit> {
        self.raycast(ray)
    }

    fn local_bounds(&self) -> Aabb3 {
        let h = self.half_extents;
        Aabb3::new(Vec3::new(-h.x, -h.y, 0.0), Vec3::new(h.x, h.y, 0.0))
    }
}

/// Closed set of the built-in shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Solid box.
    Box(Aabb3),
    /// Solid sphere.
    Sphere(Sphere3),
    /// Double-sided rectangle.
    Quad(Quad),
}

impl PreciseHitTest for Shape {
    fn raycast_local(&self, ray: &Ray3) -> Option<LocalHit> {
        match self {
            Self::Box(b) => b.raycast_local(ray),
            Self::Sphere(s) => s.raycast_local(ray),
            Self::Quad(q) => q.raycast_local(ray),
        }
    }

    fn local_bounds(&self) -> Aabb3 {
        match self {
            Self::Box(b) => b.local_bounds(),
            Self::Sphere(s) => s.local_bounds(),
            Self::Quad(q) => q.local_bounds(),
        }
    }
}
