// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Intersect: turn pointer samples into one dominant hit per frame.
//!
//! ## Overview
//!
//! This crate resolves *where* a pointer is in a 3D scene graph. It does not
//! deliver events; see `reticle_pointer` for the state machine that turns
//! successive intersections into DOM-style pointer events.
//!
//! The host scene is reached through [`SceneGraph`], an object-safe trait for
//! tree links, world transforms, per-node policy, and raycasts.
//!
//! ## Intersectors
//!
//! An [`Intersector`](intersector::Intersector) owns the probe of one pointer:
//!
//! - [`RayIntersector`](intersector::RayIntersector): a ray from a device pose.
//! - [`SphereIntersector`](intersector::SphereIntersector): a sphere around a
//!   device position, for touch and grab.
//! - [`LinesIntersector`](intersector::LinesIntersector): a polyline such as a
//!   teleport arc.
//! - [`CameraRayIntersector`](intersector::CameraRayIntersector): a ray through
//!   a screen position of a [`Camera`].
//!
//! Each frame yields exactly one [`Intersection`]: a node hit, or a void hit
//! at [`VOID_DISTANCE`] when nothing was hit.
//!
//! ## Ordering
//!
//! All intersectors share one rule: a higher `pointer_events_order` wins,
//! then a smaller distance. See [`order`].
//!
//! ## Traversal
//!
//! [`traverse::intersect_pointer_targets`] walks the scene depth-first,
//! resolving each node's [`policy`] once, and feeds eligible nodes to every
//! participating pointer.
//!
//! ```
//! use glam::{Affine3A, Quat, Vec3};
//! use reticle_geometry::{Aabb3, PreciseHitTest, Ray3};
//! use reticle_intersect::intersector::{RayIntersector, RayOptions};
//! use reticle_intersect::policy::{NodePolicy, PointerEventsMode};
//! use reticle_intersect::traverse::{TraversalOptions, intersect_pointer};
//! use reticle_intersect::{
//!     EventTarget, NoListeners, NodeGeometry, PointerInfo, PointerSample, PointerType, Pose,
//!     RawHit, SceneGraph,
//! };
//! use smallvec::SmallVec;
//!
//! // A root (0) with a single unit box (1) at the origin.
//! struct OneBox;
//! impl SceneGraph<u32> for OneBox {
//!     fn root(&self) -> u32 { 0 }
//!     fn parent_of(&self, n: u32) -> Option<u32> { (n == 1).then_some(0) }
//!     fn children_of(&self, n: u32) -> &[u32] { if n == 0 { &[1] } else { &[] } }
//!     fn policy(&self, _: u32) -> NodePolicy<'_, u32> {
//!         NodePolicy { pointer_events: Some(PointerEventsMode::Auto), ..NodePolicy::default() }
//!     }
//!     fn world_transform(&self, _: u32) -> Affine3A { Affine3A::IDENTITY }
//!     fn raycast(&self, n: u32, ray: &Ray3, hits: &mut SmallVec<[RawHit; 4]>) {
//!         if n != 1 { return; }
//!         let unit = Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE);
//!         if let Some(h) = unit.raycast_local(ray) {
//!             hits.push(RawHit {
//!                 distance: h.distance,
//!                 point: h.point,
//!                 normal: Some(h.normal),
//!                 face_index: h.face_index,
//!                 instance_id: None,
//!             });
//!         }
//!     }
//!     fn geometry(&self, _: u32) -> Option<NodeGeometry<'_>> { None }
//! }
//!
//! let mut ray = RayIntersector::new(RayOptions::default());
//! let sample = PointerSample::at_pose(0, Pose::new(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY));
//! let hit = intersect_pointer(
//!     &OneBox,
//!     &NoListeners,
//!     &PointerInfo::new(1, PointerType::RAY),
//!     &mut ray,
//!     &sample,
//!     &TraversalOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(hit.target, EventTarget::Node(1));
//! assert_eq!(hit.distance, 2.5);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod intersection;
pub mod intersector;
pub mod order;
pub mod policy;
pub mod scene;
pub mod traverse;
pub mod types;

pub use intersection::{
    Intersection, IntersectionDetails, IntersectorKind, VOID_DISTANCE,
};
pub use intersector::{IntersectError, Intersector, PointerCapture};
pub use order::{Candidate, CustomSort, HitSort};
pub use scene::{
    AncestorChain, ListenerLookup, NoListeners, NodeGeometry, RawHit, SceneGraph, ancestors,
};
pub use types::{
    Button, Camera, EventTarget, PointerId, PointerInfo, PointerSample, PointerState,
    PointerType, Pose, Projection, ndc_from_viewport,
};
