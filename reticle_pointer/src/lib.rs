// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Pointer: DOM-style pointer events for 3D scene graphs.
//!
//! ## Overview
//!
//! [`reticle_intersect`] resolves where a pointer is; this crate decides what
//! that means for the application. A [`Pointer`] compares each new
//! intersection with the last one and emits `pointerover`, `pointerenter`,
//! `pointermove`, `pointerout`, `pointerleave`, `pointerdown`, `pointerup`,
//! `pointercancel`, `click`, `dblclick`, `contextmenu`, and `wheel` events.
//! Events travel through the [`dispatcher`] to an
//! [`EventSink`](dispatcher::EventSink), usually a [`Listeners`] table.
//!
//! ## Building blocks
//!
//! - [`Pointer`]: the per-device state machine, with capture, click timing,
//!   and replay of input that arrives before the first pose.
//! - [`Listeners`]: closures per target and event kind. The void target may
//!   carry listeners too, which is how missed clicks are observed.
//! - [`PointerRegistry`]: pointers by id sharing one click state.
//! - [`CombinedPointer`]: several probes of one device, one active at a time.
//! - [`FrameBatcher`]: one intersection per pointer per rendered frame.
//! - [`ForwardAdapter`]: turns host window events into pointer calls.
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use glam::{Affine3A, Quat, Vec3};
//! use reticle_geometry::{Aabb3, Shape};
//! use reticle_intersect::intersector::{RayIntersector, RayOptions};
//! use reticle_intersect::{EventTarget, PointerSample, PointerType, Pose};
//! use reticle_pointer::{
//!     NoCaptureHost, Outcome, Pointer, PointerEnv, PointerEventKind, PointerRegistry, Listeners,
//! };
//! use reticle_scene::{LocalNode, Scene};
//!
//! let mut scene = Scene::new();
//! let cube = scene.insert(
//!     scene.root(),
//!     LocalNode::shape(
//!         Shape::Box(Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE)),
//!         Affine3A::IDENTITY,
//!     ),
//! );
//! scene.commit();
//!
//! // Nodes with listeners are tested by default.
//! let clicks = Rc::new(RefCell::new(0));
//! let mut listeners = Listeners::new();
//! let counter = clicks.clone();
//! listeners.add(EventTarget::Node(cube), PointerEventKind::Click, move |_, _| {
//!     *counter.borrow_mut() += 1;
//!     Outcome::Continue
//! });
//!
//! let mut registry = PointerRegistry::new();
//! registry.insert(Pointer::with_intersector(
//!     1,
//!     PointerType::RAY,
//!     RayIntersector::new(RayOptions::default()),
//! ));
//!
//! let mut host = NoCaptureHost;
//! let mut env = PointerEnv::new(&scene, &mut listeners, &mut host);
//! let sample = |ts| PointerSample::at_pose(ts, Pose::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY));
//! registry.move_to(&mut env, 1, &sample(0)).unwrap();
//! registry.down(&mut env, 1, &sample(10));
//! registry.up(&mut env, 1, &sample(60));
//! drop(env);
//!
//! assert_eq!(*clicks.borrow(), 1);
//! assert_eq!(
//!     registry.get(1).and_then(|p| p.intersection()).map(|i| i.target),
//!     Some(EventTarget::Node(cube))
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod batch;
pub mod combined;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod forward;
pub mod listeners;
pub mod pointer;
pub mod registry;
pub mod types;

#[cfg(test)]
mod test_util;

pub use batch::{BatchOptions, BatchedInput, FrameBatcher};
pub use combined::CombinedPointer;
pub use dispatcher::EventSink;
pub use error::{HostCaptureError, IntersectError};
pub use event::{
    Buttons, CaptureRequest, EventControl, EventKinds, PointerEvent, PointerEventBuilder,
    PointerEventKind,
};
pub use forward::{
    ForwardAdapter, ForwardOptions, HostCapture, HostEventKind, HostPointerEvent, NoHostCapture,
};
pub use listeners::{ListenerId, Listeners};
pub use pointer::{NoCaptureHost, Pointer, PointerCaptureHost, PointerCx, PointerOptions};
pub use registry::{PointerEnv, PointerRegistry, SupportsPointerCapture};
pub use types::{Dispatch, NodeKey, Outcome, Phase};
