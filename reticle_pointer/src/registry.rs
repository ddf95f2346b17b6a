// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer registry: live pointers by id, sharing one click state.
//!
//! Hosts that drive several devices keep them here. The registry owns the
//! [`ClickState`] so presses of one pointer can never complete a click that
//! another pointer started. Operations on unknown ids are ignored with a
//! warning.
//!
//! Per-frame collaborators travel in a [`PointerEnv`]; each operation borrows
//! them for the duration of one call and hands them to the addressed pointer.
//! [`FrameBatcher`](crate::batch::FrameBatcher) drives a registry the same way.
//!
//! ```
//! use reticle_intersect::PointerType;
//! use reticle_intersect::intersector::{RayIntersector, RayOptions};
//! use reticle_pointer::{Pointer, PointerRegistry};
//!
//! let mut registry = PointerRegistry::<u32>::new();
//! for id in [1, 2] {
//!     let ray = RayIntersector::new(RayOptions::default());
//!     registry.insert(Pointer::with_intersector(id, PointerType::RAY, ray));
//! }
//! assert_eq!(registry.len(), 2);
//! // Nothing is hovered until a pointer's first move.
//! assert!(registry.get(1).is_some_and(|p| p.intersection().is_none()));
//! ```

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use log::warn;

use reticle_event_state::click::ClickState;
use reticle_intersect::{EventTarget, IntersectError, PointerId, PointerSample, SceneGraph};

use crate::dispatcher::EventSink;
use crate::pointer::{Pointer, PointerCaptureHost, PointerCx};
use crate::types::NodeKey;

/// Scene, sink and host for one batch of registry operations.
pub struct PointerEnv<'a, K> {
    /// Scene to intersect.
    pub scene: &'a dyn SceneGraph<K>,
    /// Listener table receiving events.
    pub sink: &'a mut dyn EventSink<K>,
    /// Capture notifications.
    pub host: &'a mut dyn PointerCaptureHost,
}

impl<'a, K> PointerEnv<'a, K> {
    /// Bundle the collaborators.
    pub fn new(
        scene: &'a dyn SceneGraph<K>,
        sink: &'a mut dyn EventSink<K>,
        host: &'a mut dyn PointerCaptureHost,
    ) -> Self {
        Self { scene, sink, host }
    }
}

impl<K> fmt::Debug for PointerEnv<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerEnv").finish_non_exhaustive()
    }
}

/// Capture control addressed by pointer id.
pub trait SupportsPointerCapture<K> {
    /// Capture `pointer` to `target` as placed in `scene`. Returns `false` if
    /// it could not be captured.
    fn set_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        host: &mut dyn PointerCaptureHost,
        pointer: PointerId,
        target: EventTarget<K>,
    ) -> bool;

    /// Release the capture of `pointer`. Returns `false` if it held none.
    fn release_pointer_capture(
        &mut self,
        host: &mut dyn PointerCaptureHost,
        pointer: PointerId,
    ) -> bool;

    /// Whether `target` holds the capture of `pointer`.
    fn has_pointer_capture(&self, pointer: PointerId, target: EventTarget<K>) -> bool;
}

/// Live pointers keyed by id.
pub struct PointerRegistry<K> {
    pointers: HashMap<PointerId, Pointer<K>>,
    clicks: ClickState<EventTarget<K>>,
}

impl<K: NodeKey> fmt::Debug for PointerRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerRegistry")
            .field("pointers", &self.pointers)
            .finish_non_exhaustive()
    }
}

impl<K: NodeKey> Default for PointerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> PointerRegistry<K> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            pointers: HashMap::new(),
            clicks: ClickState::new(),
        }
    }

    /// Register `pointer`, returning any pointer it replaced.
    pub fn insert(&mut self, pointer: Pointer<K>) -> Option<Pointer<K>> {
        self.pointers.insert(pointer.id(), pointer)
    }

    /// Pointer `id`, creating it with `create` if absent.
    pub fn get_or_insert_with(
        &mut self,
        id: PointerId,
        create: impl FnOnce() -> Pointer<K>,
    ) -> &mut Pointer<K> {
        self.pointers.entry(id).or_insert_with(create)
    }

    /// Pointer `id`.
    pub fn get(&self, id: PointerId) -> Option<&Pointer<K>> {
        self.pointers.get(&id)
    }

    /// Mutable pointer `id`.
    pub fn get_mut(&mut self, id: PointerId) -> Option<&mut Pointer<K>> {
        self.pointers.get_mut(&id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: PointerId) -> bool {
        self.pointers.contains_key(&id)
    }

    /// Registered ids, in no particular order.
    pub fn ids(&self) -> Vec<PointerId> {
        self.pointers.keys().copied().collect()
    }

    /// Number of registered pointers.
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// Whether no pointer is registered.
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Shared click state.
    pub fn clicks(&self) -> &ClickState<EventTarget<K>> {
        &self.clicks
    }

    /// Exit and unregister pointer `id`.
    pub fn remove(
        &mut self,
        env: &mut PointerEnv<'_, K>,
        id: PointerId,
        timestamp: u64,
    ) -> Option<Pointer<K>> {
        self.with_pointer(env, id, |p, cx| p.exit(cx, timestamp))?;
        self.pointers.remove(&id)
    }

    /// Forget click history of a node leaving the scene.
    pub fn forget_target(&mut self, target: EventTarget<K>) {
        self.clicks.forget_target(&target);
    }

    /// Run `f` on pointer `id` with a context built from `env`.
    ///
    /// Returns `None`, with a warning, if `id` is unknown.
    pub fn with_pointer<R>(
        &mut self,
        env: &mut PointerEnv<'_, K>,
        id: PointerId,
        f: impl FnOnce(&mut Pointer<K>, &mut PointerCx<'_, K>) -> R,
    ) -> Option<R> {
        let Some(pointer) = self.pointers.get_mut(&id) else {
            warn!("unknown pointer {id}");
            return None;
        };
        let mut cx = PointerCx {
            scene: env.scene,
            sink: &mut *env.sink,
            clicks: &mut self.clicks,
            host: &mut *env.host,
        };
        Some(f(pointer, &mut cx))
    }

    /// Move pointer `id`.
    pub fn move_to(
        &mut self,
        env: &mut PointerEnv<'_, K>,
        id: PointerId,
        sample: &PointerSample,
    ) -> Result<(), IntersectError> {
        self.with_pointer(env, id, |p, cx| p.move_to(cx, sample))
            .unwrap_or(Ok(()))
    }

    /// Press on pointer `id`.
    pub fn down(&mut self, env: &mut PointerEnv<'_, K>, id: PointerId, sample: &PointerSample) {
        self.with_pointer(env, id, |p, cx| p.down(cx, sample));
    }

    /// Release on pointer `id`.
    pub fn up(&mut self, env: &mut PointerEnv<'_, K>, id: PointerId, sample: &PointerSample) {
        self.with_pointer(env, id, |p, cx| p.up(cx, sample));
    }

    /// Cancel pointer `id`.
    pub fn cancel(&mut self, env: &mut PointerEnv<'_, K>, id: PointerId, sample: &PointerSample) {
        self.with_pointer(env, id, |p, cx| p.cancel(cx, sample));
    }

    /// Wheel on pointer `id`.
    pub fn wheel(
        &mut self,
        env: &mut PointerEnv<'_, K>,
        id: PointerId,
        sample: &PointerSample,
    ) -> Result<(), IntersectError> {
        self.with_pointer(env, id, |p, cx| p.wheel(cx, sample))
            .unwrap_or(Ok(()))
    }

    /// Exit pointer `id` and keep it registered.
    pub fn exit(&mut self, env: &mut PointerEnv<'_, K>, id: PointerId, timestamp: u64) {
        self.with_pointer(env, id, |p, cx| p.exit(cx, timestamp));
    }
}

impl<K: NodeKey> SupportsPointerCapture<K> for PointerRegistry<K> {
    fn set_pointer_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        host: &mut dyn PointerCaptureHost,
        pointer: PointerId,
        target: EventTarget<K>,
    ) -> bool {
        match self.pointers.get_mut(&pointer) {
            Some(p) => p.set_capture(scene, host, target),
            None => {
                warn!("cannot capture unknown pointer {pointer}");
                false
            }
        }
    }

    fn release_pointer_capture(
        &mut self,
        host: &mut dyn PointerCaptureHost,
        pointer: PointerId,
    ) -> bool {
        match self.pointers.get_mut(&pointer) {
            Some(p) => p.release_capture(host),
            None => {
                warn!("cannot release unknown pointer {pointer}");
                false
            }
        }
    }

    fn has_pointer_capture(&self, pointer: PointerId, target: EventTarget<K>) -> bool {
        self.pointers
            .get(&pointer)
            .is_some_and(|p| p.has_capture(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PointerEventKind;
    use crate::listeners::Listeners;
    use crate::pointer::{NoCaptureHost, PointerCaptureHost};
    use crate::test_util::*;
    use glam::Vec3;
    use reticle_intersect::PointerType;
    use reticle_intersect::intersector::{RayIntersector, RayOptions};
    use reticle_intersect::policy::PointerEventsMode;

    #[derive(Default)]
    struct Host {
        started: Vec<PointerId>,
        released: Vec<PointerId>,
    }

    impl PointerCaptureHost for Host {
        fn pointer_capture_started(&mut self, pointer: PointerId) {
            self.started.push(pointer);
        }
        fn pointer_capture_released(&mut self, pointer: PointerId) {
            self.released.push(pointer);
        }
    }

    fn ray(id: PointerId) -> Pointer<u32> {
        let mut p = Pointer::with_intersector(id, PointerType::RAY, RayIntersector::new(RayOptions::default()));
        p.options_mut().default_pointer_events = PointerEventsMode::Auto;
        p
    }

    #[test]
    fn operations_on_unknown_ids_are_ignored() {
        let scene = Boxes::new();
        let mut listeners = Listeners::new();
        let mut host = NoCaptureHost;
        let mut env = PointerEnv::new(&scene, &mut listeners, &mut host);
        let mut registry: PointerRegistry<u32> = PointerRegistry::new();
        assert!(registry.move_to(&mut env, 7, &at(0, 0.0)).is_ok());
        assert!(registry.remove(&mut env, 7, 0).is_none());
        assert!(!registry.set_pointer_capture(&scene, &mut NoCaptureHost, 7, EventTarget::Void));
    }

    #[test]
    fn capture_notifies_host_and_removal_releases() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(&mut listeners, &[EventTarget::Node(a)], &[PointerEventKind::Leave]);
        let mut host = Host::default();
        let mut registry = PointerRegistry::new();
        registry.insert(ray(1));
        registry.insert(ray(2));

        {
            let mut env = PointerEnv::new(&scene, &mut listeners, &mut host);
            registry.move_to(&mut env, 1, &at(0, 0.0)).unwrap();
            registry.move_to(&mut env, 2, &at(0, 0.0)).unwrap();
        }
        assert!(registry.set_pointer_capture(&scene, &mut host, 1, EventTarget::Node(a)));
        assert!(registry.has_pointer_capture(1, EventTarget::Node(a)));
        assert!(!registry.has_pointer_capture(2, EventTarget::Node(a)));

        let mut env = PointerEnv::new(&scene, &mut listeners, &mut host);
        let removed = registry.remove(&mut env, 1, 5);
        assert!(removed.is_some_and(|p| p.capture().is_none()));
        assert_eq!(registry.ids(), [2]);
        drop(env);
        assert_eq!(host.started, [1]);
        assert_eq!(host.released, [1]);
        assert_eq!(log.borrow().len(), 1);
    }
}
