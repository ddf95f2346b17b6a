// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Combined pointer: several probes of one device, one active at a time.
//!
//! A hand may carry a grab sphere, a touch sphere and a ray at once. Only one
//! of them should hover and press at any moment. [`CombinedPointer`] runs a
//! single traversal for all of its members and then enables one:
//!
//! - a member holding a capture or a pressed button keeps priority;
//! - otherwise the member with the best non-void intersection under the
//!   ordering rule wins;
//! - if every member hit the void, the first ready member stays active.
//!
//! The other members are disabled, which emits out and leave for whatever
//! they were hovering.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use log::debug;
use smallvec::SmallVec;

use reticle_intersect::traverse::{TraversalOptions, TraversalPointer, intersect_pointer_targets};
use reticle_intersect::{IntersectError, Intersection, PointerId, PointerSample};

use crate::pointer::{Pointer, PointerCx, SinkListeners};
use crate::types::NodeKey;

/// Group of pointers sharing one traversal and one active member.
pub struct CombinedPointer<K> {
    pointers: Vec<Pointer<K>>,
    traversal: TraversalOptions<K>,
    active: Option<usize>,
}

impl<K: NodeKey> fmt::Debug for CombinedPointer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedPointer")
            .field("pointers", &self.pointers)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<K: NodeKey> CombinedPointer<K> {
    /// Empty group traversing with `traversal`.
    pub fn new(traversal: TraversalOptions<K>) -> Self {
        Self {
            pointers: Vec::new(),
            traversal,
            active: None,
        }
    }

    /// Add a member. Samples passed to [`move_to`](Self::move_to) match members by index.
    pub fn push(&mut self, pointer: Pointer<K>) {
        self.pointers.push(pointer);
    }

    /// Members in insertion order.
    pub fn pointers(&self) -> &[Pointer<K>] {
        &self.pointers
    }

    /// Member with `id`.
    pub fn get_mut(&mut self, id: PointerId) -> Option<&mut Pointer<K>> {
        self.pointers.iter_mut().find(|p| p.id() == id)
    }

    /// Currently active member.
    pub fn active(&self) -> Option<&Pointer<K>> {
        self.pointers.get(self.active?)
    }

    /// Intersect every member with its sample, pick the active member, and commit.
    ///
    /// `samples[i]` belongs to the `i`-th member; extra entries on either side
    /// are ignored. Members whose sample is not ready keep their state.
    pub fn move_to(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        samples: &[PointerSample],
    ) -> Result<(), IntersectError> {
        let n = self.pointers.len().min(samples.len());
        let ready: SmallVec<[bool; 4]> = self
            .pointers
            .iter_mut()
            .zip(samples)
            .map(|(p, s)| p.prepare(s))
            .collect();

        let mut results: SmallVec<[Option<Intersection<K>>; 4]> = (0..n).map(|_| None).collect();
        for (i, pointer) in self.pointers.iter_mut().enumerate().take(n) {
            if ready[i]
                && let Some(replayed) = pointer.replay_capture(cx.scene)
            {
                results[i] = Some(replayed?);
            }
        }

        {
            let lookup = SinkListeners(&*cx.sink);
            let mut participants: SmallVec<[TraversalPointer<'_, K>; 4]> = self
                .pointers
                .iter_mut()
                .enumerate()
                .take(n)
                .filter(|(i, p)| ready[*i] && p.capture().is_none())
                .map(|(_, p)| p.traversal_pointer())
                .collect();
            intersect_pointer_targets(cx.scene, &lookup, &mut participants, &self.traversal);
        }
        for (i, pointer) in self.pointers.iter_mut().enumerate().take(n) {
            if ready[i] && results[i].is_none() {
                results[i] = Some(pointer.finalize(cx.scene));
            }
        }

        let active = self.choose_active(&results);
        if active != self.active {
            debug!(
                "combined pointer switched to {:?}",
                active.map(|i| self.pointers[i].id())
            );
        }
        self.active = active;

        // Disable first so outs and leaves precede the new member's overs.
        for (i, pointer) in self.pointers.iter_mut().enumerate().take(n) {
            if results[i].is_some() && Some(i) != active {
                pointer.set_enabled(cx, false, samples[i].timestamp);
            }
        }
        for (i, pointer) in self.pointers.iter_mut().enumerate().take(n) {
            let Some(intersection) = results[i].take() else {
                continue;
            };
            if Some(i) == active {
                pointer.set_enabled_flag(&mut *cx.host, true);
            }
            pointer.apply_move(cx, Some(intersection), samples[i].timestamp)?;
        }
        Ok(())
    }

    fn choose_active(&self, results: &[Option<Intersection<K>>]) -> Option<usize> {
        let busy = results.iter().enumerate().find(|(i, r)| {
            r.is_some() && {
                let p = &self.pointers[*i];
                p.capture().is_some() || p.is_pressed()
            }
        });
        if let Some((i, _)) = busy {
            return Some(i);
        }
        let mut best: Option<(usize, &Intersection<K>)> = None;
        for (i, hit) in results.iter().enumerate() {
            let Some(hit) = hit.as_ref().filter(|h| !h.is_void()) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, current)) => {
                    self.traversal.sort.compare(&hit.candidate(), &current.candidate())
                        == Ordering::Less
                }
            };
            if better {
                best = Some((i, hit));
            }
        }
        best.map(|(i, _)| i)
            .or_else(|| results.iter().position(Option::is_some))
    }

    /// Press on the active member.
    pub fn down(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if let Some(pointer) = self.active_mut() {
            pointer.down(cx, sample);
        }
    }

    /// Release on the active member.
    pub fn up(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if let Some(pointer) = self.active_mut() {
            pointer.up(cx, sample);
        }
    }

    /// Cancel on the active member.
    pub fn cancel(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if let Some(pointer) = self.active_mut() {
            pointer.cancel(cx, sample);
        }
    }

    /// Wheel on the active member.
    pub fn wheel(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        sample: &PointerSample,
    ) -> Result<(), IntersectError> {
        match self.active_mut() {
            Some(pointer) => pointer.wheel(cx, sample),
            None => Ok(()),
        }
    }

    /// Exit every member.
    pub fn exit(&mut self, cx: &mut PointerCx<'_, K>, timestamp: u64) {
        for pointer in &mut self.pointers {
            pointer.exit(cx, timestamp);
        }
        self.active = None;
    }

    fn active_mut(&mut self) -> Option<&mut Pointer<K>> {
        self.pointers.get_mut(self.active?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PointerEventKind;
    use crate::listeners::Listeners;
    use crate::pointer::NoCaptureHost;
    use crate::test_util::*;
    use glam::{Quat, Vec3};
    use reticle_event_state::click::ClickState;
    use reticle_intersect::intersector::{
        RayIntersector, RayOptions, SphereIntersector, SphereOptions,
    };
    use reticle_intersect::policy::PointerEventsMode;
    use reticle_intersect::{EventTarget, PointerType, Pose};

    fn hand() -> CombinedPointer<u32> {
        let mut combined = CombinedPointer::new(TraversalOptions {
            default_pointer_events: PointerEventsMode::Auto,
            ..TraversalOptions::default()
        });
        combined.push(Pointer::with_intersector(
            1,
            PointerType::GRAB,
            SphereIntersector::new(SphereOptions::default()),
        ));
        combined.push(Pointer::with_intersector(
            2,
            PointerType::RAY,
            RayIntersector::new(RayOptions::default()),
        ));
        combined
    }

    fn pose(x: f32, z: f32) -> PointerSample {
        PointerSample::at_pose(0, Pose::new(Vec3::new(x, 0.0, z), Quat::IDENTITY))
    }

    #[test]
    fn nearest_member_becomes_active() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(&mut listeners, &[EventTarget::Node(a)], &[PointerEventKind::Over]);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
        let mut hand = hand();

        // Far away: the sphere touches nothing, the ray hits the box.
        let far = pose(0.0, 10.0);
        hand.move_to(&mut cx, &[far.clone(), far]).unwrap();
        assert_eq!(hand.active().map(Pointer::id), Some(2));
        assert!(!hand.pointers()[0].is_enabled());

        // The grab sphere touches the box while the ray stays far: the sphere takes over.
        hand.move_to(&mut cx, &[pose(0.0, 0.52), pose(0.0, 10.0)]).unwrap();
        assert_eq!(hand.active().map(Pointer::id), Some(1));
        assert!(!hand.pointers()[1].is_enabled());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn pressed_member_keeps_priority() {
        let mut scene = Boxes::new();
        let _a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
        let mut hand = hand();

        let far = pose(0.0, 10.0);
        hand.move_to(&mut cx, &[far.clone(), far.clone()]).unwrap();
        hand.down(&mut cx, &far);
        assert!(hand.active().is_some_and(Pointer::is_pressed));

        hand.move_to(&mut cx, &[pose(0.0, 0.52), far]).unwrap();
        assert_eq!(hand.active().map(Pointer::id), Some(2));
    }
}
