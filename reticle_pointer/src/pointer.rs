// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer: the per-device state machine.
//!
//! ## Overview
//!
//! A [`Pointer`] owns one [`Intersector`] and turns successive samples into
//! DOM-style events. Each [`move_to`](Pointer::move_to) computes a new
//! intersection (by traversal, or by capture replay while captured) and
//! commits it against the last committed one:
//!
//! 1. `pointerout` on the previous target, if the target changed.
//! 2. `pointerleave` on every previously entered node that is no longer an
//!    ancestor of the new target, leaf → root.
//! 3. `pointerover` on the new target, if it changed.
//! 4. `pointerenter` on every newly entered node, root → leaf.
//! 5. `pointermove` on the current target.
//!
//! Enter and leave use the target-only path; everything else uses capture,
//! target and bubble. Moving twice to the same spot yields two `pointermove`
//! events and nothing else.
//!
//! ## Readiness
//!
//! Until the first successful move, `down`, `up`, `cancel` and `wheel` are
//! queued and replayed in arrival order right after that move commits.
//! `exit` and `cancel` discard the queue instead.
//!
//! ## Clicks
//!
//! Releases go through the shared [`ClickState`]: a release over the node
//! that received the press, by the same pointer, within the click threshold,
//! emits `click` (or `contextmenu` for the context-menu button). Two clicks on
//! the same target within the double-click threshold add a `dblclick`.
//!
//! ## Capture
//!
//! [`Pointer::set_capture`] pins the pointer to a target. While captured,
//! moves replay the capture through the intersector instead of traversing,
//! so a drag keeps reporting the captured target. Capture survives button
//! release and ends on explicit release, `exit`, or disabling the pointer.
//! Handlers request capture through [`EventControl`]; requests are applied
//! once the event has been delivered.

use alloc::boxed::Box;
use core::fmt;
use core::mem;

use glam::Vec3;
use log::{debug, trace};
use smallvec::SmallVec;

use reticle_event_state::click::{
    ClickResult, ClickState, DEFAULT_CLICK_THRESHOLD, DEFAULT_DBL_CLICK_THRESHOLD,
};
use reticle_intersect::order::CustomSort;
use reticle_intersect::policy::PointerEventsMode;
use reticle_intersect::traverse::{
    TraversalOptions, TraversalPointer, intersect_pointer_targets,
};
use reticle_intersect::{
    AncestorChain, Button, Camera, EventTarget, HitSort, IntersectError, Intersection,
    Intersector, ListenerLookup, PointerCapture, PointerId, PointerInfo, PointerSample,
    PointerType, SceneGraph, ancestors,
};

use crate::dispatcher::{EventSink, dispatch};
use crate::event::{
    Buttons, CaptureRequest, EventControl, EventKinds, PointerEventBuilder, PointerEventKind,
};
use crate::types::NodeKey;

/// Host hook notified when a pointer gains or loses capture.
pub trait PointerCaptureHost {
    /// `pointer` is now captured.
    fn pointer_capture_started(&mut self, pointer: PointerId);
    /// `pointer` is no longer captured.
    fn pointer_capture_released(&mut self, pointer: PointerId);
}

/// Host that ignores capture notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCaptureHost;

impl PointerCaptureHost for NoCaptureHost {
    fn pointer_capture_started(&mut self, _pointer: PointerId) {}
    fn pointer_capture_released(&mut self, _pointer: PointerId) {}
}

/// Per-pointer settings.
#[derive(Clone, Copy, Debug)]
pub struct PointerOptions<K> {
    /// Longest press, in milliseconds, that still counts as a click.
    pub click_threshold: u64,
    /// Longest gap, in milliseconds, between the clicks of a double click.
    pub dbl_click_threshold: u64,
    /// Button whose click emits `contextmenu` instead of `click`.
    pub context_menu_button: Option<Button>,
    /// Mode for nodes with no declaring ancestor.
    pub default_pointer_events: PointerEventsMode,
    /// Replacement for the default hit ordering.
    pub custom_sort: Option<CustomSort<K>>,
    /// Deliver wheel events to the last move's intersection instead of
    /// intersecting again with the wheel sample.
    pub wheel_uses_move_intersection: bool,
}

impl<K> Default for PointerOptions<K> {
    fn default() -> Self {
        Self {
            click_threshold: DEFAULT_CLICK_THRESHOLD,
            dbl_click_threshold: DEFAULT_DBL_CLICK_THRESHOLD,
            context_menu_button: Some(2),
            default_pointer_events: PointerEventsMode::Listener,
            custom_sort: None,
            wheel_uses_move_intersection: true,
        }
    }
}

impl<K> PointerOptions<K> {
    /// Traversal settings derived from these options.
    pub fn traversal(&self) -> TraversalOptions<K> {
        TraversalOptions {
            default_pointer_events: self.default_pointer_events,
            sort: self.custom_sort.map_or(HitSort::Default, HitSort::Custom),
        }
    }
}

/// Everything a pointer operation touches besides the pointer itself.
pub struct PointerCx<'a, K> {
    /// Scene to intersect.
    pub scene: &'a dyn SceneGraph<K>,
    /// Listener table receiving events.
    pub sink: &'a mut dyn EventSink<K>,
    /// Click bookkeeping shared by all pointers.
    pub clicks: &'a mut ClickState<EventTarget<K>>,
    /// Capture notifications.
    pub host: &'a mut dyn PointerCaptureHost,
}

impl<'a, K> PointerCx<'a, K> {
    /// Bundle the collaborators of a pointer operation.
    pub fn new(
        scene: &'a dyn SceneGraph<K>,
        sink: &'a mut dyn EventSink<K>,
        clicks: &'a mut ClickState<EventTarget<K>>,
        host: &'a mut dyn PointerCaptureHost,
    ) -> Self {
        Self {
            scene,
            sink,
            clicks,
            host,
        }
    }
}

impl<K> fmt::Debug for PointerCx<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerCx").finish_non_exhaustive()
    }
}

/// Lets traversal ask an [`EventSink`] whether a node listens to anything.
pub(crate) struct SinkListeners<'a, K>(pub(crate) &'a dyn EventSink<K>);

impl<K: Copy> ListenerLookup<K> for SinkListeners<'_, K> {
    fn has_listener(&self, node: K) -> bool {
        EventSink::has_listener(self.0, EventTarget::Node(node), EventKinds::all())
    }
}

#[derive(Clone, Debug)]
enum Deferred {
    Down(PointerSample),
    Up(PointerSample),
    Wheel(PointerSample),
}

/// Per-device pointer state machine.
pub struct Pointer<K> {
    info: PointerInfo,
    intersector: Box<dyn Intersector<K>>,
    options: PointerOptions<K>,
    enabled: bool,
    prev_enabled: bool,
    intersection: Option<Intersection<K>>,
    prev_intersection: Option<Intersection<K>>,
    wheel_intersection: Option<Intersection<K>>,
    entered: AncestorChain<K>,
    capture: Option<PointerCapture<K>>,
    pressed: SmallVec<[Button; 4]>,
    was_moved: bool,
    camera: Option<Camera>,
    deferred: SmallVec<[Deferred; 4]>,
}

impl<K: NodeKey> fmt::Debug for Pointer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("info", &self.info)
            .field("kind", &self.intersector.kind())
            .field("enabled", &self.enabled)
            .field("target", &self.intersection.as_ref().map(|i| i.target))
            .field("capture", &self.capture.as_ref().map(|c| c.target))
            .field("pressed", &self.pressed)
            .field("was_moved", &self.was_moved)
            .finish_non_exhaustive()
    }
}

impl<K: NodeKey> Pointer<K> {
    /// Create a pointer around a boxed intersector.
    pub fn new(
        info: PointerInfo,
        intersector: Box<dyn Intersector<K>>,
        options: PointerOptions<K>,
    ) -> Self {
        Self {
            info,
            intersector,
            options,
            enabled: true,
            prev_enabled: true,
            intersection: None,
            prev_intersection: None,
            wheel_intersection: None,
            entered: AncestorChain::new(),
            capture: None,
            pressed: SmallVec::new(),
            was_moved: false,
            camera: None,
            deferred: SmallVec::new(),
        }
    }

    /// Create a pointer with default options.
    pub fn with_intersector(
        id: PointerId,
        pointer_type: PointerType,
        intersector: impl Intersector<K> + 'static,
    ) -> Self {
        Self::new(
            PointerInfo::new(id, pointer_type),
            Box::new(intersector),
            PointerOptions::default(),
        )
    }

    /// Pointer id.
    pub fn id(&self) -> PointerId {
        self.info.id
    }

    /// Identity and custom state.
    pub fn info(&self) -> &PointerInfo {
        &self.info
    }

    /// Mutable identity and custom state.
    pub fn info_mut(&mut self) -> &mut PointerInfo {
        &mut self.info
    }

    /// The intersector.
    pub fn intersector(&self) -> &dyn Intersector<K> {
        &*self.intersector
    }

    /// The intersector, for reconfiguration.
    pub fn intersector_mut(&mut self) -> &mut dyn Intersector<K> {
        &mut *self.intersector
    }

    /// Settings.
    pub fn options(&self) -> &PointerOptions<K> {
        &self.options
    }

    /// Mutable settings.
    pub fn options_mut(&mut self) -> &mut PointerOptions<K> {
        &mut self.options
    }

    /// Whether the pointer takes part in hover and dispatch.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Latest computed intersection, committed or not.
    pub fn intersection(&self) -> Option<&Intersection<K>> {
        self.intersection.as_ref()
    }

    /// Intersection used by the last wheel event.
    pub fn wheel_intersection(&self) -> Option<&Intersection<K>> {
        self.wheel_intersection.as_ref()
    }

    /// Nodes the pointer is currently inside, leaf → root.
    pub fn entered(&self) -> &[EventTarget<K>] {
        &self.entered
    }

    /// Current capture, if any.
    pub fn capture(&self) -> Option<&PointerCapture<K>> {
        self.capture.as_ref()
    }

    /// Whether `target` holds this pointer's capture.
    pub fn has_capture(&self, target: EventTarget<K>) -> bool {
        self.capture.as_ref().is_some_and(|c| c.target == target)
    }

    /// Buttons currently held.
    pub fn buttons(&self) -> Buttons {
        self.pressed
            .iter()
            .fold(Buttons::empty(), |acc, b| acc | Buttons::from_button(*b))
    }

    /// Whether any button is held.
    pub fn is_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }

    /// Whether a move has committed since creation or the last exit.
    pub fn was_moved(&self) -> bool {
        self.was_moved
    }

    /// Camera of the last sample that carried one.
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Number of inputs waiting for the first move.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Intersect `sample` and commit the result.
    ///
    /// Does nothing when the intersector is not ready for `sample`. The first
    /// committed move replays queued inputs.
    pub fn move_to(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        sample: &PointerSample,
    ) -> Result<(), IntersectError> {
        self.observe(sample);
        match self.compute_intersection(cx, sample)? {
            Some(intersection) => self.apply_move(cx, Some(intersection), sample.timestamp),
            None => {
                trace!(
                    "pointer {}: sample at {} not ready, move dropped",
                    self.info.id, sample.timestamp
                );
                Ok(())
            }
        }
    }

    /// Emit `pointermove` on the current intersection without intersecting.
    ///
    /// Used for moves a frame batcher skipped.
    pub fn notify_move(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if !self.was_moved || !self.enabled {
            return;
        }
        self.observe(sample);
        if let Some(hit) = self.intersection.clone() {
            self.emit(cx, PointerEventKind::Move, &hit, 0, sample.timestamp, Vec3::ZERO);
        }
    }

    /// Press `sample.button`.
    pub fn down(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if !self.was_moved {
            self.deferred.push(Deferred::Down(sample.clone()));
            return;
        }
        self.observe(sample);
        let button = sample.button;
        if !self.pressed.contains(&button) {
            self.pressed.push(button);
        }
        let Some(hit) = self.active_intersection() else {
            return;
        };
        cx.clicks
            .on_down(self.info.id, button, hit.target, sample.timestamp);
        self.emit(cx, PointerEventKind::Down, &hit, button, sample.timestamp, Vec3::ZERO);
    }

    /// Release `sample.button`. A release without a prior press is ignored.
    pub fn up(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if !self.was_moved {
            self.deferred.push(Deferred::Up(sample.clone()));
            return;
        }
        self.observe(sample);
        let button = sample.button;
        let Some(index) = self.pressed.iter().position(|b| *b == button) else {
            trace!("pointer {}: release of button {button} without press", self.info.id);
            return;
        };
        self.pressed.remove(index);
        let Some(hit) = self.active_intersection() else {
            return;
        };
        let ts = sample.timestamp;
        let clicked = cx.clicks.on_up(
            self.info.id,
            button,
            &hit.target,
            ts,
            self.options.click_threshold,
        ) == ClickResult::Click;
        self.emit(cx, PointerEventKind::Up, &hit, button, ts, Vec3::ZERO);
        if !clicked {
            return;
        }
        if self.options.context_menu_button == Some(button) {
            self.emit(cx, PointerEventKind::ContextMenu, &hit, button, ts, Vec3::ZERO);
            return;
        }
        self.emit(cx, PointerEventKind::Click, &hit, button, ts, Vec3::ZERO);
        if cx
            .clicks
            .register_click(&hit.target, button, ts, self.options.dbl_click_threshold)
        {
            self.emit(cx, PointerEventKind::DblClick, &hit, button, ts, Vec3::ZERO);
        }
    }

    /// Abort the current gesture: all buttons are released without clicks.
    pub fn cancel(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if !self.was_moved {
            if !self.deferred.is_empty() {
                trace!(
                    "pointer {}: cancel discards {} queued inputs",
                    self.info.id,
                    self.deferred.len()
                );
            }
            self.deferred.clear();
            return;
        }
        self.observe(sample);
        self.pressed.clear();
        cx.clicks.cancel(self.info.id);
        if let Some(hit) = self.active_intersection() {
            self.emit(cx, PointerEventKind::Cancel, &hit, 0, sample.timestamp, Vec3::ZERO);
        }
    }

    /// Deliver a wheel event carrying `sample.wheel_delta`.
    pub fn wheel(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        sample: &PointerSample,
    ) -> Result<(), IntersectError> {
        if !self.was_moved {
            self.deferred.push(Deferred::Wheel(sample.clone()));
            return Ok(());
        }
        self.observe(sample);
        let hit = if self.options.wheel_uses_move_intersection {
            self.intersection.clone()
        } else {
            self.compute_intersection(cx, sample)?
        };
        let Some(hit) = hit else {
            return Ok(());
        };
        self.wheel_intersection = Some(hit.clone());
        if self.enabled {
            self.emit(
                cx,
                PointerEventKind::Wheel,
                &hit,
                0,
                sample.timestamp,
                sample.wheel_delta,
            );
        }
        Ok(())
    }

    /// Emit `wheel` on the last wheel intersection without intersecting.
    pub fn notify_wheel(&mut self, cx: &mut PointerCx<'_, K>, sample: &PointerSample) {
        if !self.was_moved || !self.enabled {
            return;
        }
        self.observe(sample);
        let hit = self
            .wheel_intersection
            .clone()
            .or_else(|| self.intersection.clone());
        if let Some(hit) = hit {
            self.emit(
                cx,
                PointerEventKind::Wheel,
                &hit,
                0,
                sample.timestamp,
                sample.wheel_delta,
            );
        }
    }

    /// The device left: release capture, leave everything, and forget presses.
    ///
    /// The pointer becomes not-ready again until its next move.
    pub fn exit(&mut self, cx: &mut PointerCx<'_, K>, timestamp: u64) {
        self.deferred.clear();
        if !self.was_moved {
            return;
        }
        debug!("pointer {} exited", self.info.id);
        self.release_capture(&mut *cx.host);
        self.intersection = None;
        self.wheel_intersection = None;
        self.commit(cx, false, timestamp);
        self.pressed.clear();
        cx.clicks.cancel(self.info.id);
        self.was_moved = false;
    }

    /// Enable or disable the pointer.
    ///
    /// Disabling releases capture and emits out and leave for the current
    /// target; enabling emits over and enter for it again.
    pub fn set_enabled(&mut self, cx: &mut PointerCx<'_, K>, enabled: bool, timestamp: u64) {
        if !self.set_enabled_flag(&mut *cx.host, enabled) {
            return;
        }
        if self.was_moved {
            self.commit(cx, false, timestamp);
        }
    }

    /// Capture the pointer to `target`, replacing any previous capture.
    ///
    /// Fails when the pointer is disabled or has no intersection yet. The hit
    /// face is anchored to `target` as currently placed in `scene`.
    pub fn set_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
        host: &mut dyn PointerCaptureHost,
        target: EventTarget<K>,
    ) -> bool {
        let Some(intersection) = self.active_intersection() else {
            debug!(
                "pointer {}: capture by {target:?} refused, no active intersection",
                self.info.id
            );
            return false;
        };
        self.release_capture(host);
        debug!("pointer {} captured by {target:?}", self.info.id);
        self.capture = Some(PointerCapture::new(scene, target, intersection));
        host.pointer_capture_started(self.info.id);
        true
    }

    /// Release the capture. Returns `false` if there was none.
    pub fn release_capture(&mut self, host: &mut dyn PointerCaptureHost) -> bool {
        let Some(capture) = self.capture.take() else {
            return false;
        };
        debug!("pointer {} released from {:?}", self.info.id, capture.target);
        host.pointer_capture_released(self.info.id);
        true
    }

    fn observe(&mut self, sample: &PointerSample) {
        if let Some(camera) = sample.camera {
            self.camera = Some(camera);
        }
    }

    fn active_intersection(&self) -> Option<Intersection<K>> {
        if self.enabled {
            self.intersection.clone()
        } else {
            None
        }
    }

    /// Prepare the intersector for `sample`. Returns `false` if not ready.
    pub(crate) fn prepare(&mut self, sample: &PointerSample) -> bool {
        self.observe(sample);
        self.intersector.prepare_intersection(sample)
    }

    /// Replay the capture against the prepared probe, if captured.
    pub(crate) fn replay_capture(
        &mut self,
        scene: &dyn SceneGraph<K>,
    ) -> Option<Result<Intersection<K>, IntersectError>> {
        let capture = self.capture.as_ref()?;
        Some(self.intersector.intersect_pointer_capture(scene, capture))
    }

    pub(crate) fn traversal_pointer(&mut self) -> TraversalPointer<'_, K> {
        TraversalPointer {
            info: &self.info,
            intersector: &mut *self.intersector,
        }
    }

    pub(crate) fn finalize(&mut self, scene: &dyn SceneGraph<K>) -> Intersection<K> {
        self.intersector.finalize_intersection(scene)
    }

    /// Flip the enabled flag without committing. Returns `true` if it changed.
    pub(crate) fn set_enabled_flag(
        &mut self,
        host: &mut dyn PointerCaptureHost,
        enabled: bool,
    ) -> bool {
        if self.enabled == enabled {
            return false;
        }
        debug!(
            "pointer {} {}",
            self.info.id,
            if enabled { "enabled" } else { "disabled" }
        );
        self.enabled = enabled;
        if !enabled {
            self.release_capture(host);
        }
        true
    }

    fn compute_intersection(
        &mut self,
        cx: &PointerCx<'_, K>,
        sample: &PointerSample,
    ) -> Result<Option<Intersection<K>>, IntersectError> {
        if !self.intersector.prepare_intersection(sample) {
            return Ok(None);
        }
        if let Some(replayed) = self.replay_capture(cx.scene) {
            return replayed.map(Some);
        }
        let traversal = self.options.traversal();
        let lookup = SinkListeners(&*cx.sink);
        intersect_pointer_targets(
            cx.scene,
            &lookup,
            &mut [self.traversal_pointer()],
            &traversal,
        );
        Ok(Some(self.finalize(cx.scene)))
    }

    /// Store `intersection`, commit it with a move event, and flush the queue.
    pub(crate) fn apply_move(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        intersection: Option<Intersection<K>>,
        timestamp: u64,
    ) -> Result<(), IntersectError> {
        self.intersection = intersection;
        self.commit(cx, true, timestamp);
        if self.was_moved {
            return Ok(());
        }
        self.was_moved = true;
        let deferred = mem::take(&mut self.deferred);
        if !deferred.is_empty() {
            trace!(
                "pointer {}: replaying {} queued inputs",
                self.info.id,
                deferred.len()
            );
        }
        for input in deferred {
            match input {
                Deferred::Down(s) => self.down(cx, &s),
                Deferred::Up(s) => self.up(cx, &s),
                Deferred::Wheel(s) => self.wheel(cx, &s)?,
            }
        }
        Ok(())
    }

    /// Diff the current intersection against the last committed one.
    fn commit(&mut self, cx: &mut PointerCx<'_, K>, emit_move: bool, timestamp: u64) {
        let current = self.active_intersection();
        let previous = if self.prev_enabled {
            self.prev_intersection.clone()
        } else {
            None
        };
        let current_target = current.as_ref().map(|i| i.target);
        let previous_target = previous.as_ref().map(|i| i.target);
        let changed = current_target != previous_target;

        let new_chain = match current_target {
            Some(target) => ancestors(cx.scene, target),
            None => AncestorChain::new(),
        };
        let old_chain = mem::take(&mut self.entered);

        if changed && let Some(prev) = &previous {
            self.emit(cx, PointerEventKind::Out, prev, 0, timestamp, Vec3::ZERO);
        }
        if let Some(basis) = previous.as_ref().or(current.as_ref()) {
            for &node in old_chain.iter().filter(|n| !new_chain.contains(n)) {
                self.emit_to(cx, PointerEventKind::Leave, node, basis, timestamp);
            }
        }
        if let Some(cur) = &current {
            if changed {
                self.emit(cx, PointerEventKind::Over, cur, 0, timestamp, Vec3::ZERO);
            }
            for &node in new_chain.iter().rev().filter(|n| !old_chain.contains(n)) {
                self.emit_to(cx, PointerEventKind::Enter, node, cur, timestamp);
            }
            if emit_move {
                self.emit(cx, PointerEventKind::Move, cur, 0, timestamp, Vec3::ZERO);
            }
        }

        self.entered = new_chain;
        self.prev_intersection = self.intersection.clone();
        self.prev_enabled = self.enabled;
    }

    fn emit(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        kind: PointerEventKind,
        hit: &Intersection<K>,
        button: Button,
        timestamp: u64,
        wheel_delta: Vec3,
    ) {
        self.deliver(cx, kind, hit.target, hit, button, timestamp, wheel_delta);
    }

    fn emit_to(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        kind: PointerEventKind,
        target: EventTarget<K>,
        hit: &Intersection<K>,
        timestamp: u64,
    ) {
        self.deliver(cx, kind, target, hit, 0, timestamp, Vec3::ZERO);
    }

    fn deliver(
        &mut self,
        cx: &mut PointerCx<'_, K>,
        kind: PointerEventKind,
        target: EventTarget<K>,
        hit: &Intersection<K>,
        button: Button,
        timestamp: u64,
        wheel_delta: Vec3,
    ) {
        let chain = ancestors(cx.scene, target);
        let listening = if kind.bubbles() {
            chain
                .iter()
                .any(|t| EventSink::has_listener(&*cx.sink, *t, kind.flag()))
        } else {
            EventSink::has_listener(&*cx.sink, target, kind.flag())
        };
        if !listening {
            return;
        }
        let event = PointerEventBuilder::new(kind, &self.info, hit)
            .target(target)
            .camera(self.camera)
            .button(button)
            .buttons(self.buttons())
            .timestamp(timestamp)
            .wheel_delta(wheel_delta)
            .capture(self.capture.as_ref().map(|c| &c.intersection))
            .build();
        let mut control = EventControl::new(target);
        if let Some(step) = dispatch(&mut *cx.sink, &chain, &event, &mut control) {
            trace!("{kind} stopped at {:?} ({:?})", step.target, step.phase);
        }
        match control.take_capture_request() {
            Some(CaptureRequest::Set(capture_target)) => {
                self.set_capture(cx.scene, &mut *cx.host, capture_target);
            }
            Some(CaptureRequest::Release) => {
                self.release_capture(&mut *cx.host);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::Listeners;
    use crate::test_util::*;
    use crate::types::Outcome;
    use alloc::vec::Vec;
    use reticle_intersect::intersector::{RayIntersector, RayOptions};

    fn ray_pointer() -> Pointer<u32> {
        let mut p = Pointer::with_intersector(
            1,
            PointerType::RAY,
            RayIntersector::new(RayOptions::default()),
        );
        p.options_mut().default_pointer_events = PointerEventsMode::Auto;
        p
    }

    fn node(n: u32) -> EventTarget<u32> {
        EventTarget::Node(n)
    }

    const HOVER: [PointerEventKind; 5] = [
        PointerEventKind::Over,
        PointerEventKind::Enter,
        PointerEventKind::Move,
        PointerEventKind::Out,
        PointerEventKind::Leave,
    ];

    #[test]
    fn enter_and_leave_follow_the_ancestor_chain() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        // Nested box sits slightly in front of its parent.
        let b = scene.add(a, Vec3::new(0.0, 0.0, 0.25));
        let c = scene.add(0, Vec3::new(5.0, 0.0, 0.0));
        let mut listeners = Listeners::new();
        let log = record(&mut listeners, &[node(a), node(b), node(c)], &HOVER);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        assert_eq!(
            *log.borrow(),
            ["pointerover@Node(2)", "pointerenter@Node(1)", "pointerenter@Node(2)", "pointermove@Node(2)"]
        );
        log.borrow_mut().clear();

        pointer.move_to(&mut cx, &at(1, 5.0)).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                "pointerout@Node(2)",
                "pointerleave@Node(2)",
                "pointerleave@Node(1)",
                "pointerover@Node(3)",
                "pointerenter@Node(3)",
                "pointermove@Node(3)",
            ]
        );
        assert_eq!(pointer.entered(), &[node(c), node(0)]);
        assert!(!pointer.entered().contains(&node(b)));
    }

    #[test]
    fn inputs_before_first_move_are_replayed() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(
            &mut listeners,
            &[node(a)],
            &[PointerEventKind::Move, PointerEventKind::Down, PointerEventKind::Up],
        );
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.down(&mut cx, &PointerSample::new(0));
        pointer.up(&mut cx, &PointerSample::new(1));
        assert!(log.borrow().is_empty());
        assert_eq!(pointer.deferred_len(), 2);

        // A sample without a pose is not ready for a ray.
        pointer.move_to(&mut cx, &PointerSample::new(2)).unwrap();
        assert!(!pointer.was_moved());

        pointer.move_to(&mut cx, &at(3, 0.0)).unwrap();
        assert_eq!(
            *log.borrow(),
            ["pointermove@Node(1)", "pointerdown@Node(1)", "pointerup@Node(1)"]
        );
        assert_eq!(pointer.deferred_len(), 0);
    }

    #[test]
    fn handler_capture_request_is_applied() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let b = scene.add(0, Vec3::new(5.0, 0.0, 0.0));
        let mut listeners = Listeners::new();
        listeners.add(node(a), PointerEventKind::Down, |_, c| {
            c.set_pointer_capture(c.current_target());
            Outcome::Continue
        });
        let log = record(&mut listeners, &[node(a), node(b)], &[PointerEventKind::Move]);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        pointer.down(&mut cx, &at(1, 0.0));
        assert!(pointer.has_capture(node(a)));

        pointer.move_to(&mut cx, &at(2, 5.0)).unwrap();
        assert_eq!(pointer.intersection().map(|i| i.target), Some(node(a)));

        // Capture outlives the release.
        pointer.up(&mut cx, &at(3, 5.0));
        assert!(pointer.has_capture(node(a)));

        assert!(pointer.release_capture(&mut NoCaptureHost));
        pointer.move_to(&mut cx, &at(4, 5.0)).unwrap();
        let moves: Vec<_> = log.borrow().clone();
        assert_eq!(
            moves,
            ["pointermove@Node(1)", "pointermove@Node(1)", "pointermove@Node(2)"]
        );
    }

    #[test]
    fn disabling_leaves_and_enabling_reenters() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(&mut listeners, &[node(a)], &HOVER);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        log.borrow_mut().clear();

        pointer.set_enabled(&mut cx, false, 1);
        assert_eq!(*log.borrow(), ["pointerout@Node(1)", "pointerleave@Node(1)"]);
        log.borrow_mut().clear();

        // Disabled pointers stay silent.
        pointer.move_to(&mut cx, &at(2, 0.0)).unwrap();
        assert!(log.borrow().is_empty());

        pointer.set_enabled(&mut cx, true, 3);
        assert_eq!(*log.borrow(), ["pointerover@Node(1)", "pointerenter@Node(1)"]);
    }

    #[test]
    fn exit_resets_readiness() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(&mut listeners, &[node(a)], &HOVER);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        pointer.down(&mut cx, &at(1, 0.0));
        log.borrow_mut().clear();

        pointer.exit(&mut cx, 2);
        assert_eq!(*log.borrow(), ["pointerout@Node(1)", "pointerleave@Node(1)"]);
        assert!(!pointer.was_moved());
        assert!(!pointer.is_pressed());
        assert!(!cx.clicks.is_pressed(1));

        // Queued again until the next move.
        pointer.down(&mut cx, &at(3, 0.0));
        assert_eq!(pointer.deferred_len(), 1);
    }

    #[test]
    fn wheel_reuses_the_hover_target_unless_asked_to_intersect() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let b = scene.add(0, Vec3::new(5.0, 0.0, 0.0));
        let mut listeners = Listeners::new();
        let wheels = record_wheel(&mut listeners, &[node(a), node(b)]);
        let hover = record(&mut listeners, &[node(a), node(b)], &[PointerEventKind::Over]);
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        // Pointed at B, but the cheap path reports the hovered A.
        pointer.wheel(&mut cx, &wheel_at(1, 5.0, 1.0)).unwrap();
        assert_eq!(pointer.wheel_intersection().map(|i| i.target), Some(node(a)));

        pointer.options_mut().wheel_uses_move_intersection = false;
        pointer.wheel(&mut cx, &wheel_at(2, 5.0, 2.0)).unwrap();
        assert_eq!(pointer.wheel_intersection().map(|i| i.target), Some(node(b)));
        // Hover is untouched by the wheel's own intersection.
        assert_eq!(pointer.intersection().map(|i| i.target), Some(node(a)));

        // Skipped wheels go to the last wheel target without intersecting.
        pointer.notify_wheel(&mut cx, &wheel_at(3, 0.0, 3.0));
        assert_eq!(*wheels.borrow(), ["Node(1):1", "Node(2):2", "Node(2):3"]);
        assert_eq!(*hover.borrow(), ["pointerover@Node(1)"]);
    }

    #[test]
    fn secondary_button_opens_context_menu_instead_of_clicking() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(
            &mut listeners,
            &[node(a)],
            &[
                PointerEventKind::Down,
                PointerEventKind::Up,
                PointerEventKind::Click,
                PointerEventKind::ContextMenu,
            ],
        );
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        pointer.down(&mut cx, &at(10, 0.0).with_button(2));
        pointer.up(&mut cx, &at(20, 0.0).with_button(2));
        assert_eq!(
            *log.borrow(),
            ["pointerdown@Node(1)", "pointerup@Node(1)", "contextmenu@Node(1)"]
        );
        log.borrow_mut().clear();

        pointer.down(&mut cx, &at(1000, 0.0));
        pointer.up(&mut cx, &at(1010, 0.0));
        assert_eq!(
            *log.borrow(),
            ["pointerdown@Node(1)", "pointerup@Node(1)", "click@Node(1)"]
        );
    }

    #[test]
    fn cancel_emits_pointercancel_and_forgets_the_press() {
        let mut scene = Boxes::new();
        let a = scene.add(0, Vec3::ZERO);
        let mut listeners = Listeners::new();
        let log = record(
            &mut listeners,
            &[node(a)],
            &[
                PointerEventKind::Down,
                PointerEventKind::Up,
                PointerEventKind::Cancel,
                PointerEventKind::Click,
            ],
        );
        let mut clicks = ClickState::new();
        let mut host = NoCaptureHost;
        let mut pointer = ray_pointer();
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

        pointer.move_to(&mut cx, &at(0, 0.0)).unwrap();
        pointer.down(&mut cx, &at(10, 0.0));
        pointer.cancel(&mut cx, &at(20, 0.0));
        assert!(!pointer.is_pressed());
        assert!(!cx.clicks.is_pressed(1));
        // The release after a cancel has no press to pair with.
        pointer.up(&mut cx, &at(30, 0.0));
        assert_eq!(*log.borrow(), ["pointerdown@Node(1)", "pointercancel@Node(1)"]);
    }
}
