// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer event values.
//!
//! Events are immutable once built. Handlers receive the event by shared
//! reference together with a mutable [`EventControl`], through which they
//! prevent defaults and request or release pointer capture.

use core::fmt;
use core::str::FromStr;

use glam::Vec3;
use reticle_intersect::{Button, Camera, EventTarget, Intersection, PointerInfo};

use crate::types::Phase;

/// The pointer event types, named after their DOM counterparts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// `pointerover`: the pointer moved onto a target.
    Over,
    /// `pointerenter`: the pointer entered a target or one of its descendants.
    Enter,
    /// `pointermove`.
    Move,
    /// `pointerdown`.
    Down,
    /// `pointerup`.
    Up,
    /// `pointerout`: the pointer moved off a target.
    Out,
    /// `pointerleave`: the pointer left a target and all its descendants.
    Leave,
    /// `pointercancel`.
    Cancel,
    /// `click`.
    Click,
    /// `dblclick`.
    DblClick,
    /// `contextmenu`.
    ContextMenu,
    /// `wheel`.
    Wheel,
}

impl PointerEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Over,
        Self::Enter,
        Self::Move,
        Self::Down,
        Self::Up,
        Self::Out,
        Self::Leave,
        Self::Cancel,
        Self::Click,
        Self::DblClick,
        Self::ContextMenu,
        Self::Wheel,
    ];

    /// DOM event type name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Over => "pointerover",
            Self::Enter => "pointerenter",
            Self::Move => "pointermove",
            Self::Down => "pointerdown",
            Self::Up => "pointerup",
            Self::Out => "pointerout",
            Self::Leave => "pointerleave",
            Self::Cancel => "pointercancel",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::ContextMenu => "contextmenu",
            Self::Wheel => "wheel",
        }
    }

    /// Whether the event runs capture and bubble phases. Enter and leave target only.
    pub const fn bubbles(&self) -> bool {
        !matches!(self, Self::Enter | Self::Leave)
    }

    /// Single-kind flag set.
    pub const fn flag(&self) -> EventKinds {
        match self {
            Self::Over => EventKinds::OVER,
            Self::Enter => EventKinds::ENTER,
            Self::Move => EventKinds::MOVE,
            Self::Down => EventKinds::DOWN,
            Self::Up => EventKinds::UP,
            Self::Out => EventKinds::OUT,
            Self::Leave => EventKinds::LEAVE,
            Self::Cancel => EventKinds::CANCEL,
            Self::Click => EventKinds::CLICK,
            Self::DblClick => EventKinds::DBL_CLICK,
            Self::ContextMenu => EventKinds::CONTEXT_MENU,
            Self::Wheel => EventKinds::WHEEL,
        }
    }
}

impl fmt::Display for PointerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown event type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown pointer event type")]
pub struct UnknownEventKind;

impl FromStr for PointerEventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(UnknownEventKind)
    }
}

bitflags::bitflags! {
    /// A set of event kinds, used for listener queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventKinds: u16 {
        /// `pointerover`.
        const OVER         = 1 << 0;
        /// `pointerenter`.
        const ENTER        = 1 << 1;
        /// `pointermove`.
        const MOVE         = 1 << 2;
        /// `pointerdown`.
        const DOWN         = 1 << 3;
        /// `pointerup`.
        const UP           = 1 << 4;
        /// `pointerout`.
        const OUT          = 1 << 5;
        /// `pointerleave`.
        const LEAVE        = 1 << 6;
        /// `pointercancel`.
        const CANCEL       = 1 << 7;
        /// `click`.
        const CLICK        = 1 << 8;
        /// `dblclick`.
        const DBL_CLICK    = 1 << 9;
        /// `contextmenu`.
        const CONTEXT_MENU = 1 << 10;
        /// `wheel`.
        const WHEEL        = 1 << 11;
    }
}

impl From<PointerEventKind> for EventKinds {
    fn from(kind: PointerEventKind) -> Self {
        kind.flag()
    }
}

bitflags::bitflags! {
    /// Pressed buttons as a DOM `buttons` mask.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        /// Button 0.
        const PRIMARY   = 1;
        /// Button 2.
        const SECONDARY = 1 << 1;
        /// Button 1.
        const AUXILIARY = 1 << 2;
        /// Button 3.
        const BACK      = 1 << 3;
        /// Button 4.
        const FORWARD   = 1 << 4;
    }
}

impl Buttons {
    /// Mask bit for a DOM button code. Codes above 15 have no bit.
    pub fn from_button(button: Button) -> Self {
        match button {
            0 => Self::PRIMARY,
            1 => Self::AUXILIARY,
            2 => Self::SECONDARY,
            3 => Self::BACK,
            4 => Self::FORWARD,
            n if n < 16 => Self::from_bits_retain(1 << n),
            _ => Self::empty(),
        }
    }
}

/// One synthesized pointer event.
#[derive(Clone, Debug)]
pub struct PointerEvent<K> {
    kind: PointerEventKind,
    target: EventTarget<K>,
    pointer: PointerInfo,
    intersection: Intersection<K>,
    camera: Option<Camera>,
    button: Button,
    buttons: Buttons,
    timestamp: u64,
    wheel_delta: Vec3,
    capture: Option<Intersection<K>>,
}

impl<K: Copy> PointerEvent<K> {
    /// Event kind.
    pub fn kind(&self) -> PointerEventKind {
        self.kind
    }

    /// Target the event is dispatched to.
    ///
    /// For enter and leave this is the entered or left ancestor; otherwise it
    /// is the hit target.
    pub fn target(&self) -> EventTarget<K> {
        self.target
    }

    /// Originating pointer.
    pub fn pointer(&self) -> &PointerInfo {
        &self.pointer
    }

    /// Intersection the event was derived from.
    pub fn intersection(&self) -> &Intersection<K> {
        &self.intersection
    }

    /// Camera the pointer was observed through, if any.
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Button that changed state, for down, up, click, and context menu.
    pub fn button(&self) -> Button {
        self.button
    }

    /// Buttons held when the event was built.
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    /// Timestamp in milliseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Wheel delta; zero for non-wheel events.
    pub fn wheel_delta(&self) -> Vec3 {
        self.wheel_delta
    }

    /// Intersection recorded when the active capture was taken.
    ///
    /// Drag handlers compare it with [`PointerEvent::intersection`] to get a
    /// continuous offset.
    pub fn capture_intersection(&self) -> Option<&Intersection<K>> {
        self.capture.as_ref()
    }

    /// Whether the pointer holds a capture.
    pub fn is_captured(&self) -> bool {
        self.capture.is_some()
    }
}

/// Builds an immutable [`PointerEvent`].
///
/// ```
/// use glam::{Quat, Vec3};
/// use reticle_intersect::{Intersection, IntersectionDetails, PointerInfo, PointerType, Pose};
/// use reticle_pointer::event::{Buttons, PointerEventBuilder, PointerEventKind};
///
/// let hit: Intersection<u32> = Intersection::void(Vec3::ZERO, Pose::IDENTITY, IntersectionDetails::Ray);
/// let info = PointerInfo::new(7, PointerType::RAY);
/// let ev = PointerEventBuilder::new(PointerEventKind::Down, &info, &hit)
///     .button(0)
///     .buttons(Buttons::PRIMARY)
///     .timestamp(16)
///     .build();
/// assert_eq!(ev.kind().as_str(), "pointerdown");
/// assert_eq!(ev.pointer().id, 7);
/// assert!(ev.target().is_void());
/// ```
#[derive(Clone, Debug)]
pub struct PointerEventBuilder<K> {
    event: PointerEvent<K>,
}

impl<K: Copy> PointerEventBuilder<K> {
    /// Start an event of `kind` for `pointer` at `intersection`, targeting the hit target.
    pub fn new(kind: PointerEventKind, pointer: &PointerInfo, intersection: &Intersection<K>) -> Self {
        Self {
            event: PointerEvent {
                kind,
                target: intersection.target,
                pointer: pointer.clone(),
                intersection: intersection.clone(),
                camera: None,
                button: 0,
                buttons: Buttons::empty(),
                timestamp: 0,
                wheel_delta: Vec3::ZERO,
                capture: None,
            },
        }
    }

    /// Dispatch to `target` instead of the hit target.
    pub fn target(mut self, target: EventTarget<K>) -> Self {
        self.event.target = target;
        self
    }

    /// Set the camera.
    pub fn camera(mut self, camera: Option<Camera>) -> Self {
        self.event.camera = camera;
        self
    }

    /// Set the changed button.
    pub fn button(mut self, button: Button) -> Self {
        self.event.button = button;
        self
    }

    /// Set the held buttons.
    pub fn buttons(mut self, buttons: Buttons) -> Self {
        self.event.buttons = buttons;
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    /// Set the wheel delta.
    pub fn wheel_delta(mut self, delta: Vec3) -> Self {
        self.event.wheel_delta = delta;
        self
    }

    /// Attach the intersection of the active capture.
    pub fn capture(mut self, capture: Option<&Intersection<K>>) -> Self {
        self.event.capture = capture.cloned();
        self
    }

    /// Finish the event.
    pub fn build(self) -> PointerEvent<K> {
        self.event
    }
}

/// Capture change requested by a handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CaptureRequest<K> {
    /// Capture the pointer to this target.
    Set(EventTarget<K>),
    /// Release the pointer's capture.
    Release,
}

/// Mutable side channel handed to handlers alongside an event.
#[derive(Clone, Debug)]
pub struct EventControl<K> {
    phase: Phase,
    current_target: EventTarget<K>,
    default_prevented: bool,
    capture_request: Option<CaptureRequest<K>>,
}

impl<K: Copy> EventControl<K> {
    /// Fresh control for one event dispatched to `target`.
    pub fn new(target: EventTarget<K>) -> Self {
        Self {
            phase: Phase::Target,
            current_target: target,
            default_prevented: false,
            capture_request: None,
        }
    }

    /// Phase of the step being delivered.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Target whose listeners are running.
    pub fn current_target(&self) -> EventTarget<K> {
        self.current_target
    }

    /// Move to the next dispatch step.
    pub fn enter_step(&mut self, phase: Phase, target: EventTarget<K>) {
        self.phase = phase;
        self.current_target = target;
    }

    /// Mark the default action as prevented.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a handler prevented the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Capture the event's pointer to `target` once delivery finishes.
    ///
    /// The last request of a dispatch wins.
    pub fn set_pointer_capture(&mut self, target: EventTarget<K>) {
        self.capture_request = Some(CaptureRequest::Set(target));
    }

    /// Release the event's pointer capture once delivery finishes.
    pub fn release_pointer_capture(&mut self) {
        self.capture_request = Some(CaptureRequest::Release);
    }

    /// Pending capture request.
    pub fn capture_request(&self) -> Option<CaptureRequest<K>> {
        self.capture_request
    }

    /// Take the pending capture request.
    pub fn take_capture_request(&mut self) -> Option<CaptureRequest<K>> {
        self.capture_request.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in PointerEventKind::ALL {
            assert_eq!(kind.as_str().parse::<PointerEventKind>(), Ok(kind));
        }
        assert_eq!("pointerdance".parse::<PointerEventKind>(), Err(UnknownEventKind));
    }

    #[test]
    fn only_enter_and_leave_do_not_bubble() {
        let flat: alloc::vec::Vec<_> = PointerEventKind::ALL
            .into_iter()
            .filter(|k| !k.bubbles())
            .collect();
        assert_eq!(flat, [PointerEventKind::Enter, PointerEventKind::Leave]);
    }

    #[test]
    fn kind_flags_are_distinct() {
        let all = PointerEventKind::ALL
            .into_iter()
            .fold(EventKinds::empty(), |acc, k| {
                assert!(!acc.intersects(k.flag()));
                acc | k.flag()
            });
        assert_eq!(all, EventKinds::all());
    }

    #[test]
    fn buttons_use_dom_mask() {
        assert_eq!(Buttons::from_button(0).bits(), 1);
        assert_eq!(Buttons::from_button(1).bits(), 4);
        assert_eq!(Buttons::from_button(2).bits(), 2);
        assert_eq!(Buttons::from_button(5).bits(), 32);
        assert!(Buttons::from_button(200).is_empty());
    }

    #[test]
    fn last_capture_request_wins() {
        let mut control = EventControl::new(EventTarget::Node(1_u32));
        control.set_pointer_capture(EventTarget::Node(2));
        control.release_pointer_capture();
        assert_eq!(control.take_capture_request(), Some(CaptureRequest::Release));
        assert_eq!(control.take_capture_request(), None);
    }
}
