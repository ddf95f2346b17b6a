// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwarding adapter: drive pointers from a host window's pointer events.
//!
//! The host reports pixel positions inside a viewport. [`ForwardAdapter`]
//! converts them to normalized device coordinates, creates one camera-ray
//! [`Pointer`] per host pointer id on first sight, and either delivers each
//! event immediately or queues it for the next [`frame`](ForwardAdapter::frame).
//!
//! Hosts usually manage a capture of their own (a window keeps receiving
//! events for a pointer after it leaves the canvas). While a pointer is
//! captured here and the host still reports its capture as active, the
//! adapter re-asserts the host capture on every event. Host capture errors
//! are logged and ignored: a release may race with focus changes that
//! already dropped the host capture.

use alloc::boxed::Box;

use glam::Vec3;
use kurbo::{Point, Rect};
use log::debug;

use reticle_intersect::intersector::CameraRayIntersector;
use reticle_intersect::{
    Button, Camera, IntersectError, PointerId, PointerInfo, PointerSample, PointerType, SceneGraph,
    ndc_from_viewport,
};

use crate::batch::{BatchOptions, BatchedInput, FrameBatcher};
use crate::dispatcher::EventSink;
use crate::error::HostCaptureError;
use crate::pointer::{Pointer, PointerCaptureHost, PointerOptions};
use crate::registry::{PointerEnv, PointerRegistry};
use crate::types::NodeKey;

/// Kind of a host pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostEventKind {
    /// Position changed.
    Move,
    /// Button pressed.
    Down,
    /// Button released.
    Up,
    /// Host aborted the gesture.
    Cancel,
    /// Wheel turned.
    Wheel,
    /// Pointer left the host surface.
    Leave,
}

/// One pointer event as reported by the host.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HostPointerEvent {
    /// Host pointer id.
    pub pointer_id: PointerId,
    /// What happened.
    pub kind: HostEventKind,
    /// Position in host pixels, +Y down.
    pub position: Point,
    /// DOM button code for presses and releases.
    pub button: Button,
    /// Milliseconds on the host clock.
    pub timestamp: u64,
    /// Wheel delta for wheel events.
    pub wheel_delta: Vec3,
    /// Whether the host still holds its own capture for this pointer.
    pub host_capture_active: bool,
}

impl HostPointerEvent {
    /// Event without button, wheel delta, or host capture.
    pub fn new(pointer_id: PointerId, kind: HostEventKind, position: Point, timestamp: u64) -> Self {
        Self {
            pointer_id,
            kind,
            position,
            button: 0,
            timestamp,
            wheel_delta: Vec3::ZERO,
            host_capture_active: false,
        }
    }

    /// Set the button.
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = button;
        self
    }

    /// Set the wheel delta.
    pub fn with_wheel_delta(mut self, delta: Vec3) -> Self {
        self.wheel_delta = delta;
        self
    }

    /// Set whether the host capture is active.
    pub fn with_host_capture(mut self, active: bool) -> Self {
        self.host_capture_active = active;
        self
    }
}

/// Host-side capture control.
pub trait HostCapture {
    /// Ask the host to route `pointer` to this surface.
    fn set_capture(&mut self, pointer: PointerId) -> Result<(), HostCaptureError>;
    /// Ask the host to stop routing `pointer` to this surface.
    fn release_capture(&mut self, pointer: PointerId) -> Result<(), HostCaptureError>;
}

/// Host without capture support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHostCapture;

impl HostCapture for NoHostCapture {
    fn set_capture(&mut self, _pointer: PointerId) -> Result<(), HostCaptureError> {
        Ok(())
    }

    fn release_capture(&mut self, _pointer: PointerId) -> Result<(), HostCaptureError> {
        Ok(())
    }
}

/// Mirrors pointer capture onto the host and swallows its errors.
struct HostBridge<'h>(&'h mut dyn HostCapture);

impl PointerCaptureHost for HostBridge<'_> {
    fn pointer_capture_started(&mut self, pointer: PointerId) {
        if let Err(err) = self.0.set_capture(pointer) {
            debug!("ignoring host capture error: {err}");
        }
    }

    fn pointer_capture_released(&mut self, pointer: PointerId) {
        if let Err(err) = self.0.release_capture(pointer) {
            debug!("ignoring host release error: {err}");
        }
    }
}

/// Adapter settings.
#[derive(Clone, Copy, Debug)]
pub struct ForwardOptions<K> {
    /// Type of the pointers the adapter creates.
    pub pointer_type: PointerType,
    /// Queue events until [`ForwardAdapter::frame`] instead of delivering them at once.
    pub batch_events: bool,
    /// Host surface in pixels.
    pub viewport: Rect,
    /// Options of the pointers the adapter creates.
    pub pointer: PointerOptions<K>,
}

impl<K> Default for ForwardOptions<K> {
    fn default() -> Self {
        Self {
            pointer_type: PointerType::FORWARD,
            batch_events: true,
            viewport: Rect::new(0.0, 0.0, 1.0, 1.0),
            pointer: PointerOptions::default(),
        }
    }
}

impl<K> ForwardOptions<K> {
    /// Set the pointer type.
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    /// Enable or disable per-frame batching.
    pub fn with_batch_events(mut self, batch_events: bool) -> Self {
        self.batch_events = batch_events;
        self
    }

    /// Set the viewport.
    pub fn with_viewport(mut self, viewport: Rect) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the options of created pointers.
    pub fn with_pointer_options(mut self, pointer: PointerOptions<K>) -> Self {
        self.pointer = pointer;
        self
    }
}

/// Turns host window events into pointer operations.
#[derive(Debug)]
pub struct ForwardAdapter<K: NodeKey> {
    options: ForwardOptions<K>,
    camera: Camera,
    registry: PointerRegistry<K>,
    batcher: FrameBatcher,
}

impl<K: NodeKey> ForwardAdapter<K> {
    /// Adapter viewing the scene through `camera`.
    pub fn new(camera: Camera, options: ForwardOptions<K>) -> Self {
        Self {
            options,
            camera,
            registry: PointerRegistry::new(),
            batcher: FrameBatcher::new(BatchOptions::default()),
        }
    }

    /// Settings.
    pub fn options(&self) -> &ForwardOptions<K> {
        &self.options
    }

    /// Camera used for new samples.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera, for example after the view moved.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Replace the viewport, for example after a resize.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.options.viewport = viewport;
    }

    /// Pointers created so far.
    pub fn registry(&self) -> &PointerRegistry<K> {
        &self.registry
    }

    /// Mutable access to the pointers, for capture control.
    pub fn registry_mut(&mut self) -> &mut PointerRegistry<K> {
        &mut self.registry
    }

    /// Number of events waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.batcher.len()
    }

    /// Sample for `event` under the current camera and viewport.
    pub fn sample(&self, event: &HostPointerEvent) -> PointerSample {
        let ndc = ndc_from_viewport(self.options.viewport, event.position);
        PointerSample::on_screen(event.timestamp, self.camera, ndc)
            .with_button(event.button)
            .with_wheel_delta(event.wheel_delta)
    }

    /// Handle one host event, delivering it now or queueing it.
    pub fn handle_event(
        &mut self,
        event: &HostPointerEvent,
        scene: &dyn SceneGraph<K>,
        sink: &mut dyn EventSink<K>,
        host: &mut dyn HostCapture,
    ) -> Result<(), IntersectError> {
        let id = event.pointer_id;
        if event.kind == HostEventKind::Leave && !self.registry.contains(id) {
            return Ok(());
        }
        let info = PointerInfo::new(id, self.options.pointer_type);
        let options = self.options.pointer;
        let pointer = self.registry.get_or_insert_with(id, || {
            debug!("forwarded pointer {id} created");
            Pointer::new(info, Box::new(CameraRayIntersector::new()), options)
        });

        if event.host_capture_active
            && pointer.capture().is_some()
            && let Err(err) = host.set_capture(id)
        {
            debug!("ignoring host capture error: {err}");
        }

        let sample = self.sample(event);
        let input = match event.kind {
            HostEventKind::Move => BatchedInput::Move(sample),
            HostEventKind::Down => BatchedInput::Down(sample),
            HostEventKind::Up => BatchedInput::Up(sample),
            HostEventKind::Cancel => BatchedInput::Cancel(sample),
            HostEventKind::Wheel => BatchedInput::Wheel(sample),
            HostEventKind::Leave => BatchedInput::Exit(event.timestamp),
        };
        if self.options.batch_events {
            self.batcher.push(id, input);
            return Ok(());
        }
        let mut bridge = HostBridge(host);
        let mut env = PointerEnv::new(scene, sink, &mut bridge);
        let registry = &mut self.registry;
        match input {
            BatchedInput::Move(s) => registry.move_to(&mut env, id, &s)?,
            BatchedInput::Wheel(s) => registry.wheel(&mut env, id, &s)?,
            BatchedInput::Down(s) => registry.down(&mut env, id, &s),
            BatchedInput::Up(s) => registry.up(&mut env, id, &s),
            BatchedInput::Cancel(s) => registry.cancel(&mut env, id, &s),
            BatchedInput::Exit(ts) => registry.exit(&mut env, id, ts),
        }
        Ok(())
    }

    /// Deliver the events queued since the last frame.
    pub fn frame(
        &mut self,
        scene: &dyn SceneGraph<K>,
        sink: &mut dyn EventSink<K>,
        host: &mut dyn HostCapture,
    ) -> Result<(), IntersectError> {
        let mut bridge = HostBridge(host);
        let mut env = PointerEnv::new(scene, sink, &mut bridge);
        self.batcher.flush(&mut self.registry, &mut env)
    }
}
