// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mouse over a canvas: host window events forwarded into a 3D scene.
//!
//! This example shows how to combine:
//! - `reticle_scene` for the scene graph and its pointer-events policy,
//! - `reticle_pointer::ForwardAdapter` to turn pixel events into camera rays,
//! - `reticle_pointer::Listeners` to observe the resulting DOM-style events,
//!   including a capture-driven drag.
//!
//! Run:
//! - `cargo run -p reticle_demos --example forward_mouse`

use glam::{Affine3A, Quat, Vec3};
use kurbo::{Point, Rect};
use reticle_geometry::{Quad, Shape};
use reticle_intersect::{Camera, EventTarget};
use reticle_pointer::{
    ForwardAdapter, ForwardOptions, HostEventKind, HostPointerEvent, Listeners, NoCaptureHost,
    NoHostCapture, Outcome, Phase, PointerEventKind, SupportsPointerCapture,
};
use reticle_scene::{LocalNode, Scene};

fn main() {
    // Two cards side by side, one unit wide, in front of a camera at z = 10.
    let mut scene = Scene::new();
    let left = scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Quad(Quad::new(1.0, 1.0)),
            Affine3A::from_translation(Vec3::new(-1.0, 0.0, 0.0)),
        ),
    );
    let right = scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Quad(Quad::new(1.0, 1.0)),
            Affine3A::from_scale_rotation_translation(
                Vec3::splat(0.5),
                Quat::IDENTITY,
                Vec3::new(1.0, 0.0, 0.0),
            ),
        ),
    );
    scene.commit();

    let mut listeners = Listeners::new();
    for (node, name) in [(left, "left"), (right, "right")] {
        for kind in PointerEventKind::ALL {
            listeners.add(EventTarget::Node(node), kind, move |e, c| {
                if c.phase() == Phase::Target {
                    let p = e.intersection().point;
                    println!("  {name:>5}: {:<13} at ({:+.2}, {:+.2})", e.kind(), p.x, p.y);
                }
                Outcome::Continue
            });
        }
    }
    // Pressing the left card starts a drag that sticks to it.
    listeners.add(EventTarget::Node(left), PointerEventKind::Down, |e, c| {
        c.set_pointer_capture(e.target());
        Outcome::Continue
    });
    listeners.add(EventTarget::Void, PointerEventKind::Click, |_, _| {
        println!("   void: click missed everything");
        Outcome::Continue
    });

    let camera = Camera::perspective(
        Affine3A::from_translation(Vec3::new(0.0, 0.0, 10.0)),
        core::f32::consts::FRAC_PI_4,
        1.0,
        0.1,
        100.0,
    );
    let mut adapter = ForwardAdapter::new(
        camera,
        ForwardOptions::default()
            .with_batch_events(false)
            .with_viewport(Rect::new(0.0, 0.0, 800.0, 800.0)),
    );

    // A canvas of 800 px spans about 8.3 world units at z = 0.
    let px = |x: f32| Point::new(400.0 + f64::from(x) * 96.6, 400.0);
    let script = [
        ("hover left", HostEventKind::Move, px(-1.0)),
        ("press", HostEventKind::Down, px(-1.0)),
        ("drag onto right", HostEventKind::Move, px(1.0)),
        ("release", HostEventKind::Up, px(1.0)),
        ("hover right", HostEventKind::Move, px(1.1)),
        ("click empty space", HostEventKind::Move, px(3.0)),
        ("", HostEventKind::Down, px(3.0)),
        ("", HostEventKind::Up, px(3.0)),
        ("leave the window", HostEventKind::Leave, px(3.0)),
    ];
    for (ts, (label, kind, position)) in (0_u64..).zip(script) {
        if !label.is_empty() {
            println!("\n== {label} ==");
        }
        let event = HostPointerEvent::new(1, kind, position, ts * 16);
        if let Err(err) = adapter.handle_event(&event, &scene, &mut listeners, &mut NoHostCapture) {
            println!("  error: {err}");
        }
        if kind == HostEventKind::Up {
            // The demo ends its drag on release; capture otherwise outlives the button.
            adapter
                .registry_mut()
                .release_pointer_capture(&mut NoCaptureHost, 1);
        }
    }
}
