// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An XR hand with a grab sphere and a far ray, sharing one traversal.
//!
//! The hand reaches toward a ball. While far away the ray hovers the panel
//! behind it; once the grab sphere touches the ball, the sphere becomes the
//! active pointer and the ray is disabled, which ends its hover.
//!
//! Run:
//! - `cargo run -p reticle_demos --example xr_hand`

use glam::{Affine3A, Quat, Vec3};
use reticle_event_state::click::ClickState;
use reticle_geometry::{Quad, Shape, Sphere3};
use reticle_intersect::intersector::{RayIntersector, RayOptions, SphereIntersector, SphereOptions};
use reticle_intersect::policy::PointerEventsMode;
use reticle_intersect::traverse::TraversalOptions;
use reticle_intersect::{EventTarget, PointerSample, PointerType, Pose};
use reticle_pointer::{
    CombinedPointer, Listeners, NoCaptureHost, Outcome, Phase, Pointer, PointerCx,
    PointerEventKind,
};
use reticle_scene::{LocalNode, Scene};

fn main() {
    let mut scene = Scene::new();
    let panel = scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Quad(Quad::new(4.0, 3.0)),
            Affine3A::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        ),
    );
    let ball = scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Sphere(Sphere3::new(Vec3::ZERO, 0.1)),
            Affine3A::from_translation(Vec3::new(0.5, 0.0, 0.0)),
        ),
    );
    scene.commit();

    let mut listeners = Listeners::new();
    for (node, name) in [(panel, "panel"), (ball, "ball")] {
        for kind in [
            PointerEventKind::Over,
            PointerEventKind::Out,
            PointerEventKind::Down,
            PointerEventKind::Up,
            PointerEventKind::Click,
        ] {
            listeners.add(EventTarget::Node(node), kind, move |e, c| {
                if c.phase() == Phase::Target {
                    println!(
                        "  {name:>5}: {} by {} ({})",
                        e.kind(),
                        e.pointer().id,
                        e.pointer().pointer_type.as_str()
                    );
                }
                Outcome::Continue
            });
        }
    }

    let mut hand = CombinedPointer::new(TraversalOptions {
        default_pointer_events: PointerEventsMode::Listener,
        ..TraversalOptions::default()
    });
    hand.push(Pointer::with_intersector(
        1,
        PointerType::GRAB,
        SphereIntersector::new(SphereOptions::default().with_radius(0.05)),
    ));
    hand.push(Pointer::with_intersector(
        2,
        PointerType::RAY,
        RayIntersector::new(RayOptions::default()),
    ));

    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);

    for (ts, x) in (0_u64..).zip([0.0, 0.2, 0.38, 0.44]) {
        println!("\n== hand at x = {x:.2} ==");
        let pose = Pose::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY);
        let sample = PointerSample::at_pose(ts * 11, pose);
        if let Err(err) = hand.move_to(&mut cx, &[sample.clone(), sample]) {
            println!("  error: {err}");
        }
        if let Some(active) = hand.active() {
            println!("  active: pointer {}", active.id());
        }
    }

    println!("\n== pinch ==");
    let pinch = PointerSample::at_pose(60, Pose::new(Vec3::new(0.44, 0.0, 0.0), Quat::IDENTITY));
    hand.down(&mut cx, &pinch);
    hand.up(&mut cx, &PointerSample { timestamp: 120, ..pinch });
}
