// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end pointer scenarios against a `reticle_scene` scene.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine3A, Quat, Vec3};
use kurbo::Point;
use reticle_event_state::click::ClickState;
use reticle_geometry::{Aabb3, Quad, Shape};
use reticle_intersect::intersector::{CameraRayIntersector, RayIntersector, RayOptions};
use reticle_intersect::policy::PointerEventsMode;
use reticle_intersect::{Camera, EventTarget, PointerSample, PointerType, Pose};
use reticle_pointer::{
    Listeners, NoCaptureHost, Outcome, Phase, Pointer, PointerCx, PointerEventKind,
};
use reticle_scene::{LocalNode, NodeId, Scene};

type Log = Rc<RefCell<Vec<String>>>;

const EYE_Z: f32 = 10.0;
const FOV_Y: f32 = core::f32::consts::FRAC_PI_4;

fn camera() -> Camera {
    Camera::perspective(
        Affine3A::from_translation(Vec3::new(0.0, 0.0, EYE_Z)),
        FOV_Y,
        1.0,
        0.1,
        100.0,
    )
}

/// NDC of the world point `(x, 0, 0)` seen through [`camera`].
fn ndc_at(x: f32) -> Point {
    let half_height = EYE_Z * (FOV_Y / 2.0).tan();
    Point::new(f64::from(x / half_height), 0.0)
}

fn screen(ts: u64, x: f32) -> PointerSample {
    PointerSample::on_screen(ts, camera(), ndc_at(x))
}

fn rect(scene: &mut Scene, at: Vec3, scale: f32) -> NodeId {
    scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Quad(Quad::new(1.0, 1.0)),
            Affine3A::from_scale_rotation_translation(Vec3::splat(scale), Quat::IDENTITY, at),
        ),
    )
}

/// Record every event reaching `targets` in its target phase as "kind@name".
fn record(listeners: &mut Listeners<NodeId>, targets: &[(NodeId, &'static str)]) -> Log {
    let log: Log = Rc::default();
    for &(node, name) in targets {
        for kind in PointerEventKind::ALL {
            let log = log.clone();
            listeners.add(EventTarget::Node(node), kind, move |e, c| {
                if c.phase() == Phase::Target {
                    log.borrow_mut().push(format!("{}@{name}", e.kind()));
                }
                Outcome::Continue
            });
        }
    }
    log
}

fn mouse() -> Pointer<NodeId> {
    Pointer::with_intersector(1, PointerType::MOUSE, CameraRayIntersector::new())
}

#[test]
fn hover_then_move_away() {
    let mut scene = Scene::new();
    let r = rect(&mut scene, Vec3::ZERO, 0.5);
    scene.commit();
    let mut listeners = Listeners::new();
    let log = record(&mut listeners, &[(r, "rect")]);
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    pointer.move_to(&mut cx, &screen(0, 0.0)).unwrap();
    assert_eq!(
        *log.borrow(),
        ["pointerover@rect", "pointerenter@rect", "pointermove@rect"]
    );

    log.borrow_mut().clear();
    pointer.move_to(&mut cx, &screen(1, 3.0)).unwrap();
    assert_eq!(*log.borrow(), ["pointerout@rect", "pointerleave@rect"]);
    assert!(pointer.intersection().is_some_and(|i| i.is_void()));
}

#[test]
fn identical_moves_only_move() {
    let mut scene = Scene::new();
    let r = rect(&mut scene, Vec3::ZERO, 0.5);
    scene.commit();
    let mut listeners = Listeners::new();
    let log = record(&mut listeners, &[(r, "rect")]);
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    pointer.move_to(&mut cx, &screen(0, 0.0)).unwrap();
    log.borrow_mut().clear();
    pointer.move_to(&mut cx, &screen(1, 0.0)).unwrap();
    pointer.move_to(&mut cx, &screen(2, 0.0)).unwrap();
    assert_eq!(*log.borrow(), ["pointermove@rect", "pointermove@rect"]);
}

#[test]
fn nested_targets_leave_leaf_first_and_enter_root_first() {
    let mut scene = Scene::new();
    let outer = rect(&mut scene, Vec3::ZERO, 2.0);
    let inner = scene.insert(
        outer,
        LocalNode::shape(
            Shape::Quad(Quad::new(0.25, 0.25)),
            Affine3A::from_translation(Vec3::new(0.0, 0.0, 0.1)),
        ),
    );
    scene.commit();
    let mut listeners = Listeners::new();
    let log = record(&mut listeners, &[(outer, "outer"), (inner, "inner")]);
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    pointer.move_to(&mut cx, &screen(0, 0.0)).unwrap();
    assert_eq!(
        *log.borrow(),
        [
            "pointerover@inner",
            "pointerenter@outer",
            "pointerenter@inner",
            "pointermove@inner",
        ]
    );

    log.borrow_mut().clear();
    pointer.move_to(&mut cx, &screen(1, 0.8)).unwrap();
    assert_eq!(
        *log.borrow(),
        [
            "pointerout@inner",
            "pointerleave@inner",
            "pointerover@outer",
            "pointermove@outer",
        ]
    );

    log.borrow_mut().clear();
    pointer.move_to(&mut cx, &screen(2, 4.0)).unwrap();
    assert_eq!(*log.borrow(), ["pointerout@outer", "pointerleave@outer"]);
}

#[test]
fn priority_beats_distance() {
    let mut scene = Scene::new();
    let near = rect(&mut scene, Vec3::ZERO, 1.0);
    let middle = rect(&mut scene, Vec3::new(0.0, 0.0, -1.0), 1.0);
    let far = rect(&mut scene, Vec3::new(0.0, 0.0, -2.0), 1.0);
    for (node, order) in [(near, 1), (middle, 0), (far, 2)] {
        scene.set_pointer_events(node, Some(PointerEventsMode::Auto));
        scene.set_pointer_events_order(node, Some(order));
    }
    scene.commit();
    let mut listeners = Listeners::new();
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut pointer = mouse();

    {
        let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
        pointer.move_to(&mut cx, &screen(0, 0.0)).unwrap();
    }
    let hit = pointer.intersection().unwrap();
    assert_eq!(hit.target, EventTarget::Node(far));
    assert_eq!(hit.pointer_events_order, Some(2));

    // With equal orders the nearest wins.
    scene.set_pointer_events_order(near, Some(0));
    scene.set_pointer_events_order(far, Some(0));
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    pointer.move_to(&mut cx, &screen(1, 0.0)).unwrap();
    assert_eq!(
        pointer.intersection().map(|i| i.target),
        Some(EventTarget::Node(near))
    );
}

#[test]
fn captured_drag_keeps_reporting_the_captured_target() {
    let mut scene = Scene::new();
    let a = rect(&mut scene, Vec3::new(-1.0, 0.0, 0.0), 1.0);
    let b = rect(&mut scene, Vec3::new(1.0, 0.0, 0.0), 1.0);
    scene.commit();
    let mut listeners = Listeners::new();
    let moves: Rc<RefCell<Vec<(EventTarget<NodeId>, Vec3)>>> = Rc::default();
    for node in [a, b] {
        let moves = moves.clone();
        listeners.add(EventTarget::Node(node), PointerEventKind::Move, move |e, _| {
            moves.borrow_mut().push((e.target(), e.intersection().point));
            Outcome::Continue
        });
    }
    listeners.add(EventTarget::Node(a), PointerEventKind::Down, |e, c| {
        c.set_pointer_capture(e.target());
        Outcome::Continue
    });
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    pointer.move_to(&mut cx, &screen(0, -1.0)).unwrap();
    pointer.down(&mut cx, &screen(1, -1.0));
    assert!(pointer.has_capture(EventTarget::Node(a)));

    moves.borrow_mut().clear();
    pointer.move_to(&mut cx, &screen(2, 0.0)).unwrap();
    pointer.move_to(&mut cx, &screen(3, 1.0)).unwrap();
    {
        let moves = moves.borrow();
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|(t, _)| *t == EventTarget::Node(a)));
        assert!(moves[0].1.x.abs() < 1e-3, "point follows the drag");
        assert!((moves[1].1.x - 1.0).abs() < 1e-3, "point follows the drag");
    }

    // Capture outlives the release and ends on explicit release.
    pointer.up(&mut cx, &screen(4, 1.0));
    assert!(pointer.has_capture(EventTarget::Node(a)));
    assert!(pointer.release_capture(&mut NoCaptureHost));
    pointer.move_to(&mut cx, &screen(5, 1.0)).unwrap();
    assert_eq!(
        pointer.intersection().map(|i| i.target),
        Some(EventTarget::Node(b))
    );
}

#[test]
fn double_click_pairs_only_once() {
    let mut scene = Scene::new();
    let cube = scene.insert(
        scene.root(),
        LocalNode::shape(
            Shape::Box(Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE)),
            Affine3A::IDENTITY,
        ),
    );
    scene.commit();
    let mut listeners = Listeners::new();
    let log: Log = Rc::default();
    for kind in [PointerEventKind::Click, PointerEventKind::DblClick] {
        let log = log.clone();
        listeners.add(EventTarget::Node(cube), kind, move |e, _| {
            log.borrow_mut().push(e.kind().to_string());
            Outcome::Continue
        });
    }
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = Pointer::with_intersector(
        1,
        PointerType::RAY,
        RayIntersector::new(RayOptions::default()),
    );
    let pose = |ts| PointerSample::at_pose(ts, Pose::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY));

    pointer.move_to(&mut cx, &pose(0)).unwrap();
    for press in 0..3 {
        let t = 100 * press;
        pointer.down(&mut cx, &pose(t + 10));
        pointer.up(&mut cx, &pose(t + 60));
    }
    assert_eq!(*log.borrow(), ["click", "click", "dblclick", "click"]);

    // A fourth click pairs with the third.
    pointer.down(&mut cx, &pose(310));
    pointer.up(&mut cx, &pose(360));
    assert_eq!(log.borrow().len(), 6);
    assert_eq!(log.borrow()[5], "dblclick");

    // A slow press is no click at all.
    pointer.down(&mut cx, &pose(1000));
    pointer.up(&mut cx, &pose(1500));
    assert_eq!(log.borrow().len(), 6);
}

#[test]
fn press_before_first_pose_is_replayed() {
    let mut scene = Scene::new();
    let r = rect(&mut scene, Vec3::ZERO, 1.0);
    scene.commit();
    let mut listeners = Listeners::new();
    let log = record(&mut listeners, &[(r, "rect")]);
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    // No screen position yet: the move is dropped and the press waits.
    pointer.move_to(&mut cx, &PointerSample::new(0)).unwrap();
    pointer.down(&mut cx, &PointerSample::new(1));
    assert_eq!(pointer.deferred_len(), 1);
    assert!(log.borrow().is_empty());

    pointer.move_to(&mut cx, &screen(2, 0.0)).unwrap();
    assert_eq!(pointer.deferred_len(), 0);
    assert_eq!(
        *log.borrow(),
        [
            "pointerover@rect",
            "pointerenter@rect",
            "pointermove@rect",
            "pointerdown@rect",
        ]
    );
}

#[test]
fn missed_clicks_reach_the_void() {
    let mut scene = Scene::new();
    let _r = rect(&mut scene, Vec3::ZERO, 1.0);
    scene.commit();
    let mut listeners = Listeners::new();
    let missed = Rc::new(RefCell::new(0));
    let counter = missed.clone();
    listeners.add(EventTarget::Void, PointerEventKind::Click, move |_, _| {
        *counter.borrow_mut() += 1;
        Outcome::Continue
    });
    let mut clicks = ClickState::new();
    let mut host = NoCaptureHost;
    let mut cx = PointerCx::new(&scene, &mut listeners, &mut clicks, &mut host);
    let mut pointer = mouse();

    pointer.move_to(&mut cx, &screen(0, 3.0)).unwrap();
    pointer.down(&mut cx, &screen(1, 3.0));
    pointer.up(&mut cx, &screen(2, 3.0));
    assert_eq!(*missed.borrow(), 1);
}
