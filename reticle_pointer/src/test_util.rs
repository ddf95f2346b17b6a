// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared unit-test scene and recorders.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use glam::{Affine3A, Quat, Vec3};
use reticle_geometry::{Aabb3, PreciseHitTest, Ray3};
use reticle_intersect::policy::NodePolicy;
use reticle_intersect::{EventTarget, NodeGeometry, PointerSample, Pose, RawHit, SceneGraph};
use smallvec::SmallVec;

use crate::event::PointerEventKind;
use crate::listeners::Listeners;
use crate::types::Outcome;

/// Root 0 with unit boxes placed at absolute centers.
pub(crate) struct Boxes {
    parents: Vec<Option<u32>>,
    children: Vec<Vec<u32>>,
    centers: Vec<Vec3>,
}

impl Boxes {
    pub(crate) fn new() -> Self {
        Self {
            parents: alloc::vec![None],
            children: alloc::vec![Vec::new()],
            centers: alloc::vec![Vec3::ZERO],
        }
    }

    pub(crate) fn add(&mut self, parent: u32, center: Vec3) -> u32 {
        let id = u32::try_from(self.parents.len()).expect("small test scene");
        self.parents.push(Some(parent));
        self.children.push(Vec::new());
        self.centers.push(center);
        self.children[parent as usize].push(id);
        id
    }
}

impl SceneGraph<u32> for Boxes {
    fn root(&self) -> u32 {
        0
    }

    fn parent_of(&self, node: u32) -> Option<u32> {
        self.parents[node as usize]
    }

    fn children_of(&self, node: u32) -> &[u32] {
        &self.children[node as usize]
    }

    fn policy(&self, _node: u32) -> NodePolicy<'_, u32> {
        NodePolicy::default()
    }

    fn world_transform(&self, node: u32) -> Affine3A {
        Affine3A::from_translation(self.centers[node as usize])
    }

    fn raycast(&self, node: u32, ray: &Ray3, hits: &mut SmallVec<[RawHit; 4]>) {
        if node == 0 {
            return;
        }
        let center = self.centers[node as usize];
        let local = ray.transformed(&Affine3A::from_translation(-center));
        let unit = Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE);
        if let Some(h) = unit.raycast_local(&local) {
            hits.push(RawHit {
                distance: h.distance,
                point: h.point + center,
                normal: Some(h.normal),
                face_index: h.face_index,
                instance_id: None,
            });
        }
    }

    fn geometry(&self, node: u32) -> Option<NodeGeometry<'_>> {
        (node != 0).then(|| NodeGeometry::Mesh {
            bounds: Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE),
        })
    }
}

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

/// Record `kinds` reaching `targets` in their target phase as "kind@target".
pub(crate) fn record(
    listeners: &mut Listeners<u32>,
    targets: &[EventTarget<u32>],
    kinds: &[PointerEventKind],
) -> Log {
    let log: Log = Rc::default();
    for &target in targets {
        for &kind in kinds {
            let log = log.clone();
            listeners.add(target, kind, move |e, c| {
                if c.current_target() == e.target() {
                    log.borrow_mut()
                        .push(alloc::format!("{}@{:?}", e.kind(), e.target()));
                }
                Outcome::Continue
            });
        }
    }
    log
}

/// Record wheel events reaching `targets` as "target:dy".
pub(crate) fn record_wheel(listeners: &mut Listeners<u32>, targets: &[EventTarget<u32>]) -> Log {
    let log: Log = Rc::default();
    for &target in targets {
        let log = log.clone();
        listeners.add(target, PointerEventKind::Wheel, move |e, c| {
            if c.current_target() == e.target() {
                log.borrow_mut()
                    .push(alloc::format!("{:?}:{}", e.target(), e.wheel_delta().y));
            }
            Outcome::Continue
        });
    }
    log
}

/// Vertical wheel turn of `dy` with the ray at `x`.
pub(crate) fn wheel_at(ts: u64, x: f32, dy: f32) -> PointerSample {
    at(ts, x).with_wheel_delta(Vec3::new(0.0, dy, 0.0))
}

/// Ray pose at `x` looking down -Z from z = 10.
pub(crate) fn at(ts: u64, x: f32) -> PointerSample {
    PointerSample::at_pose(ts, Pose::new(Vec3::new(x, 0.0, 10.0), Quat::IDENTITY))
}
