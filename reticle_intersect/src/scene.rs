// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts the engine needs from the host scene graph.
//!
//! The engine never owns or mutates the scene. It reads tree links,
//! world transforms, and per-node policy, and asks nodes to raycast or
//! describe their bounds. [`SceneGraph`] is object safe; intersectors and
//! traversal take `&dyn SceneGraph<K>`.

use glam::{Affine3A, Vec3};
use reticle_geometry::{Aabb3, Ray3, Sphere3};
use smallvec::SmallVec;

use crate::policy::NodePolicy;
use crate::types::EventTarget;

/// Raw world-space hit reported by a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawHit {
    /// Distance from the probe origin: along the ray for rays and segments,
    /// from the center for spheres.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// World-space normal, when the surface has one.
    pub normal: Option<Vec3>,
    /// Face index, when the surface has faces.
    pub face_index: Option<u32>,
    /// Instance index for instanced geometry.
    pub instance_id: Option<u32>,
}

/// Bounds a node exposes to volume probes.
#[derive(Clone, Copy, Debug)]
pub enum NodeGeometry<'a> {
    /// Ordinary mesh with a local bounding box.
    Mesh {
        /// Local bounds.
        bounds: Aabb3,
    },
    /// Instanced mesh: one local box, repeated under per-instance transforms.
    Instanced {
        /// Local bounds of one instance.
        bounds: Aabb3,
        /// Instance transforms, relative to the node.
        instances: &'a [Affine3A],
    },
    /// The node answers sphere probes itself through [`SceneGraph::spherecast`].
    Custom,
}

/// Read-only view of a scene graph.
pub trait SceneGraph<K: Copy> {
    /// Root node.
    fn root(&self) -> K;

    /// Parent of `node`, `None` for the root or detached nodes.
    fn parent_of(&self, node: K) -> Option<K>;

    /// Children of `node`, in traversal order.
    fn children_of(&self, node: K) -> &[K];

    /// Policy `node` declares locally.
    fn policy(&self, node: K) -> NodePolicy<'_, K>;

    /// Current world transform of `node`.
    fn world_transform(&self, node: K) -> Affine3A;

    /// Append every hit of the world-space `ray` against `node` to `hits`.
    fn raycast(&self, node: K, ray: &Ray3, hits: &mut SmallVec<[RawHit; 4]>);

    /// Bounds for volume probes, or `None` if the node has no geometry.
    fn geometry(&self, node: K) -> Option<NodeGeometry<'_>>;

    /// Closest hit of a world-space sphere against a [`NodeGeometry::Custom`] node.
    fn spherecast(&self, node: K, sphere: &Sphere3) -> Option<RawHit> {
        let _ = (node, sphere);
        None
    }
}

/// Answers whether a node carries pointer listeners.
///
/// Drives the [`Listener`](crate::policy::PointerEventsMode::Listener) policy.
pub trait ListenerLookup<K> {
    /// Whether `node` itself has at least one pointer listener.
    fn has_listener(&self, node: K) -> bool;
}

/// Lookup that reports no listeners anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoListeners;

impl<K> ListenerLookup<K> for NoListeners {
    fn has_listener(&self, _: K) -> bool {
        false
    }
}

impl<K, F: Fn(K) -> bool> ListenerLookup<K> for F {
    fn has_listener(&self, node: K) -> bool {
        self(node)
    }
}

/// Ancestor chain of a target, leaf to root.
pub type AncestorChain<K> = SmallVec<[EventTarget<K>; 8]>;

/// Collect `target` and its ancestors, leaf to root.
///
/// The void target is parented to the scene root.
pub fn ancestors<K: Copy + PartialEq>(
    scene: &dyn SceneGraph<K>,
    target: EventTarget<K>,
) -> AncestorChain<K> {
    let mut chain = AncestorChain::new();
    let mut cur = match target {
        EventTarget::Node(node) => Some(node),
        EventTarget::Void => {
            chain.push(EventTarget::Void);
            Some(scene.root())
        }
    };
    while let Some(node) = cur {
        chain.push(EventTarget::Node(node));
        cur = scene.parent_of(node);
    }
    chain
}

/// World transform of a target; identity for the void.
pub fn target_transform<K: Copy>(scene: &dyn SceneGraph<K>, target: EventTarget<K>) -> Affine3A {
    match target {
        EventTarget::Node(node) => scene.world_transform(node),
        EventTarget::Void => Affine3A::IDENTITY,
    }
}


#[cfg(test)]
mod tests {
    use super::test_scene::BoxScene;
    use super::*;

    #[test]
    fn ancestors_run_leaf_to_root() {
        let mut scene = BoxScene::new();
        let a = scene.add_box(0, Vec3::ZERO, 1.0);
        let b = scene.add_box(a, Vec3::ZERO, 1.0);
        let chain = ancestors(&scene, EventTarget::Node(b));
        assert_eq!(
            chain.as_slice(),
            &[
                EventTarget::Node(b),
                EventTarget::Node(a),
                EventTarget::Node(0)
            ]
        );
    }

    #[test]
    fn void_is_parented_to_root() {
        let scene = BoxScene::new();
        let chain = ancestors(&scene, EventTarget::Void);
        assert_eq!(chain.as_slice(), &[EventTarget::Void, EventTarget::Node(0)]);
    }

    #[test]
    fn closures_are_listener_lookups() {
        let lookup = |n: u32| n == 3;
        assert!(ListenerLookup::has_listener(&lookup, 3));
        assert!(!ListenerLookup::has_listener(&NoListeners, 3_u32));
    }
}
