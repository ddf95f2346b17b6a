// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, updates, and the pointer queries.

use alloc::{vec, vec::Vec};

use glam::Affine3A;
use reticle_geometry::{PreciseHitTest, Ray3, Shape, Sphere3};
use reticle_intersect::policy::{NodePolicy, PointerEventsMode, PointerTypeFilter};
use reticle_intersect::{NodeGeometry, RawHit, SceneGraph};
use smallvec::SmallVec;

use crate::types::{Geometry, LocalNode, NodeFlags, NodeId, PointerPolicy};

/// Arena scene graph with a single root.
///
/// Changes to local transforms do **not** take effect immediately. They are
/// batched and applied when [`Scene::commit`] is called, which recomputes
/// world transforms. Policy, geometry, and flag changes are visible to the
/// next query right away.
///
/// ## Example
///
/// ```rust
/// use glam::{Affine3A, Vec3};
/// use reticle_geometry::{Aabb3, Shape};
/// use reticle_scene::{LocalNode, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.root();
/// let group = scene.insert(
///     root,
///     LocalNode {
///         local_transform: Affine3A::from_translation(Vec3::X),
///         ..LocalNode::default()
///     },
/// );
/// let cube = scene.insert(
///     group,
///     LocalNode::shape(
///         Shape::Box(Aabb3::from_center_size(Vec3::ZERO, Vec3::ONE)),
///         Affine3A::from_translation(Vec3::Y),
///     ),
/// );
///
/// // Changes only take effect after commit.
/// scene.commit();
///
/// let world = scene.world_transform(cube).unwrap();
/// assert_eq!(world.translation, Vec3::new(1.0, 1.0, 0.0).into());
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes_total", &self.nodes.len())
            .field("nodes_alive", &self.len())
            .field("free_list", &self.free_list.len())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    world: Affine3A,
    dirty: bool,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            world: Affine3A::IDENTITY,
            dirty: true,
        }
    }
}

impl Scene {
    /// Create a scene holding only an empty root node.
    pub fn new() -> Self {
        let root = NodeId::new(0, 1);
        Self {
            nodes: vec![Some(Node::new(1, LocalNode::default()))],
            generations: vec![1],
            free_list: Vec::new(),
            root,
        }
    }

    /// Root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always `false`: the root cannot be removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Insert a new node as the last child of `parent`.
    ///
    /// The returned [`NodeId`] becomes live immediately, but its world
    /// transform is only computed on the next call to [`Scene::commit`]. A
    /// stale `parent` attaches the node to the root.
    pub fn insert(&mut self, parent: NodeId, local: LocalNode) -> NodeId {
        let parent = if self.is_alive(parent) {
            parent
        } else {
            self.root
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        self.link_parent(id, parent);
        id
    }

    /// Remove a node and its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes[cur.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(cur.idx());
            }
        }
    }

    /// Move `id` under `new_parent`, as its last child.
    ///
    /// Returns `false` and leaves the scene untouched if either id is stale,
    /// `id` is the root, or `new_parent` lies inside the subtree of `id`.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        if id == self.root || !self.is_alive(id) || !self.is_alive(new_parent) {
            return false;
        }
        let mut cur = Some(new_parent);
        while let Some(n) = cur {
            if n == id {
                return false;
            }
            cur = self.parent_of(n);
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        self.link_parent(id, new_parent);
        self.node_mut(id).dirty = true;
        true
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine3A) {
        if let Some(n) = self.node_opt_mut(id)
            && n.local.local_transform != tf
        {
            n.local.local_transform = tf;
            n.dirty = true;
        }
    }

    /// Replace the geometry.
    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.geometry = geometry;
        }
    }

    /// Replace the instance transforms of an instanced node.
    ///
    /// Does nothing for nodes that are not instanced.
    pub fn set_instances(&mut self, id: NodeId, transforms: Vec<Affine3A>) {
        if let Some(n) = self.node_opt_mut(id)
            && let Geometry::Instanced { instances, .. } = &mut n.local.geometry
        {
            *instances = transforms;
        }
    }

    /// Replace the whole pointer-events policy.
    pub fn set_policy(&mut self, id: NodeId, policy: PointerPolicy) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy = policy;
        }
    }

    /// Declare (or, with `None`, inherit) the pointer-events mode.
    pub fn set_pointer_events(&mut self, id: NodeId, mode: Option<PointerEventsMode>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy.pointer_events = mode;
        }
    }

    /// Declare (or, with `None`, inherit) the pointer-type filter.
    pub fn set_pointer_events_type(&mut self, id: NodeId, filter: Option<PointerTypeFilter>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy.pointer_events_type = filter;
        }
    }

    /// Declare (or, with `None`, inherit) the ordering priority.
    pub fn set_pointer_events_order(&mut self, id: NodeId, order: Option<i32>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy.pointer_events_order = order;
        }
    }

    /// Whether traversal descends into the children of `id`.
    pub fn set_intersect_children(&mut self, id: NodeId, intersect_children: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy.intersect_children = intersect_children;
        }
    }

    /// Traverse `descendants` instead of the literal children of `id`.
    pub fn set_interactable_descendants(&mut self, id: NodeId, descendants: Option<Vec<NodeId>>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.policy.interactable_descendants = descendants;
        }
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.flags = flags;
        }
    }

    /// Local data of a live node.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.live(id).map(|n| &n.local)
    }

    /// World transform of a live node as of the last [`Scene::commit`].
    pub fn world_transform(&self, id: NodeId) -> Option<Affine3A> {
        self.live(id).map(|n| n.world)
    }

    /// Recompute world transforms of every node whose transform, or whose
    /// ancestor's transform, changed since the last commit.
    ///
    /// Returns the number of nodes updated.
    pub fn commit(&mut self) -> usize {
        let mut updated = 0;
        // Depth-first, propagating transforms and dirtiness toward the leaves.
        let mut stack = vec![(self.root, Affine3A::IDENTITY, false)];
        while let Some((id, parent_tf, parent_dirty)) = stack.pop() {
            let Some(node) = self.node_opt_mut(id) else {
                continue;
            };
            let dirty = node.dirty || parent_dirty;
            if dirty {
                node.world = parent_tf * node.local.local_transform;
                node.dirty = false;
                updated += 1;
            }
            for &child in node.children.iter().rev() {
                stack.push((child, node.world, dirty));
            }
        }
        updated
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.live(id).is_some()
    }

    /// Returns the parent of a node if live, or `None` for the root or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.live(id).and_then(|n| n.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.live(id).map_or(&[], |n| &n.children)
    }

    // --- internals ---

    fn live(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// Live node that takes part in hit testing.
    fn pickable(&self, id: NodeId) -> Option<&Node> {
        self.live(id)
            .filter(|n| n.local.flags.contains(NodeFlags::VISIBLE | NodeFlags::PICKABLE))
    }
}

/// World-space hit of `ray` against `shape` placed at `transform`.
fn cast_ray(shape: &Shape, transform: &Affine3A, ray: &Ray3, instance: Option<u32>) -> Option<RawHit> {
    let local = ray.transformed(&transform.inverse());
    let hit = shape.raycast_local(&local)?;
    let point = transform.transform_point3(hit.point);
    let normal = transform
        .matrix3
        .inverse()
        .transpose()
        .mul_vec3(hit.normal)
        .normalize_or_zero();
    Some(RawHit {
        distance: point.distance(ray.origin),
        point,
        normal: Some(normal),
        face_index: hit.face_index,
        instance_id: instance,
    })
}

impl SceneGraph<NodeId> for Scene {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        Self::parent_of(self, node)
    }

    fn children_of(&self, node: NodeId) -> &[NodeId] {
        Self::children_of(self, node)
    }

    fn policy(&self, node: NodeId) -> NodePolicy<'_, NodeId> {
        let Some(n) = self.live(node) else {
            return NodePolicy {
                pointer_events: Some(PointerEventsMode::None),
                intersect_children: false,
                ..NodePolicy::default()
            };
        };
        let p = &n.local.policy;
        NodePolicy {
            pointer_events: p.pointer_events,
            pointer_events_type: p.pointer_events_type.as_ref(),
            pointer_events_order: p.pointer_events_order,
            intersect_children: p.intersect_children,
            interactable_descendants: p.interactable_descendants.as_deref(),
        }
    }

    fn world_transform(&self, node: NodeId) -> Affine3A {
        Self::world_transform(self, node).unwrap_or(Affine3A::IDENTITY)
    }

    fn raycast(&self, node: NodeId, ray: &Ray3, hits: &mut SmallVec<[RawHit; 4]>) {
        let Some(n) = self.pickable(node) else { return };
        match &n.local.geometry {
            Geometry::Empty => {}
            Geometry::Shape(shape) => hits.extend(cast_ray(shape, &n.world, ray, None)),
            Geometry::Instanced { shape, instances } => {
                for (index, instance) in (0_u32..).zip(instances) {
                    hits.extend(cast_ray(shape, &(n.world * *instance), ray, Some(index)));
                }
            }
        }
    }

    fn geometry(&self, node: NodeId) -> Option<NodeGeometry<'_>> {
        let n = self.pickable(node)?;
        match &n.local.geometry {
            Geometry::Empty => None,
            Geometry::Shape(Shape::Sphere(_)) => Some(NodeGeometry::Custom),
            Geometry::Shape(shape) => Some(NodeGeometry::Mesh {
                bounds: shape.local_bounds(),
            }),
            Geometry::Instanced { shape, instances } => Some(NodeGeometry::Instanced {
                bounds: shape.local_bounds(),
                instances,
            }),
        }
    }

    fn spherecast(&self, node: NodeId, sphere: &Sphere3) -> Option<RawHit> {
        let n = self.pickable(node)?;
        let Geometry::Shape(Shape::Sphere(local)) = &n.local.geometry else {
            return None;
        };
        let world = local.transformed(&n.world);
        if !world.intersects_sphere(sphere) {
            return None;
        }
        let offset = sphere.center - world.center;
        let gap = offset.length() - world.radius;
        let direction = offset.normalize_or_zero();
        let (point, distance) = if gap <= 0.0 {
            (sphere.center, 0.0)
        } else {
            (world.center + direction * world.radius, gap)
        };
        Some(RawHit {
            distance,
            point,
            normal: Some(direction),
            face_index: None,
            instance_id: None,
        })
    }
}
