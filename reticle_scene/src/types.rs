// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, geometry, and policy.

use alloc::vec::Vec;

use glam::Affine3A;
use reticle_geometry::Shape;
use reticle_intersect::policy::{PointerEventsMode, PointerTypeFilter};

/// Identifier for a node in the scene (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. Invisible nodes report no hits, but their children still may.
        const VISIBLE  = 0b0000_0001;
        /// Node is pickable (participates in hit testing).
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// What a node draws, as far as hit testing is concerned.
#[derive(Clone, Debug, Default)]
pub enum Geometry {
    /// Grouping node without a surface.
    #[default]
    Empty,
    /// A single shape in node space.
    Shape(Shape),
    /// One shape repeated under per-instance transforms relative to the node.
    Instanced {
        /// Shape of every instance.
        shape: Shape,
        /// Instance transforms.
        instances: Vec<Affine3A>,
    },
}

/// Pointer-events declarations of one node. `None` fields inherit.
#[derive(Clone, Debug)]
pub struct PointerPolicy {
    /// Pointer-events mode.
    pub pointer_events: Option<PointerEventsMode>,
    /// Which pointers the node accepts.
    pub pointer_events_type: Option<PointerTypeFilter>,
    /// Ordering priority; higher wins over distance.
    pub pointer_events_order: Option<i32>,
    /// Whether traversal descends into the children.
    pub intersect_children: bool,
    /// Nodes traversed instead of the literal children.
    pub interactable_descendants: Option<Vec<NodeId>>,
}

impl Default for PointerPolicy {
    fn default() -> Self {
        Self {
            pointer_events: None,
            pointer_events_type: None,
            pointer_events_order: None,
            intersect_children: true,
            interactable_descendants: None,
        }
    }
}

/// Local data for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local transform relative to parent space.
    pub local_transform: Affine3A,
    /// Surface tested by intersectors.
    pub geometry: Geometry,
    /// Pointer-events policy.
    pub policy: PointerPolicy,
    /// Visibility and picking flags.
    pub flags: NodeFlags,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_transform: Affine3A::IDENTITY,
            geometry: Geometry::Empty,
            policy: PointerPolicy::default(),
            flags: NodeFlags::default(),
        }
    }
}

impl LocalNode {
    /// Node drawing `shape` at `local_transform`.
    pub fn shape(shape: Shape, local_transform: Affine3A) -> Self {
        Self {
            local_transform,
            geometry: Geometry::Shape(shape),
            ..Self::default()
        }
    }

    /// Set [`PointerPolicy::pointer_events`].
    pub fn with_pointer_events(mut self, mode: PointerEventsMode) -> Self {
        self.policy.pointer_events = Some(mode);
        self
    }

    /// Set [`PointerPolicy::pointer_events_order`].
    pub fn with_order(mut self, order: i32) -> Self {
        self.policy.pointer_events_order = Some(order);
        self
    }
}
