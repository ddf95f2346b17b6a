// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node pointer-events policy and its inheritance.
//!
//! Each node may declare a pointer-events mode, a pointer-type filter, and a
//! numeric order. Undeclared values come from the nearest ancestor that
//! declares them; the root falls back to the traversal defaults.

use alloc::vec::Vec;

use crate::types::{PointerInfo, PointerType};

/// Whether a node takes part in intersection testing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerEventsMode {
    /// Never tested.
    None,
    /// Tested only if the node or one of its ancestors has a listener.
    #[default]
    Listener,
    /// Always tested.
    Auto,
}

/// Which pointers a node accepts.
#[derive(Clone, Debug, Default)]
pub enum PointerTypeFilter {
    /// Every pointer.
    #[default]
    All,
    /// Only pointers of the listed types.
    Allow(Vec<PointerType>),
    /// Every pointer except those of the listed types.
    Deny(Vec<PointerType>),
    /// Arbitrary predicate over pointer id, type, and state.
    Predicate(fn(&PointerInfo) -> bool),
}

impl PointerTypeFilter {
    /// Whether `info` passes the filter.
    pub fn allows(&self, info: &PointerInfo) -> bool {
        match self {
            Self::All => true,
            Self::Allow(types) => types.contains(&info.pointer_type),
            Self::Deny(types) => !types.contains(&info.pointer_type),
            Self::Predicate(f) => f(info),
        }
    }
}

/// Policy a node declares locally. `None` fields inherit.
#[derive(Clone, Copy, Debug)]
pub struct NodePolicy<'a, K> {
    /// Pointer-events mode.
    pub pointer_events: Option<PointerEventsMode>,
    /// Pointer-type filter.
    pub pointer_events_type: Option<&'a PointerTypeFilter>,
    /// Ordering priority.
    pub pointer_events_order: Option<i32>,
    /// Whether traversal descends into this node's children. Not inherited.
    pub intersect_children: bool,
    /// Replaces the literal children during traversal. Not inherited.
    pub interactable_descendants: Option<&'a [K]>,
}

impl<K> Default for NodePolicy<'_, K> {
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

/// Effective policy after inheritance.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedPolicy<'a> {
    /// Effective mode.
    pub mode: PointerEventsMode,
    /// Effective filter; `None` accepts all pointers.
    pub filter: Option<&'a PointerTypeFilter>,
    /// Effective order.
    pub order: Option<i32>,
    /// Whether this node or an ancestor has a listener.
    pub has_listener: bool,
}

impl<'a> ResolvedPolicy<'a> {
    /// Policy above the root.
    pub fn base(default_mode: PointerEventsMode) -> Self {
        Self {
            mode: default_mode,
            filter: None,
            order: None,
            has_listener: false,
        }
    }

    /// Resolve a child's policy from this (parent) policy and the child's local declaration.
    pub fn inherit<K>(&self, local: &NodePolicy<'a, K>, has_local_listener: bool) -> Self {
        Self {
            mode: local.pointer_events.unwrap_or(self.mode),
            filter: local.pointer_events_type.or(self.filter),
            order: local.pointer_events_order.or(self.order),
            has_listener: self.has_listener || has_local_listener,
        }
    }

    /// Whether the node should be tested at all.
    pub fn is_active(&self) -> bool {
        match self.mode {
            PointerEventsMode::None => false,
            PointerEventsMode::Listener => self.has_listener,
            PointerEventsMode::Auto => true,
        }
    }

    /// Whether the node should be tested for `pointer`.
    pub fn allows(&self, pointer: &PointerInfo) -> bool {
        self.filter.is_none_or(|f| f.allows(pointer))
    }
}
