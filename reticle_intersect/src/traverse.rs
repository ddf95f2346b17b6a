// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Policy-filtered scene traversal.
//!
//! ## Overview
//!
//! Walks the scene depth-first from the root, resolving each node's
//! pointer-events policy from its nearest declaring ancestor, and feeds the
//! nodes that pass to every participating pointer's intersector.
//!
//! ## Per node
//!
//! - The policy is resolved once and reused for all pointers.
//! - Mode [`None`](PointerEventsMode::None) skips the node but still visits its children.
//! - Mode [`Listener`](PointerEventsMode::Listener) tests the node only if it
//!   or an ancestor has a listener.
//! - The type filter is checked per pointer.
//! - `intersect_children = false` prunes the subtree; `interactable_descendants`
//!   replaces the literal children.

use alloc::vec::Vec;

use crate::intersection::Intersection;
use crate::intersector::Intersector;
use crate::order::HitSort;
use crate::policy::{PointerEventsMode, ResolvedPolicy};
use crate::scene::{ListenerLookup, SceneGraph};
use crate::types::{PointerInfo, PointerSample};

/// Traversal settings.
#[derive(Clone, Copy, Debug)]
pub struct TraversalOptions<K> {
    /// Mode for nodes with no declaring ancestor.
    pub default_pointer_events: PointerEventsMode,
    /// Ordering rule used by the intersectors.
    pub sort: HitSort<K>,
}

impl<K> Default for TraversalOptions<K> {
    fn default() -> Self {
        Self {
            default_pointer_events: PointerEventsMode::Listener,
            sort: HitSort::Default,
        }
    }
}

/// One pointer taking part in a traversal.
pub struct TraversalPointer<'p, K> {
    /// Pointer identity, checked against type filters.
    pub info: &'p PointerInfo,
    /// Prepared intersector.
    pub intersector: &'p mut dyn Intersector<K>,
}

impl<K> core::fmt::Debug for TraversalPointer<'_, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TraversalPointer")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Feed every eligible node of `scene` to each pointer's intersector.
///
/// Intersectors must already be prepared; not-ready ones simply find nothing.
/// Call [`Intersector::finalize_intersection`] afterwards to collect results.
pub fn intersect_pointer_targets<K: Copy>(
    scene: &dyn SceneGraph<K>,
    listeners: &dyn ListenerLookup<K>,
    pointers: &mut [TraversalPointer<'_, K>],
    options: &TraversalOptions<K>,
) {
    if pointers.is_empty() {
        return;
    }
    let mut stack: Vec<(K, ResolvedPolicy<'_>)> = Vec::new();
    stack.push((
        scene.root(),
        ResolvedPolicy::base(options.default_pointer_events),
    ));
    while let Some((node, parent)) = stack.pop() {
        let local = scene.policy(node);
        let policy = parent.inherit(&local, listeners.has_listener(node));
        if policy.is_active() {
            for pointer in pointers.iter_mut() {
                if policy.allows(pointer.info) {
                    pointer
                        .intersector
                        .execute_intersection(scene, node, policy.order, &options.sort);
                }
            }
        }
        if !local.intersect_children {
            continue;
        }
        let children = local
            .interactable_descendants
            .unwrap_or_else(|| scene.children_of(node));
        // Reverse so children pop in declaration order.
        for &child in children.iter().rev() {
            stack.push((child, policy));
        }
    }
}

/// Prepare, traverse, and finalize for a single pointer.
///
/// Returns `None` when the sample is not ready for this intersector.
pub fn intersect_pointer<K: Copy>(
    scene: &dyn SceneGraph<K>,
    listeners: &dyn ListenerLookup<K>,
    info: &PointerInfo,
    intersector: &mut dyn Intersector<K>,
    sample: &PointerSample,
    options: &TraversalOptions<K>,
) -> Option<Intersection<K>> {
    if !intersector.prepare_intersection(sample) {
        return None;
    }
    intersect_pointer_targets(
        scene,
        listeners,
        &mut [TraversalPointer {
            info,
            intersector: &mut *intersector,
        }],
        options,
    );
    Some(intersector.finalize_intersection(scene))
}
