// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Scene: a small arena scene graph that Reticle pointers can intersect.
//!
//! Hosts with their own scene graph implement
//! [`SceneGraph`](reticle_intersect::SceneGraph) directly. This crate is for
//! everyone else, and for tests and demos.
//!
//! - Represents a single-rooted hierarchy of nodes with local transforms.
//! - Nodes draw nothing, one [`Shape`](reticle_geometry::Shape), or one shape
//!   repeated under GPU-style instance transforms.
//! - Each node carries its pointer-events policy: mode, pointer-type filter,
//!   order, `intersect_children`, and interactable-descendant overrides.
//! - Transform changes are batched and applied by [`Scene::commit`].
//!
//! ## API overview
//!
//! - [`Scene`]: container managing nodes and world transforms.
//! - [`LocalNode`]: per-node local data (transform, geometry, policy, flags).
//! - [`Geometry`] and [`PointerPolicy`]: the parts of a node intersectors look at.
//! - [`NodeFlags`]: visibility and picking controls.
//! - [`NodeId`]: generational handle of a node.
//!
//! Sphere shapes answer sphere casts exactly; boxes, quads, and instances
//! are tested against their local bounds.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod scene;
mod types;

pub use scene::Scene;
pub use types::{Geometry, LocalNode, NodeFlags, NodeId, PointerPolicy};
