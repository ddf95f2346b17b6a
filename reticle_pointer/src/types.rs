// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core dispatch types.

use core::fmt::Debug;
use core::hash::Hash;

use reticle_intersect::EventTarget;

/// Bounds required of scene node keys.
pub trait NodeKey: Copy + Eq + Hash + Debug + 'static {}

impl<K: Copy + Eq + Hash + Debug + 'static> NodeKey for K {}

/// Propagation phase of a dispatch step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root toward the target, excluding the target.
    Capture,
    /// The target itself.
    Target,
    /// Parent of the target toward the root.
    Bubble,
}

/// Handler result controlling propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep propagating.
    Continue,
    /// Stop the remaining steps of this event.
    Stop,
}

/// One step of a dispatch sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<K> {
    /// Phase.
    pub phase: Phase,
    /// Target whose listeners run in this step.
    pub target: EventTarget<K>,
}

impl<K> Dispatch<K> {
    /// Capture step.
    pub fn capture(target: EventTarget<K>) -> Self {
        Self {
            phase: Phase::Capture,
            target,
        }
    }

    /// Target step.
    pub fn target(target: EventTarget<K>) -> Self {
        Self {
            phase: Phase::Target,
            target,
        }
    }

    /// Bubble step.
    pub fn bubble(target: EventTarget<K>) -> Self {
        Self {
            phase: Phase::Bubble,
            target,
        }
    }
}
