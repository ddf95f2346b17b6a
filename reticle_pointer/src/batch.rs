// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame batcher: one intersection per pointer per frame.
//!
//! Input devices often report faster than the scene is rendered. The
//! [`FrameBatcher`] queues raw input between frames and, on
//! [`flush`](FrameBatcher::flush), recomputes each pointer's intersection
//! once, from its last move (and last wheel) sample. Earlier moves and wheels
//! are replayed as notify-only events against the intersection already in
//! place, so listeners still observe every physical sample. Presses,
//! releases, cancels and exits are never coalesced and run in arrival order.
//!
//! ```
//! use reticle_pointer::batch::{BatchOptions, BatchedInput, FrameBatcher};
//! use reticle_intersect::PointerSample;
//!
//! let mut batcher = FrameBatcher::new(BatchOptions::default());
//! for ts in 0..3 {
//!     batcher.push(1, BatchedInput::Move(PointerSample::new(ts)));
//! }
//! batcher.push(1, BatchedInput::Down(PointerSample::new(3)));
//! assert_eq!(batcher.len(), 4);
//! // At frame time: `batcher.flush(&mut registry, &mut env)`.
//! ```

use alloc::vec::Vec;
use core::mem;

use hashbrown::HashMap;
use log::{trace, warn};

use reticle_intersect::{IntersectError, PointerId, PointerSample};

use crate::registry::{PointerEnv, PointerRegistry};
use crate::types::NodeKey;

/// One queued raw input.
#[derive(Clone, Debug)]
pub enum BatchedInput {
    /// Pose or screen position changed.
    Move(PointerSample),
    /// Wheel turned.
    Wheel(PointerSample),
    /// Button pressed.
    Down(PointerSample),
    /// Button released.
    Up(PointerSample),
    /// Gesture aborted.
    Cancel(PointerSample),
    /// Device left, at the given timestamp.
    Exit(u64),
}

/// Batcher settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    /// Replay coalesced moves and wheels as notify-only events.
    pub replay_skipped: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            replay_skipped: true,
        }
    }
}

impl BatchOptions {
    /// Set [`replay_skipped`](Self::replay_skipped).
    pub fn with_replay_skipped(mut self, replay_skipped: bool) -> Self {
        self.replay_skipped = replay_skipped;
        self
    }
}

/// Queue of raw input flushed once per frame.
#[derive(Clone, Debug, Default)]
pub struct FrameBatcher {
    options: BatchOptions,
    queue: Vec<(PointerId, BatchedInput)>,
}

impl FrameBatcher {
    /// Empty batcher.
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            queue: Vec::new(),
        }
    }

    /// Settings.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Queue `input` for `pointer`.
    pub fn push(&mut self, pointer: PointerId, input: BatchedInput) {
        self.queue.push((pointer, input));
    }

    /// Number of queued inputs.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all queued input.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Deliver everything queued since the last flush.
    ///
    /// Inputs for pointers missing from `registry` are skipped. A failed
    /// intersection is logged and the rest of the queue is still delivered;
    /// the first such error is returned.
    pub fn flush<K: NodeKey>(
        &mut self,
        registry: &mut PointerRegistry<K>,
        env: &mut PointerEnv<'_, K>,
    ) -> Result<(), IntersectError> {
        let queue = mem::take(&mut self.queue);
        let mut last_move: HashMap<PointerId, usize> = HashMap::new();
        let mut last_wheel: HashMap<PointerId, usize> = HashMap::new();
        for (index, (pointer, input)) in queue.iter().enumerate() {
            match input {
                BatchedInput::Move(_) => {
                    last_move.insert(*pointer, index);
                }
                BatchedInput::Wheel(_) => {
                    last_wheel.insert(*pointer, index);
                }
                _ => {}
            }
        }
        let replay = self.options.replay_skipped;
        let mut first_error = None;
        for (index, (pointer, input)) in queue.into_iter().enumerate() {
            if !registry.contains(pointer) {
                trace!("batched input for unknown pointer {pointer} dropped");
                continue;
            }
            match input {
                BatchedInput::Move(sample) => {
                    if last_move.get(&pointer) == Some(&index) {
                        if let Err(e) = registry.move_to(env, pointer, &sample) {
                            warn!("pointer {pointer}: batched move failed: {e}");
                            first_error.get_or_insert(e);
                        }
                    } else if replay {
                        registry.with_pointer(env, pointer, |p, cx| p.notify_move(cx, &sample));
                    }
                }
                BatchedInput::Wheel(sample) => {
                    if last_wheel.get(&pointer) == Some(&index) {
                        if let Err(e) = registry.wheel(env, pointer, &sample) {
                            warn!("pointer {pointer}: batched wheel failed: {e}");
                            first_error.get_or_insert(e);
                        }
                    } else if replay {
                        registry.with_pointer(env, pointer, |p, cx| p.notify_wheel(cx, &sample));
                    }
                }
                BatchedInput::Down(sample) => registry.down(env, pointer, &sample),
                BatchedInput::Up(sample) => registry.up(env, pointer, &sample),
                BatchedInput::Cancel(sample) => registry.cancel(env, pointer, &sample),
                BatchedInput::Exit(timestamp) => registry.exit(env, pointer, timestamp),
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
