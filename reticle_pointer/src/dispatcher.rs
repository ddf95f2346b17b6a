// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher: build capture → target → bubble sequences and run them.
//!
//! ## Semantics
//!
//! - [`dispatch_path`] turns a leaf → root ancestor chain into a sequence.
//!   Bubbling kinds get capture steps (root → parent), the target step, and
//!   bubble steps (parent → root). Enter and leave get the target step only.
//! - [`run`] walks a sequence in order. [`Outcome::Stop`] aborts the rest of
//!   that sequence and nothing else; later events of the same transition
//!   (for example the enter burst after an out) are still delivered.
//! - [`dispatch`] ties both to an [`EventSink`].
//!
//! ```
//! use reticle_intersect::EventTarget;
//! use reticle_pointer::dispatcher::{dispatch_path, run};
//! use reticle_pointer::types::{Outcome, Phase};
//!
//! // Chain for node 2 whose parent is node 1.
//! let chain = [EventTarget::Node(2_u32), EventTarget::Node(1)];
//! let seq = dispatch_path(&chain, true);
//!
//! let mut seen = Vec::new();
//! let stopped = run(&seq, &mut seen, |d, seen| {
//!     seen.push((d.phase, d.target));
//!     Outcome::Continue
//! });
//! assert!(stopped.is_none());
//! assert_eq!(seen, vec![
//!     (Phase::Capture, EventTarget::Node(1)),
//!     (Phase::Target, EventTarget::Node(2)),
//!     (Phase::Bubble, EventTarget::Node(1)),
//! ]);
//! ```

use smallvec::SmallVec;

use reticle_intersect::EventTarget;

use crate::event::{EventControl, EventKinds, PointerEvent};
use crate::types::{Dispatch, Outcome};

/// Dispatch sequence with inline room for shallow scenes.
pub type DispatchSeq<K> = SmallVec<[Dispatch<K>; 16]>;

/// Receiver of dispatched events, usually [`Listeners`](crate::listeners::Listeners).
pub trait EventSink<K: Copy> {
    /// Whether `target` has a listener for any of `kinds`.
    fn has_listener(&self, target: EventTarget<K>, kinds: EventKinds) -> bool;

    /// Run the listeners of one dispatch step.
    fn deliver(
        &mut self,
        step: &Dispatch<K>,
        event: &PointerEvent<K>,
        control: &mut EventControl<K>,
    ) -> Outcome;
}

/// Build the dispatch sequence for a leaf → root `chain`.
pub fn dispatch_path<K: Copy>(chain: &[EventTarget<K>], bubbles: bool) -> DispatchSeq<K> {
    let mut out = DispatchSeq::new();
    let Some((&target, ancestors)) = chain.split_first() else {
        return out;
    };
    if !bubbles {
        out.push(Dispatch::target(target));
        return out;
    }
    for &n in ancestors.iter().rev() {
        out.push(Dispatch::capture(n));
    }
    out.push(Dispatch::target(target));
    for &n in ancestors {
        out.push(Dispatch::bubble(n));
    }
    out
}

/// Run a handler over a dispatch sequence and honor stop outcomes.
///
/// Returns the step where propagation stopped, or `None` if the whole
/// sequence ran.
pub fn run<'a, K, E>(
    seq: &'a [Dispatch<K>],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch<K>, &mut E) -> Outcome,
) -> Option<&'a Dispatch<K>> {
    for d in seq {
        match handler(d, event) {
            Outcome::Continue => {}
            Outcome::Stop => return Some(d),
        }
    }
    None
}

/// Deliver `event` along the leaf → root `chain` to `sink`.
///
/// Returns the step where propagation stopped, if it did.
pub fn dispatch<K: Copy>(
    sink: &mut dyn EventSink<K>,
    chain: &[EventTarget<K>],
    event: &PointerEvent<K>,
    control: &mut EventControl<K>,
) -> Option<Dispatch<K>> {
    let seq = dispatch_path(chain, event.kind().bubbles());
    run(&seq, control, |step, control| {
        control.enter_step(step.phase, step.target);
        sink.deliver(step, event, control)
    })
    .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;
    use alloc::vec::Vec;

    fn chain() -> [EventTarget<u32>; 3] {
        [
            EventTarget::Node(3),
            EventTarget::Node(2),
            EventTarget::Node(1),
        ]
    }

    #[test]
    fn bubbling_sequence_is_capture_target_bubble() {
        let seq = dispatch_path(&chain(), true);
        let got: Vec<_> = seq.iter().map(|d| (d.phase, d.target)).collect();
        assert_eq!(
            got,
            [
                (Phase::Capture, EventTarget::Node(1)),
                (Phase::Capture, EventTarget::Node(2)),
                (Phase::Target, EventTarget::Node(3)),
                (Phase::Bubble, EventTarget::Node(2)),
                (Phase::Bubble, EventTarget::Node(1)),
            ]
        );
    }

    #[test]
    fn non_bubbling_sequence_is_target_only() {
        let seq = dispatch_path(&chain(), false);
        assert_eq!(seq.as_slice(), &[Dispatch::target(EventTarget::Node(3))]);
        assert!(dispatch_path::<u32>(&[], true).is_empty());
    }

    #[test]
    fn stop_in_capture_skips_target() {
        let seq = dispatch_path(&chain(), true);
        let mut seen = Vec::new();
        let stopped = run(&seq, &mut seen, |d, seen| {
            seen.push(d.target);
            if d.phase == Phase::Capture {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        assert_eq!(stopped, Some(&Dispatch::capture(EventTarget::Node(1))));
        assert_eq!(seen, [EventTarget::Node(1)]);
    }

    #[test]
    fn void_bubbles_to_root() {
        let seq = dispatch_path(&[EventTarget::Void, EventTarget::Node(0_u32)], true);
        let got: Vec<_> = seq.iter().map(|d| d.target).collect();
        assert_eq!(
            got,
            [EventTarget::Node(0), EventTarget::Void, EventTarget::Node(0)]
        );
    }
}
