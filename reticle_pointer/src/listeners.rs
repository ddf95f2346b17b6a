// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry keyed by target and event kind.
//!
//! Listeners registered with [`Listeners::add`] run in the target and bubble
//! phases; those registered with [`Listeners::add_capture`] run in the
//! capture and target phases, matching DOM `addEventListener` with and
//! without `capture`. Within a step, listeners run in registration order.
//! If any of them returns [`Outcome::Stop`], the remaining listeners of that
//! step still run and propagation stops afterwards.
//!
//! ```
//! use reticle_intersect::EventTarget;
//! use reticle_pointer::event::{EventKinds, PointerEventKind};
//! use reticle_pointer::listeners::Listeners;
//! use reticle_pointer::dispatcher::EventSink;
//! use reticle_pointer::types::Outcome;
//!
//! let mut listeners: Listeners<u32> = Listeners::new();
//! let id = listeners.add(EventTarget::Node(1), PointerEventKind::Click, |_, _| Outcome::Continue);
//! assert!(listeners.has_listener(EventTarget::Node(1), EventKinds::CLICK));
//! assert!(!listeners.has_listener(EventTarget::Node(1), EventKinds::MOVE));
//! assert!(listeners.remove(id));
//! assert!(!listeners.has_listener(EventTarget::Node(1), EventKinds::all()));
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use reticle_intersect::{EventTarget, ListenerLookup};

use crate::dispatcher::EventSink;
use crate::event::{EventControl, EventKinds, PointerEvent, PointerEventKind};
use crate::types::{Dispatch, NodeKey, Outcome, Phase};

/// Boxed listener callback.
pub type Handler<K> = Box<dyn FnMut(&PointerEvent<K>, &mut EventControl<K>) -> Outcome>;

/// Handle returned by [`Listeners::add`], used to remove the listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry<K> {
    id: ListenerId,
    capture: bool,
    handler: Handler<K>,
}

/// Listener table implementing [`EventSink`].
pub struct Listeners<K> {
    table: HashMap<(EventTarget<K>, PointerEventKind), Vec<Entry<K>>>,
    kinds: HashMap<EventTarget<K>, EventKinds>,
    next_id: u64,
}

impl<K: NodeKey> fmt::Debug for Listeners<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("targets", &self.kinds)
            .finish_non_exhaustive()
    }
}

impl<K: NodeKey> Default for Listeners<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> Listeners<K> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            kinds: HashMap::new(),
            next_id: 0,
        }
    }

    /// Attach a target/bubble-phase listener.
    pub fn add(
        &mut self,
        target: EventTarget<K>,
        kind: PointerEventKind,
        handler: impl FnMut(&PointerEvent<K>, &mut EventControl<K>) -> Outcome + 'static,
    ) -> ListenerId {
        self.insert(target, kind, false, Box::new(handler))
    }

    /// Attach a capture/target-phase listener.
    pub fn add_capture(
        &mut self,
        target: EventTarget<K>,
        kind: PointerEventKind,
        handler: impl FnMut(&PointerEvent<K>, &mut EventControl<K>) -> Outcome + 'static,
    ) -> ListenerId {
        self.insert(target, kind, true, Box::new(handler))
    }

    /// Attach several target/bubble-phase listeners to one target.
    pub fn bind(
        &mut self,
        target: EventTarget<K>,
        handlers: impl IntoIterator<Item = (PointerEventKind, Handler<K>)>,
    ) -> Vec<ListenerId> {
        handlers
            .into_iter()
            .map(|(kind, handler)| self.insert(target, kind, false, handler))
            .collect()
    }

    fn insert(
        &mut self,
        target: EventTarget<K>,
        kind: PointerEventKind,
        capture: bool,
        handler: Handler<K>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.table.entry((target, kind)).or_default().push(Entry {
            id,
            capture,
            handler,
        });
        *self.kinds.entry(target).or_insert(EventKinds::empty()) |= kind.flag();
        id
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(key) = self
            .table
            .iter()
            .find_map(|(key, entries)| entries.iter().any(|e| e.id == id).then_some(*key))
        else {
            return false;
        };
        if let Some(entries) = self.table.get_mut(&key) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                self.table.remove(&key);
            }
        }
        self.refresh_kinds(key.0);
        true
    }

    /// Detach every listener of `target`.
    pub fn clear_target(&mut self, target: EventTarget<K>) {
        self.table.retain(|(t, _), _| *t != target);
        self.kinds.remove(&target);
    }

    /// Kinds with at least one listener on `target`.
    pub fn kinds_of(&self, target: EventTarget<K>) -> EventKinds {
        self.kinds.get(&target).copied().unwrap_or(EventKinds::empty())
    }

    fn refresh_kinds(&mut self, target: EventTarget<K>) {
        let kinds = PointerEventKind::ALL
            .into_iter()
            .filter(|k| self.table.contains_key(&(target, *k)))
            .fold(EventKinds::empty(), |acc, k| acc | k.flag());
        if kinds.is_empty() {
            self.kinds.remove(&target);
        } else {
            self.kinds.insert(target, kinds);
        }
    }
}

impl<K: NodeKey> EventSink<K> for Listeners<K> {
    fn has_listener(&self, target: EventTarget<K>, kinds: EventKinds) -> bool {
        self.kinds_of(target).intersects(kinds)
    }

    fn deliver(
        &mut self,
        step: &Dispatch<K>,
        event: &PointerEvent<K>,
        control: &mut EventControl<K>,
    ) -> Outcome {
        let Some(entries) = self.table.get_mut(&(step.target, event.kind())) else {
            return Outcome::Continue;
        };
        let mut outcome = Outcome::Continue;
        for entry in entries.iter_mut() {
            let runs = match step.phase {
                Phase::Capture => entry.capture,
                Phase::Target => true,
                Phase::Bubble => !entry.capture,
            };
            if runs && (entry.handler)(event, control) == Outcome::Stop {
                outcome = Outcome::Stop;
            }
        }
        outcome
    }
}

impl<K: NodeKey> ListenerLookup<K> for Listeners<K> {
    fn has_listener(&self, node: K) -> bool {
        self.kinds.contains_key(&EventTarget::Node(node))
    }
}
