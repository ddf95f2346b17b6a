// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click and double-click recognition.
//!
//! A press is recorded twice: once for the pointer that pressed and once for
//! the target that was pressed. A release is a click only if both records
//! agree, which stops one pointer from completing a click that a different
//! pointer started on the same target.
//!
//! ## Usage
//!
//! ```
//! use reticle_event_state::click::{ClickResult, ClickState};
//! use reticle_event_state::click::{DEFAULT_CLICK_THRESHOLD, DEFAULT_DBL_CLICK_THRESHOLD};
//!
//! let mut state: ClickState<u32> = ClickState::new();
//!
//! // Pointer 1 presses the primary button on target 42.
//! state.on_down(1, 0, 42, 1000);
//! assert_eq!(
//!     state.on_up(1, 0, &42, 1100, DEFAULT_CLICK_THRESHOLD),
//!     ClickResult::Click
//! );
//!
//! // A second click soon after pairs with the first.
//! assert!(!state.register_click(&42, 0, 1100, DEFAULT_DBL_CLICK_THRESHOLD));
//! assert!(state.register_click(&42, 0, 1300, DEFAULT_DBL_CLICK_THRESHOLD));
//! ```
//!
//! ## Rules
//!
//! 1. **Same pointer**: the target's press must come from the releasing pointer.
//! 2. **Same press**: the target's press time must equal the pointer's press time.
//! 3. **Threshold**: the release must follow the press within the click threshold.
//! 4. **Double click**: two clicks on the same target and button within the
//!    double-click threshold pair up once; the pair is then reset, so a third
//!    click starts a new pair.
//!
//! Thresholds are passed per call because each pointer carries its own.
//! The defaults are [`DEFAULT_CLICK_THRESHOLD`] and [`DEFAULT_DBL_CLICK_THRESHOLD`].

use core::hash::Hash;

use hashbrown::HashMap;

/// Pointer identifier.
pub type PointerId = u64;

/// Button code (DOM numbering).
pub type Button = u8;

/// Default click threshold in milliseconds.
pub const DEFAULT_CLICK_THRESHOLD: u64 = 300;

/// Default double-click threshold in milliseconds.
pub const DEFAULT_DBL_CLICK_THRESHOLD: u64 = 500;

/// Press recorded on a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Press {
    /// Pointer that pressed.
    pub pointer: PointerId,
    /// Timestamp of the press.
    pub down_time: u64,
}

/// Outcome of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickResult {
    /// The release completes a click.
    Click,
    /// No click.
    Suppressed,
}

/// Press and click bookkeeping for all pointers.
#[derive(Clone, Debug)]
pub struct ClickState<K> {
    pointer_presses: HashMap<(PointerId, Button), u64>,
    target_presses: HashMap<(K, Button), Press>,
    last_clicks: HashMap<(K, Button), u64>,
}

impl<K: Eq + Hash + Clone> Default for ClickState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> ClickState<K> {
    /// Create empty click state.
    pub fn new() -> Self {
        Self {
            pointer_presses: HashMap::new(),
            target_presses: HashMap::new(),
            last_clicks: HashMap::new(),
        }
    }

    /// Record a press of `button` by `pointer` on `target`.
    pub fn on_down(&mut self, pointer: PointerId, button: Button, target: K, timestamp: u64) {
        self.pointer_presses.insert((pointer, button), timestamp);
        self.target_presses.insert(
            (target, button),
            Press {
                pointer,
                down_time: timestamp,
            },
        );
    }

    /// Process a release of `button` by `pointer` over `target`.
    ///
    /// A click needs the press to be at most `click_threshold` ms old. The
    /// pointer's press is consumed either way; the target's press is consumed
    /// only when it belonged to this pointer.
    pub fn on_up(
        &mut self,
        pointer: PointerId,
        button: Button,
        target: &K,
        timestamp: u64,
        click_threshold: u64,
    ) -> ClickResult {
        let Some(pointer_down) = self.pointer_presses.remove(&(pointer, button)) else {
            return ClickResult::Suppressed;
        };
        let key = (target.clone(), button);
        let Some(press) = self.target_presses.get(&key).copied() else {
            return ClickResult::Suppressed;
        };
        if press.pointer != pointer {
            return ClickResult::Suppressed;
        }
        self.target_presses.remove(&key);
        if press.down_time == pointer_down
            && timestamp.saturating_sub(press.down_time) <= click_threshold
        {
            ClickResult::Click
        } else {
            ClickResult::Suppressed
        }
    }

    /// Record a click on `target` and report whether it completes a double click.
    ///
    /// The previous click must be at most `dbl_click_threshold` ms old. A
    /// completed pair clears the record so the next click starts over.
    pub fn register_click(
        &mut self,
        target: &K,
        button: Button,
        timestamp: u64,
        dbl_click_threshold: u64,
    ) -> bool {
        let key = (target.clone(), button);
        match self.last_clicks.get(&key) {
            Some(&last) if timestamp.saturating_sub(last) <= dbl_click_threshold => {
                self.last_clicks.remove(&key);
                true
            }
            _ => {
                self.last_clicks.insert(key, timestamp);
                false
            }
        }
    }

    /// Forget every press of `pointer`; its pending releases will not click.
    ///
    /// Returns `true` if a press was dropped.
    pub fn cancel(&mut self, pointer: PointerId) -> bool {
        let before = self.pointer_presses.len();
        self.pointer_presses.retain(|(p, _), _| *p != pointer);
        self.target_presses.retain(|_, press| press.pointer != pointer);
        self.pointer_presses.len() != before
    }

    /// Forget everything recorded for `target`, for example when it leaves the scene.
    pub fn forget_target(&mut self, target: &K) {
        self.target_presses.retain(|(t, _), _| t != target);
        self.last_clicks.retain(|(t, _), _| t != target);
    }

    /// Press time of `button` on `pointer`, if pressed.
    pub fn pointer_down_time(&self, pointer: PointerId, button: Button) -> Option<u64> {
        self.pointer_presses.get(&(pointer, button)).copied()
    }

    /// Press recorded on `target` for `button`, if any.
    pub fn target_press(&self, target: &K, button: Button) -> Option<Press> {
        self.target_presses.get(&(target.clone(), button)).copied()
    }

    /// Whether `pointer` has any button recorded as pressed.
    pub fn is_pressed(&self, pointer: PointerId) -> bool {
        self.pointer_presses.keys().any(|(p, _)| *p == pointer)
    }

    /// Whether any pointer holds a press on `target`.
    pub fn has_active_press(&self, target: &K) -> bool {
        self.target_presses.keys().any(|(t, _)| t == target)
    }

    /// Clear all presses and click history.
    pub fn clear(&mut self) {
        self.pointer_presses.clear();
        self.target_presses.clear();
        self.last_clicks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICK: u64 = DEFAULT_CLICK_THRESHOLD;
    const DBL: u64 = DEFAULT_DBL_CLICK_THRESHOLD;

    #[test]
    fn press_and_release_on_same_target_clicks() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        assert!(state.is_pressed(1));
        assert_eq!(state.on_up(1, 0, &42, 1050, CLICK), ClickResult::Click);
        assert!(!state.is_pressed(1));
        assert!(!state.has_active_press(&42));
    }

    #[test]
    fn release_on_other_target_does_not_click() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        assert_eq!(state.on_up(1, 0, &99, 1050, CLICK), ClickResult::Suppressed);
        // The pointer press is consumed.
        assert!(!state.is_pressed(1));
    }

    #[test]
    fn slow_release_does_not_click() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        assert_eq!(state.on_up(1, 0, &42, 1301, CLICK), ClickResult::Suppressed);

        // Exactly at the threshold still clicks.
        state.on_down(1, 0, 42, 2000);
        assert_eq!(state.on_up(1, 0, &42, 2300, CLICK), ClickResult::Click);
    }

    #[test]
    fn other_pointer_cannot_complete_click() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        // Pointer 2 pressed elsewhere, releases over 42.
        state.on_down(2, 0, 7, 1010);
        assert_eq!(state.on_up(2, 0, &42, 1020, CLICK), ClickResult::Suppressed);
        // Pointer 1's press on 42 is still intact.
        assert_eq!(state.on_up(1, 0, &42, 1030, CLICK), ClickResult::Click);
    }

    #[test]
    fn newer_press_by_another_pointer_steals_target() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        state.on_down(2, 0, 42, 1005);
        assert_eq!(state.on_up(1, 0, &42, 1010, CLICK), ClickResult::Suppressed);
        assert_eq!(state.on_up(2, 0, &42, 1015, CLICK), ClickResult::Click);
    }

    #[test]
    fn buttons_are_independent() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        assert_eq!(state.on_up(1, 2, &42, 1010, CLICK), ClickResult::Suppressed);
        assert_eq!(state.on_up(1, 0, &42, 1020, CLICK), ClickResult::Click);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut state: ClickState<u32> = ClickState::new();
        assert_eq!(state.on_up(1, 0, &42, 1000, CLICK), ClickResult::Suppressed);
    }

    #[test]
    fn double_clicks_pair_once() {
        let mut state: ClickState<u32> = ClickState::new();
        assert!(!state.register_click(&42, 0, 1000, DBL));
        assert!(state.register_click(&42, 0, 1200, DBL));
        // Third click starts a new pair.
        assert!(!state.register_click(&42, 0, 1400, DBL));
        assert!(state.register_click(&42, 0, 1600, DBL));
    }

    #[test]
    fn slow_second_click_restarts_pair() {
        let mut state: ClickState<u32> = ClickState::new();
        assert!(!state.register_click(&42, 0, 1000, DBL));
        assert!(!state.register_click(&42, 0, 1501, DBL));
        assert!(state.register_click(&42, 0, 1900, DBL));
    }

    #[test]
    fn cancel_and_forget_drop_state() {
        let mut state: ClickState<u32> = ClickState::new();
        state.on_down(1, 0, 42, 1000);
        assert!(state.cancel(1));
        assert!(!state.cancel(1));
        assert_eq!(state.on_up(1, 0, &42, 1010, CLICK), ClickResult::Suppressed);

        state.on_down(1, 0, 42, 2000);
        state.register_click(&42, 0, 2000, DBL);
        state.forget_target(&42);
        assert!(state.target_press(&42, 0).is_none());
        assert!(!state.register_click(&42, 0, 2100, DBL));
        assert_eq!(state.pointer_down_time(1, 0), Some(2000));
    }
}
