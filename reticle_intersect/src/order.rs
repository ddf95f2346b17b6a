// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit ordering shared by every intersector.
//!
//! ## Rule
//!
//! - A higher `pointer_events_order` always wins; an absent order counts as `0`.
//! - Equal orders fall back to the smaller `distance`.
//! - A [`HitSort::Custom`] comparator replaces both steps.
//!
//! Comparators return [`Ordering::Less`] when the first candidate should win.
//! Distances are compared with [`f32::total_cmp`], so the rule stays a strict
//! weak ordering even for NaN distances produced by degenerate geometry.
//!
//! ## Ties
//!
//! [`BestHit`] only replaces its running best when a candidate is strictly
//! better, so among equal candidates the first one offered wins. Traversal
//! visits nodes in scene order, which makes the result deterministic.

use core::cmp::Ordering;

use crate::types::EventTarget;

/// The subset of an intersection that participates in ordering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate<K> {
    /// Hit target.
    pub target: EventTarget<K>,
    /// Distance in the intersector's metric.
    pub distance: f32,
    /// Resolved `pointer_events_order` of the target.
    pub order: Option<i32>,
}

/// Caller-supplied comparator. Return [`Ordering::Less`] when `a` should win over `b`.
pub type CustomSort<K> = fn(&Candidate<K>, &Candidate<K>) -> Ordering;

/// Which ordering rule to apply.
#[derive(Copy, Clone, Debug, Default)]
pub enum HitSort<K> {
    /// Order priority, then distance.
    #[default]
    Default,
    /// Caller-supplied comparator.
    Custom(CustomSort<K>),
}

impl<K> HitSort<K> {
    /// Compare two candidates; [`Ordering::Less`] means `a` wins.
    pub fn compare(&self, a: &Candidate<K>, b: &Candidate<K>) -> Ordering {
        match self {
            Self::Default => default_compare(a, b),
            Self::Custom(f) => f(a, b),
        }
    }
}

/// Order priority (higher first), then distance (smaller first).
pub fn default_compare<K>(a: &Candidate<K>, b: &Candidate<K>) -> Ordering {
    let oa = a.order.unwrap_or(0);
    let ob = b.order.unwrap_or(0);
    ob.cmp(&oa).then_with(|| a.distance.total_cmp(&b.distance))
}

/// Running best candidate with an attached payload.
#[derive(Clone, Debug)]
pub struct BestHit<K, T> {
    best: Option<(Candidate<K>, T)>,
}

impl<K, T> Default for BestHit<K, T> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<K, T> BestHit<K, T> {
    /// Offer a candidate; returns `true` if it became the new best.
    pub fn offer(&mut self, candidate: Candidate<K>, payload: T, sort: &HitSort<K>) -> bool {
        let better = match &self.best {
            None => true,
            Some((current, _)) => sort.compare(&candidate, current) == Ordering::Less,
        };
        if better {
            self.best = Some((candidate, payload));
        }
        better
    }

    /// Current best, if any.
    pub fn get(&self) -> Option<&(Candidate<K>, T)> {
        self.best.as_ref()
    }

    /// Take the best and reset.
    pub fn take(&mut self) -> Option<(Candidate<K>, T)> {
        self.best.take()
    }

    /// Forget the running best.
    pub fn clear(&mut self) {
        self.best = None;
    }
}
