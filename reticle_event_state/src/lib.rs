// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reticle Event State: timing state shared by pointers.
//!
//! - [`click`]: press bookkeeping per pointer and per target, click and
//!   double-click recognition by timestamp comparison.
//!
//! There are no timers; every decision is made when the release arrives.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod click;
