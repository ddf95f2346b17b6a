// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use reticle_intersect::PointerId;

pub use reticle_intersect::IntersectError;

/// Failure reported by a host when asked to grab or release its own capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostCaptureError {
    /// The host does not know the pointer, or it is no longer active.
    #[error("host has no active pointer {0}")]
    UnknownPointer(PointerId),
    /// The host refused the request.
    #[error("host rejected the capture request for pointer {0}")]
    Rejected(PointerId),
}
