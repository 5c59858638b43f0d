// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the physics layout core.

use crate::host::ChildKey;

/// Errors raised by physics layout operations
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The pixels-per-meter scale is zero, negative or not finite
    #[error("Pixels per meter must be positive and finite, got {0}")]
    InvalidPixelsPerMeter(f32),

    /// A view is already captured by the drag controller
    #[error("A view is already captured: {0:?}")]
    AlreadyCaptured(ChildKey),

    /// Release requested while no view is captured
    #[error("No view is captured")]
    NotCaptured,

    /// The host has no child with this key
    #[error("Child not found: {0:?}")]
    UnknownChild(ChildKey),

    /// A dimension attribute could not be parsed
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// An attribute file could not be parsed
    #[error("Attribute parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
