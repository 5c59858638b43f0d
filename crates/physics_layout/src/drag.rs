// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drag and fling of a single child view.
//!
//! The controller only tracks which child is held and where the pointer
//! was last seen. Moving views and bodies is left to [`crate::Physics`].

use crate::error::PhysicsError;
use crate::host::{ChildKey, ViewGroup};
use serde::{Deserialize, Serialize};

/// Pointer input forwarded by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Pointer pressed
    Down {
        /// Horizontal position in pixels
        x: f32,
        /// Vertical position in pixels
        y: f32,
    },
    /// Pointer moved while pressed
    Move {
        /// Horizontal position in pixels
        x: f32,
        /// Vertical position in pixels
        y: f32,
    },
    /// Pointer lifted
    Up {
        /// Horizontal position in pixels
        x: f32,
        /// Vertical position in pixels
        y: f32,
        /// Release velocity in px/s
        velocity_x: f32,
        /// Release velocity in px/s
        velocity_y: f32,
    },
    /// Gesture aborted by the host
    Cancel,
}

/// Drag state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragState {
    /// Nothing held
    #[default]
    Idle,
    /// A child is held under the pointer
    Captured {
        /// The held child
        key: ChildKey,
    },
}

/// Tracks the captured child and the last pointer position
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
    last_pointer: (f32, f32),
}

impl DragController {
    /// Create an idle controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> DragState {
        self.state
    }

    /// The held child, if any
    pub fn captured(&self) -> Option<ChildKey> {
        match self.state {
            DragState::Idle => None,
            DragState::Captured { key } => Some(key),
        }
    }

    /// Check whether a child is held
    pub fn is_captured(&self) -> bool {
        self.captured().is_some()
    }

    /// Start holding `key` with the pointer at `(x, y)`
    pub fn capture(&mut self, key: ChildKey, x: f32, y: f32) -> Result<(), PhysicsError> {
        if let DragState::Captured { key: held } = self.state {
            return Err(PhysicsError::AlreadyCaptured(held));
        }
        self.state = DragState::Captured { key };
        self.last_pointer = (x, y);
        Ok(())
    }

    /// Move the pointer, returning the held child and the pointer delta
    pub fn drag_to(&mut self, x: f32, y: f32) -> Option<(ChildKey, f32, f32)> {
        let key = self.captured()?;
        let (last_x, last_y) = self.last_pointer;
        self.last_pointer = (x, y);
        Some((key, x - last_x, y - last_y))
    }

    /// Stop holding, returning the child that was released
    pub fn release(&mut self) -> Result<ChildKey, PhysicsError> {
        let key = self.captured().ok_or(PhysicsError::NotCaptured)?;
        self.state = DragState::Idle;
        Ok(key)
    }
}

/// Top-most child whose bounds contain the point. Later children draw on
/// top of earlier ones.
pub fn find_top_child_under(host: &dyn ViewGroup, x: f32, y: f32) -> Option<usize> {
    (0..host.child_count())
        .rev()
        .find(|&index| host.child(index).is_some_and(|child| child.contains(x, y)))
}
