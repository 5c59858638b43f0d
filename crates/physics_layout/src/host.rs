// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host container capabilities.
//!
//! A host is any view container that can report its children and their
//! geometry, accept transform updates, and optionally provide per-child
//! layout-parameter configuration. Frame, linear or flow containers all
//! implement the same [`ViewGroup`] trait and share one [`crate::Physics`].

use crate::config::PhysicsConfig;
use serde::{Deserialize, Serialize};

/// Stable identity of a child view, independent of its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildKey(pub u64);

/// Snapshot of a child view's geometry, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ChildView {
    /// Stable identity
    pub key: ChildKey,
    /// User-assigned view id, reported in collisions
    pub id: Option<i32>,
    /// Left edge on screen
    pub x: f32,
    /// Top edge on screen
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Clockwise rotation in degrees
    pub rotation: f32,
}

impl ChildView {
    /// Half of the width
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Half of the height
    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    /// Horizontal center
    pub fn center_x(&self) -> f32 {
        self.x + self.half_width()
    }

    /// Vertical center
    pub fn center_y(&self) -> f32 {
        self.y + self.half_height()
    }

    /// Check whether a point lies inside the (unrotated) view bounds
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A view container hosting physics-driven children
pub trait ViewGroup {
    /// Number of children
    fn child_count(&self) -> usize;

    /// Geometry of the child at `index`
    fn child(&self, index: usize) -> Option<ChildView>;

    /// Config embedded in the child's layout parameters, if the container
    /// supports physics layout parameters
    fn layout_config(&self, _index: usize) -> Option<PhysicsConfig> {
        None
    }

    /// Move the child's top-left corner
    fn set_child_position(&mut self, index: usize, x: f32, y: f32);

    /// Rotate the child, in degrees
    fn set_child_rotation(&mut self, index: usize, degrees: f32);

    /// Request a redraw of the container
    fn invalidate(&mut self) {}

    /// Index of the child with the given key
    fn index_of(&self, key: ChildKey) -> Option<usize> {
        (0..self.child_count()).find(|&index| self.child(index).is_some_and(|c| c.key == key))
    }

    /// Index of the first child with the given view id
    fn find_child_by_id(&self, id: i32) -> Option<usize> {
        (0..self.child_count()).find(|&index| self.child(index).is_some_and(|c| c.id == Some(id)))
    }
}
