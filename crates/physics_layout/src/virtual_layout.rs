// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory view container.
//!
//! [`VirtualLayout`] implements [`ViewGroup`] without any UI toolkit, for
//! headless hosts, tests and the demo binary.

use crate::attributes::AttributeSet;
use crate::config::PhysicsConfig;
use crate::host::{ChildKey, ChildView, ViewGroup};
use serde::{Deserialize, Serialize};

/// A child view held by a [`VirtualLayout`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualView {
    /// Stable identity
    pub key: ChildKey,
    /// View id reported in collisions
    #[serde(default)]
    pub id: Option<i32>,
    /// Left edge in pixels
    pub x: f32,
    /// Top edge in pixels
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
    /// Rotation in degrees
    #[serde(default)]
    pub rotation: f32,
    /// Physics layout parameters
    #[serde(default)]
    pub layout: Option<AttributeSet>,
}

impl VirtualView {
    /// Create an unrotated view without an id
    pub fn new(key: ChildKey, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            key,
            id: None,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            layout: None,
        }
    }

    /// Set the view id
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the rotation in degrees
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the physics layout parameters
    pub fn with_layout(mut self, layout: AttributeSet) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Geometry snapshot
    pub fn snapshot(&self) -> ChildView {
        ChildView {
            key: self.key,
            id: self.id,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }
}

/// View container kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct VirtualLayout {
    views: Vec<VirtualView>,
    density: f32,
    invalidations: usize,
}

impl VirtualLayout {
    /// Create an empty container for a display of the given density
    pub fn new(density: f32) -> Self {
        Self {
            views: Vec::new(),
            density,
            invalidations: 0,
        }
    }

    /// Append a child; later children draw on top
    pub fn add_view(&mut self, view: VirtualView) {
        self.views.push(view);
    }

    /// Remove a child
    pub fn remove_view(&mut self, key: ChildKey) -> Option<VirtualView> {
        let index = self.views.iter().position(|view| view.key == key)?;
        Some(self.views.remove(index))
    }

    /// Get a child
    pub fn view(&self, key: ChildKey) -> Option<&VirtualView> {
        self.views.iter().find(|view| view.key == key)
    }

    /// Get a mutable child
    pub fn view_mut(&mut self, key: ChildKey) -> Option<&mut VirtualView> {
        self.views.iter_mut().find(|view| view.key == key)
    }

    /// All children in draw order
    pub fn views(&self) -> &[VirtualView] {
        &self.views
    }

    /// Number of redraw requests so far
    pub fn invalidation_count(&self) -> usize {
        self.invalidations
    }
}

impl ViewGroup for VirtualLayout {
    fn child_count(&self) -> usize {
        self.views.len()
    }

    fn child(&self, index: usize) -> Option<ChildView> {
        self.views.get(index).map(VirtualView::snapshot)
    }

    fn layout_config(&self, index: usize) -> Option<PhysicsConfig> {
        let layout = self.views.get(index)?.layout.as_ref()?;
        Some(PhysicsConfig::from_layout_attributes(layout, self.density))
    }

    fn set_child_position(&mut self, index: usize, x: f32, y: f32) {
        if let Some(view) = self.views.get_mut(index) {
            view.x = x;
            view.y = y;
        }
    }

    fn set_child_rotation(&mut self, index: usize, degrees: f32) {
        if let Some(view) = self.views.get_mut(index) {
            view.rotation = degrees;
        }
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }
}
