// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo scene description.
//!
//! A scene is a RON file holding the container size, its attributes, the
//! child views and a short script of what happens while it runs.

use physics_layout::{AttributeSet, ChildKey, PhysicsError, VirtualView};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scene shipped with the binary
pub const PLAYGROUND: &str = include_str!("../scenes/playground.ron");

/// Errors raised while loading or running a scene
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// The scene file could not be read
    #[error("Failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    /// The scene file is not valid RON
    #[error("Failed to parse scene: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The physics component rejected the scene
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// The fling script names a view that is not in the scene
    #[error("Fling target not found: {0:?}")]
    MissingFlingTarget(ChildKey),
}

/// A drag-and-fling performed at a given frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedFling {
    /// Frame at which the gesture happens
    pub at_frame: usize,
    /// View to grab
    pub key: ChildKey,
    /// Where the pointer drags the view's center to
    pub to_x: f32,
    /// Where the pointer drags the view's center to
    pub to_y: f32,
    /// Release velocity in px/s
    pub velocity_x: f32,
    /// Release velocity in px/s
    pub velocity_y: f32,
}

fn default_frames() -> usize {
    120
}

fn default_density() -> f32 {
    1.0
}

/// A container and its children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoScene {
    /// Container width in pixels
    pub width: f32,
    /// Container height in pixels
    pub height: f32,
    /// Display density
    #[serde(default = "default_density")]
    pub density: f32,
    /// Container attributes
    #[serde(default)]
    pub attributes: AttributeSet,
    /// Children in draw order
    pub views: Vec<VirtualView>,
    /// Number of frames to simulate
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Optional drag-and-fling
    #[serde(default)]
    pub fling: Option<ScriptedFling>,
    /// Frame at which every body gets a random kick
    #[serde(default)]
    pub random_impulse_at: Option<usize>,
    /// Seed for the random kick; unseeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl DemoScene {
    /// Parse a scene from RON text
    pub fn from_ron(source: &str) -> Result<Self, DemoError> {
        Ok(ron::from_str(source)?)
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }

    /// The scene shipped with the binary
    pub fn playground() -> Result<Self, DemoError> {
        Self::from_ron(PLAYGROUND)
    }
}
