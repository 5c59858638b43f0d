// SPDX-License-Identifier: MIT OR Apache-2.0
//! Container-level physics settings.
//!
//! Settings are read once from the container's [`AttributeSet`] when the
//! physics component is constructed. Every attribute is optional.

use crate::attributes::AttributeSet;
use serde::{Deserialize, Serialize};

/// No gravity at all
pub const NO_GRAVITY: f32 = 0.0;
/// Gravity on the moon, in m/s²
pub const MOON_GRAVITY: f32 = 1.6;
/// Gravity on earth, in m/s²
pub const EARTH_GRAVITY: f32 = 9.8;
/// Gravity on jupiter, in m/s²
pub const JUPITER_GRAVITY: f32 = 24.8;

/// Default thickness of the world walls, in dp
pub const BOUND_SIZE_DP: f32 = 20.0;
/// Default world scale, in dp per meter
pub const DP_PER_METER: f32 = 20.0;
/// Fixed simulation timestep, in seconds
pub const FRAME_RATE: f32 = 1.0 / 60.0;
/// Default solver velocity iterations
pub const DEFAULT_VELOCITY_ITERATIONS: usize = 8;
/// Default solver position iterations
pub const DEFAULT_POSITION_ITERATIONS: usize = 3;

/// Screen density information supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    /// Pixels per dp
    pub density: f32,
}

impl DisplayMetrics {
    /// Create display metrics for the given density
    pub fn new(density: f32) -> Self {
        Self { density }
    }

    /// Convert dp to pixels
    pub fn dp_to_pixels(&self, dp: f32) -> f32 {
        dp * self.density
    }
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self { density: 1.0 }
    }
}

/// Settings of a physics container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    /// Whether the simulation runs on draw
    pub physics_enabled: bool,
    /// Horizontal gravity, positive is right
    pub gravity_x: f32,
    /// Vertical gravity, positive is down
    pub gravity_y: f32,
    /// Whether the four world walls exist
    pub bounds_enabled: bool,
    /// Wall thickness in pixels
    pub bounds_size: f32,
    /// Whether children can be dragged and flung
    pub fling_enabled: bool,
    /// Solver velocity iterations per step
    pub velocity_iterations: usize,
    /// Solver position iterations per step
    pub position_iterations: usize,
    /// World scale
    pub pixels_per_meter: f32,
}

impl PhysicsSettings {
    /// Default settings for a display
    pub fn new(metrics: DisplayMetrics) -> Self {
        Self {
            physics_enabled: true,
            gravity_x: NO_GRAVITY,
            gravity_y: EARTH_GRAVITY,
            bounds_enabled: true,
            bounds_size: metrics.dp_to_pixels(BOUND_SIZE_DP),
            fling_enabled: false,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            pixels_per_meter: metrics.dp_to_pixels(DP_PER_METER),
        }
    }

    /// Read settings from container attributes, keeping defaults for
    /// anything absent or malformed
    pub fn from_attributes(attrs: &AttributeSet, metrics: DisplayMetrics) -> Self {
        let defaults = Self::new(metrics);
        Self {
            physics_enabled: attrs.get_bool("physicsEnabled", defaults.physics_enabled),
            gravity_x: attrs.get_float("gravityX", defaults.gravity_x),
            gravity_y: attrs.get_float("gravityY", defaults.gravity_y),
            bounds_enabled: attrs.get_bool("boundsEnabled", defaults.bounds_enabled),
            bounds_size: attrs.get_dimension("boundsSize", defaults.bounds_size, metrics.density),
            fling_enabled: attrs.get_bool("flingEnabled", defaults.fling_enabled),
            velocity_iterations: iterations(
                attrs,
                "velocityIterations",
                defaults.velocity_iterations,
            ),
            position_iterations: iterations(
                attrs,
                "positionIterations",
                defaults.position_iterations,
            ),
            pixels_per_meter: attrs.get_float("pixelsPerMeter", defaults.pixels_per_meter),
        }
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self::new(DisplayMetrics::default())
    }
}

fn iterations(attrs: &AttributeSet, name: &str, default: usize) -> usize {
    let raw = attrs.get_int(name, default as i64);
    match usize::try_from(raw) {
        Ok(count) if count > 0 => count,
        _ => {
            tracing::warn!("{} must be positive, got {}; using {}", name, raw, default);
            default
        }
    }
}
