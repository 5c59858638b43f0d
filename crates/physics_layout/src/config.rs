// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-child physics configuration.
//!
//! This module handles:
//! - The immutable [`PhysicsConfig`] value used to build a child's body
//! - Parsing layout-parameter attributes into a config
//! - Resolving which config applies to a child (explicit > layout > default)

use crate::attributes::AttributeSet;
use crate::host::{ChildKey, ChildView};
use rapier2d::prelude::RigidBodyType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Collision shape of a child body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Shape {
    /// Box matching the view bounds
    #[default]
    Rectangle,
    /// Circle, sized by the configured radius or the larger half-extent
    Circle,
}

impl Shape {
    fn from_attribute(raw: &str) -> Option<Self> {
        match raw {
            "rectangle" | "0" => Some(Shape::Rectangle),
            "circle" | "1" => Some(Shape::Circle),
            _ => None,
        }
    }
}

/// Simulation type of a child body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BodyType {
    /// Never moves
    Static,
    /// Moved by its velocity only, unaffected by forces
    Kinematic,
    /// Fully simulated
    #[default]
    Dynamic,
}

impl BodyType {
    /// Engine body type
    pub fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
            BodyType::Dynamic => RigidBodyType::Dynamic,
        }
    }

    fn from_attribute(raw: &str) -> Option<Self> {
        match raw {
            "static" | "0" => Some(BodyType::Static),
            "kinematic" | "1" => Some(BodyType::Kinematic),
            "dynamic" | "2" => Some(BodyType::Dynamic),
            _ => None,
        }
    }
}

/// Material of a child's collider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FixtureDef {
    /// Mass per square meter
    pub density: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Bounciness (0-1)
    pub restitution: f32,
}

impl Default for FixtureDef {
    fn default() -> Self {
        Self {
            density: 0.2,
            friction: 0.3,
            restitution: 0.2,
        }
    }
}

/// Body properties of a child
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BodyDef {
    /// Body type (dynamic by default)
    pub body_type: BodyType,
    /// Prevent the body from rotating
    pub fixed_rotation: bool,
    /// Linear velocity decay
    pub linear_damping: f32,
    /// Angular velocity decay
    pub angular_damping: f32,
}

/// Configuration used when building a child's body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PhysicsConfig {
    /// Collision shape
    pub shape: Shape,
    /// Circle radius in pixels; `None` uses the larger half-extent of the view
    pub radius: Option<f32>,
    /// Collider material
    pub fixture: FixtureDef,
    /// Body properties
    pub body: BodyDef,
}

impl PhysicsConfig {
    /// Default rectangle config
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with a circle shape
    pub fn circle() -> Self {
        Self::default().with_shape(Shape::Circle)
    }

    /// Set the shape
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the circle radius in pixels
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Set the collider material
    pub fn with_fixture(mut self, fixture: FixtureDef) -> Self {
        self.fixture = fixture;
        self
    }

    /// Set the body properties
    pub fn with_body(mut self, body: BodyDef) -> Self {
        self.body = body;
        self
    }

    /// Circle radius in pixels for a view of the given geometry
    pub fn circle_radius(&self, view: &ChildView) -> f32 {
        self.radius
            .unwrap_or_else(|| view.half_width().max(view.half_height()))
    }

    /// Build a config from child layout attributes. Only attributes that are
    /// present override the stock [`PhysicsConfig::default`]. A resolver's
    /// custom default never applies here: a child with layout attributes
    /// takes its whole config from them.
    pub fn from_layout_attributes(attrs: &AttributeSet, density: f32) -> Self {
        let mut config = Self::default();

        if let Some(raw) = attrs.get("layout_shape") {
            match Shape::from_attribute(raw.trim()) {
                Some(shape) => config.shape = shape,
                None => tracing::warn!("Unknown layout_shape {:?}", raw),
            }
        }
        if attrs.has_value("layout_circleRadius") {
            let radius = attrs.get_dimension("layout_circleRadius", -1.0, density);
            if radius >= 0.0 {
                config.radius = Some(radius);
            }
        }

        if let Some(raw) = attrs.get("layout_bodyType") {
            match BodyType::from_attribute(raw.trim()) {
                Some(body_type) => config.body.body_type = body_type,
                None => tracing::warn!("Unknown layout_bodyType {:?}", raw),
            }
        }
        config.body.fixed_rotation =
            attrs.get_bool("layout_fixedRotation", config.body.fixed_rotation);

        config.fixture.friction = attrs.get_float("layout_friction", config.fixture.friction);
        config.fixture.restitution =
            attrs.get_float("layout_restitution", config.fixture.restitution);
        config.fixture.density = attrs.get_float("layout_density", config.fixture.density);

        config
    }
}

/// Decides which [`PhysicsConfig`] applies to each child.
///
/// Explicit configs are registered by key and survive rebuilds. Resolved
/// configs are cached per key until [`ConfigResolver::clear_resolved`] is
/// called at the start of the next rebuild.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    default: PhysicsConfig,
    explicit: HashMap<ChildKey, PhysicsConfig>,
    resolved: HashMap<ChildKey, PhysicsConfig>,
}

impl ConfigResolver {
    /// Create a resolver with the stock default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with a custom default config
    pub fn with_default(default: PhysicsConfig) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// The fallback config
    pub fn default_config(&self) -> &PhysicsConfig {
        &self.default
    }

    /// Replace the fallback config
    pub fn set_default_config(&mut self, config: PhysicsConfig) {
        self.default = config;
        self.resolved.clear();
    }

    /// Register (or clear, with `None`) an explicit config for a child
    pub fn set_explicit(&mut self, key: ChildKey, config: Option<PhysicsConfig>) {
        match config {
            Some(config) => {
                self.explicit.insert(key, config);
            }
            None => {
                self.explicit.remove(&key);
            }
        }
        self.resolved.remove(&key);
    }

    /// The explicit config registered for a child
    pub fn explicit(&self, key: ChildKey) -> Option<&PhysicsConfig> {
        self.explicit.get(&key)
    }

    /// The config last resolved for a child
    pub fn resolved(&self, key: ChildKey) -> Option<&PhysicsConfig> {
        self.resolved.get(&key)
    }

    /// Forget cached resolutions
    pub fn clear_resolved(&mut self) {
        self.resolved.clear();
    }

    /// Forget everything registered for a child that no longer exists
    pub fn forget(&mut self, key: ChildKey) {
        self.explicit.remove(&key);
        self.resolved.remove(&key);
    }

    /// Resolve the config for a child: explicit, then layout-parameter, then
    /// default. The result is cached until the next [`Self::clear_resolved`].
    pub fn resolve(&mut self, key: ChildKey, layout: Option<&PhysicsConfig>) -> PhysicsConfig {
        if let Some(config) = self.resolved.get(&key) {
            return *config;
        }
        let config = self
            .explicit
            .get(&key)
            .or(layout)
            .copied()
            .unwrap_or(self.default);
        self.resolved.insert(key, config);
        config
    }
}
