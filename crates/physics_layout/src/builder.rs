// SPDX-License-Identifier: MIT OR Apache-2.0
//! World builder.
//!
//! Every layout pass throws the old world away and builds a new one from
//! the current children. Motion state of bodies that existed before the
//! rebuild is captured first and carried into their replacements so the
//! rebuild does not show up as a visible jump.

use crate::config::{PhysicsConfig, Shape};
use crate::host::{ChildKey, ChildView};
use crate::units::{degrees_to_radians, PixelScale};
use crate::world::{CollisionId, PhysicsWorld};
use indexmap::IndexMap;
use rapier2d::prelude::*;
use std::collections::HashMap;

/// Motion state carried from an old body to its replacement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Rotation in radians
    pub angle: f32,
    /// Angular velocity in rad/s
    pub angular_velocity: f32,
    /// Linear velocity in m/s
    pub linear_velocity: Vector<Real>,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
}

impl BodyState {
    /// Snapshot a body's motion state
    pub fn capture(body: &RigidBody) -> Self {
        Self {
            angle: body.rotation().angle(),
            angular_velocity: body.angvel(),
            linear_velocity: *body.linvel(),
            linear_damping: body.linear_damping(),
            angular_damping: body.angular_damping(),
        }
    }
}

/// Link between a child view and its body in the current world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildBinding {
    /// View id at build time
    pub id: Option<i32>,
    /// Body of the child
    pub body: RigidBodyHandle,
    /// Collider of the child
    pub collider: ColliderHandle,
}

/// A child together with the config resolved for it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChild {
    /// Geometry snapshot
    pub view: ChildView,
    /// Config to build the body from
    pub config: PhysicsConfig,
}

/// Parameters of a world rebuild
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSpec {
    /// Container width in pixels
    pub width: f32,
    /// Container height in pixels
    pub height: f32,
    /// Gravity in m/s²
    pub gravity: Vector<Real>,
    /// Whether to create walls
    pub bounds_enabled: bool,
    /// Wall thickness in pixels
    pub bounds_size: f32,
    /// Solver velocity iterations
    pub velocity_iterations: usize,
    /// Solver position iterations
    pub position_iterations: usize,
    /// World scale
    pub scale: PixelScale,
}

/// Result of a rebuild
#[derive(Debug)]
pub struct BuiltWorld {
    /// The new world
    pub world: PhysicsWorld,
    /// Body of every child, in view order
    pub children: IndexMap<ChildKey, ChildBinding>,
}

/// Snapshot the motion state of every child body in a world
pub fn capture_states(
    world: Option<&PhysicsWorld>,
    children: &IndexMap<ChildKey, ChildBinding>,
) -> HashMap<ChildKey, BodyState> {
    let Some(world) = world else {
        return HashMap::new();
    };
    children
        .iter()
        .filter_map(|(key, binding)| {
            world
                .body(binding.body)
                .map(|body| (*key, BodyState::capture(body)))
        })
        .collect()
}

/// Build a new world mirroring `children`.
///
/// `on_body_created` is invoked once per child, in view order, right after
/// its body is inserted.
pub fn rebuild_world(
    spec: &WorldSpec,
    children: &[ResolvedChild],
    previous: &HashMap<ChildKey, BodyState>,
    mut on_body_created: impl FnMut(&ChildView, &RigidBody),
) -> BuiltWorld {
    let mut world = PhysicsWorld::new(
        spec.gravity,
        spec.velocity_iterations,
        spec.position_iterations,
    );
    if spec.bounds_enabled {
        world.create_bounds(spec.width, spec.height, spec.bounds_size, spec.scale);
    }

    let mut bindings = IndexMap::with_capacity(children.len());
    for child in children {
        let (body, collider) = build_child(
            &child.view,
            &child.config,
            previous.get(&child.view.key),
            spec.scale,
        );
        let tag = child.view.id.map_or(CollisionId::NoId, CollisionId::View);
        let (body_handle, collider_handle) = world.insert_body(body, collider, tag);
        bindings.insert(
            child.view.key,
            ChildBinding {
                id: child.view.id,
                body: body_handle,
                collider: collider_handle,
            },
        );
        if let Some(body) = world.body(body_handle) {
            on_body_created(&child.view, body);
        }
    }

    tracing::debug!(
        "Physics world rebuilt: {} children, {} bodies, {} carried over",
        bindings.len(),
        world.body_count(),
        children
            .iter()
            .filter(|c| previous.contains_key(&c.view.key))
            .count()
    );

    BuiltWorld {
        world,
        children: bindings,
    }
}

/// Body and collider for one child view
pub fn build_child(
    view: &ChildView,
    config: &PhysicsConfig,
    previous: Option<&BodyState>,
    scale: PixelScale,
) -> (RigidBody, Collider) {
    let mut builder = RigidBodyBuilder::new(config.body.body_type.to_rapier())
        .translation(vector![
            scale.pixels_to_meters(view.center_x()),
            scale.pixels_to_meters(view.center_y())
        ])
        .linear_damping(config.body.linear_damping)
        .angular_damping(config.body.angular_damping);
    if config.body.fixed_rotation {
        builder = builder.lock_rotations();
    }
    builder = match previous {
        Some(state) => builder
            .rotation(state.angle)
            .angvel(state.angular_velocity)
            .linvel(state.linear_velocity)
            .linear_damping(state.linear_damping)
            .angular_damping(state.angular_damping),
        None => builder.angvel(degrees_to_radians(view.rotation)),
    };

    let shape = match config.shape {
        Shape::Rectangle => ColliderBuilder::cuboid(
            scale.pixels_to_meters(view.half_width()),
            scale.pixels_to_meters(view.half_height()),
        ),
        Shape::Circle => ColliderBuilder::ball(scale.pixels_to_meters(config.circle_radius(view))),
    };
    let collider = shape
        .density(config.fixture.density)
        .friction(config.fixture.friction)
        .restitution(config.fixture.restitution)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();

    (builder.build(), collider)
}
