// SPDX-License-Identifier: MIT OR Apache-2.0
//! Static walls around the edges of the container.

use crate::units::PixelScale;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

/// Density of a wall collider
pub const BOUND_DENSITY: f32 = 0.5;
/// Friction of a wall collider
pub const BOUND_FRICTION: f32 = 0.3;
/// Restitution of a wall collider
pub const BOUND_RESTITUTION: f32 = 0.5;

/// Edge of the container a wall sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Above the container
    Top,
    /// Left of the container
    Left,
    /// Right of the container
    Right,
    /// Below the container
    Bottom,
}

impl Side {
    /// All four sides, in creation order
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];
}

/// A wall around one edge of the container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// Half-extent along x, in pixels
    pub width_in_pixels: f32,
    /// Half-extent along y, in pixels
    pub height_in_pixels: f32,
    /// Static body backing the wall
    pub body: RigidBodyHandle,
    /// Which edge this wall guards
    pub side: Side,
}

/// Pixel-space geometry of a wall before it is inserted into a world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundGeometry {
    /// Edge
    pub side: Side,
    /// Half-extent along x, in pixels
    pub width_in_pixels: f32,
    /// Half-extent along y, in pixels
    pub height_in_pixels: f32,
}

impl BoundGeometry {
    /// Geometry of the wall on `side` for a container of the given size
    pub fn new(side: Side, container_width: f32, container_height: f32, bounds_size: f32) -> Self {
        let (width_in_pixels, height_in_pixels) = match side {
            Side::Top | Side::Bottom => (container_width, bounds_size),
            Side::Left | Side::Right => (bounds_size, container_height),
        };
        Self {
            side,
            width_in_pixels,
            height_in_pixels,
        }
    }

    /// Wall center in meters, just outside the container edge
    pub fn center(
        &self,
        container_width: f32,
        container_height: f32,
        scale: PixelScale,
    ) -> Vector<Real> {
        let half_width = scale.pixels_to_meters(self.width_in_pixels);
        let half_height = scale.pixels_to_meters(self.height_in_pixels);
        match self.side {
            Side::Top => vector![0.0, -half_height],
            Side::Bottom => vector![0.0, scale.pixels_to_meters(container_height) + half_height],
            Side::Left => vector![-half_width, 0.0],
            Side::Right => vector![scale.pixels_to_meters(container_width) + half_width, 0.0],
        }
    }

    /// Static body and collider for this wall
    pub fn build(
        &self,
        container_width: f32,
        container_height: f32,
        scale: PixelScale,
    ) -> (RigidBody, Collider) {
        let body = RigidBodyBuilder::fixed()
            .translation(self.center(container_width, container_height, scale))
            .build();
        let collider = ColliderBuilder::cuboid(
            scale.pixels_to_meters(self.width_in_pixels),
            scale.pixels_to_meters(self.height_in_pixels),
        )
        .density(BOUND_DENSITY)
        .friction(BOUND_FRICTION)
        .restitution(BOUND_RESTITUTION)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
        (body, collider)
    }
}
