// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debug outlines in pixel space.
//!
//! Hosts draw these lines over the container to see where the bodies
//! actually are. Everything is converted back to pixels so no knowledge of
//! the world scale is needed on the drawing side.

use crate::units::PixelScale;
use crate::world::{CollisionId, PhysicsWorld};
use rapier2d::prelude::*;

/// Color of a child collider outline
pub const COLLIDER_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 0.8];
/// Color of a wall outline
pub const BOUND_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 0.5];
/// Color of a velocity line
pub const VELOCITY_COLOR: [f32; 4] = [0.0, 0.5, 1.0, 1.0];

const CIRCLE_SEGMENTS: usize = 16;
/// Longest velocity line, in meters
const MAX_VELOCITY_LENGTH: f32 = 5.0;

/// Debug line for visualization, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Start point
    pub start: [f32; 2],
    /// End point
    pub end: [f32; 2],
    /// RGBA color
    pub color: [f32; 4],
}

fn to_pixels(point: Point<Real>, scale: PixelScale) -> [f32; 2] {
    [
        scale.meters_to_pixels(point.x),
        scale.meters_to_pixels(point.y),
    ]
}

/// Outline of every box and circle collider in the world
pub fn collider_lines(world: &PhysicsWorld, scale: PixelScale) -> Vec<DebugLine> {
    let mut lines = Vec::new();

    for (handle, collider) in world.colliders() {
        let color = match world.collision_id(handle) {
            Some(CollisionId::Bound(_)) => BOUND_COLOR,
            _ => COLLIDER_COLOR,
        };
        let position = collider.position();
        let shape = collider.shape();

        if let Some(cuboid) = shape.as_cuboid() {
            let half = cuboid.half_extents;
            let corners = [
                point![-half.x, -half.y],
                point![half.x, -half.y],
                point![half.x, half.y],
                point![-half.x, half.y],
            ];
            for i in 0..corners.len() {
                let a = position * corners[i];
                let b = position * corners[(i + 1) % corners.len()];
                lines.push(DebugLine {
                    start: to_pixels(a, scale),
                    end: to_pixels(b, scale),
                    color,
                });
            }
        } else if let Some(ball) = shape.as_ball() {
            let radius = ball.radius;
            for i in 0..CIRCLE_SEGMENTS {
                let angle1 = (i as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
                let angle2 = ((i + 1) as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
                let a = position * point![angle1.cos() * radius, angle1.sin() * radius];
                let b = position * point![angle2.cos() * radius, angle2.sin() * radius];
                lines.push(DebugLine {
                    start: to_pixels(a, scale),
                    end: to_pixels(b, scale),
                    color,
                });
            }
        }
    }

    lines
}

/// A line along the velocity of every moving body
pub fn velocity_lines(world: &PhysicsWorld, scale: PixelScale) -> Vec<DebugLine> {
    let mut lines = Vec::new();

    for (_, body) in world.bodies() {
        let velocity = body.linvel();
        let length = velocity.norm();
        if length > 0.01 {
            let start = Point::from(*body.translation());
            let end = start + velocity.normalize() * length.min(MAX_VELOCITY_LENGTH);
            lines.push(DebugLine {
                start: to_pixels(start, scale),
                end: to_pixels(end, scale),
                color: VELOCITY_COLOR,
            });
        }
    }

    lines
}
