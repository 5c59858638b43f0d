// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rigid-body physics for the children of a view container.
//!
//! This crate keeps a 2D physics world in lockstep with a tree of views:
//! - World building from child geometry and per-child configuration
//! - Fixed-step simulation with body → view transform sync
//! - Drag and fling of a single captured child
//! - Collision, body-created and physics-processed notifications
//!
//! ## Architecture
//!
//! The host view system is reached through the [`ViewGroup`] trait. A host
//! forwards its size, layout, draw and touch callbacks to a [`Physics`]
//! instance, which rebuilds the world on layout, steps it on draw and
//! writes positions and rotations back to the children. The rigid-body
//! solver itself is `rapier2d`.

pub mod attributes;
pub mod bounds;
pub mod builder;
pub mod config;
pub mod debug;
pub mod drag;
pub mod error;
pub mod events;
pub mod host;
pub mod physics;
pub mod settings;
pub mod units;
pub mod virtual_layout;
pub mod world;

pub use attributes::AttributeSet;
pub use bounds::{Bound, Side};
pub use config::{BodyDef, BodyType, ConfigResolver, FixtureDef, PhysicsConfig, Shape};
pub use debug::DebugLine;
pub use drag::{DragController, DragState, PointerEvent};
pub use error::PhysicsError;
pub use events::{
    BodyCreatedListener, CollisionListener, FlingListener, ListenerId, PhysicsProcessedListener,
};
pub use host::{ChildKey, ChildView, ViewGroup};
pub use physics::Physics;
pub use settings::{DisplayMetrics, PhysicsSettings};
pub use units::PixelScale;
pub use virtual_layout::{VirtualLayout, VirtualView};
pub use world::{CollisionId, CollisionPair, PhysicsWorld};

/// Re-export of the physics engine so hosts can work with bodies directly
pub use rapier2d;
