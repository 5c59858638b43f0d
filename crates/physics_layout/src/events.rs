// SPDX-License-Identifier: MIT OR Apache-2.0
//! Listener interfaces and event fan-out.
//!
//! Collision, body-created and fling listeners are single slots: setting a
//! new one replaces the previous one. Physics-processed listeners form an
//! ordered list and are invoked in registration order.

use crate::host::ChildView;
use crate::world::{CollisionId, CollisionPair, PhysicsWorld};
use indexmap::IndexMap;
use rapier2d::prelude::RigidBody;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Receives collisions between bodies in the layout
pub trait CollisionListener {
    /// A contact between two bodies began
    fn on_collision_entered(&mut self, a: CollisionId, b: CollisionId);

    /// A contact between two bodies ended
    fn on_collision_exited(&mut self, a: CollisionId, b: CollisionId);
}

/// Hook invoked after every simulation step, e.g. to apply extra forces
pub trait PhysicsProcessedListener {
    /// The world has just been stepped
    fn on_physics_processed(&mut self, world: &mut PhysicsWorld);
}

impl<F: FnMut(&mut PhysicsWorld)> PhysicsProcessedListener for F {
    fn on_physics_processed(&mut self, world: &mut PhysicsWorld) {
        self(world);
    }
}

/// Hook invoked when a body is created for a child view
pub trait BodyCreatedListener {
    /// `body` was created for `view`
    fn on_body_created(&mut self, view: &ChildView, body: &RigidBody);
}

impl<F: FnMut(&ChildView, &RigidBody)> BodyCreatedListener for F {
    fn on_body_created(&mut self, view: &ChildView, body: &RigidBody) {
        self(view, body);
    }
}

/// Receives drag capture and release
pub trait FlingListener {
    /// A view was grabbed
    fn on_grabbed(&mut self, view: &ChildView);

    /// A view was released
    fn on_released(&mut self, view: &ChildView);
}

/// Handle for removing a physics-processed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// All listeners registered on a physics component
#[derive(Default)]
pub struct Listeners {
    collision: Option<Box<dyn CollisionListener>>,
    physics_processed: IndexMap<ListenerId, Box<dyn PhysicsProcessedListener>>,
    body_created: Option<Box<dyn BodyCreatedListener>>,
    fling: Option<Box<dyn FlingListener>>,
}

impl Listeners {
    /// Create an empty listener registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collision listener
    pub fn set_collision_listener(&mut self, listener: Option<Box<dyn CollisionListener>>) {
        self.collision = listener;
    }

    /// Replace the body-created listener
    pub fn set_body_created_listener(&mut self, listener: Option<Box<dyn BodyCreatedListener>>) {
        self.body_created = listener;
    }

    /// Replace the fling listener
    pub fn set_fling_listener(&mut self, listener: Option<Box<dyn FlingListener>>) {
        self.fling = listener;
    }

    /// Append a physics-processed listener
    pub fn add_physics_processed_listener(
        &mut self,
        listener: Box<dyn PhysicsProcessedListener>,
    ) -> ListenerId {
        let id = ListenerId::new();
        self.physics_processed.insert(id, listener);
        id
    }

    /// Remove a physics-processed listener, keeping the order of the rest
    pub fn remove_physics_processed_listener(&mut self, id: ListenerId) -> bool {
        self.physics_processed.shift_remove(&id).is_some()
    }

    /// Number of physics-processed listeners
    pub fn physics_processed_count(&self) -> usize {
        self.physics_processed.len()
    }

    /// Deliver a collision begin/end
    pub fn emit_collision(&mut self, pair: CollisionPair) {
        let Some(listener) = self.collision.as_mut() else {
            return;
        };
        if pair.started {
            listener.on_collision_entered(pair.a, pair.b);
        } else {
            listener.on_collision_exited(pair.a, pair.b);
        }
    }

    /// Deliver the stepped world to every physics-processed listener
    pub fn emit_physics_processed(&mut self, world: &mut PhysicsWorld) {
        for listener in self.physics_processed.values_mut() {
            listener.on_physics_processed(world);
        }
    }

    /// Deliver a body creation
    pub fn emit_body_created(&mut self, view: &ChildView, body: &RigidBody) {
        if let Some(listener) = self.body_created.as_mut() {
            listener.on_body_created(view, body);
        }
    }

    /// Deliver a grab
    pub fn emit_grabbed(&mut self, view: &ChildView) {
        if let Some(listener) = self.fling.as_mut() {
            listener.on_grabbed(view);
        }
    }

    /// Deliver a release
    pub fn emit_released(&mut self, view: &ChildView) {
        if let Some(listener) = self.fling.as_mut() {
            listener.on_released(view);
        }
    }
}
