// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physics world managing the simulation.
//!
//! [`PhysicsWorld`] wraps the rapier pipeline state together with:
//! - A collider tag table used to report collisions by view id
//! - The set of wall bodies around the container
//! - A collision event collector drained after every step

use crate::bounds::{Bound, BoundGeometry, Side};
use crate::settings::FRAME_RATE;
use crate::units::PixelScale;
use parking_lot::Mutex;
use rapier2d::prelude::*;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Identifier reported for each side of a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionId {
    /// A child view with an id
    View(i32),
    /// A child view without an id
    NoId,
    /// One of the container walls
    Bound(Side),
}

/// A collision begin/end between two tagged colliders.
///
/// `a <= b` always holds, so the same pair is reported in the same order
/// when it begins and when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    /// Lower id of the pair
    pub a: CollisionId,
    /// Higher id of the pair
    pub b: CollisionId,
    /// `true` when the contact began, `false` when it ended
    pub started: bool,
}

impl CollisionPair {
    /// Create a pair in canonical order
    pub fn new(first: CollisionId, second: CollisionId, started: bool) -> Self {
        let (a, b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self { a, b, started }
    }
}

/// Collects collision events raised while the pipeline steps
struct EventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl EventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.collisions.lock())
    }
}

impl EventHandler for EventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions.lock().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Physics world for one layout pass
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    events: EventCollector,
    /// Collision id of every live collider
    tags: HashMap<ColliderHandle, CollisionId>,
    /// Tags of colliders removed since the last step, kept so their
    /// end-of-contact events can still be reported
    retired_tags: HashMap<ColliderHandle, CollisionId>,
    bounds: Vec<Bound>,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new(
        gravity: Vector<Real>,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> Self {
        let mut integration_parameters = IntegrationParameters {
            dt: FRAME_RATE,
            ..IntegrationParameters::default()
        };
        apply_iterations(
            &mut integration_parameters,
            velocity_iterations,
            position_iterations,
        );

        Self {
            gravity,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            events: EventCollector::new(),
            tags: HashMap::new(),
            retired_tags: HashMap::new(),
            bounds: Vec::new(),
        }
    }

    /// Current gravity in m/s²
    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /// Change gravity for subsequent steps
    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        self.gravity = gravity;
    }

    /// Change solver iteration counts for subsequent steps
    pub fn set_iterations(&mut self, velocity_iterations: usize, position_iterations: usize) {
        apply_iterations(
            &mut self.integration_parameters,
            velocity_iterations,
            position_iterations,
        );
    }

    /// Integration parameters used for each step
    pub fn integration_parameters(&self) -> &IntegrationParameters {
        &self.integration_parameters
    }

    /// Insert a body with a single collider tagged for collision reporting
    pub fn insert_body(
        &mut self,
        body: RigidBody,
        collider: Collider,
        tag: CollisionId,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.bodies.insert(body);
        let collider_handle = self
            .colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);
        self.tags.insert(collider_handle, tag);
        (body_handle, collider_handle)
    }

    /// Remove a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        let removed = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )?;
        for collider in removed.colliders() {
            if let Some(tag) = self.tags.remove(collider) {
                self.retired_tags.insert(*collider, tag);
            }
        }
        Some(removed)
    }

    /// Get a body
    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Get a mutable body
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Get a collider
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// All bodies, walls included
    pub fn bodies(&self) -> impl Iterator<Item = (RigidBodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    /// All colliders
    pub fn colliders(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter()
    }

    /// Number of bodies, walls included
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Collision id of a collider, if it is still known
    pub fn collision_id(&self, collider: ColliderHandle) -> Option<CollisionId> {
        self.tags
            .get(&collider)
            .or_else(|| self.retired_tags.get(&collider))
            .copied()
    }

    /// Apply an impulse at a body's center of mass
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vector<Real>) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(impulse, true);
        }
    }

    /// Walls currently in the world
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Check whether walls exist
    pub fn has_bounds(&self) -> bool {
        !self.bounds.is_empty()
    }

    /// Create the four walls around a container of the given pixel size,
    /// replacing any existing walls
    pub fn create_bounds(
        &mut self,
        container_width: f32,
        container_height: f32,
        bounds_size: f32,
        scale: PixelScale,
    ) {
        self.remove_bounds();
        for side in Side::ALL {
            let geometry = BoundGeometry::new(side, container_width, container_height, bounds_size);
            let (body, collider) = geometry.build(container_width, container_height, scale);
            let (handle, _) = self.insert_body(body, collider, CollisionId::Bound(side));
            self.bounds.push(Bound {
                width_in_pixels: geometry.width_in_pixels,
                height_in_pixels: geometry.height_in_pixels,
                body: handle,
                side,
            });
        }
    }

    /// Destroy all walls, returning how many were removed
    pub fn remove_bounds(&mut self) -> usize {
        let bounds = std::mem::take(&mut self.bounds);
        for bound in &bounds {
            self.remove_body(bound.body);
        }
        bounds.len()
    }

    /// Advance the simulation by one fixed step and return the collisions
    /// that began or ended during it
    pub fn step(&mut self) -> Vec<CollisionPair> {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.events,
        );

        let pairs = self
            .events
            .drain()
            .into_iter()
            .filter_map(|event| {
                let first = self.collision_id(event.collider1())?;
                let second = self.collision_id(event.collider2())?;
                Some(CollisionPair::new(first, second, event.started()))
            })
            .collect();
        self.retired_tags.clear();
        pairs
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("bounds", &self.bounds.len())
            .finish()
    }
}

fn apply_iterations(
    parameters: &mut IntegrationParameters,
    velocity_iterations: usize,
    position_iterations: usize,
) {
    parameters.num_solver_iterations =
        NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
    parameters.num_internal_pgs_iterations = position_iterations.max(1);
}
