// SPDX-License-Identifier: MIT OR Apache-2.0
//! The physics component attached to a view container.
//!
//! This module handles:
//! - Rebuilding the world on every layout pass
//! - Stepping the world on draw and syncing bodies back to the children
//! - Drag and fling of a single child through the host's touch events
//! - Runtime tuning of gravity, walls, iterations and scale
//!
//! The host owns its children and forwards its lifecycle callbacks here:
//! [`Physics::on_size_changed`], [`Physics::on_layout`],
//! [`Physics::on_draw`], [`Physics::on_intercept_touch_event`] and
//! [`Physics::on_touch_event`].

use crate::attributes::AttributeSet;
use crate::builder::{capture_states, rebuild_world, ChildBinding, ResolvedChild, WorldSpec};
use crate::config::{ConfigResolver, PhysicsConfig};
use crate::debug::{collider_lines, velocity_lines, DebugLine};
use crate::drag::{find_top_child_under, DragController, DragState, PointerEvent};
use crate::error::PhysicsError;
use crate::events::{
    BodyCreatedListener, CollisionListener, FlingListener, ListenerId, Listeners,
    PhysicsProcessedListener,
};
use crate::host::{ChildKey, ChildView, ViewGroup};
use crate::settings::{DisplayMetrics, PhysicsSettings};
use crate::units::{degrees_to_radians, normalize_degrees, radians_to_degrees, PixelScale};
use crate::world::PhysicsWorld;
use indexmap::IndexMap;
use rand::Rng;
use rapier2d::prelude::*;

/// Bound of the random impulse on each axis
const RANDOM_IMPULSE_RANGE: i32 = 1000;

/// Physics state of one view container
pub struct Physics {
    settings: PhysicsSettings,
    metrics: DisplayMetrics,
    /// Scale of the current world
    scale: PixelScale,
    /// Scale to use from the next rebuild on
    pending_scale: Option<PixelScale>,
    width: f32,
    height: f32,
    world: Option<PhysicsWorld>,
    children: IndexMap<ChildKey, ChildBinding>,
    configs: ConfigResolver,
    drag: DragController,
    listeners: Listeners,
}

impl Physics {
    /// Create the physics component for a container
    pub fn new(settings: PhysicsSettings, metrics: DisplayMetrics) -> Result<Self, PhysicsError> {
        let scale = PixelScale::new(settings.pixels_per_meter)?;

        tracing::info!(
            "Physics initialized: gravity ({}, {}), {} px/m, bounds {}, fling {}",
            settings.gravity_x,
            settings.gravity_y,
            scale.pixels_per_meter(),
            settings.bounds_enabled,
            settings.fling_enabled
        );

        Ok(Self {
            settings,
            metrics,
            scale,
            pending_scale: None,
            width: 0.0,
            height: 0.0,
            world: None,
            children: IndexMap::new(),
            configs: ConfigResolver::new(),
            drag: DragController::new(),
            listeners: Listeners::new(),
        })
    }

    /// Create the physics component from container attributes
    pub fn from_attributes(
        attrs: &AttributeSet,
        metrics: DisplayMetrics,
    ) -> Result<Self, PhysicsError> {
        Self::new(PhysicsSettings::from_attributes(attrs, metrics), metrics)
    }

    // ------------------------------------------------------------------
    // Host callbacks
    // ------------------------------------------------------------------

    /// The container was resized
    pub fn on_size_changed(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Rebuild the world from the container's current children
    pub fn on_layout(&mut self, host: &dyn ViewGroup) {
        if let Some(scale) = self.pending_scale.take() {
            tracing::debug!(
                "Applying new scale: {} -> {} px/m",
                self.scale.pixels_per_meter(),
                scale.pixels_per_meter()
            );
            self.scale = scale;
        }

        let previous = capture_states(self.world.as_ref(), &self.children);
        self.configs.clear_resolved();

        let children: Vec<ResolvedChild> = (0..host.child_count())
            .filter_map(|index| {
                let view = host.child(index)?;
                let layout = host.layout_config(index);
                let config = self.configs.resolve(view.key, layout.as_ref());
                Some(ResolvedChild { view, config })
            })
            .collect();

        let spec = WorldSpec {
            width: self.width,
            height: self.height,
            gravity: vector![self.settings.gravity_x, self.settings.gravity_y],
            bounds_enabled: self.settings.bounds_enabled,
            bounds_size: self.settings.bounds_size,
            velocity_iterations: self.settings.velocity_iterations,
            position_iterations: self.settings.position_iterations,
            scale: self.scale,
        };
        let listeners = &mut self.listeners;
        let built = rebuild_world(&spec, &children, &previous, |view, body| {
            listeners.emit_body_created(view, body);
        });

        self.world = Some(built.world);
        self.children = built.children;

        if let Some(key) = self.drag.captured() {
            if !self.children.contains_key(&key) {
                tracing::debug!("Captured child {:?} left the layout, dropping drag", key);
                self.drag = DragController::new();
            }
        }
    }

    /// Advance the simulation by one frame and move the children
    pub fn on_draw(&mut self, host: &mut dyn ViewGroup) {
        if !self.settings.physics_enabled {
            return;
        }
        let Some(world) = self.world.as_mut() else {
            return;
        };

        for pair in world.step() {
            self.listeners.emit_collision(pair);
        }

        let captured = self.drag.captured();
        for index in 0..host.child_count() {
            let Some(view) = host.child(index) else {
                continue;
            };
            let Some(binding) = self.children.get(&view.key) else {
                continue;
            };

            if captured == Some(view.key) {
                if let Some(body) = world.body_mut(binding.body) {
                    snap_body_to_view(body, &view, self.scale);
                }
            } else if let Some(body) = world.body(binding.body) {
                let translation = body.translation();
                host.set_child_position(
                    index,
                    self.scale.meters_to_pixels(translation.x) - view.half_width(),
                    self.scale.meters_to_pixels(translation.y) - view.half_height(),
                );
                host.set_child_rotation(
                    index,
                    normalize_degrees(radians_to_degrees(body.rotation().angle())),
                );
            }
        }

        self.listeners.emit_physics_processed(world);
        host.invalidate();
    }

    /// Decide whether the container takes over a touch gesture
    pub fn on_intercept_touch_event(
        &mut self,
        host: &mut dyn ViewGroup,
        event: PointerEvent,
    ) -> bool {
        if !self.settings.fling_enabled {
            return false;
        }
        match event {
            PointerEvent::Down { x, y } => self.grab_at(host, x, y),
            PointerEvent::Move { .. } => self.drag.is_captured(),
            PointerEvent::Up { .. } | PointerEvent::Cancel => {
                if self.drag.is_captured() {
                    let _ = self.release_child(host, None);
                }
                false
            }
        }
    }

    /// Handle a touch gesture the container has taken over
    pub fn on_touch_event(&mut self, host: &mut dyn ViewGroup, event: PointerEvent) -> bool {
        if !self.settings.fling_enabled {
            return false;
        }
        match event {
            PointerEvent::Down { x, y } => {
                self.grab_at(host, x, y);
            }
            PointerEvent::Move { x, y } => self.drag_captured(host, x, y),
            PointerEvent::Up {
                velocity_x,
                velocity_y,
                ..
            } => {
                if self.drag.is_captured() {
                    let _ = self.release_child(host, Some((velocity_x, velocity_y)));
                }
            }
            PointerEvent::Cancel => {
                if self.drag.is_captured() {
                    let _ = self.release_child(host, None);
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Drag and fling
    // ------------------------------------------------------------------

    fn grab_at(&mut self, host: &dyn ViewGroup, x: f32, y: f32) -> bool {
        let Some(view) = find_top_child_under(host, x, y).and_then(|index| host.child(index))
        else {
            return false;
        };
        match self.capture_child(host, view.key, x, y) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Ignoring grab: {}", e);
                false
            }
        }
    }

    fn drag_captured(&mut self, host: &mut dyn ViewGroup, x: f32, y: f32) {
        let Some((key, dx, dy)) = self.drag.drag_to(x, y) else {
            return;
        };
        let Some(index) = host.index_of(key) else {
            return;
        };
        if let Some(view) = host.child(index) {
            host.set_child_position(index, view.x + dx, view.y + dy);
        }
    }

    /// Start dragging a child. Its body stops moving until released.
    pub fn capture_child(
        &mut self,
        host: &dyn ViewGroup,
        key: ChildKey,
        x: f32,
        y: f32,
    ) -> Result<(), PhysicsError> {
        let view = child_by_key(host, key).ok_or(PhysicsError::UnknownChild(key))?;
        self.drag.capture(key, x, y)?;

        if let Some(body) = self.body_mut_for(key) {
            body.set_linvel(vector![0.0, 0.0], true);
            body.set_angvel(0.0, true);
        }
        tracing::debug!("Captured child {:?}", key);
        self.listeners.emit_grabbed(&view);
        Ok(())
    }

    /// Stop dragging. The body is moved to where the view was dropped and,
    /// given a release velocity in px/s, flung with it. Without a velocity
    /// the body is dropped at rest.
    pub fn release_child(
        &mut self,
        host: &dyn ViewGroup,
        velocity: Option<(f32, f32)>,
    ) -> Result<ChildKey, PhysicsError> {
        let key = self.drag.release()?;
        let view = child_by_key(host, key);
        let scale = self.scale;

        if let (Some(view), Some(body)) = (view.as_ref(), self.body_mut_for(key)) {
            snap_body_to_view(body, view, scale);
            match velocity {
                Some((velocity_x, velocity_y)) => body.set_linvel(
                    vector![
                        scale.pixels_to_meters(velocity_x),
                        scale.pixels_to_meters(velocity_y)
                    ],
                    true,
                ),
                // Held bodies keep integrating forces while the view is pinned
                None => {
                    body.set_linvel(vector![0.0, 0.0], true);
                    body.set_angvel(0.0, true);
                }
            }
            body.wake_up(true);
        }

        tracing::debug!("Released child {:?} with velocity {:?}", key, velocity);
        if let Some(view) = view {
            self.listeners.emit_released(&view);
        }
        Ok(key)
    }

    /// Current drag state
    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Settings currently in effect
    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Enable or disable stepping on draw
    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.settings.physics_enabled = enabled;
    }

    /// Check whether stepping on draw is enabled
    pub fn is_physics_enabled(&self) -> bool {
        self.settings.physics_enabled
    }

    /// Enable or disable drag and fling. Disabling drops any drag in
    /// progress.
    pub fn set_fling_enabled(&mut self, enabled: bool) {
        self.settings.fling_enabled = enabled;
        if !enabled && self.drag.is_captured() {
            self.drag = DragController::new();
        }
    }

    /// Check whether drag and fling are enabled
    pub fn is_fling_enabled(&self) -> bool {
        self.settings.fling_enabled
    }

    /// Set gravity in m/s², applied to the live world immediately
    pub fn set_gravity(&mut self, gravity_x: f32, gravity_y: f32) {
        self.settings.gravity_x = gravity_x;
        self.settings.gravity_y = gravity_y;
        if let Some(world) = self.world.as_mut() {
            world.set_gravity(vector![gravity_x, gravity_y]);
        }
    }

    /// Set horizontal gravity
    pub fn set_gravity_x(&mut self, gravity_x: f32) {
        self.set_gravity(gravity_x, self.settings.gravity_y);
    }

    /// Set vertical gravity
    pub fn set_gravity_y(&mut self, gravity_y: f32) {
        self.set_gravity(self.settings.gravity_x, gravity_y);
    }

    /// Horizontal gravity
    pub fn gravity_x(&self) -> f32 {
        self.settings.gravity_x
    }

    /// Vertical gravity
    pub fn gravity_y(&self) -> f32 {
        self.settings.gravity_y
    }

    /// Create or destroy the walls around the container
    pub fn set_bounds_enabled(&mut self, enabled: bool) {
        self.settings.bounds_enabled = enabled;
        if enabled {
            self.recreate_bounds();
        } else if let Some(world) = self.world.as_mut() {
            world.remove_bounds();
        }
    }

    /// Check whether walls are enabled
    pub fn is_bounds_enabled(&self) -> bool {
        self.settings.bounds_enabled
    }

    /// Set the wall thickness in dp and enable the walls
    pub fn set_bounds_size(&mut self, size_dp: f32) {
        self.settings.bounds_size = self.metrics.dp_to_pixels(size_dp);
        self.settings.bounds_enabled = true;
        self.recreate_bounds();
    }

    /// Wall thickness in pixels
    pub fn bounds_size(&self) -> f32 {
        self.settings.bounds_size
    }

    fn recreate_bounds(&mut self) {
        if let Some(world) = self.world.as_mut() {
            world.create_bounds(
                self.width,
                self.height,
                self.settings.bounds_size,
                self.scale,
            );
        }
    }

    /// Set the solver velocity iterations
    pub fn set_velocity_iterations(&mut self, iterations: usize) {
        self.settings.velocity_iterations = iterations;
        self.apply_iterations();
    }

    /// Solver velocity iterations
    pub fn velocity_iterations(&self) -> usize {
        self.settings.velocity_iterations
    }

    /// Set the solver position iterations
    pub fn set_position_iterations(&mut self, iterations: usize) {
        self.settings.position_iterations = iterations;
        self.apply_iterations();
    }

    /// Solver position iterations
    pub fn position_iterations(&self) -> usize {
        self.settings.position_iterations
    }

    fn apply_iterations(&mut self) {
        if let Some(world) = self.world.as_mut() {
            world.set_iterations(
                self.settings.velocity_iterations,
                self.settings.position_iterations,
            );
        }
    }

    /// Change the world scale. The current world keeps its scale; the new
    /// one is used from the next layout pass.
    pub fn set_pixels_per_meter(&mut self, pixels_per_meter: f32) -> Result<(), PhysicsError> {
        let scale = PixelScale::new(pixels_per_meter)?;
        self.settings.pixels_per_meter = pixels_per_meter;
        self.pending_scale = Some(scale);
        Ok(())
    }

    /// Configured pixels per meter, including a change not yet applied
    pub fn pixels_per_meter(&self) -> f32 {
        self.settings.pixels_per_meter
    }

    /// Scale of the current world
    pub fn scale(&self) -> PixelScale {
        self.scale
    }

    /// Convert meters to pixels at the current world scale
    pub fn meters_to_pixels(&self, meters: f32) -> f32 {
        self.scale.meters_to_pixels(meters)
    }

    /// Convert pixels to meters at the current world scale
    pub fn pixels_to_meters(&self, pixels: f32) -> f32 {
        self.scale.pixels_to_meters(pixels)
    }

    // ------------------------------------------------------------------
    // Per-child configuration
    // ------------------------------------------------------------------

    /// Register (or clear, with `None`) the config of a child. Applied on
    /// the next layout pass.
    pub fn set_physics_config(&mut self, key: ChildKey, config: Option<PhysicsConfig>) {
        self.configs.set_explicit(key, config);
    }

    /// Replace the config used by children without any other config
    pub fn set_default_config(&mut self, config: PhysicsConfig) {
        self.configs.set_default_config(config);
    }

    /// Config the child's current body was built from
    pub fn config_for(&self, key: ChildKey) -> Option<&PhysicsConfig> {
        self.configs.resolved(key)
    }

    /// Drop everything registered for a child that was removed for good
    pub fn forget_child(&mut self, key: ChildKey) {
        self.configs.forget(key);
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// The current world, once the first layout pass has run
    pub fn world(&self) -> Option<&PhysicsWorld> {
        self.world.as_ref()
    }

    /// The current world, mutably
    pub fn world_mut(&mut self) -> Option<&mut PhysicsWorld> {
        self.world.as_mut()
    }

    /// Handle of a child's body
    pub fn body_handle_for(&self, key: ChildKey) -> Option<RigidBodyHandle> {
        self.children.get(&key).map(|binding| binding.body)
    }

    /// Body of a child
    pub fn body_for(&self, key: ChildKey) -> Option<&RigidBody> {
        let binding = self.children.get(&key)?;
        self.world.as_ref()?.body(binding.body)
    }

    /// Body of a child, mutably
    pub fn body_mut_for(&mut self, key: ChildKey) -> Option<&mut RigidBody> {
        let binding = self.children.get(&key)?;
        self.world.as_mut()?.body_mut(binding.body)
    }

    /// Collider of a child
    pub fn collider_for(&self, key: ChildKey) -> Option<&Collider> {
        let binding = self.children.get(&key)?;
        self.world.as_ref()?.collider(binding.collider)
    }

    /// Body of the first child with the given view id
    pub fn find_body_by_id(&self, id: i32) -> Option<&RigidBody> {
        let binding = self
            .children
            .values()
            .find(|binding| binding.id == Some(id))?;
        self.world.as_ref()?.body(binding.body)
    }

    /// Kick every child body in a random direction up and to the left
    pub fn give_random_impulse(&mut self) {
        self.give_random_impulse_with(&mut rand::thread_rng());
    }

    /// [`Self::give_random_impulse`] with a caller-provided random source
    pub fn give_random_impulse_with<R: Rng>(&mut self, rng: &mut R) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        for binding in self.children.values() {
            let impulse = vector![
                rng.gen_range(-RANDOM_IMPULSE_RANGE..0) as f32,
                rng.gen_range(-RANDOM_IMPULSE_RANGE..0) as f32
            ];
            world.apply_impulse(binding.body, impulse);
        }
    }

    /// Outline of every collider, in pixels
    pub fn debug_outlines(&self) -> Vec<DebugLine> {
        self.world
            .as_ref()
            .map(|world| collider_lines(world, self.scale))
            .unwrap_or_default()
    }

    /// Velocity of every moving body, in pixels
    pub fn debug_velocities(&self) -> Vec<DebugLine> {
        self.world
            .as_ref()
            .map(|world| velocity_lines(world, self.scale))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Replace the collision listener
    pub fn set_collision_listener(&mut self, listener: Option<Box<dyn CollisionListener>>) {
        self.listeners.set_collision_listener(listener);
    }

    /// Replace the body-created listener
    pub fn set_body_created_listener(&mut self, listener: Option<Box<dyn BodyCreatedListener>>) {
        self.listeners.set_body_created_listener(listener);
    }

    /// Replace the drag listener
    pub fn set_fling_listener(&mut self, listener: Option<Box<dyn FlingListener>>) {
        self.listeners.set_fling_listener(listener);
    }

    /// Add a listener run after every step
    pub fn add_physics_processed_listener(
        &mut self,
        listener: impl PhysicsProcessedListener + 'static,
    ) -> ListenerId {
        self.listeners
            .add_physics_processed_listener(Box::new(listener))
    }

    /// Remove a listener added with [`Self::add_physics_processed_listener`]
    pub fn remove_physics_processed_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_physics_processed_listener(id)
    }
}

fn child_by_key(host: &dyn ViewGroup, key: ChildKey) -> Option<ChildView> {
    host.index_of(key).and_then(|index| host.child(index))
}

fn snap_body_to_view(body: &mut RigidBody, view: &ChildView, scale: PixelScale) {
    body.set_position(
        Isometry::new(
            vector![
                scale.pixels_to_meters(view.center_x()),
                scale.pixels_to_meters(view.center_y())
            ],
            degrees_to_radians(view.rotation),
        ),
        true,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Side;
    use crate::config::{FixtureDef, Shape};
    use crate::virtual_layout::{VirtualLayout, VirtualView};
    use crate::world::CollisionId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn settings() -> PhysicsSettings {
        PhysicsSettings::default()
    }

    fn physics(settings: PhysicsSettings) -> Physics {
        let mut physics = Physics::new(settings, DisplayMetrics::default()).unwrap();
        physics.on_size_changed(400.0, 800.0);
        physics
    }

    fn floating() -> PhysicsSettings {
        PhysicsSettings {
            gravity_y: 0.0,
            bounds_enabled: false,
            fling_enabled: true,
            ..settings()
        }
    }

    fn layout(views: impl IntoIterator<Item = VirtualView>) -> VirtualLayout {
        let mut layout = VirtualLayout::new(1.0);
        for view in views {
            layout.add_view(view);
        }
        layout
    }

    fn square(key: u64, x: f32, y: f32) -> VirtualView {
        VirtualView::new(ChildKey(key), x, y, 40.0, 40.0)
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl CollisionListener for Recorder {
        fn on_collision_entered(&mut self, a: CollisionId, b: CollisionId) {
            self.0.borrow_mut().push(format!("enter {a:?} {b:?}"));
        }

        fn on_collision_exited(&mut self, a: CollisionId, b: CollisionId) {
            self.0.borrow_mut().push(format!("exit {a:?} {b:?}"));
        }
    }

    impl FlingListener for Recorder {
        fn on_grabbed(&mut self, view: &ChildView) {
            self.0.borrow_mut().push(format!("grab {}", view.key.0));
        }

        fn on_released(&mut self, view: &ChildView) {
            self.0.borrow_mut().push(format!("release {}", view.key.0));
        }
    }

    #[test]
    fn test_invalid_pixels_per_meter() {
        let bad = PhysicsSettings {
            pixels_per_meter: -1.0,
            ..settings()
        };
        assert!(matches!(
            Physics::new(bad, DisplayMetrics::default()),
            Err(PhysicsError::InvalidPixelsPerMeter(_))
        ));

        let mut physics = physics(settings());
        assert!(physics.set_pixels_per_meter(0.0).is_err());
        assert!(physics.set_pixels_per_meter(f32::NAN).is_err());
        assert_eq!(physics.pixels_per_meter(), 20.0);
    }

    #[test]
    fn test_pixels_per_meter_applies_on_next_layout() {
        let mut physics = physics(settings());
        let host = layout([square(1, 0.0, 0.0)]);
        physics.on_layout(&host);

        physics.set_pixels_per_meter(40.0).unwrap();
        assert_eq!(physics.pixels_per_meter(), 40.0);
        assert_eq!(physics.meters_to_pixels(1.0), 20.0);

        physics.on_layout(&host);
        assert_eq!(physics.meters_to_pixels(1.0), 40.0);
        assert_eq!(physics.pixels_to_meters(20.0), 0.5);
        assert_eq!(
            *physics.body_for(ChildKey(1)).unwrap().translation(),
            vector![0.5, 0.5]
        );
    }

    #[test]
    fn test_gravity_pulls_children_down() {
        let mut physics = physics(settings());
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);

        for _ in 0..30 {
            physics.on_draw(&mut host);
        }
        let view = host.view(ChildKey(1)).unwrap();
        assert!(view.y > 100.0);
        assert!((view.x - 100.0).abs() < 1e-3);
        assert_eq!(host.invalidation_count(), 30);
    }

    #[test]
    fn test_disabled_physics_does_not_step() {
        let mut physics = physics(settings());
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);
        physics.set_physics_enabled(false);

        for _ in 0..10 {
            physics.on_draw(&mut host);
        }
        assert_eq!(host.view(ChildKey(1)).unwrap().y, 100.0);
        assert_eq!(host.invalidation_count(), 0);
        assert!(!physics.is_physics_enabled());
    }

    #[test]
    fn test_draw_before_layout_is_noop() {
        let mut physics = physics(settings());
        let mut host = layout([square(1, 0.0, 0.0)]);
        physics.on_draw(&mut host);
        assert!(physics.world().is_none());
        assert_eq!(host.invalidation_count(), 0);
    }

    #[test]
    fn test_empty_layout_steps() {
        let mut physics = physics(settings());
        let mut host = layout([]);
        physics.on_layout(&host);
        physics.on_draw(&mut host);
        assert_eq!(physics.world().unwrap().body_count(), 4);
        assert_eq!(host.invalidation_count(), 1);
    }

    #[test]
    fn test_rebuild_keeps_motion() {
        let mut physics = physics(settings());
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);
        physics.body_mut_for(ChildKey(1)).unwrap().set_angvel(1.5, true);

        for _ in 0..10 {
            physics.on_draw(&mut host);
        }
        let before = physics.body_for(ChildKey(1)).unwrap().clone();

        physics.on_layout(&host);
        let after = physics.body_for(ChildKey(1)).unwrap();

        assert_eq!(after.linvel(), before.linvel());
        assert_eq!(after.angvel(), before.angvel());
        assert!((after.rotation().angle() - before.rotation().angle()).abs() < 1e-4);
        assert!((after.translation() - before.translation()).norm() < 1e-3);
    }

    #[test]
    fn test_rotation_written_in_degrees() {
        let mut physics = physics(floating());
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);
        physics
            .body_mut_for(ChildKey(1))
            .unwrap()
            .set_rotation(Rotation::new(-0.5), true);

        physics.on_draw(&mut host);
        let rotation = host.view(ChildKey(1)).unwrap().rotation;
        assert!((0.0..360.0).contains(&rotation));
        assert!((rotation - (360.0 - 0.5_f32.to_degrees())).abs() < 1e-2);
    }

    #[test]
    fn test_bounds_toggle() {
        let mut physics = physics(settings());
        let host = layout([square(1, 0.0, 0.0)]);
        physics.on_layout(&host);
        assert_eq!(physics.world().unwrap().bounds().len(), 4);
        assert_eq!(physics.world().unwrap().body_count(), 5);

        physics.set_bounds_enabled(false);
        assert!(!physics.world().unwrap().has_bounds());
        assert_eq!(physics.world().unwrap().body_count(), 1);

        physics.on_size_changed(200.0, 300.0);
        physics.set_bounds_enabled(true);
        let world = physics.world().unwrap();
        assert_eq!(world.bounds().len(), 4);
        let bottom = world
            .bounds()
            .iter()
            .find(|bound| bound.side == Side::Bottom)
            .unwrap();
        assert_eq!(world.body(bottom.body).unwrap().translation().y, 16.0);

        physics.set_bounds_size(10.0);
        assert_eq!(physics.bounds_size(), 10.0);
        let world = physics.world().unwrap();
        assert_eq!(world.body_count(), 5);
        let bottom = world
            .bounds()
            .iter()
            .find(|bound| bound.side == Side::Bottom)
            .unwrap();
        assert_eq!(world.body(bottom.body).unwrap().translation().y, 15.5);
    }

    #[test]
    fn test_bounds_size_enables_bounds() {
        let mut physics = physics(PhysicsSettings {
            bounds_enabled: false,
            ..settings()
        });
        physics.on_layout(&layout([square(1, 0.0, 0.0)]));
        assert!(!physics.world().unwrap().has_bounds());

        physics.set_bounds_size(10.0);
        assert!(physics.is_bounds_enabled());
        assert_eq!(physics.bounds_size(), 10.0);
        let world = physics.world().unwrap();
        assert_eq!(world.bounds().len(), 4);
        assert_eq!(world.body_count(), 5);

        // Walls stay on across rebuilds
        physics.on_layout(&layout([square(1, 0.0, 0.0)]));
        assert_eq!(physics.world().unwrap().bounds().len(), 4);
    }

    #[test]
    fn test_bounds_size_before_layout() {
        let mut physics = physics(PhysicsSettings {
            bounds_enabled: false,
            ..settings()
        });
        physics.set_bounds_size(5.0);
        assert!(physics.is_bounds_enabled());
        assert!(physics.world().is_none());

        physics.on_layout(&layout([]));
        assert_eq!(physics.world().unwrap().bounds().len(), 4);
    }

    #[test]
    fn test_gravity_updates_live_world() {
        let mut physics = physics(settings());
        physics.on_layout(&layout([]));
        physics.set_gravity(0.0, crate::settings::MOON_GRAVITY);
        physics.set_gravity_x(-1.0);

        assert_eq!(physics.gravity_x(), -1.0);
        assert_eq!(physics.gravity_y(), 1.6);
        assert_eq!(physics.world().unwrap().gravity(), vector![-1.0, 1.6]);
    }

    #[test]
    fn test_iterations_update_live_world() {
        let mut physics = physics(settings());
        physics.on_layout(&layout([]));
        physics.set_velocity_iterations(4);
        physics.set_position_iterations(7);

        let params = physics.world().unwrap().integration_parameters();
        assert_eq!(params.num_solver_iterations.get(), 4);
        assert_eq!(params.num_internal_pgs_iterations, 7);
        assert_eq!(physics.velocity_iterations(), 4);
        assert_eq!(physics.position_iterations(), 7);
    }

    #[test]
    fn test_config_precedence() {
        let mut physics = physics(settings());
        let rectangle = AttributeSet::new().with("layout_shape", "rectangle");
        let circle = AttributeSet::new().with("layout_shape", "circle");
        let host = layout([
            square(1, 0.0, 0.0).with_layout(rectangle),
            square(2, 50.0, 0.0).with_layout(circle),
            square(3, 100.0, 0.0),
        ]);
        physics.set_physics_config(ChildKey(1), Some(PhysicsConfig::circle()));
        physics.on_layout(&host);

        assert!(physics.collider_for(ChildKey(1)).unwrap().shape().as_ball().is_some());
        assert!(physics.collider_for(ChildKey(2)).unwrap().shape().as_ball().is_some());
        assert!(physics.collider_for(ChildKey(3)).unwrap().shape().as_cuboid().is_some());
        assert_eq!(physics.config_for(ChildKey(1)).unwrap().shape, Shape::Circle);

        physics.set_physics_config(ChildKey(1), None);
        physics.on_layout(&host);
        assert!(physics.collider_for(ChildKey(1)).unwrap().shape().as_cuboid().is_some());
    }

    #[test]
    fn test_layout_attributes_ignore_custom_default() {
        let mut physics = physics(settings());
        let bouncy = AttributeSet::new().with("layout_restitution", "0.9");
        let host = layout([
            square(1, 0.0, 0.0).with_layout(bouncy),
            square(2, 100.0, 0.0),
        ]);
        physics.set_default_config(PhysicsConfig::circle());
        physics.on_layout(&host);

        let from_layout = physics.config_for(ChildKey(1)).unwrap();
        assert_eq!(from_layout.shape, Shape::Rectangle);
        assert_eq!(from_layout.fixture.restitution, 0.9);
        assert_eq!(physics.config_for(ChildKey(2)).unwrap().shape, Shape::Circle);
    }

    #[test]
    fn test_forget_child_drops_explicit_config() {
        let mut physics = physics(settings());
        let host = layout([square(1, 0.0, 0.0)]);
        physics.set_physics_config(ChildKey(1), Some(PhysicsConfig::circle()));
        physics.forget_child(ChildKey(1));
        physics.on_layout(&host);
        assert!(physics.collider_for(ChildKey(1)).unwrap().shape().as_cuboid().is_some());
    }

    #[test]
    fn test_collision_reported_by_view_id() {
        let mut physics = physics(floating());
        let bouncy = PhysicsConfig::circle().with_fixture(FixtureDef {
            density: 0.2,
            friction: 0.0,
            restitution: 1.0,
        });
        let host_views = [
            VirtualView::new(ChildKey(1), 0.0, 0.0, 20.0, 20.0).with_id(7),
            VirtualView::new(ChildKey(2), 60.0, 0.0, 20.0, 20.0).with_id(5),
        ];
        let mut host = layout(host_views);
        physics.set_physics_config(ChildKey(1), Some(bouncy));
        physics.set_physics_config(ChildKey(2), Some(bouncy));
        let recorder = Recorder::default();
        physics.set_collision_listener(Some(Box::new(recorder.clone())));

        physics.on_layout(&host);
        physics
            .body_mut_for(ChildKey(1))
            .unwrap()
            .set_linvel(vector![2.0, 0.0], true);
        for _ in 0..240 {
            physics.on_draw(&mut host);
        }

        assert_eq!(
            *recorder.0.borrow(),
            vec!["enter View(5) View(7)", "exit View(5) View(7)"]
        );
    }

    #[test]
    fn test_drag_and_fling() {
        let mut physics = physics(floating());
        let mut host = layout([square(1, 100.0, 100.0)]);
        let recorder = Recorder::default();
        physics.set_fling_listener(Some(Box::new(recorder.clone())));
        physics.on_layout(&host);
        physics
            .body_mut_for(ChildKey(1))
            .unwrap()
            .set_linvel(vector![3.0, 3.0], true);

        assert!(physics.on_intercept_touch_event(
            &mut host,
            PointerEvent::Down { x: 120.0, y: 120.0 }
        ));
        assert_eq!(physics.drag_state(), DragState::Captured { key: ChildKey(1) });
        assert_eq!(
            *physics.body_for(ChildKey(1)).unwrap().linvel(),
            vector![0.0, 0.0]
        );

        assert!(physics.on_touch_event(
            &mut host,
            PointerEvent::Move { x: 130.0, y: 125.0 }
        ));
        let view = host.view(ChildKey(1)).unwrap();
        assert_eq!((view.x, view.y), (110.0, 105.0));

        // The held body follows the view instead of the simulation
        physics.on_draw(&mut host);
        let view = host.view(ChildKey(1)).unwrap();
        assert_eq!((view.x, view.y), (110.0, 105.0));
        assert_eq!(
            *physics.body_for(ChildKey(1)).unwrap().translation(),
            vector![6.5, 6.25]
        );

        assert!(physics.on_touch_event(
            &mut host,
            PointerEvent::Up {
                x: 130.0,
                y: 125.0,
                velocity_x: 200.0,
                velocity_y: -100.0,
            }
        ));
        let body = physics.body_for(ChildKey(1)).unwrap();
        assert_eq!(*body.linvel(), vector![10.0, -5.0]);
        assert_eq!(*body.translation(), vector![6.5, 6.25]);
        assert!(!body.is_sleeping());
        assert_eq!(physics.drag_state(), DragState::Idle);
        assert_eq!(*recorder.0.borrow(), vec!["grab 1", "release 1"]);
    }

    #[test]
    fn test_cancel_releases_without_fling() {
        let mut physics = physics(floating());
        let mut host = layout([square(1, 0.0, 0.0)]);
        let recorder = Recorder::default();
        physics.set_fling_listener(Some(Box::new(recorder.clone())));
        physics.on_layout(&host);

        physics.on_touch_event(&mut host, PointerEvent::Down { x: 10.0, y: 10.0 });
        physics.on_touch_event(&mut host, PointerEvent::Cancel);

        assert_eq!(
            *physics.body_for(ChildKey(1)).unwrap().linvel(),
            vector![0.0, 0.0]
        );
        assert_eq!(physics.drag_state(), DragState::Idle);
        assert_eq!(*recorder.0.borrow(), vec!["grab 1", "release 1"]);
    }

    #[test]
    fn test_cancel_after_hold_drops_body_at_rest() {
        let mut physics = physics(PhysicsSettings {
            bounds_enabled: false,
            fling_enabled: true,
            ..settings()
        });
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);

        assert!(physics.on_intercept_touch_event(
            &mut host,
            PointerEvent::Down { x: 120.0, y: 120.0 }
        ));
        for _ in 0..60 {
            physics.on_draw(&mut host);
        }
        let view = host.view(ChildKey(1)).unwrap();
        assert_eq!((view.x, view.y), (100.0, 100.0));

        physics.on_touch_event(&mut host, PointerEvent::Cancel);
        let body = physics.body_for(ChildKey(1)).unwrap();
        assert_eq!(*body.linvel(), vector![0.0, 0.0]);
        assert_eq!(body.angvel(), 0.0);
        assert_eq!(*body.translation(), vector![6.0, 6.0]);
        assert_eq!(physics.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_intercepted_up_after_hold_does_not_fling() {
        let mut physics = physics(PhysicsSettings {
            bounds_enabled: false,
            fling_enabled: true,
            ..settings()
        });
        let mut host = layout([square(1, 100.0, 100.0)]);
        physics.on_layout(&host);

        physics.capture_child(&host, ChildKey(1), 120.0, 120.0).unwrap();
        for _ in 0..30 {
            physics.on_draw(&mut host);
        }
        let up = PointerEvent::Up {
            x: 120.0,
            y: 120.0,
            velocity_x: 500.0,
            velocity_y: 500.0,
        };
        assert!(!physics.on_intercept_touch_event(&mut host, up));
        assert_eq!(
            *physics.body_for(ChildKey(1)).unwrap().linvel(),
            vector![0.0, 0.0]
        );
    }

    #[test]
    fn test_second_capture_is_rejected() {
        let mut physics = physics(floating());
        let host = layout([square(1, 0.0, 0.0), square(2, 100.0, 0.0)]);
        physics.on_layout(&host);

        physics.capture_child(&host, ChildKey(1), 0.0, 0.0).unwrap();
        assert!(matches!(
            physics.capture_child(&host, ChildKey(2), 0.0, 0.0),
            Err(PhysicsError::AlreadyCaptured(ChildKey(1)))
        ));
        assert!(matches!(
            physics.capture_child(&host, ChildKey(9), 0.0, 0.0),
            Err(PhysicsError::UnknownChild(ChildKey(9)))
        ));
        assert_eq!(physics.drag_state(), DragState::Captured { key: ChildKey(1) });
    }

    #[test]
    fn test_touch_ignored_when_fling_disabled() {
        let mut physics = physics(settings());
        let mut host = layout([square(1, 0.0, 0.0)]);
        physics.on_layout(&host);

        let down = PointerEvent::Down { x: 10.0, y: 10.0 };
        assert!(!physics.on_intercept_touch_event(&mut host, down));
        assert!(!physics.on_touch_event(&mut host, down));
        assert_eq!(physics.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_intercept_outside_children_and_stray_release() {
        let mut physics = physics(floating());
        let mut host = layout([square(1, 0.0, 0.0)]);
        physics.on_layout(&host);

        assert!(!physics.on_intercept_touch_event(
            &mut host,
            PointerEvent::Down { x: 300.0, y: 300.0 }
        ));
        assert!(!physics.on_intercept_touch_event(&mut host, PointerEvent::Cancel));
        assert!(physics.on_touch_event(
            &mut host,
            PointerEvent::Up {
                x: 0.0,
                y: 0.0,
                velocity_x: 0.0,
                velocity_y: 0.0,
            }
        ));
        assert_eq!(physics.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_removed_child_drops_drag() {
        let mut physics = physics(floating());
        let mut host = layout([square(1, 0.0, 0.0)]);
        physics.on_layout(&host);
        physics.capture_child(&host, ChildKey(1), 0.0, 0.0).unwrap();

        host.remove_view(ChildKey(1));
        physics.on_layout(&host);
        assert_eq!(physics.drag_state(), DragState::Idle);
        assert!(physics.body_for(ChildKey(1)).is_none());
    }

    #[test]
    fn test_listeners_through_physics() {
        let mut physics = physics(settings());
        let mut host = layout([
            square(1, 0.0, 0.0),
            square(2, 50.0, 0.0),
            square(3, 100.0, 0.0),
        ]);

        let created = Rc::new(RefCell::new(Vec::new()));
        let sink = created.clone();
        physics.set_body_created_listener(Some(Box::new(
            move |view: &ChildView, _: &RigidBody| {
                sink.borrow_mut().push(view.key.0);
            },
        )));

        let processed = Rc::new(RefCell::new(Vec::new()));
        let first = processed.clone();
        let second = processed.clone();
        let id = physics.add_physics_processed_listener(move |_: &mut PhysicsWorld| {
            first.borrow_mut().push(1);
        });
        physics.add_physics_processed_listener(move |world: &mut PhysicsWorld| {
            assert_eq!(world.body_count(), 7);
            second.borrow_mut().push(2);
        });

        physics.on_layout(&host);
        physics.on_draw(&mut host);
        assert!(physics.remove_physics_processed_listener(id));
        physics.on_draw(&mut host);
        physics.on_layout(&host);

        assert_eq!(*created.borrow(), vec![1, 2, 3, 1, 2, 3]);
        assert_eq!(*processed.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn test_find_body_by_id() {
        let mut physics = physics(settings());
        let host = layout([square(1, 0.0, 0.0), square(2, 100.0, 60.0).with_id(42)]);
        physics.on_layout(&host);

        let body = physics.find_body_by_id(42).unwrap();
        assert_eq!(*body.translation(), vector![6.0, 4.0]);
        assert!(physics.find_body_by_id(1).is_none());
    }

    #[test]
    fn test_seeded_random_impulse() {
        let run = || {
            let mut physics = physics(floating());
            let mut host = layout([square(1, 0.0, 0.0), square(2, 100.0, 0.0)]);
            physics.on_layout(&host);
            physics.on_draw(&mut host);
            physics.give_random_impulse_with(&mut StdRng::seed_from_u64(7));
            [ChildKey(1), ChildKey(2)].map(|key| *physics.body_for(key).unwrap().linvel())
        };

        let velocities = run();
        for velocity in velocities {
            assert!(velocity.x < 0.0 && velocity.y < 0.0);
        }
        assert_eq!(velocities, run());
    }

    #[test]
    fn test_debug_outlines() {
        let mut physics = physics(settings());
        assert!(physics.debug_outlines().is_empty());
        physics.on_layout(&layout([square(1, 0.0, 0.0)]));
        assert_eq!(physics.debug_outlines().len(), 5 * 4);
        assert!(physics.debug_velocities().is_empty());
    }
}
