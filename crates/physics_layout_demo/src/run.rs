// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless scene runner.
//!
//! Drives a [`Physics`] component the way a real container would: size,
//! layout, then one draw per frame, with the scene's scripted gesture and
//! impulse injected at their frames.

use crate::scene::{DemoError, DemoScene, ScriptedFling};
use physics_layout::rapier2d::prelude::RigidBody;
use physics_layout::{
    ChildView, CollisionId, CollisionListener, DisplayMetrics, FlingListener, Physics,
    PhysicsWorld, PointerEvent, VirtualLayout, VirtualView,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::rc::Rc;

/// Frames between position dumps
const REPORT_INTERVAL: usize = 60;

/// Outcome of a scene run
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Frames stepped
    pub steps: usize,
    /// Contacts that began during the run
    pub collisions: usize,
    /// Whether the scripted fling grabbed its view
    pub flung: bool,
    /// Children after the last frame
    pub views: Vec<VirtualView>,
}

struct CollisionLog {
    count: Rc<Cell<usize>>,
}

impl CollisionListener for CollisionLog {
    fn on_collision_entered(&mut self, a: CollisionId, b: CollisionId) {
        self.count.set(self.count.get() + 1);
        tracing::debug!("Collision entered: {:?} <-> {:?}", a, b);
    }

    fn on_collision_exited(&mut self, a: CollisionId, b: CollisionId) {
        tracing::debug!("Collision exited: {:?} <-> {:?}", a, b);
    }
}

struct FlingLog;

impl FlingListener for FlingLog {
    fn on_grabbed(&mut self, view: &ChildView) {
        tracing::info!("Grabbed {:?} at ({:.1}, {:.1})", view.key, view.x, view.y);
    }

    fn on_released(&mut self, view: &ChildView) {
        tracing::info!("Released {:?} at ({:.1}, {:.1})", view.key, view.x, view.y);
    }
}

/// Run a scene to completion
pub fn run(scene: &DemoScene) -> Result<DemoReport, DemoError> {
    let metrics = DisplayMetrics::new(scene.density);
    let mut physics = Physics::from_attributes(&scene.attributes, metrics)?;

    let mut layout = VirtualLayout::new(scene.density);
    for view in &scene.views {
        layout.add_view(view.clone());
    }

    let collisions = Rc::new(Cell::new(0));
    physics.set_collision_listener(Some(Box::new(CollisionLog {
        count: collisions.clone(),
    })));
    physics.set_fling_listener(Some(Box::new(FlingLog)));
    physics.set_body_created_listener(Some(Box::new(|view: &ChildView, body: &RigidBody| {
        tracing::debug!(
            "Body created for {:?}: {:?}, mass {:.3}",
            view.key,
            body.body_type(),
            body.mass()
        );
    })));
    let steps = Rc::new(Cell::new(0));
    let counter = steps.clone();
    physics.add_physics_processed_listener(move |_: &mut PhysicsWorld| {
        counter.set(counter.get() + 1);
    });

    physics.on_size_changed(scene.width, scene.height);
    physics.on_layout(&layout);
    tracing::info!(
        "Scene ready: {}x{} px, {} views, {} frames",
        scene.width,
        scene.height,
        scene.views.len(),
        scene.frames
    );

    let mut flung = false;
    for frame in 0..scene.frames {
        if let Some(fling) = scene.fling.as_ref().filter(|fling| fling.at_frame == frame) {
            flung = perform_fling(&mut physics, &mut layout, fling)?;
        }
        if scene.random_impulse_at == Some(frame) {
            match scene.seed {
                Some(seed) => physics.give_random_impulse_with(&mut StdRng::seed_from_u64(seed)),
                None => physics.give_random_impulse(),
            }
            tracing::info!("Random impulse applied at frame {}", frame);
        }

        physics.on_draw(&mut layout);

        if (frame + 1) % REPORT_INTERVAL == 0 {
            log_positions(frame + 1, &layout);
        }
    }

    tracing::debug!("{} debug outline segments", physics.debug_outlines().len());

    Ok(DemoReport {
        steps: steps.get(),
        collisions: collisions.get(),
        flung,
        views: layout.views().to_vec(),
    })
}

/// Grab a view at its center, drag it and let go with the scripted velocity
fn perform_fling(
    physics: &mut Physics,
    layout: &mut VirtualLayout,
    fling: &ScriptedFling,
) -> Result<bool, DemoError> {
    let view = layout
        .view(fling.key)
        .map(VirtualView::snapshot)
        .ok_or(DemoError::MissingFlingTarget(fling.key))?;

    let down = PointerEvent::Down {
        x: view.center_x(),
        y: view.center_y(),
    };
    if !physics.on_intercept_touch_event(layout, down) {
        tracing::warn!("Fling of {:?} was not intercepted", fling.key);
        return Ok(false);
    }
    physics.on_touch_event(
        layout,
        PointerEvent::Move {
            x: fling.to_x,
            y: fling.to_y,
        },
    );
    physics.on_touch_event(
        layout,
        PointerEvent::Up {
            x: fling.to_x,
            y: fling.to_y,
            velocity_x: fling.velocity_x,
            velocity_y: fling.velocity_y,
        },
    );
    Ok(true)
}

fn log_positions(frame: usize, layout: &VirtualLayout) {
    for view in layout.views() {
        tracing::info!(
            "frame {:>4} {:?}: ({:.1}, {:.1}) rot {:.1}",
            frame,
            view.key,
            view.x,
            view.y,
            view.rotation
        );
    }
}
