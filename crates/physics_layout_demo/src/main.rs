// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physics layout demo - a headless container full of falling views
//!
//! Loads a scene (the built-in playground, or the RON file given as the
//! first argument), lets its children fall, performs the scripted fling and
//! random impulse, and logs where everything ends up.
//!
//! Set `RUST_LOG` to change verbosity, e.g. `RUST_LOG=physics_layout=trace`.

mod run;
mod scene;

use scene::{DemoError, DemoScene};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("physics_layout=debug".parse().unwrap())
        .add_directive("physics_layout_demo=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting physics layout demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_demo(std::env::args().nth(1).map(PathBuf::from)) {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

fn run_demo(path: Option<PathBuf>) -> Result<(), DemoError> {
    let scene = match path {
        Some(path) => {
            tracing::info!("Loading scene from {}", path.display());
            DemoScene::load(&path)?
        }
        None => DemoScene::playground()?,
    };

    let report = run::run(&scene)?;

    tracing::info!(
        "Finished {} steps, {} collisions, fling {}",
        report.steps,
        report.collisions,
        if report.flung { "performed" } else { "skipped" }
    );
    for view in &report.views {
        tracing::info!(
            "{:?} (id {:?}) rests at ({:.1}, {:.1}), rotation {:.1}",
            view.key,
            view.id,
            view.x,
            view.y,
            view.rotation
        );
    }
    Ok(())
}
