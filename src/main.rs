//! Command-line entry point for the Sheepdog herding game.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use log::{info, warn};
use sheepdog::simulation::steering_disabled;
use sheepdog::{init_logging, LevelId, LevelSet, SheepdogPlugin, SimulationState, Tuning};

/// A herding game: steer followers past roaming enemies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON file holding the level set
    #[arg(long)]
    levels: PathBuf,
    /// Identifier of the level to start on
    #[arg(long)]
    start: String,
    /// Number of fixed ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Optional JSON file overriding tuning values
    #[arg(long)]
    tuning: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let levels = LevelSet::from_path(&args.levels)
        .with_context(|| format!("loading levels from {}", args.levels.display()))?;
    let tuning = match &args.tuning {
        Some(path) => Tuning::from_path(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::default(),
    };
    if steering_disabled(&tuning) {
        warn!("every steering behaviour is disabled; agents will only coast");
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SheepdogPlugin::new(
        levels,
        LevelId(args.start.clone()),
        tuning,
    ));
    if !app.world().contains_resource::<SimulationState>() {
        bail!("level `{}` could not be started", args.start);
    }
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        sheepdog::REFERENCE_DT,
    )));
    app.finish();
    app.cleanup();

    // The first update only establishes the clock; allow one spare frame per tick.
    let frame_budget = args.ticks.saturating_mul(2).saturating_add(1);
    for _ in 0..frame_budget {
        let done = app
            .world()
            .get_resource::<SimulationState>()
            .is_none_or(|state| state.simulation.ticks() >= args.ticks);
        if done {
            break;
        }
        app.update();
    }

    let state = app
        .world()
        .get_resource::<SimulationState>()
        .context("simulation state disappeared")?;
    let sim = &state.simulation;
    info!(
        "ran {} ticks; level `{}` with {} followers and {} enemies; {} caught; loss risk {:?}",
        sim.ticks(),
        sim.level().id(),
        sim.level().followers.len(),
        sim.level().enemies.len(),
        state.captured,
        sim.loss_risk().phase()
    );
    for id in &state.entered {
        info!("entered level `{id}`");
    }
    Ok(())
}
