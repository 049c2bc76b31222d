use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use antmind::sim::config::SimConfig;
use antmind::sim::SimulationPlugin;
use antmind::ConfigError;

/// Headless ant colony driven by per-ant planning minds.
#[derive(Parser, Debug)]
#[command(name = "antmind", version, about)]
struct Args {
    /// JSON file with simulation and mind settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of ants to spawn
    #[arg(long)]
    ants: Option<usize>,

    /// Seed for world generation and every ant's random source
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), ConfigError> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.max_ticks = ticks;
    }
    if let Some(ants) = args.ants {
        config.initial_ants = ants;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
        config.mind.seed = seed;
    }
    config.validate()?;

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default())
        .add_plugins(SimulationPlugin::new(config))
        .run();
    Ok(())
}
