//! Headless host world that drives the decision engine: a walled grid with a
//! nest and food, two pheromone fields and a population of ants whose minds
//! live in an [`AntRegistry`](crate::registry::AntRegistry).

pub mod components;
pub mod config;
pub mod pheromones;
pub mod systems;
pub mod world;

use bevy::prelude::*;

use crate::registry::AntRegistry;
use components::{ColonyStats, SimRng};
use config::SimConfig;
use pheromones::PheromoneGrid;
use systems::*;
use world::TerrainGrid;

/// Installs the host resources and the per-tick system chain.
pub struct SimulationPlugin {
    pub config: SimConfig,
}

impl SimulationPlugin {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone();
        let mut rng = SimRng::seeded(config.seed);
        let terrain = TerrainGrid::generate(&config, &mut rng.0);

        app.insert_resource(PheromoneGrid::new(config.world_width, config.world_height))
            .insert_resource(AntRegistry::new(config.mind.clone()))
            .insert_resource(ColonyStats::default())
            .insert_resource(terrain)
            .insert_resource(rng)
            .insert_resource(config)
            .add_systems(Startup, setup)
            .add_systems(
                Update,
                (decision_system, pheromone_update_system, report_system, exit_system).chain(),
            );
    }
}
