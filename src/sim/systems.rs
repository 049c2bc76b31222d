use bevy::app::AppExit;
use bevy::prelude::*;
use rand::Rng;

use super::components::*;
use super::config::*;
use super::pheromones::*;
use super::world::*;
use crate::heading::Heading;
use crate::perception::{Action, AntId, Perception};
use crate::registry::AntRegistry;
use crate::terrain::Terrain;

pub fn setup(mut commands: Commands, config: Res<SimConfig>, terrain: Res<TerrainGrid>, mut rng: ResMut<SimRng>) {
    for i in 0..config.initial_ants {
        let heading = Heading::from_index(rng.0.gen_range(0..8));
        commands.spawn(Ant::new(AntId(i as u32), terrain.nest(), heading));
    }
    info!(
        ants = config.initial_ants,
        width = config.world_width,
        height = config.world_height,
        food = terrain.food_remaining(),
        "colony founded"
    );
}

/// Builds what one ant senses: every cell within `radius` (Chebyshev) and
/// both pheromone fields over the same window.
pub fn perceive(ant: &Ant, terrain: &TerrainGrid, pheromones: &PheromoneGrid, radius: i32) -> Perception {
    let mut perception = Perception::new(ant.id, ant.heading);
    perception.has_food = ant.carrying_food;
    for y in -radius..=radius {
        for x in -radius..=radius {
            let offset = IVec2::new(x, y);
            let cell = ant.cell + offset;
            perception.visible_cells.insert(offset, terrain.terrain_at(cell));
            let nest = pheromones.sample(cell, PheromoneType::Nest);
            if nest > 0.0 {
                perception.home_pheromone.insert(offset, nest);
            }
            let food = pheromones.sample(cell, PheromoneType::Food);
            if food > 0.0 {
                perception.food_pheromone.insert(offset, food);
            }
        }
    }
    perception
}

/// Every ant perceives, the registry decides for all of them in parallel,
/// then actions are applied in ant-id order.
pub fn decision_system(
    mut ants: Query<&mut Ant>,
    registry: Res<AntRegistry>,
    config: Res<SimConfig>,
    mut terrain: ResMut<TerrainGrid>,
    mut pheromones: ResMut<PheromoneGrid>,
    mut stats: ResMut<ColonyStats>,
) {
    let mut ants: Vec<Mut<Ant>> = ants.iter_mut().collect();
    ants.sort_by_key(|ant| ant.id);

    let perceptions: Vec<Perception> = ants
        .iter()
        .map(|ant| perceive(ant, &terrain, &pheromones, config.sensor_radius))
        .collect();
    let actions = registry.decide_all(&perceptions);

    let tick = stats.ticks;
    for (ant, action) in ants.iter_mut().zip(actions) {
        stats.record(action);
        apply_action(ant, action, &config, &mut terrain, &mut pheromones, &mut stats, tick);
    }
    stats.ticks += 1;
}

fn apply_action(
    ant: &mut Ant,
    action: Action,
    config: &SimConfig,
    terrain: &mut TerrainGrid,
    pheromones: &mut PheromoneGrid,
    stats: &mut ColonyStats,
    tick: u64,
) {
    match action {
        Action::MoveForward => {
            let next = ant.cell + ant.heading.delta();
            if terrain.terrain_at(next).blocks_movement() {
                stats.blocked_moves += 1;
                debug!(ant = %ant.id, ?next, "walked into a wall");
            } else {
                ant.cell = next;
                stats.moves += 1;
            }
        }
        Action::TurnLeft => ant.heading = ant.heading.rotate_left(),
        Action::TurnRight => ant.heading = ant.heading.rotate_right(),
        Action::PickUpFood => {
            if !ant.carrying_food && terrain.take_food(ant.cell) {
                ant.carrying_food = true;
                ant.food_pickup_tick = tick;
                stats.pickups += 1;
                debug!(ant = %ant.id, cell = ?ant.cell, "picked up food");
            } else {
                stats.failed_attempts += 1;
            }
        }
        Action::DropFood => {
            if ant.carrying_food && terrain.terrain_at(ant.cell) == Terrain::Colony {
                ant.carrying_food = false;
                ant.successful_deliveries += 1;
                stats.record_delivery(tick - ant.food_pickup_tick);
                debug!(ant = %ant.id, deliveries = ant.successful_deliveries, "delivered food");
            } else {
                stats.failed_attempts += 1;
            }
        }
        Action::DepositHomePheromone => {
            pheromones.deposit(ant.cell, PheromoneType::Nest, config.lay_rate_nest, config.saturation_limit);
        }
        Action::DepositFoodPheromone => {
            pheromones.deposit(ant.cell, PheromoneType::Food, config.lay_rate_food, config.saturation_limit);
        }
    }
}

pub fn pheromone_update_system(mut pheromone_grid: ResMut<PheromoneGrid>, config: Res<SimConfig>) {
    let evap_rates = (config.evap_food, config.evap_nest);
    let diff_rates = (config.diff_food, config.diff_nest);
    pheromone_grid.update(evap_rates, diff_rates);
}

pub fn report_system(
    config: Res<SimConfig>,
    stats: Res<ColonyStats>,
    terrain: Res<TerrainGrid>,
    pheromones: Res<PheromoneGrid>,
    ants: Query<&Ant>,
) {
    if stats.ticks == 0 || config.report_interval == 0 || stats.ticks % config.report_interval != 0 {
        return;
    }
    let carrying = ants.iter().filter(|ant| ant.carrying_food).count();
    info!(
        tick = stats.ticks,
        deliveries = stats.successful_deliveries,
        avg_delivery_ticks = stats.average_delivery_time,
        carrying,
        blocked = stats.blocked_moves,
        failed = stats.failed_attempts,
        food_left = terrain.food_remaining(),
        nest_trail = pheromones.total(PheromoneType::Nest),
        food_trail = pheromones.total(PheromoneType::Food),
        "colony report"
    );
}

pub fn exit_system(config: Res<SimConfig>, stats: Res<ColonyStats>, mut exit: EventWriter<AppExit>) {
    if stats.ticks >= config.max_ticks {
        info!(
            ticks = stats.ticks,
            deliveries = stats.successful_deliveries,
            moves = stats.moves,
            deposits = stats.deposits,
            "simulation finished"
        );
        exit.send(AppExit::Success);
    }
}
