use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::heading::Heading;
use crate::perception::{Action, AntId};

/// Host-side body of an ant. The mind lives in the `AntRegistry`.
#[derive(Component, Debug, Clone)]
pub struct Ant {
    pub id: AntId,
    pub cell: IVec2,
    pub heading: Heading,
    pub carrying_food: bool,
    pub food_pickup_tick: u64,
    pub successful_deliveries: u32,
}

impl Ant {
    pub fn new(id: AntId, cell: IVec2, heading: Heading) -> Self {
        Self { id, cell, heading, carrying_food: false, food_pickup_tick: 0, successful_deliveries: 0 }
    }
}

/// Seeded randomness for world generation and spawning.
#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Running totals reported by the host.
#[derive(Resource, Debug, Default, Clone)]
pub struct ColonyStats {
    pub ticks: u64,
    pub decisions: u64,
    pub moves: u64,
    pub blocked_moves: u64,
    pub turns: u64,
    pub deposits: u64,
    pub pickups: u64,
    pub successful_deliveries: u32,
    pub failed_attempts: u32,
    pub total_delivery_ticks: u64,
    pub average_delivery_time: f32,
}

impl ColonyStats {
    pub fn record_delivery(&mut self, ticks_carried: u64) {
        self.successful_deliveries += 1;
        self.total_delivery_ticks += ticks_carried;
        self.average_delivery_time = self.total_delivery_ticks as f32 / self.successful_deliveries as f32;
    }

    pub fn record(&mut self, action: Action) {
        self.decisions += 1;
        match action {
            Action::TurnLeft | Action::TurnRight => self.turns += 1,
            Action::DepositHomePheromone | Action::DepositFoodPheromone => self.deposits += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_average_tracks_all_deliveries() {
        let mut stats = ColonyStats::default();
        stats.record_delivery(10);
        stats.record_delivery(20);
        assert_eq!(stats.successful_deliveries, 2);
        assert_eq!(stats.average_delivery_time, 15.0);
        stats.record_delivery(0);
        assert_eq!(stats.total_delivery_ticks, 30);
        assert_eq!(stats.average_delivery_time, 10.0);
    }

    #[test]
    fn actions_are_tallied_by_kind() {
        let mut stats = ColonyStats::default();
        for action in [Action::TurnLeft, Action::DepositHomePheromone, Action::MoveForward, Action::TurnRight] {
            stats.record(action);
        }
        assert_eq!((stats.decisions, stats.turns, stats.deposits), (4, 2, 1));
    }
}
