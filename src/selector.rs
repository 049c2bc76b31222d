use bevy::math::IVec2;
use rand::Rng;

use crate::config::{RandomWalkWeights, SelectorConfig};
use crate::heading::Heading;
use crate::perception::{Action, Perception};
use crate::planner::{Goal, PathPlanner, Plan, PlanState};
use crate::terrain::Terrain;
use crate::world_model::WorldModel;

/// Which rung of the priority ladder produced a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    PickUp,
    Drop,
    ColonyInSight,
    HomeTrail,
    PlanToColony,
    PlanToFood,
    Explore,
    FoodTrail,
    RandomWalk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub action: Action,
    pub rule: Rule,
}

impl Choice {
    fn new(action: Action, rule: Rule) -> Self {
        Self { action, rule }
    }
}

/// Fuses perception, pheromone gradients and planned paths into one action.
#[derive(Debug, Clone)]
pub struct SignalSelector {
    planner: PathPlanner,
    config: SelectorConfig,
}

impl SignalSelector {
    pub fn new(planner: PathPlanner, config: SelectorConfig) -> Self {
        Self { planner, config }
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Rules that always win at once: picking up and dropping food.
    pub fn immediate(&self, perception: &Perception) -> Option<Choice> {
        match (perception.has_food, perception.here()) {
            (false, Terrain::Food) => Some(Choice::new(Action::PickUpFood, Rule::PickUp)),
            (true, Terrain::Colony) => Some(Choice::new(Action::DropFood, Rule::Drop)),
            _ => None,
        }
    }

    /// Walks the full ladder. Any step taken from `plan` is consumed.
    pub fn select<R: Rng + ?Sized>(
        &self,
        world: &WorldModel,
        perception: &Perception,
        plan: &mut Option<Plan>,
        rng: &mut R,
    ) -> Choice {
        if let Some(choice) = self.immediate(perception) {
            *plan = None;
            return choice;
        }

        if perception.has_food {
            if let Some(action) = perception
                .nearest_visible(Terrain::Colony)
                .and_then(|offset| steer(world, offset))
            {
                *plan = None;
                return Choice::new(action, Rule::ColonyInSight);
            }
            if let Some(action) = Perception::strongest(&perception.home_pheromone, self.config.home_trail_threshold)
                .and_then(|(offset, _)| steer(world, offset))
            {
                *plan = None;
                return Choice::new(action, Rule::HomeTrail);
            }
            if let Some(choice) = self.follow(world, plan, &[(Goal::NearestTerrain(Terrain::Colony), Rule::PlanToColony)]) {
                return choice;
            }
        } else {
            let mut goals = Vec::with_capacity(2);
            if world.has_seen(Terrain::Food) {
                goals.push((Goal::NearestTerrain(Terrain::Food), Rule::PlanToFood));
            }
            goals.push((Goal::FarthestUnknown, Rule::Explore));
            if let Some(choice) = self.follow(world, plan, &goals) {
                return choice;
            }
            if self.config.follow_food_trail {
                if let Some(action) = Perception::strongest(&perception.food_pheromone, self.config.food_trail_threshold)
                    .and_then(|(offset, _)| steer(world, offset))
                {
                    return Choice::new(action, Rule::FoodTrail);
                }
            }
        }

        Choice::new(random_walk(world, &self.config.random_walk, rng), Rule::RandomWalk)
    }

    /// Takes one step toward the first goal that has (or gets) a usable plan.
    /// An active plan for a goal is reused while it stays valid; a plan for an
    /// earlier goal supersedes it.
    fn follow(&self, world: &WorldModel, plan: &mut Option<Plan>, goals: &[(Goal, Rule)]) -> Option<Choice> {
        if plan.as_ref().is_some_and(|active| !active.is_valid(world)) {
            *plan = None;
        }
        for (goal, rule) in goals {
            let reuse = plan.as_ref().is_some_and(|active| active.goal() == *goal);
            if !reuse {
                match self.planner.plan(world, PlanState::of(world), *goal) {
                    Some(fresh) if !fresh.is_empty() => *plan = Some(fresh),
                    _ => continue,
                }
            }
            if let Some(action) = plan.as_mut().and_then(Plan::advance) {
                return Some(Choice::new(action, *rule));
            }
        }
        *plan = None;
        None
    }
}

/// The action that points the ant at `offset`, or moves it there once
/// aligned. `None` when there is nowhere to turn or the way ahead is walled.
pub fn steer(world: &WorldModel, offset: IVec2) -> Option<Action> {
    let target = Heading::toward(offset)?;
    let action = world.heading().turn_toward(target);
    if action == Action::MoveForward && !world.can_execute(Action::MoveForward) {
        return None;
    }
    Some(action)
}

/// Weighted random step. A forward step into a known wall becomes a turn.
pub fn random_walk<R: Rng + ?Sized>(world: &WorldModel, weights: &RandomWalkWeights, rng: &mut R) -> Action {
    let total = weights.forward + weights.left + weights.right;
    let roll = rng.gen::<f64>() * total;
    let action = if roll < weights.forward {
        Action::MoveForward
    } else if roll < weights.forward + weights.left {
        Action::TurnLeft
    } else {
        Action::TurnRight
    };
    if action == Action::MoveForward && world.terrain_at(world.forward_cell()).blocks_movement() {
        if rng.gen_bool(0.5) {
            Action::TurnLeft
        } else {
            Action::TurnRight
        }
    } else {
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::perception::AntId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn selector() -> SignalSelector {
        SignalSelector::new(PathPlanner::new(PlannerConfig::default()), SelectorConfig::default())
    }

    fn open_perception(heading: Heading, radius: i32) -> Perception {
        let mut p = Perception::new(AntId(3), heading);
        for y in -radius..=radius {
            for x in -radius..=radius {
                p.visible_cells.insert(IVec2::new(x, y), Terrain::Empty);
            }
        }
        p
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn pickup_beats_everything_and_clears_the_plan() {
        let mut p = open_perception(Heading::North, 1);
        p.visible_cells.insert(IVec2::ZERO, Terrain::Food);
        p.food_pheromone.insert(IVec2::new(1, 0), 50.0);
        let mut world = WorldModel::new(Heading::North);
        world.integrate(&p);

        let mut plan = selector().planner().plan(&world, PlanState::of(&world), Goal::FarthestUnknown);
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice, Choice::new(Action::PickUpFood, Rule::PickUp));
        assert!(plan.is_none());
    }

    #[test]
    fn drop_when_carrying_onto_colony() {
        let mut p = open_perception(Heading::North, 1);
        p.has_food = true;
        p.visible_cells.insert(IVec2::ZERO, Terrain::Colony);
        assert_eq!(selector().immediate(&p).map(|c| c.action), Some(Action::DropFood));

        p.has_food = false;
        assert_eq!(selector().immediate(&p), None);
    }

    #[test]
    fn visible_colony_is_approached_directly() {
        let mut p = open_perception(Heading::North, 2);
        p.has_food = true;
        p.visible_cells.insert(IVec2::new(2, 0), Terrain::Colony);
        let mut world = WorldModel::new(Heading::North);
        world.integrate(&p);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice, Choice::new(Action::TurnRight, Rule::ColonyInSight));
    }

    #[test]
    fn home_trail_steers_when_colony_is_out_of_sight() {
        let mut p = open_perception(Heading::East, 1);
        p.has_food = true;
        p.home_pheromone = HashMap::from([(IVec2::new(1, 0), 3.0), (IVec2::new(-1, 0), 1.0)]);
        let mut world = WorldModel::new(Heading::East);
        world.integrate(&p);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice, Choice::new(Action::MoveForward, Rule::HomeTrail));
    }

    #[test]
    fn weak_home_trail_falls_through_to_planning() {
        // Ant walked east of its colony; colony now remembered but unseen.
        let mut world = WorldModel::new(Heading::West);
        let mut p = open_perception(Heading::West, 1);
        p.has_food = true;
        p.home_pheromone.insert(IVec2::new(0, 1), 0.0001);
        world.record(IVec2::new(-3, 0), Terrain::Colony);
        world.integrate(&p);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice.rule, Rule::PlanToColony);
        assert_eq!(choice.action, Action::MoveForward);
        assert_eq!(plan.as_ref().map(Plan::target), Some(IVec2::new(-3, 0)));
    }

    #[test]
    fn known_food_is_preferred_over_exploration() {
        let mut p = open_perception(Heading::North, 2);
        p.visible_cells.insert(IVec2::new(0, 2), Terrain::Food);
        let mut world = WorldModel::new(Heading::North);
        world.integrate(&p);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice.rule, Rule::PlanToFood);
        assert!(matches!(choice.action, Action::TurnLeft | Action::TurnRight));
    }

    #[test]
    fn explores_when_no_food_is_known() {
        let p = open_perception(Heading::North, 1);
        let mut world = WorldModel::new(Heading::North);
        world.integrate(&p);
        // Push one unknown cell into the map.
        world.record(IVec2::new(0, -2), Terrain::Unknown);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice.rule, Rule::Explore);
        assert!(choice.action.is_movement());
        let target = plan.as_ref().map(Plan::target).unwrap();
        assert_eq!(world.terrain_at(target), Terrain::Unknown);
    }

    #[test]
    fn fully_explored_enclosure_walks_randomly() {
        let mut p = open_perception(Heading::North, 1);
        for offset in [IVec2::new(-1, -1), IVec2::new(0, -1), IVec2::new(1, -1), IVec2::new(-1, 0), IVec2::new(1, 0)] {
            p.visible_cells.insert(offset, Terrain::Wall);
        }
        for offset in [IVec2::new(-1, 1), IVec2::new(0, 1), IVec2::new(1, 1)] {
            p.visible_cells.insert(offset, Terrain::Wall);
        }
        let mut world = WorldModel::new(Heading::North);
        world.integrate(&p);

        let mut rng = rng();
        for _ in 0..50 {
            let choice = selector().select(&world, &p, &mut None, &mut rng);
            assert_eq!(choice.rule, Rule::RandomWalk);
            // Forward is walled, so the walk must turn.
            assert_ne!(choice.action, Action::MoveForward);
        }
    }

    /// A fully known 3x3 room ringed by walls, with the ant in the middle and
    /// neither food nor colony on the map.
    fn walled_room(heading: Heading, has_food: bool) -> (WorldModel, Perception) {
        let mut p = Perception::new(AntId(3), heading);
        p.has_food = has_food;
        for y in -2..=2 {
            for x in -2..=2 {
                let offset = IVec2::new(x, y);
                let terrain = if offset.abs().max_element() == 2 { Terrain::Wall } else { Terrain::Empty };
                p.visible_cells.insert(offset, terrain);
            }
        }
        let mut world = WorldModel::new(heading);
        world.integrate(&p);
        (world, p)
    }

    #[test]
    fn food_trail_is_followed_when_nothing_can_be_planned() {
        let (world, mut p) = walled_room(Heading::North, false);
        p.food_pheromone = HashMap::from([(IVec2::new(1, -1), 2.0), (IVec2::new(-1, 0), 0.5)]);
        assert_eq!(world.count(Terrain::Unknown), 0);

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice, Choice::new(Action::TurnRight, Rule::FoodTrail));
        assert!(plan.is_none());
    }

    #[test]
    fn disabled_food_trail_falls_back_to_random_walk() {
        let (world, mut p) = walled_room(Heading::North, false);
        p.food_pheromone.insert(IVec2::new(1, -1), 2.0);
        let config = SelectorConfig { follow_food_trail: false, ..SelectorConfig::default() };
        let selector = SignalSelector::new(PathPlanner::new(PlannerConfig::default()), config);

        let choice = selector.select(&world, &p, &mut None, &mut rng());
        assert_eq!(choice.rule, Rule::RandomWalk);
    }

    #[test]
    fn lost_carrier_walks_randomly() {
        let (mut world, mut p) = walled_room(Heading::East, true);
        p.home_pheromone.insert(IVec2::new(1, 0), 0.0001);
        // The colony is remembered, but only beyond the wall ring.
        world.record(IVec2::new(0, -4), Terrain::Colony);
        assert!(world.has_seen(Terrain::Colony));

        let mut plan = None;
        let choice = selector().select(&world, &p, &mut plan, &mut rng());
        assert_eq!(choice.rule, Rule::RandomWalk);
        assert!(choice.action.is_movement());
        assert!(plan.is_none());
    }

    #[test]
    fn random_walk_follows_its_weights() {
        let world = {
            let mut w = WorldModel::new(Heading::North);
            w.integrate(&open_perception(Heading::North, 1));
            w
        };
        let weights = RandomWalkWeights::default();
        let mut rng = rng();
        let mut forward = 0;
        for _ in 0..10_000 {
            if random_walk(&world, &weights, &mut rng) == Action::MoveForward {
                forward += 1;
            }
        }
        assert!((5_500..6_500).contains(&forward), "forward count {forward}");
    }

    #[test]
    fn steer_refuses_to_walk_into_walls() {
        let mut p = open_perception(Heading::East, 1);
        p.visible_cells.insert(IVec2::new(1, 0), Terrain::Wall);
        let mut world = WorldModel::new(Heading::East);
        world.integrate(&p);
        assert_eq!(steer(&world, IVec2::new(3, 0)), None);
        assert_eq!(steer(&world, IVec2::new(0, 3)), Some(Action::TurnRight));
        assert_eq!(steer(&world, IVec2::ZERO), None);
    }
}
