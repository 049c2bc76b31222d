use bevy::log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{DepositSchedule, MindConfig};
use crate::heading::Heading;
use crate::perception::{Action, AntId, Perception};
use crate::planner::{PathPlanner, Plan};
use crate::selector::{Rule, SignalSelector};
use crate::world_model::WorldModel;

/// Everything one ant carries between ticks: its map, its current plan and
/// the bookkeeping that keeps deposits from landing on consecutive ticks.
#[derive(Debug, Clone)]
pub struct AntMind {
    id: AntId,
    world: WorldModel,
    plan: Option<Plan>,
    last_action: Option<Action>,
    last_rule: Option<Rule>,
    deferred: Option<Action>,
    schedule: DepositSchedule,
    rng: ChaCha8Rng,
    ticks: u64,
}

impl AntMind {
    pub fn new(id: AntId, heading: Heading, config: &MindConfig) -> Self {
        Self {
            id,
            world: WorldModel::new(heading).with_sensor_limit(config.max_sensor_radius),
            plan: None,
            last_action: None,
            last_rule: None,
            deferred: None,
            schedule: config.deposit,
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ u64::from(id.0)),
            ticks: 0,
        }
    }

    pub fn id(&self) -> AntId {
        self.id
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    /// The ladder rung behind the most recent non-deposit choice.
    pub fn last_rule(&self) -> Option<Rule> {
        self.last_rule
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One tick: fold in the perception, pick an action and mirror it on the
    /// private map.
    pub fn decide(&mut self, selector: &SignalSelector, perception: &Perception) -> Action {
        self.world.integrate(perception);
        self.ticks += 1;

        let action = self.choose(selector, perception);
        self.last_action = Some(action);
        self.world.apply(action);
        trace!(ant = %self.id, ?action, position = ?self.world.position(), "decided");
        action
    }

    fn choose(&mut self, selector: &SignalSelector, perception: &Perception) -> Action {
        if let Some(choice) = selector.immediate(perception) {
            self.plan = None;
            self.deferred = None;
            self.last_rule = Some(choice.rule);
            debug!(ant = %self.id, rule = ?choice.rule, "food exchange");
            return choice.action;
        }

        let after_deposit = self.last_action.is_some_and(Action::is_deposit);
        if after_deposit {
            if let Some(action) = self.deferred.take().filter(|a| self.world.can_execute(*a)) {
                return action;
            }
        }
        // A deferred step that was not emitted right after its deposit is stale.
        self.deferred = None;

        let choice = selector.select(&self.world, perception, &mut self.plan, &mut self.rng);
        self.last_rule = Some(choice.rule);
        if choice.rule == Rule::RandomWalk {
            debug!(ant = %self.id, "no plan or trail, walking randomly");
        }

        if choice.action.is_movement() && !after_deposit && self.deposit_due() {
            self.deferred = Some(choice.action);
            return if perception.has_food {
                Action::DepositFoodPheromone
            } else {
                Action::DepositHomePheromone
            };
        }
        choice.action
    }

    fn deposit_due(&mut self) -> bool {
        match self.schedule {
            DepositSchedule::Alternate => true,
            DepositSchedule::CoinFlip { probability } => self.rng.gen_bool(probability.clamp(0.0, 1.0)),
        }
    }
}

/// Builds the selector every mind in a registry shares.
pub fn selector_for(config: &MindConfig) -> SignalSelector {
    SignalSelector::new(PathPlanner::new(config.planner.clone()), config.selector.clone())
}
