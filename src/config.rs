use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Sensor range a world model accepts unless configured otherwise.
pub const DEFAULT_SENSOR_RADIUS: u32 = 32;

/// Tunables for one ant's decision engine. Shared by every ant in a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindConfig {
    pub planner: PlannerConfig,
    pub selector: SelectorConfig,
    pub deposit: DepositSchedule,
    /// Observations farther than this (Chebyshev) from the ant are dropped.
    pub max_sensor_radius: u32,
    /// Base seed; each ant's random source is derived from it and the ant id.
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub turn_cost: f64,
    pub cardinal_cost: f64,
    pub diagonal_cost: f64,
    /// When false, Unknown cells may only be entered if they are the goal.
    pub unknown_passable: bool,
    /// Upper bound on states expanded by a single plan() call.
    pub max_expansions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Minimum home-trail concentration worth steering toward.
    pub home_trail_threshold: f32,
    /// Minimum food-trail concentration worth steering toward.
    pub food_trail_threshold: f32,
    /// Follow food trails when no plan can be found before walking randomly.
    pub follow_food_trail: bool,
    pub random_walk: RandomWalkWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkWeights {
    pub forward: f64,
    pub left: f64,
    pub right: f64,
}

/// When a movement may be preceded by a pheromone deposit. No schedule ever
/// deposits on two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DepositSchedule {
    /// Deposit before every movement that does not follow a deposit.
    Alternate,
    /// Deposit before an eligible movement with the given probability.
    CoinFlip { probability: f64 },
}

impl Default for MindConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            selector: SelectorConfig::default(),
            deposit: DepositSchedule::Alternate,
            max_sensor_radius: DEFAULT_SENSOR_RADIUS,
            seed: 0x5eed_a575,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            turn_cost: 1.0,
            cardinal_cost: 1.0,
            diagonal_cost: SQRT_2,
            unknown_passable: true,
            max_expansions: 20_000,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            home_trail_threshold: 0.0005,
            food_trail_threshold: 0.0005,
            follow_food_trail: true,
            random_walk: RandomWalkWeights::default(),
        }
    }
}

impl Default for RandomWalkWeights {
    fn default() -> Self {
        Self { forward: 0.6, left: 0.2, right: 0.2 }
    }
}

impl Default for DepositSchedule {
    fn default() -> Self {
        DepositSchedule::Alternate
    }
}

impl MindConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: MindConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let planner = &self.planner;
        non_negative("planner.turn_cost", planner.turn_cost)?;
        positive("planner.cardinal_cost", planner.cardinal_cost)?;
        positive("planner.diagonal_cost", planner.diagonal_cost)?;
        if planner.max_expansions == 0 {
            return Err(invalid("planner.max_expansions", "must be greater than zero"));
        }

        non_negative("selector.home_trail_threshold", self.selector.home_trail_threshold as f64)?;
        non_negative("selector.food_trail_threshold", self.selector.food_trail_threshold as f64)?;
        let walk = &self.selector.random_walk;
        non_negative("selector.random_walk.forward", walk.forward)?;
        non_negative("selector.random_walk.left", walk.left)?;
        non_negative("selector.random_walk.right", walk.right)?;
        if walk.forward + walk.left + walk.right <= 0.0 {
            return Err(invalid("selector.random_walk", "weights must not all be zero"));
        }

        if self.max_sensor_radius == 0 || self.max_sensor_radius > MAX_SENSOR_RADIUS {
            return Err(invalid("max_sensor_radius", &format!("must be within 1..={MAX_SENSOR_RADIUS}")));
        }

        if let DepositSchedule::CoinFlip { probability } = self.deposit {
            if !(0.0..=1.0).contains(&probability) {
                return Err(invalid("deposit.probability", "must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Keeps one perception from growing a map past a few million cells.
const MAX_SENSOR_RADIUS: u32 = 1024;

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_string() }
}

fn non_negative(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("{value} is not a non-negative number") })
    }
}

fn positive(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("{value} is not a positive number") })
    }
}
