//! Per-ant decision engine for a grid-world foraging simulation, plus a
//! small headless Bevy host that drives it.
//!
//! Each tick the host hands an ant's [`Perception`] to the [`AntRegistry`]
//! and gets back exactly one [`Action`].

pub mod config;
pub mod error;
pub mod grid;
pub mod heading;
pub mod perception;
pub mod planner;
pub mod policy;
pub mod registry;
pub mod search;
pub mod selector;
pub mod sim;
pub mod terrain;
pub mod world_model;

pub use config::{DepositSchedule, MindConfig, PlannerConfig, RandomWalkWeights, SelectorConfig};
pub use error::{ConfigError, ConfigResult};
pub use heading::Heading;
pub use perception::{Action, AntId, Perception};
pub use planner::{Goal, PathPlanner, Plan, PlanState};
pub use policy::AntMind;
pub use registry::AntRegistry;
pub use selector::{Choice, Rule, SignalSelector};
pub use terrain::Terrain;
pub use world_model::WorldModel;
