use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::MindConfig;
use crate::error::{ConfigError, ConfigResult};

/// Host world and pheromone physics. The ants' own tunables live in
/// `MindConfig`.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_width: usize,
    pub world_height: usize,
    pub initial_ants: usize,
    pub food_sources: usize,
    pub food_per_cell: u32,
    pub food_source_radius: i32,
    pub nest_radius: i32,
    pub sensor_radius: i32,

    // Pheromone parameters
    pub evap_food: f32,
    pub evap_nest: f32,
    pub diff_food: f32,
    pub diff_nest: f32,
    pub lay_rate_food: f32,
    pub lay_rate_nest: f32,
    pub saturation_limit: f32,

    // Terrain generation
    pub wall_noise_scale: f64,
    /// Perlin values above this become walls; anything above 1.0 disables them.
    pub wall_threshold: f64,

    pub max_ticks: u64,
    pub report_interval: u64,
    pub seed: u64,

    pub mind: MindConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 96,
            world_height: 64,
            initial_ants: 40,
            food_sources: 6,
            food_per_cell: 20,
            food_source_radius: 2,
            nest_radius: 1,
            sensor_radius: 3,

            evap_food: 0.002,
            evap_nest: 0.001,
            diff_food: 0.05,
            diff_nest: 0.03,
            lay_rate_food: 1.0,
            lay_rate_nest: 1.0,
            saturation_limit: 10.0,

            wall_noise_scale: 0.09,
            wall_threshold: 0.35,

            max_ticks: 5_000,
            report_interval: 500,
            seed: 0xa17,

            mind: MindConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.world_width < 8 || self.world_height < 8 {
            return Err(invalid("world_width/world_height", "world must be at least 8x8"));
        }
        if self.sensor_radius < 1 {
            return Err(invalid("sensor_radius", "ants must see at least their neighbours"));
        }
        if self.sensor_radius as u32 > self.mind.max_sensor_radius {
            return Err(invalid("sensor_radius", "exceeds mind.max_sensor_radius, ants would discard what they see"));
        }
        if self.nest_radius < 0 || self.food_source_radius < 0 {
            return Err(invalid("nest_radius/food_source_radius", "radii must not be negative"));
        }
        for (field, rate) in [
            ("evap_food", self.evap_food),
            ("evap_nest", self.evap_nest),
            ("diff_food", self.diff_food),
            ("diff_nest", self.diff_nest),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(field, "rates must be within [0, 1]"));
            }
        }
        if self.saturation_limit <= 0.0 {
            return Err(invalid("saturation_limit", "must be positive"));
        }
        if self.report_interval == 0 {
            return Err(invalid("report_interval", "must be greater than zero"));
        }
        self.mind.validate()
    }

    /// Cell the nest is centred on.
    pub fn nest_cell(&self) -> IVec2 {
        IVec2::new(self.world_width as i32 / 2, self.world_height as i32 / 2)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_string() }
}
