use bevy::math::IVec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::heading::{chebyshev_length, Heading};
use crate::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AntId(pub u32);

impl fmt::Display for AntId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ant#{}", self.0)
    }
}

/// The single action an ant emits per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    TurnLeft,
    TurnRight,
    PickUpFood,
    DropFood,
    DepositHomePheromone,
    DepositFoodPheromone,
}

impl Action {
    pub fn is_deposit(self) -> bool {
        matches!(self, Action::DepositHomePheromone | Action::DepositFoodPheromone)
    }

    pub fn is_movement(self) -> bool {
        matches!(self, Action::MoveForward | Action::TurnLeft | Action::TurnRight)
    }

    pub fn is_food_exchange(self) -> bool {
        matches!(self, Action::PickUpFood | Action::DropFood)
    }
}

/// What one ant senses this tick. Offsets are relative to the ant's own cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    pub ant_id: AntId,
    pub has_food: bool,
    pub heading: Heading,
    pub visible_cells: HashMap<IVec2, Terrain>,
    pub home_pheromone: HashMap<IVec2, f32>,
    pub food_pheromone: HashMap<IVec2, f32>,
}

impl Perception {
    pub fn new(ant_id: AntId, heading: Heading) -> Self {
        Self {
            ant_id,
            has_food: false,
            heading,
            visible_cells: HashMap::new(),
            home_pheromone: HashMap::new(),
            food_pheromone: HashMap::new(),
        }
    }

    /// Terrain under the ant; a missing entry reads as Unknown.
    pub fn here(&self) -> Terrain {
        self.terrain_at(IVec2::ZERO)
    }

    pub fn terrain_at(&self, offset: IVec2) -> Terrain {
        self.visible_cells.get(&offset).copied().unwrap_or(Terrain::Unknown)
    }

    /// Closest visible cell of `terrain`, excluding the ant's own cell.
    /// Ties resolve by row, then column, so the answer does not depend on
    /// map iteration order.
    pub fn nearest_visible(&self, terrain: Terrain) -> Option<IVec2> {
        self.visible_cells
            .iter()
            .filter(|(offset, seen)| **seen == terrain && **offset != IVec2::ZERO)
            .map(|(offset, _)| *offset)
            .min_by_key(|offset| {
                let short = offset.x.unsigned_abs().min(offset.y.unsigned_abs());
                (chebyshev_length(*offset), short, offset.y, offset.x)
            })
    }

    /// Offset of the strongest concentration in `field`, if it clears
    /// `threshold`. Invalid readings count as zero.
    pub fn strongest(field: &HashMap<IVec2, f32>, threshold: f32) -> Option<(IVec2, f32)> {
        field
            .iter()
            .map(|(offset, value)| (*offset, sanitize(*value)))
            .filter(|(_, value)| *value > threshold)
            .max_by(|(a_offset, a), (b_offset, b)| {
                a.total_cmp(b)
                    .then_with(|| (b_offset.y, b_offset.x).cmp(&(a_offset.y, a_offset.x)))
            })
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
