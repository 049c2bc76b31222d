use bevy::math::IVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;

use crate::perception::Action;

/// Eight compass headings, clockwise from North.
///
/// Grid convention: `x` grows to the east and `y` grows to the south, so
/// North is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::North,
        Heading::NorthEast,
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 8) as usize]
    }

    pub fn rotate_left(self) -> Self {
        Self::from_index(self.index() + 7)
    }

    pub fn rotate_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn delta(self) -> IVec2 {
        match self {
            Heading::North => IVec2::new(0, -1),
            Heading::NorthEast => IVec2::new(1, -1),
            Heading::East => IVec2::new(1, 0),
            Heading::SouthEast => IVec2::new(1, 1),
            Heading::South => IVec2::new(0, 1),
            Heading::SouthWest => IVec2::new(-1, 1),
            Heading::West => IVec2::new(-1, 0),
            Heading::NorthWest => IVec2::new(-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// Heading pointing from the origin toward `offset`, using only the signs
    /// of its components. `None` for the zero offset.
    pub fn toward(offset: IVec2) -> Option<Self> {
        let step = offset.signum();
        Self::ALL.into_iter().find(|heading| heading.delta() == step)
    }

    /// Number of 45° steps clockwise from `self` to `target`.
    pub fn clockwise_steps(self, target: Heading) -> u8 {
        (target.index() + 8 - self.index()) % 8
    }

    /// The single action that brings an ant facing `self` closer to facing
    /// `target`; `MoveForward` once aligned. Ties (a half turn) go left.
    pub fn turn_toward(self, target: Heading) -> Action {
        let clockwise = self.clockwise_steps(target);
        let counter_clockwise = (8 - clockwise) % 8;
        if clockwise == 0 {
            Action::MoveForward
        } else if clockwise < counter_clockwise {
            Action::TurnRight
        } else {
            Action::TurnLeft
        }
    }
}

/// Octile distance: cardinal steps cost 1, diagonal steps cost √2.
pub fn octile_distance(a: IVec2, b: IVec2) -> f64 {
    let d = (a - b).abs();
    let (low, high) = if d.x < d.y { (d.x, d.y) } else { (d.y, d.x) };
    high as f64 + (SQRT_2 - 1.0) * low as f64
}

/// Chebyshev length of an offset: the minimum number of 8-directional unit
/// moves that cover it. Total over all of `i32`.
pub fn chebyshev_length(offset: IVec2) -> u32 {
    offset.x.unsigned_abs().max(offset.y.unsigned_abs())
}
