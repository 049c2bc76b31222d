use serde::{Deserialize, Serialize};

/// What an ant believes (or observes) occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    Empty,
    Wall,
    Food,
    Colony,
    #[default]
    Unknown,
}

impl Terrain {
    pub const CONCRETE: [Terrain; 4] = [Terrain::Empty, Terrain::Wall, Terrain::Food, Terrain::Colony];

    pub fn is_known(self) -> bool {
        self != Terrain::Unknown
    }

    /// Food and colony markings are never erased by an Unknown re-observation.
    pub fn is_landmark(self) -> bool {
        matches!(self, Terrain::Food | Terrain::Colony)
    }

    pub fn blocks_movement(self) -> bool {
        self == Terrain::Wall
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Terrain::Empty => 0,
            Terrain::Wall => 1,
            Terrain::Food => 2,
            Terrain::Colony => 3,
            Terrain::Unknown => 4,
        }
    }
}
