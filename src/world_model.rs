use bevy::log::{trace, warn};
use bevy::math::IVec2;

use crate::config::DEFAULT_SENSOR_RADIUS;
use crate::grid::{Bounds, GrowableGrid};
use crate::heading::{chebyshev_length, Heading};
use crate::perception::{Action, Perception};
use crate::terrain::Terrain;

/// An ant's private map of everything it has observed.
///
/// Coordinates live in a stable frame anchored at the cell where the ant was
/// first registered; growth never renumbers cells. The ant's index into the
/// current rectangle is `position - bounds.min`.
#[derive(Debug, Clone)]
pub struct WorldModel {
    grid: GrowableGrid<Terrain>,
    position: IVec2,
    heading: Heading,
    counts: [usize; 5],
    sensor_limit: u32,
}

impl WorldModel {
    /// A freshly registered ant knows one thing: it is standing on its colony.
    pub fn new(heading: Heading) -> Self {
        let mut grid = GrowableGrid::new(IVec2::ZERO, Terrain::Unknown);
        grid.set(IVec2::ZERO, Terrain::Colony);
        let mut counts = [0; 5];
        counts[Terrain::Colony.index()] = 1;
        Self { grid, position: IVec2::ZERO, heading, counts, sensor_limit: DEFAULT_SENSOR_RADIUS }
    }

    /// Caps how far from the ant an observed offset may lie.
    pub fn with_sensor_limit(mut self, limit: u32) -> Self {
        self.sensor_limit = limit;
        self
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// The ant's index within the current rectangle, as `(column, row)`.
    pub fn ant_index(&self) -> IVec2 {
        self.grid.index_of(self.position).unwrap_or(IVec2::ZERO)
    }

    pub fn bounds(&self) -> Bounds {
        self.grid.bounds()
    }

    pub fn width(&self) -> usize {
        self.grid.bounds().size().x as usize
    }

    pub fn height(&self) -> usize {
        self.grid.bounds().size().y as usize
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        self.grid.contains(cell)
    }

    /// Terrain at a stable-frame coordinate; Unknown outside the map.
    pub fn terrain_at(&self, cell: IVec2) -> Terrain {
        self.grid.get(cell).unwrap_or(Terrain::Unknown)
    }

    pub fn forward_cell(&self) -> IVec2 {
        self.position + self.heading.delta()
    }

    pub fn cells(&self) -> impl Iterator<Item = (IVec2, Terrain)> + '_ {
        self.grid.iter()
    }

    pub fn count(&self, terrain: Terrain) -> usize {
        if terrain == Terrain::Unknown {
            let known: usize = Terrain::CONCRETE.iter().map(|t| self.counts[t.index()]).sum();
            self.grid.bounds().area() - known
        } else {
            self.counts[terrain.index()]
        }
    }

    pub fn has_seen(&self, terrain: Terrain) -> bool {
        self.count(terrain) > 0
    }

    /// Folds one tick of observations into the map. Offsets beyond the
    /// sensor limit are skipped.
    pub fn integrate(&mut self, perception: &Perception) {
        self.heading = perception.heading;
        let mut skipped = 0usize;
        for (offset, terrain) in &perception.visible_cells {
            match self.locate(*offset) {
                Some(cell) => self.record(cell, *terrain),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(ant = %perception.ant_id, skipped, limit = self.sensor_limit, "observations outside sensor range");
        }
    }

    fn locate(&self, offset: IVec2) -> Option<IVec2> {
        if chebyshev_length(offset) > self.sensor_limit {
            return None;
        }
        let x = self.position.x.checked_add(offset.x)?;
        let y = self.position.y.checked_add(offset.y)?;
        Some(IVec2::new(x, y))
    }

    /// Records an observation at a stable-frame coordinate, growing the map
    /// as needed. Unknown never overwrites concrete terrain.
    pub fn record(&mut self, cell: IVec2, terrain: Terrain) {
        let added = self.grid.ensure(cell);
        if added > 0 {
            trace!(?cell, added, "world model grew");
        }
        if !terrain.is_known() {
            return;
        }
        let previous = self.grid.set(cell, terrain);
        if previous != terrain {
            if previous.is_known() {
                self.counts[previous.index()] -= 1;
            }
            self.counts[terrain.index()] += 1;
        }
    }

    /// Mirrors an emitted action. Forward moves only happen onto known-bounds
    /// cells that are not walls; returns whether the ant's cell changed.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::MoveForward => {
                let next = self.forward_cell();
                if self.in_bounds(next) && !self.terrain_at(next).blocks_movement() {
                    self.position = next;
                    true
                } else {
                    false
                }
            }
            Action::TurnLeft => {
                self.heading = self.heading.rotate_left();
                false
            }
            Action::TurnRight => {
                self.heading = self.heading.rotate_right();
                false
            }
            _ => false,
        }
    }

    /// Whether emitting `action` now would be consistent with the map.
    pub fn can_execute(&self, action: Action) -> bool {
        match action {
            Action::MoveForward => {
                let next = self.forward_cell();
                self.in_bounds(next) && !self.terrain_at(next).blocks_movement()
            }
            _ => true,
        }
    }
}
