use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::Rng;

use super::config::SimConfig;
use crate::terrain::Terrain;

/// The host's ground truth. Every cell is concrete; Unknown never appears.
#[derive(Resource, Debug, Clone)]
pub struct TerrainGrid {
    pub width: usize,
    pub height: usize,
    cells: Vec<Terrain>,
    food: Vec<u32>,
    nest: IVec2,
}

impl TerrainGrid {
    /// An open world with a wall border and the nest at its centre.
    pub fn empty(config: &SimConfig) -> Self {
        let (width, height) = (config.world_width, config.world_height);
        let mut grid = Self {
            width,
            height,
            cells: vec![Terrain::Empty; width * height],
            food: vec![0; width * height],
            nest: config.nest_cell(),
        };
        for x in 0..width as i32 {
            grid.set(IVec2::new(x, 0), Terrain::Wall);
            grid.set(IVec2::new(x, height as i32 - 1), Terrain::Wall);
        }
        for y in 0..height as i32 {
            grid.set(IVec2::new(0, y), Terrain::Wall);
            grid.set(IVec2::new(width as i32 - 1, y), Terrain::Wall);
        }
        grid.place_nest(config.nest_radius);
        grid
    }

    /// Perlin-noise walls around a clear nest, then food sources scattered at
    /// least a third of the smaller world dimension away from the nest.
    pub fn generate<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let mut grid = Self::empty(config);
        let perlin = Perlin::new(rng.gen());
        let keep_clear = config.nest_radius + 2;
        for y in 1..grid.height as i32 - 1 {
            for x in 1..grid.width as i32 - 1 {
                let cell = IVec2::new(x, y);
                if (cell - grid.nest).abs().max_element() <= keep_clear {
                    continue;
                }
                let value = perlin.get([x as f64 * config.wall_noise_scale, y as f64 * config.wall_noise_scale]);
                if value > config.wall_threshold {
                    grid.set(cell, Terrain::Wall);
                }
            }
        }

        let min_distance = (grid.width.min(grid.height) / 3) as f32;
        let max_distance = (grid.width.min(grid.height) / 2) as f32 - 2.0;
        for _ in 0..config.food_sources {
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let distance = min_distance + rng.gen::<f32>() * (max_distance - min_distance).max(0.0);
            let centre = grid.nest + (Vec2::new(angle.cos(), angle.sin()) * distance).round().as_ivec2();
            grid.place_food(centre, config.food_source_radius, config.food_per_cell);
        }
        grid
    }

    pub fn nest(&self) -> IVec2 {
        self.nest
    }

    pub fn index(&self, cell: IVec2) -> Option<usize> {
        if cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    /// Off-world cells read as Wall.
    pub fn terrain_at(&self, cell: IVec2) -> Terrain {
        self.index(cell).map_or(Terrain::Wall, |idx| self.cells[idx])
    }

    pub fn set(&mut self, cell: IVec2, terrain: Terrain) {
        if let Some(idx) = self.index(cell) {
            self.cells[idx] = terrain;
            if terrain != Terrain::Food {
                self.food[idx] = 0;
            }
        }
    }

    fn place_nest(&mut self, radius: i32) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                self.set(self.nest + IVec2::new(x, y), Terrain::Colony);
            }
        }
    }

    /// Fills a square of open cells with food. Walls, the nest and the world
    /// border are left alone.
    pub fn place_food(&mut self, centre: IVec2, radius: i32, amount: u32) -> usize {
        let mut placed = 0;
        for y in -radius..=radius {
            for x in -radius..=radius {
                let cell = centre + IVec2::new(x, y);
                if let Some(idx) = self.index(cell) {
                    if self.cells[idx] == Terrain::Empty && amount > 0 {
                        self.cells[idx] = Terrain::Food;
                        self.food[idx] = amount;
                        placed += 1;
                    }
                }
            }
        }
        placed
    }

    /// Removes one unit of food; the cell empties when exhausted.
    pub fn take_food(&mut self, cell: IVec2) -> bool {
        let Some(idx) = self.index(cell) else {
            return false;
        };
        if self.cells[idx] != Terrain::Food || self.food[idx] == 0 {
            return false;
        }
        self.food[idx] -= 1;
        if self.food[idx] == 0 {
            self.cells[idx] = Terrain::Empty;
        }
        true
    }

    pub fn food_remaining(&self) -> u64 {
        self.food.iter().map(|&f| u64::from(f)).sum()
    }
}
