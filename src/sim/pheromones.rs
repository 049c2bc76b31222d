use bevy::prelude::*;
use rayon::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PheromoneType {
    Food,
    Nest,
}

/// Two concentration fields over the host grid, one cell per world cell.
#[derive(Resource)]
pub struct PheromoneGrid {
    pub width: usize,
    pub height: usize,
    pub food_trail: Vec<f32>,
    pub nest_trail: Vec<f32>,

    // Double buffer for diffusion
    food_trail_buffer: Vec<f32>,
    nest_trail_buffer: Vec<f32>,
}

impl PheromoneGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            food_trail: vec![0.0; size],
            nest_trail: vec![0.0; size],
            food_trail_buffer: vec![0.0; size],
            nest_trail_buffer: vec![0.0; size],
        }
    }

    pub fn index(&self, cell: IVec2) -> Option<usize> {
        if cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    fn field(&self, pheromone_type: PheromoneType) -> &[f32] {
        match pheromone_type {
            PheromoneType::Food => &self.food_trail,
            PheromoneType::Nest => &self.nest_trail,
        }
    }

    pub fn sample(&self, cell: IVec2, pheromone_type: PheromoneType) -> f32 {
        self.index(cell).map_or(0.0, |idx| self.field(pheromone_type)[idx])
    }

    /// Adds `amount` at `cell`, capped at `limit`. Off-grid deposits vanish.
    pub fn deposit(&mut self, cell: IVec2, pheromone_type: PheromoneType, amount: f32, limit: f32) {
        if let Some(idx) = self.index(cell) {
            let slot = match pheromone_type {
                PheromoneType::Food => &mut self.food_trail[idx],
                PheromoneType::Nest => &mut self.nest_trail[idx],
            };
            *slot = (*slot + amount).min(limit);
        }
    }

    pub fn total(&self, pheromone_type: PheromoneType) -> f32 {
        self.field(pheromone_type).par_iter().sum()
    }

    /// One physics step: evaporate, then blend every interior cell toward its
    /// 3x3 neighbourhood mean. Rates are `(food, nest)`.
    pub fn update(&mut self, evap_rates: (f32, f32), diff_rates: (f32, f32)) {
        self.food_trail.par_iter_mut().for_each(|val| *val *= 1.0 - evap_rates.0);
        self.nest_trail.par_iter_mut().for_each(|val| *val *= 1.0 - evap_rates.1);

        if self.width < 3 || self.height < 3 {
            return;
        }
        self.food_trail_buffer.copy_from_slice(&self.food_trail);
        self.nest_trail_buffer.copy_from_slice(&self.nest_trail);
        diffuse(&mut self.food_trail, &self.food_trail_buffer, self.width, diff_rates.0);
        diffuse(&mut self.nest_trail, &self.nest_trail_buffer, self.width, diff_rates.1);
    }
}

fn diffuse(field: &mut [f32], snapshot: &[f32], width: usize, rate: f32) {
    let height = field.len() / width;
    field.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        if y == 0 || y + 1 == height {
            return;
        }
        for x in 1..width - 1 {
            let mut sum = 0.0;
            for ny in y - 1..=y + 1 {
                let base = ny * width;
                sum += snapshot[base + x - 1] + snapshot[base + x] + snapshot[base + x + 1];
            }
            row[x] = row[x] * (1.0 - rate) + (sum / 9.0) * rate;
        }
    });
}
