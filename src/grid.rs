use bevy::math::IVec2;

/// Inclusive rectangle of grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn point(p: IVec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn including(&self, p: IVec2) -> Self {
        Self { min: self.min.min(p), max: self.max.max(p) }
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min + IVec2::ONE
    }

    pub fn area(&self) -> usize {
        let size = self.size();
        size.x as usize * size.y as usize
    }

    /// Row-major walk over every coordinate in the rectangle.
    pub fn iter(&self) -> impl Iterator<Item = IVec2> {
        let Bounds { min, max } = *self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec2::new(x, y)))
    }
}

/// A rectangular grid addressed by signed coordinates that grows in any
/// direction without renumbering existing cells.
///
/// The logical extent (`bounds`) is always the smallest rectangle covering
/// every coordinate ever touched. It lives inside a larger backing buffer
/// whose capacity doubles along an axis whenever the extent outgrows it, so
/// growth costs amortized O(added cells).
#[derive(Debug, Clone)]
pub struct GrowableGrid<T> {
    cells: Vec<T>,
    capacity: Bounds,
    bounds: Bounds,
    fill: T,
}

impl<T: Copy> GrowableGrid<T> {
    pub fn new(origin: IVec2, fill: T) -> Self {
        let capacity = Bounds::point(origin);
        Self { cells: vec![fill; 1], capacity, bounds: capacity, fill }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn contains(&self, p: IVec2) -> bool {
        self.bounds.contains(p)
    }

    pub fn get(&self, p: IVec2) -> Option<T> {
        self.contains(p).then(|| self.cells[self.slot(p)])
    }

    /// Writes `value` at `p`, growing the grid first. Returns the previous value.
    pub fn set(&mut self, p: IVec2, value: T) -> T {
        self.ensure(p);
        let slot = self.slot(p);
        std::mem::replace(&mut self.cells[slot], value)
    }

    /// Extends the logical extent to cover `p`. Returns how many cells were
    /// added.
    pub fn ensure(&mut self, p: IVec2) -> usize {
        if self.bounds.contains(p) {
            return 0;
        }
        let before = self.bounds.area();
        let wanted = self.bounds.including(p);
        if !(self.capacity.contains(wanted.min) && self.capacity.contains(wanted.max)) {
            self.reserve(wanted);
        }
        self.bounds = wanted;
        wanted.area() - before
    }

    /// Position of `p` relative to the logical top-left corner.
    pub fn index_of(&self, p: IVec2) -> Option<IVec2> {
        self.contains(p).then(|| p - self.bounds.min)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec2, T)> + '_ {
        self.bounds.iter().map(move |p| (p, self.cells[self.slot(p)]))
    }

    fn slot(&self, p: IVec2) -> usize {
        let local = p - self.capacity.min;
        let width = self.capacity.size().x;
        (local.y * width + local.x) as usize
    }

    fn reserve(&mut self, wanted: Bounds) {
        let old = self.capacity;
        let old_size = old.size();
        let mut next = old;
        // Double along each axis that overflows, or jump straight to what is
        // needed when that is larger.
        if wanted.min.x < old.min.x {
            next.min.x = wanted.min.x.min(old.min.x - old_size.x);
        }
        if wanted.max.x > old.max.x {
            next.max.x = wanted.max.x.max(old.max.x + old_size.x);
        }
        if wanted.min.y < old.min.y {
            next.min.y = wanted.min.y.min(old.min.y - old_size.y);
        }
        if wanted.max.y > old.max.y {
            next.max.y = wanted.max.y.max(old.max.y + old_size.y);
        }

        let new_width = next.size().x as usize;
        let mut cells = vec![self.fill; next.area()];
        let shift = old.min - next.min;
        for row in 0..old_size.y as usize {
            let src = row * old_size.x as usize;
            let dst = (row + shift.y as usize) * new_width + shift.x as usize;
            cells[dst..dst + old_size.x as usize].copy_from_slice(&self.cells[src..src + old_size.x as usize]);
        }
        self.cells = cells;
        self.capacity = next;
    }
}
