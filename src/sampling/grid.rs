//! Background acceleration grid for Poisson-disk sampling.

use std::f64::consts::SQRT_2;

use glam::IVec2;

use crate::error::{try_filled_vec, GenerationError};

/// An accepted sample. `order` is its index in acceptance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub position: IVec2,
    pub order: usize,
}

/// Square grid of side `r / √2` over a bounded domain.
///
/// Two points inside one cell are always closer than `r`, so a grid filled
/// through the minimum-distance rule never stores more than one sample per
/// cell. [`insert`](Self::insert) refuses occupied cells outright.
#[derive(Debug, Clone)]
pub struct BackgroundGrid {
    bounds: IVec2,
    min_distance: f32,
    cell_inverse: f64,
    columns: i32,
    rows: i32,
    cells: Vec<Option<u32>>,
    samples: Vec<Sample>,
}

impl BackgroundGrid {
    /// Creates an empty grid over `[0, bounds.x) × [0, bounds.y)`.
    pub fn new(bounds: IVec2, min_distance: f32) -> Result<Self, GenerationError> {
        if !min_distance.is_finite() || min_distance <= 0.0 {
            return Err(GenerationError::config(format!(
                "minimum sample distance must be positive, got {min_distance}"
            )));
        }
        if bounds.x <= 0 || bounds.y <= 0 {
            return Err(GenerationError::config(format!(
                "sampling domain must be positive, got {}x{}",
                bounds.x, bounds.y
            )));
        }

        let cell_inverse = SQRT_2 / min_distance as f64;
        let columns = (bounds.x as f64 * cell_inverse).ceil().max(1.0);
        let rows = (bounds.y as f64 * cell_inverse).ceil().max(1.0);
        let len = columns * rows;
        if len >= usize::MAX as f64 || columns > i32::MAX as f64 || rows > i32::MAX as f64 {
            return Err(GenerationError::ResourceExhaustion {
                what: "background grid",
                cells: usize::MAX,
            });
        }
        let cells = try_filled_vec("background grid", len as usize, None)?;

        Ok(Self {
            bounds,
            min_distance,
            cell_inverse,
            columns: columns as i32,
            rows: rows as i32,
            cells,
            samples: Vec::new(),
        })
    }

    pub fn bounds(&self) -> IVec2 {
        self.bounds
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Side length of one grid cell.
    pub fn cell_size(&self) -> f64 {
        1.0 / self.cell_inverse
    }

    /// Number of grid cells per axis.
    pub fn dimensions(&self) -> IVec2 {
        IVec2::new(self.columns, self.rows)
    }

    /// Grid cell containing a domain point.
    pub fn cell_of(&self, p: IVec2) -> IVec2 {
        let gx = (p.x as f64 * self.cell_inverse).floor() as i32;
        let gy = (p.y as f64 * self.cell_inverse).floor() as i32;
        IVec2::new(gx.clamp(0, self.columns - 1), gy.clamp(0, self.rows - 1))
    }

    fn slot(&self, c: IVec2) -> Option<usize> {
        if c.x < 0 || c.y < 0 || c.x >= self.columns || c.y >= self.rows {
            return None;
        }
        Some(c.y as usize * self.columns as usize + c.x as usize)
    }

    /// Sample stored in grid cell `c`, if any. Out-of-range cells are empty.
    pub fn sample_in_cell(&self, c: IVec2) -> Option<&Sample> {
        let slot = self.slot(c)?;
        self.cells[slot].map(|i| &self.samples[i as usize])
    }

    /// Stores a sample and returns its acceptance order, or `None` when the
    /// point lies outside the domain or its cell is already occupied.
    pub fn insert(&mut self, p: IVec2) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.bounds.x || p.y >= self.bounds.y {
            return None;
        }
        let slot = self.slot(self.cell_of(p))?;
        if self.cells[slot].is_some() {
            return None;
        }
        let order = self.samples.len();
        self.cells[slot] = Some(order as u32);
        self.samples.push(Sample { position: p, order });
        Some(order)
    }

    /// Samples within `reach` grid cells of the cell containing `p`.
    ///
    /// Iteration runs over x offsets in the outer loop and y offsets in the
    /// inner loop; callers that break ties by first match rely on this order.
    pub fn neighbors(&self, p: IVec2, reach: i32) -> impl Iterator<Item = &Sample> + '_ {
        let c = self.cell_of(p);
        (-reach..=reach)
            .flat_map(move |dx| (-reach..=reach).map(move |dy| c + IVec2::new(dx, dy)))
            .filter_map(move |n| self.sample_in_cell(n))
    }

    /// True when no stored sample within `reach` cells is closer than the
    /// minimum distance.
    pub fn is_far_from_neighbors(&self, p: IVec2, reach: i32) -> bool {
        let r2 = self.min_distance as f64 * self.min_distance as f64;
        self.neighbors(p, reach)
            .all(|q| distance_squared(q.position, p) as f64 >= r2)
    }

    /// Accepted samples in acceptance order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of occupied grid cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Exact squared distance between integer points.
#[inline]
pub(crate) fn distance_squared(a: IVec2, b: IVec2) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}
