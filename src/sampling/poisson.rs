//! Poisson-disk sampling over an integer domain.

use std::f64::consts::TAU;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grid::BackgroundGrid;
use crate::error::GenerationError;

/// Candidate attempts per active sample.
pub const DEFAULT_ATTEMPTS: usize = 30;

/// Grid cells scanned around a candidate when validating spacing.
///
/// Cells are `r / √2` wide, so a sample two cells away can still be closer
/// than `r`; a reach of 2 (a 5×5 block) covers every such sample.
pub const VALIDATION_REACH: i32 = 2;

/// Where the first sample of a pass is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPolicy {
    /// `(width >> 1, height >> 1)`.
    Center,
    /// Uniformly random in-bounds point.
    Random,
}

/// Fills `[0, bounds.x) × [0, bounds.y)` with samples at least
/// `min_distance` apart.
///
/// Each iteration picks a random active sample and tries `attempts`
/// candidates in the annulus `[r, 2r)` around it. Every valid candidate is
/// accepted; a sample that yields none is retired from the active set.
///
/// Returns the grid, which owns the accepted samples in acceptance order.
pub fn poisson_sample<R: Rng + ?Sized>(
    bounds: IVec2,
    min_distance: f32,
    seed: SeedPolicy,
    attempts: usize,
    rng: &mut R,
) -> Result<BackgroundGrid, GenerationError> {
    if attempts == 0 {
        return Err(GenerationError::config("sampling attempts must be positive"));
    }
    let mut grid = BackgroundGrid::new(bounds, min_distance)?;

    let s0 = match seed {
        SeedPolicy::Center => IVec2::new(bounds.x >> 1, bounds.y >> 1),
        SeedPolicy::Random => IVec2::new(rng.random_range(0..bounds.x), rng.random_range(0..bounds.y)),
    };
    let mut active: Vec<usize> = grid.insert(s0).into_iter().collect();

    while !active.is_empty() {
        let working_index = rng.random_range(0..active.len());
        let working = grid.samples()[active[working_index]].position;

        let mut found = false;
        for _ in 0..attempts {
            let candidate = annulus_point(working, min_distance, bounds, rng);
            if !grid.is_far_from_neighbors(candidate, VALIDATION_REACH) {
                continue;
            }
            if let Some(order) = grid.insert(candidate) {
                active.push(order);
                found = true;
            }
        }

        if !found {
            active.remove(working_index);
        }
    }

    debug!(
        samples = grid.len(),
        min_distance,
        width = bounds.x,
        height = bounds.y,
        "poisson sampling finished"
    );
    Ok(grid)
}

/// Random point at distance `[r, 2r)` from `center`, clamped into the domain
/// and truncated to integer coordinates.
fn annulus_point<R: Rng + ?Sized>(center: IVec2, r: f32, bounds: IVec2, rng: &mut R) -> IVec2 {
    let angle = rng.random::<f64>() * TAU;
    let radius = r as f64 + rng.random::<f64>() * r as f64;
    let x = (center.x as f64 + radius * angle.cos()).clamp(0.0, (bounds.x - 1) as f64);
    let y = (center.y as f64 + radius * angle.sin()).clamp(0.0, (bounds.y - 1) as f64);
    IVec2::new(x as i32, y as i32)
}
