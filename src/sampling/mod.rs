//! Blue-noise point sampling.
//!
//! Bridson-style Poisson-disk sampling accelerated by a background grid whose
//! cells are small enough to hold at most one accepted sample.

mod grid;
mod poisson;

pub use grid::{BackgroundGrid, Sample};
pub use poisson::{poisson_sample, SeedPolicy, DEFAULT_ATTEMPTS, VALIDATION_REACH};
