//! Nearest-seed region assignment over a sampled background grid.

mod region;

pub use region::{assign_regions, BoundaryRing, TessellationReport, SCAN_REACH};
