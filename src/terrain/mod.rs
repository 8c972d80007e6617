//! Surface storage and chunk materialization.
//!
//! Provides the row-major `Surface` canvas shared by every stage and the
//! tessellator that turns coarse cells into tile-resolution chunks.

mod chunk;
mod surface;

pub use chunk::{Chunk, ChunkConfig, ChunkSeeding, ChunkTessellator, NeighborSeed};
pub use surface::{Cell, Surface};
