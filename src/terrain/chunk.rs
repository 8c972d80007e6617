//! Tile-resolution re-tessellation of the coarse biome map.
//!
//! Every coarse cell owns one seed inside its tile. A chunk is painted from
//! the seeds of its own cell and of its in-bounds 3×3 neighbors, projected
//! into the chunk's local coordinates, so that region borders run across
//! tile edges without seams.

use glam::I64Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::surface::Surface;
use crate::biomes::Biome;
use crate::error::GenerationError;
use crate::random::{cell_rng, Stream};

/// Where each coarse cell places its seed inside its tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSeeding {
    /// `(size / 2, size / 2)`; chunks reproduce the coarse map block by block.
    Centered,
    /// Uniform offset in `[0, size)²` drawn from the cell's own stream.
    #[default]
    Jittered,
}

/// Configuration for chunk materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Chunk width and height in pixels.
    pub size: u32,
    pub seeding: ChunkSeeding,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 256,
            seeding: ChunkSeeding::Jittered,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.size == 0 {
            return Err(GenerationError::config("chunk size must be positive"));
        }
        if self.size > i32::MAX as u32 / 3 {
            return Err(GenerationError::config(format!(
                "chunk size {} is too large",
                self.size
            )));
        }
        Ok(())
    }

    /// Bytes held by one materialized chunk.
    pub fn chunk_bytes(&self) -> usize {
        let side = self.size as usize;
        side * side * std::mem::size_of::<super::Cell>()
    }
}

/// One materialized tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Coarse cell this chunk was built from.
    pub x: u32,
    pub y: u32,
    pub surface: Surface,
}

impl Chunk {
    pub fn size(&self) -> u32 {
        self.surface.width()
    }
}

/// A seed projected into a chunk's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborSeed {
    pub local: I64Vec2,
    pub biome: Biome,
}

/// Materializes chunks from a finished coarse map.
///
/// Holds only shared references, so one tessellator can serve many threads.
pub struct ChunkTessellator<'a> {
    coarse: &'a Surface,
    config: ChunkConfig,
    seed: u64,
}

impl<'a> ChunkTessellator<'a> {
    /// `seed` is the master seed; seed offsets depend only on it and the
    /// coarse coordinate.
    pub fn new(coarse: &'a Surface, config: ChunkConfig, seed: u64) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self {
            coarse,
            config,
            seed,
        })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Number of chunks the coarse map yields.
    pub fn chunk_count(&self) -> usize {
        self.coarse.pixel_count()
    }

    /// Seed offset of coarse cell `(cx, cy)` inside its own tile.
    pub fn seed_offset(&self, cx: u32, cy: u32) -> I64Vec2 {
        let size = self.config.size;
        match self.config.seeding {
            ChunkSeeding::Centered => I64Vec2::splat((size / 2) as i64),
            ChunkSeeding::Jittered => {
                let mut rng = cell_rng(self.seed, Stream::ChunkSeeds, cx, cy);
                let x = rng.random_range(0..size);
                let y = rng.random_range(0..size);
                I64Vec2::new(x as i64, y as i64)
            }
        }
    }

    /// Seeds visible from chunk `(cx, cy)`: its own first, then the
    /// in-bounds neighbors row by row.
    pub fn neighborhood(&self, cx: u32, cy: u32) -> Result<Vec<NeighborSeed>, GenerationError> {
        self.check_coord(cx, cy)?;
        let size = self.config.size as i64;
        let mut seeds = Vec::with_capacity(9);
        seeds.push(NeighborSeed {
            local: self.seed_offset(cx, cy),
            biome: self.coarse.biome(cx, cy),
        });

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = cx as i64 + dx;
                let ny = cy as i64 + dy;
                if nx < 0
                    || ny < 0
                    || nx >= self.coarse.width() as i64
                    || ny >= self.coarse.height() as i64
                {
                    continue;
                }
                let offset = self.seed_offset(nx as u32, ny as u32);
                seeds.push(NeighborSeed {
                    local: I64Vec2::new(dx * size, dy * size) + offset,
                    biome: self.coarse.biome(nx as u32, ny as u32),
                });
            }
        }
        Ok(seeds)
    }

    /// Builds the tagged chunk for coarse cell `(cx, cy)`.
    pub fn materialize(&self, cx: u32, cy: u32) -> Result<Chunk, GenerationError> {
        let seeds = self.neighborhood(cx, cy)?;
        let size = self.config.size;
        let mut surface = Surface::new(size, size, seeds[0].biome)?;

        for y in 0..size {
            for x in 0..size {
                let p = I64Vec2::new(x as i64, y as i64);
                let mut best = seeds[0].biome;
                let mut best_dist = i64::MAX;
                for seed in &seeds {
                    let dist = (seed.local - p).length_squared();
                    if dist < best_dist {
                        best = seed.biome;
                        best_dist = dist;
                    }
                }
                surface.set_biome(x, y, best);
            }
        }

        Ok(Chunk {
            x: cx,
            y: cy,
            surface,
        })
    }

    fn check_coord(&self, cx: u32, cy: u32) -> Result<(), GenerationError> {
        if cx >= self.coarse.width() || cy >= self.coarse.height() {
            return Err(GenerationError::config(format!(
                "chunk ({cx}, {cy}) is outside the {}x{} coarse map",
                self.coarse.width(),
                self.coarse.height()
            )));
        }
        Ok(())
    }
}
