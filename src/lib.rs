//! Procedural biome map and chunk generator.
//!
//! A coarse biome map is composed from repeated Poisson-disk sampling and
//! nearest-seed tessellation passes at halving spacing. Each coarse cell is
//! then re-tessellated into a seamless tile and given a multi-octave value
//! noise detail channel.

pub mod biomes;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod noise;
pub mod pipeline;
pub mod random;
pub mod sampling;
pub mod terrain;
pub mod tessellation;

pub use biomes::{Biome, BiomeComposer, BiomeMap, CompositionConfig, OverrideRules};
pub use config::GeneratorConfig;
pub use error::GenerationError;
pub use noise::DetailNoiseConfig;
pub use pipeline::{ChunkSelection, ChunkStage, CompositionStage, GenerationStage, Pipeline, StageConfig, World};
pub use terrain::{Cell, Chunk, ChunkConfig, ChunkSeeding, ChunkTessellator, Surface};
