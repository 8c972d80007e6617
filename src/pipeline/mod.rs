//! Pipeline module for orchestrating biome map generation stages.
//!
//! Provides a trait-based architecture for modular generation stages
//! that can be composed into a complete generation run.

mod stage;

pub use stage::{
    ChunkSelection, ChunkStage, CompositionStage, GenerationStage, Pipeline, PipelineError,
    ProgressFn, StageConfig, StageId, World,
};
