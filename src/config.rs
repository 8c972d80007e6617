//! Top-level generator configuration.
//!
//! Aggregates the per-component configs so a whole run can be stored in and
//! reloaded from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biomes::CompositionConfig;
use crate::error::GenerationError;
use crate::noise::DetailNoiseConfig;
use crate::terrain::ChunkConfig;

/// Errors that can occur while loading or saving a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] GenerationError),
}

/// Everything a generation run needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Master seed; `None` picks one from the clock at run time.
    pub seed: Option<u64>,
    pub composition: CompositionConfig,
    pub chunks: ChunkConfig,
    pub detail: DetailNoiseConfig,
}

impl GeneratorConfig {
    /// Fine composition at `depth` with default chunk and detail settings.
    pub fn fine(depth: u32) -> Self {
        Self {
            composition: CompositionConfig::fine(depth),
            ..Default::default()
        }
    }

    /// Coarse composition at `depth` with default chunk and detail settings.
    pub fn coarse(depth: u32) -> Self {
        Self {
            composition: CompositionConfig::coarse(depth),
            ..Default::default()
        }
    }

    /// Validates every component.
    pub fn validate(&self) -> Result<(), GenerationError> {
        self.composition.validate()?;
        self.chunks.validate()?;
        self.detail.validate(self.chunks.size)
    }

    /// Reads and validates a JSON configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
