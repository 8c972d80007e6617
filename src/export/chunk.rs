//! Chunk persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::png::{render_rgb, render_value_l16, write_l16, write_rgb, ExportError, PngExportOptions};
use crate::terrain::{Cell, Chunk};

/// Receives finished chunks. Called concurrently from the chunk stage.
pub trait ChunkSink: Send + Sync {
    fn write_chunk(&self, chunk: &Chunk) -> Result<(), ExportError>;
}

/// How chunk images are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkImageMode {
    /// Flat biome palette.
    Biome,
    /// 16-bit grayscale of the detail channel.
    Detail,
    /// Biome palette scaled by `0.5 + 0.5 * value`.
    #[default]
    Shaded,
}

/// Writes each chunk to `<output_dir>/chunk,<x>,<y>.png`.
#[derive(Debug, Clone)]
pub struct PngChunkSink {
    output_dir: PathBuf,
    mode: ChunkImageMode,
    options: PngExportOptions,
}

impl PngChunkSink {
    /// Creates the sink, creating `output_dir` if needed.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        mode: ChunkImageMode,
        options: PngExportOptions,
    ) -> Result<Self, ExportError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            mode,
            options,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn chunk_path(&self, x: u32, y: u32) -> PathBuf {
        self.output_dir.join(format!("chunk,{x},{y}.png"))
    }
}

fn shade(cell: &Cell) -> [u8; 3] {
    let factor = 0.5 + 0.5 * cell.value.clamp(0.0, 1.0);
    cell.display_rgb().map(|c| (c as f32 * factor).round() as u8)
}

impl ChunkSink for PngChunkSink {
    fn write_chunk(&self, chunk: &Chunk) -> Result<(), ExportError> {
        let path = self.chunk_path(chunk.x, chunk.y);
        match self.mode {
            ChunkImageMode::Biome => {
                write_rgb(&render_rgb(&chunk.surface, Cell::display_rgb), &path, &self.options)
            }
            ChunkImageMode::Shaded => write_rgb(&render_rgb(&chunk.surface, shade), &path, &self.options),
            ChunkImageMode::Detail => write_l16(&render_value_l16(&chunk.surface), &path, &self.options),
        }
    }
}
