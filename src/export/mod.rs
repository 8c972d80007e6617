//! Export module for saving biome maps and chunks as images.
//!
//! The generation core never touches the filesystem; everything here is a
//! collaborator fed by the pipeline.

mod biome_map;
mod chunk;
mod png;

pub use biome_map::{export_biome_map_png, BIOME_MAP_FILE};
pub use chunk::{ChunkImageMode, ChunkSink, PngChunkSink};
pub use png::{ExportError, PngExportOptions};
