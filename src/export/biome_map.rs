//! Coarse biome map export.

use std::path::Path;

use super::png::{render_rgb, write_rgb, ExportError, PngExportOptions};
use crate::terrain::Surface;

/// File name of the coarse map inside an output directory.
pub const BIOME_MAP_FILE: &str = "biome_map.png";

/// Exports the coarse biome map as an RGB PNG.
///
/// Each cell is drawn with its color override when set, otherwise with its
/// biome's preview color.
pub fn export_biome_map_png(
    surface: &Surface,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let img = render_rgb(surface, |cell| cell.display_rgb());
    write_rgb(&img, path, options)
}
