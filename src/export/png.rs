//! Shared PNG encoding for biome maps and chunk images.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma, Rgb};
use thiserror::Error;

use crate::terrain::Surface;

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Options for PNG export.
#[derive(Debug, Clone, Copy)]
pub struct PngExportOptions {
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Fast compression, for bulk chunk output.
    pub fn fast() -> Self {
        Self {
            compression: CompressionType::Fast,
            filter: FilterType::NoFilter,
        }
    }
}

/// Renders a surface as RGB, each cell mapped through `color`.
pub(crate) fn render_rgb<F>(surface: &Surface, mut color: F) -> ImageBuffer<Rgb<u8>, Vec<u8>>
where
    F: FnMut(&crate::terrain::Cell) -> [u8; 3],
{
    let width = surface.width();
    let mut img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, surface.height());
    for (i, cell) in surface.cells().iter().enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        img.put_pixel(x, y, Rgb(color(cell)));
    }
    img
}

/// Renders the detail channel as 16-bit grayscale.
pub(crate) fn render_value_l16(surface: &Surface) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    let width = surface.width();
    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(width, surface.height());
    for (i, cell) in surface.cells().iter().enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let value = (cell.value.clamp(0.0, 1.0) * 65535.0) as u16;
        img.put_pixel(x, y, Luma([value]));
    }
    img
}

pub(crate) fn write_rgb(
    img: &ImageBuffer<Rgb<u8>, Vec<u8>>,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

pub(crate) fn write_l16(
    img: &ImageBuffer<Luma<u16>, Vec<u16>>,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    // Convert u16 slice to bytes for the encoder
    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());
    encoder.write_image(
        byte_slice,
        img.width(),
        img.height(),
        image::ExtendedColorType::L16,
    )?;
    Ok(())
}
