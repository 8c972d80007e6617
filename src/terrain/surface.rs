//! Row-major cell storage shared by the coarse map and chunks.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::biomes::Biome;
use crate::error::{try_filled_vec, GenerationError};

/// One surface cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Biome tag.
    pub biome: Biome,
    /// Presentation color that replaces the biome preview color, if set.
    pub color_override: Option<[u8; 3]>,
    /// Detail value in [0, 1]; zero until the detail stage runs.
    pub value: f32,
}

impl Cell {
    pub fn new(biome: Biome) -> Self {
        Self {
            biome,
            color_override: None,
            value: 0.0,
        }
    }

    /// Color used when presenting this cell.
    pub fn display_rgb(&self) -> [u8; 3] {
        self.color_override.unwrap_or_else(|| self.biome.preview_rgb())
    }
}

/// A fixed-size 2-D canvas of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Surface {
    /// Creates a surface filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Biome) -> Result<Self, GenerationError> {
        if width == 0 || height == 0 {
            return Err(GenerationError::config(format!(
                "surface dimensions must be positive, got {width}x{height}"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(GenerationError::ResourceExhaustion {
                what: "surface",
                cells: usize::MAX,
            })?;
        let cells = try_filled_vec("surface", len, Cell::new(fill))?;
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a vector, for geometric code.
    pub fn bounds(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    pub fn pixel_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    pub fn cell(&self, x: u32, y: u32) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn biome(&self, x: u32, y: u32) -> Biome {
        self.cell(x, y).biome
    }

    /// Biome at an integer point, which must lie inside the surface.
    pub fn biome_at(&self, p: IVec2) -> Biome {
        self.biome(p.x as u32, p.y as u32)
    }

    /// Writes a biome tag; any color override on the cell is cleared.
    pub fn set_biome(&mut self, x: u32, y: u32, biome: Biome) {
        let i = self.index(x, y);
        let cell = &mut self.cells[i];
        cell.biome = biome;
        cell.color_override = None;
    }

    pub fn set_color_override(&mut self, x: u32, y: u32, rgb: Option<[u8; 3]>) {
        let i = self.index(x, y);
        self.cells[i].color_override = rgb;
    }

    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.cell(x, y).value
    }

    pub fn set_value(&mut self, x: u32, y: u32, value: f32) {
        let i = self.index(x, y);
        self.cells[i].value = value;
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Number of cells per biome, indexed by `Biome::as_u8()`.
    pub fn biome_histogram(&self) -> [usize; 8] {
        let mut counts = [0usize; 8];
        for cell in &self.cells {
            counts[cell.biome.as_u8() as usize] += 1;
        }
        counts
    }

    /// Min and max of the detail channel.
    pub fn value_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for cell in &self.cells {
            min = min.min(cell.value);
            max = max.max(cell.value);
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_filled() {
        let s = Surface::new(4, 3, Biome::Swamp).unwrap();
        assert_eq!(s.pixel_count(), 12);
        assert!(s.cells().iter().all(|c| c.biome == Biome::Swamp && c.value == 0.0));
        assert_eq!(s.biome_histogram()[Biome::Swamp.as_u8() as usize], 12);
    }

    #[test]
    fn test_zero_sized_surface_is_rejected() {
        assert!(matches!(
            Surface::new(0, 10, Biome::Plains),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn test_writing_a_biome_clears_the_override() {
        let mut s = Surface::new(2, 2, Biome::Plains).unwrap();
        s.set_color_override(1, 0, Some([1, 2, 3]));
        assert_eq!(s.cell(1, 0).display_rgb(), [1, 2, 3]);

        s.set_biome(1, 0, Biome::River);
        assert_eq!(s.cell(1, 0).color_override, None);
        assert_eq!(s.cell(1, 0).display_rgb(), Biome::River.preview_rgb());
    }

    #[test]
    fn test_contains_checks_both_axes() {
        let s = Surface::new(5, 3, Biome::Plains).unwrap();
        assert!(s.contains(IVec2::new(4, 2)));
        assert!(!s.contains(IVec2::new(5, 0)));
        assert!(!s.contains(IVec2::new(0, 3)));
        assert!(!s.contains(IVec2::new(-1, 0)));
    }
}
