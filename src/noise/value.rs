//! Multi-octave bilinear value noise for per-chunk surface detail.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{try_filled_vec, GenerationError};
use crate::terrain::Chunk;

/// Configuration for detail noise synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailNoiseConfig {
    /// Number of octaves. Octave `o` uses blocks of `size >> o` pixels.
    pub octaves: u8,
    /// Amplitude decay per octave.
    pub persistence: f32,
}

impl Default for DetailNoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 8,
            persistence: 0.6,
        }
    }
}

impl DetailNoiseConfig {
    /// Broad, soft detail: few octaves with strong decay.
    pub fn smooth() -> Self {
        Self {
            octaves: 4,
            persistence: 0.4,
        }
    }

    /// Checks the configuration against a chunk size.
    pub fn validate(&self, size: u32) -> Result<(), GenerationError> {
        if size == 0 {
            return Err(GenerationError::config("noise size must be positive"));
        }
        if self.octaves == 0 {
            return Err(GenerationError::config("octaves must be at least 1"));
        }
        let finest = size.checked_shr(self.octaves as u32 - 1).unwrap_or(0);
        if finest == 0 {
            return Err(GenerationError::config(format!(
                "{} octaves leave no pixels per block at size {}",
                self.octaves, size
            )));
        }
        if !self.persistence.is_finite() || self.persistence < 0.0 {
            return Err(GenerationError::config(format!(
                "persistence must be a non-negative number, got {}",
                self.persistence
            )));
        }
        Ok(())
    }
}

/// Fills a `size × size` basis with independent uniform values in [0, 1).
pub fn seed_basis<R: Rng + ?Sized>(size: u32, rng: &mut R) -> Result<Vec<f32>, GenerationError> {
    if size == 0 {
        return Err(GenerationError::config("noise size must be positive"));
    }
    let len = (size as usize) * (size as usize);
    let mut basis = try_filled_vec("noise basis", len, 0.0f32)?;
    for v in basis.iter_mut() {
        *v = rng.random::<f32>();
    }
    Ok(basis)
}

/// Blends octaves of bilinear interpolation over `basis`.
///
/// For octave `o` the chunk is split into blocks of side `pitch = size >> o`;
/// every pixel interpolates the basis values at its block's corners, the far
/// corner being clamped to `size - 1`. Octaves are weighted by
/// `persistence^o` and the sum is normalized by the total weight, so the
/// output stays within the range of the basis.
///
/// # Arguments
/// * `size` - Width and height of the field
/// * `basis` - Row-major values, `size²` of them
/// * `config` - Octave count and persistence
pub fn synthesize_from_basis(
    size: u32,
    basis: &[f32],
    config: &DetailNoiseConfig,
) -> Result<Vec<f32>, GenerationError> {
    config.validate(size)?;
    let side = size as usize;
    if basis.len() != side * side {
        return Err(GenerationError::config(format!(
            "noise basis holds {} values, expected {}",
            basis.len(),
            side * side
        )));
    }

    let mut sum = try_filled_vec("noise field", basis.len(), 0.0f32)?;
    let mut weight = 0.0f32;
    let mut scale = 1.0f32;
    let last = size - 1;

    for octave in 0..config.octaves as u32 {
        let pitch = size >> octave;
        let inv_pitch = 1.0 / pitch as f32;

        for y in 0..size {
            let y0 = (y / pitch) * pitch;
            let y1 = (y0 + pitch).min(last);
            let fy = (y - y0) as f32 * inv_pitch;
            let row0 = y0 as usize * side;
            let row1 = y1 as usize * side;

            for x in 0..size {
                let x0 = (x / pitch) * pitch;
                let x1 = (x0 + pitch).min(last);
                let fx = (x - x0) as f32 * inv_pitch;

                let v = bilerp(
                    basis[row0 + x0 as usize],
                    basis[row0 + x1 as usize],
                    basis[row1 + x0 as usize],
                    basis[row1 + x1 as usize],
                    fx,
                    fy,
                );
                sum[y as usize * side + x as usize] += v * scale;
            }
        }

        weight += scale;
        scale *= config.persistence;
    }

    for v in sum.iter_mut() {
        *v = (*v / weight).clamp(0.0, 1.0);
    }
    Ok(sum)
}

/// Seeds a fresh basis from `rng` and synthesizes a `size × size` field.
pub fn synthesize<R: Rng + ?Sized>(
    size: u32,
    config: &DetailNoiseConfig,
    rng: &mut R,
) -> Result<Vec<f32>, GenerationError> {
    config.validate(size)?;
    let basis = seed_basis(size, rng)?;
    synthesize_from_basis(size, &basis, config)
}

/// Writes a freshly synthesized field into the chunk's value channel.
pub fn apply_detail<R: Rng + ?Sized>(
    chunk: &mut Chunk,
    config: &DetailNoiseConfig,
    rng: &mut R,
) -> Result<(), GenerationError> {
    let field = synthesize(chunk.size(), config, rng)?;
    for (cell, value) in chunk.surface.cells_mut().iter_mut().zip(field) {
        cell.value = value;
    }
    Ok(())
}

#[inline]
fn bilerp(v00: f32, v10: f32, v01: f32, v11: f32, fx: f32, fy: f32) -> f32 {
    let top = v00 + (v10 - v00) * fx;
    let bottom = v01 + (v11 - v01) * fx;
    top + (bottom - top) * fy
}
