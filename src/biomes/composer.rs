//! Coarse-to-fine biome map composition.
//!
//! The composer is a small state machine: one global pass, a run of
//! refinement passes at halving depth, then a terminal state holding the
//! authoritative biome map.

use glam::IVec2;
use rand::Rng;
use tracing::info;

use super::config::CompositionConfig;
use super::{classify_sector, Biome};
use crate::error::GenerationError;
use crate::sampling::{poisson_sample, BackgroundGrid, SeedPolicy};
use crate::tessellation::{assign_regions, BoundaryRing, TessellationReport};
use crate::terrain::Surface;

/// Composition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionPhase {
    /// Center-seeded pass classifying sectors around the continent center.
    Global,
    /// Random-seeded pass at the given depth.
    Refinement { depth: u32 },
    /// Composition finished.
    Terminal,
}

/// Number of seeds each override rule converted in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideCounts {
    pub ruins: usize,
    pub mountain: usize,
    pub river: usize,
}

impl OverrideCounts {
    pub fn total(&self) -> usize {
        self.ruins + self.mountain + self.river
    }

    fn record(&mut self, before: Biome, after: Biome) {
        if before == after {
            return;
        }
        match after {
            Biome::Ruins => self.ruins += 1,
            Biome::Mountain => self.mountain += 1,
            Biome::River => self.river += 1,
            _ => {}
        }
    }
}

/// Statistics of one completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    /// 0 for the global pass.
    pub index: u32,
    pub depth: u32,
    /// Minimum sample distance used by the pass.
    pub spacing: f32,
    pub samples: usize,
    pub overrides: OverrideCounts,
    pub tessellation: TessellationReport,
}

/// Progress reported while a composition runs.
#[derive(Debug, Clone, Copy)]
pub enum CompositionProgress<'a> {
    /// Fraction of the current pass's columns tessellated so far.
    Column { pass: u32, fraction: f32 },
    /// A pass finished.
    Pass(&'a PassSummary),
}

/// Finished coarse biome map.
#[derive(Debug, Clone)]
pub struct BiomeMap {
    pub surface: Surface,
    pub passes: Vec<PassSummary>,
}

/// Minimum sample distance of a pass at `depth`.
pub fn spacing_for_depth(depth: u32) -> f32 {
    (depth >> 1).max(1) as f32
}

/// Total passes (global included) a composition will run.
///
/// Without a refinement cap this is `floor(log2(depth / min_depth)) + 1`,
/// and 1 when `depth < 2 * min_depth`.
pub fn expected_pass_count(depth: u32, min_depth: u32, max_refinements: Option<u32>) -> u32 {
    let min_depth = min_depth.max(1);
    let mut passes = 1;
    let mut next = depth >> 1;
    while next >= min_depth && max_refinements.map_or(true, |cap| passes - 1 < cap) {
        passes += 1;
        next >>= 1;
    }
    passes
}

/// Builds the coarse biome map.
///
/// The RNG is owned by the composer for its whole run; pass a seeded
/// generator for reproducible maps.
pub struct BiomeComposer<R> {
    config: CompositionConfig,
    surface: Surface,
    rng: R,
    phase: CompositionPhase,
    passes: Vec<PassSummary>,
    global_seeds: Vec<IVec2>,
}

impl<R: Rng> BiomeComposer<R> {
    /// Validates the configuration and allocates the `(2·depth + 1)²` map.
    pub fn new(config: CompositionConfig, rng: R) -> Result<Self, GenerationError> {
        config.validate()?;
        let size = config.domain_size();
        let surface = Surface::new(size, size, Biome::Badlands)?;
        Ok(Self {
            config,
            surface,
            rng,
            phase: CompositionPhase::Global,
            passes: Vec::new(),
            global_seeds: Vec::new(),
        })
    }

    pub fn phase(&self) -> CompositionPhase {
        self.phase
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Current state of the map.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn passes(&self) -> &[PassSummary] {
        &self.passes
    }

    fn center(&self) -> IVec2 {
        let b = self.surface.bounds();
        IVec2::new(b.x >> 1, b.y >> 1)
    }

    /// Runs the pass of the current phase and advances the state machine.
    ///
    /// Returns `None` once the composer is terminal.
    pub fn step(&mut self) -> Result<Option<&PassSummary>, GenerationError> {
        self.step_with_progress(|_| {})
    }

    /// Like [`step`](Self::step), calling `on_column` with the tessellated
    /// fraction of the pass after every column.
    pub fn step_with_progress<F>(&mut self, on_column: F) -> Result<Option<&PassSummary>, GenerationError>
    where
        F: FnMut(f32),
    {
        let (summary, depth) = match self.phase {
            CompositionPhase::Global => (self.global_pass(on_column)?, self.config.depth),
            CompositionPhase::Refinement { depth } => (self.refinement_pass(depth, on_column)?, depth),
            CompositionPhase::Terminal => return Ok(None),
        };

        info!(
            pass = summary.index,
            depth = summary.depth,
            spacing = summary.spacing,
            samples = summary.samples,
            overrides = summary.overrides.total(),
            "biome pass complete"
        );
        self.passes.push(summary);

        let refinements_done = self.passes.len() as u32 - 1;
        let next = depth >> 1;
        let may_refine = self
            .config
            .max_refinements
            .map_or(true, |cap| refinements_done < cap);
        self.phase = if next >= self.config.min_depth && may_refine {
            CompositionPhase::Refinement { depth: next }
        } else {
            self.finish();
            CompositionPhase::Terminal
        };

        Ok(self.passes.last())
    }

    /// Drives the composer to its terminal state.
    pub fn run(self) -> Result<BiomeMap, GenerationError> {
        self.run_with_progress(|_| {})
    }

    /// Drives the composer to its terminal state, reporting column progress
    /// and every finished pass.
    pub fn run_with_progress<F>(mut self, mut on_progress: F) -> Result<BiomeMap, GenerationError>
    where
        F: FnMut(CompositionProgress<'_>),
    {
        loop {
            let pass = self.passes.len() as u32;
            let Some(summary) = self.step_with_progress(|fraction| {
                on_progress(CompositionProgress::Column { pass, fraction })
            })?
            else {
                break;
            };
            on_progress(CompositionProgress::Pass(summary));
        }
        Ok(BiomeMap {
            surface: self.surface,
            passes: self.passes,
        })
    }

    fn sample(&mut self, depth: u32, seed: SeedPolicy) -> Result<BackgroundGrid, GenerationError> {
        poisson_sample(
            self.surface.bounds(),
            spacing_for_depth(depth),
            seed,
            self.config.attempts,
            &mut self.rng,
        )
    }

    fn global_pass(&mut self, on_column: impl FnMut(f32)) -> Result<PassSummary, GenerationError> {
        let depth = self.config.depth;
        let center = self.center();
        let grid = self.sample(depth, SeedPolicy::Center)?;

        // The center seed carries badlands; the ring borrows its tag.
        let tags: Vec<Biome> = grid
            .samples()
            .iter()
            .map(|s| {
                if s.order == 0 {
                    Biome::Badlands
                } else {
                    classify_sector(center, s.position)
                }
            })
            .collect();
        let ring = BoundaryRing {
            center,
            radius: self.config.ring_radius(),
            sample: 0,
        };
        let tessellation = assign_regions(&mut self.surface, &grid, &tags, Some(&ring), on_column);

        if self.config.seed_marker.is_some() {
            self.global_seeds = grid.samples().iter().map(|s| s.position).collect();
        }

        Ok(PassSummary {
            index: 0,
            depth,
            spacing: grid.min_distance(),
            samples: grid.len(),
            overrides: OverrideCounts::default(),
            tessellation,
        })
    }

    fn refinement_pass(
        &mut self,
        depth: u32,
        on_column: impl FnMut(f32),
    ) -> Result<PassSummary, GenerationError> {
        let grid = self.sample(depth, SeedPolicy::Random)?;

        let mut overrides = OverrideCounts::default();
        let mut tags = Vec::with_capacity(grid.len());
        for s in grid.samples() {
            let current = self.surface.biome_at(s.position);
            let tag = self.config.overrides.resolve(current, &mut self.rng);
            overrides.record(current, tag);
            tags.push(tag);
        }
        let tessellation = assign_regions(&mut self.surface, &grid, &tags, None, on_column);

        Ok(PassSummary {
            index: self.passes.len() as u32,
            depth,
            spacing: grid.min_distance(),
            samples: grid.len(),
            overrides,
            tessellation,
        })
    }

    /// Applies the terminal touches: the badlands frame outside the ring and
    /// optional seed markers.
    fn finish(&mut self) {
        if self.config.mask_outside_ring {
            let center = self.center();
            let r = self.config.ring_radius() as f64;
            let r2 = r * r;
            for y in 0..self.surface.height() {
                for x in 0..self.surface.width() {
                    let d = IVec2::new(x as i32, y as i32) - center;
                    let d2 = d.x as f64 * d.x as f64 + d.y as f64 * d.y as f64;
                    if d2 > r2 {
                        self.surface.set_biome(x, y, Biome::Badlands);
                    }
                }
            }
        }
        if let Some(rgb) = self.config.seed_marker {
            for p in std::mem::take(&mut self.global_seeds) {
                self.surface.set_color_override(p.x as u32, p.y as u32, Some(rgb));
            }
        }
    }
}
