//! Voronoi tessellation of a surface from grid-indexed seeds.

use glam::IVec2;
use tracing::warn;

use crate::biomes::Biome;
use crate::sampling::BackgroundGrid;
use crate::terrain::Surface;

/// Grid cells scanned around each surface cell (a 5×5 block).
pub const SCAN_REACH: i32 = 2;

/// Circular boundary that claims every cell lying closer to the circle than
/// to any seed. Used by the global pass to frame the continent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryRing {
    pub center: IVec2,
    pub radius: f32,
    /// Sample whose tag the ring paints.
    pub sample: usize,
}

impl BoundaryRing {
    /// Distance measure `| |p - center|² - radius² |`.
    fn distance(&self, p: IVec2) -> f64 {
        let d = p - self.center;
        let d2 = d.x as f64 * d.x as f64 + d.y as f64 * d.y as f64;
        let r = self.radius as f64;
        (d2 - r * r).abs()
    }
}

/// Outcome of one tessellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TessellationReport {
    /// Cells written from a seed or the ring.
    pub assigned: usize,
    /// Cells with no seed in range, left at their prior tag.
    pub degenerate: usize,
    /// Cells claimed by the boundary ring.
    pub ring_claims: usize,
}

/// Paints every surface cell with the tag of its nearest seed.
///
/// `tags[i]` is the tag of the sample with acceptance order `i`. Each cell
/// scans the [`SCAN_REACH`] neighborhood of its grid cell and keeps the first
/// sample at strictly minimal squared distance. Cells that find nothing keep
/// their previous tag and are counted as degenerate.
///
/// `on_progress` receives the completed fraction after every column.
pub fn assign_regions(
    surface: &mut Surface,
    grid: &BackgroundGrid,
    tags: &[Biome],
    ring: Option<&BoundaryRing>,
    mut on_progress: impl FnMut(f32),
) -> TessellationReport {
    debug_assert_eq!(tags.len(), grid.len());
    let mut report = TessellationReport::default();
    let width = surface.width();
    let height = surface.height();

    for x in 0..width {
        for y in 0..height {
            let p = IVec2::new(x as i32, y as i32);

            let mut best: Option<usize> = None;
            let mut best_dist = f64::MAX;
            for sample in grid.neighbors(p, SCAN_REACH) {
                let d = p - sample.position;
                let dist = (d.x as i64 * d.x as i64 + d.y as i64 * d.y as i64) as f64;
                if dist < best_dist {
                    best = Some(sample.order);
                    best_dist = dist;
                }
            }

            if let Some(ring) = ring {
                if ring.distance(p) < best_dist {
                    best = Some(ring.sample);
                    report.ring_claims += 1;
                }
            }

            match best {
                Some(order) => {
                    surface.set_biome(x, y, tags[order]);
                    report.assigned += 1;
                }
                None => report.degenerate += 1,
            }
        }
        on_progress((x + 1) as f32 / width as f32);
    }

    if report.degenerate > 0 {
        warn!(
            degenerate = report.degenerate,
            spacing = grid.min_distance(),
            "cells had no seed within the scan neighborhood and kept their previous biome"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{poisson_sample, SeedPolicy, DEFAULT_ATTEMPTS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_two_seeds_split_the_surface() {
        let mut surface = Surface::new(100, 100, Biome::Plains).unwrap();
        let mut grid = BackgroundGrid::new(IVec2::new(100, 100), 100.0).unwrap();
        grid.insert(IVec2::new(0, 0)).unwrap();
        grid.insert(IVec2::new(99, 99)).unwrap();
        let tags = [Biome::Forest, Biome::Desert];

        let report = assign_regions(&mut surface, &grid, &tags, None, |_| {});

        assert_eq!(report.assigned, 100 * 100);
        assert_eq!(report.degenerate, 0);
        assert_eq!(surface.biome(10, 10), Biome::Forest);
        assert_eq!(surface.biome(90, 90), Biome::Desert);
        // 49² + 49² < 50² + 50²
        assert_eq!(surface.biome(49, 49), Biome::Forest);
        assert_eq!(surface.biome(50, 50), Biome::Desert);
    }

    #[test]
    fn test_equidistant_cells_keep_the_first_sample_found() {
        let mut surface = Surface::new(11, 1, Biome::Plains).unwrap();
        let mut grid = BackgroundGrid::new(IVec2::new(11, 1), 4.0).unwrap();
        grid.insert(IVec2::new(10, 0)).unwrap();
        grid.insert(IVec2::new(0, 0)).unwrap();
        let tags = [Biome::Swamp, Biome::River];

        assign_regions(&mut surface, &grid, &tags, None, |_| {});

        // (5, 0) is 5 away from both; the scan visits lower grid columns first.
        assert_eq!(surface.biome(5, 0), Biome::River);
        assert_eq!(surface.biome(4, 0), Biome::River);
        assert_eq!(surface.biome(6, 0), Biome::Swamp);
    }

    #[test]
    fn test_every_cell_takes_a_sampled_tag() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let bounds = IVec2::new(80, 60);
        let grid = poisson_sample(bounds, 6.0, SeedPolicy::Random, DEFAULT_ATTEMPTS, &mut rng).unwrap();
        let tags: Vec<Biome> = (0..grid.len()).map(|i| Biome::ALL[1 + i % 7]).collect();

        let mut surface = Surface::new(80, 60, Biome::Plains).unwrap();
        let report = assign_regions(&mut surface, &grid, &tags, None, |_| {});

        // Only cells without a seed in range may keep the initial tag.
        assert_eq!(report.assigned + report.degenerate, 80 * 60);
        assert_eq!(
            surface.biome_histogram()[Biome::Plains.as_u8() as usize],
            report.degenerate
        );
        assert!(report.degenerate * 100 < 80 * 60);
        // Every seed cell is painted with its own tag.
        for s in grid.samples() {
            assert_eq!(surface.biome_at(s.position), tags[s.order]);
        }
    }

    #[test]
    fn test_cells_out_of_reach_keep_their_tag() {
        let mut surface = Surface::new(60, 4, Biome::Ruins).unwrap();
        let mut grid = BackgroundGrid::new(IVec2::new(60, 4), 2.0).unwrap();
        grid.insert(IVec2::new(0, 0)).unwrap();

        let report = assign_regions(&mut surface, &grid, &[Biome::Swamp], None, |_| {});

        assert!(report.degenerate > 0);
        assert_eq!(surface.biome(0, 0), Biome::Swamp);
        assert_eq!(surface.biome(59, 3), Biome::Ruins);
        assert_eq!(report.assigned + report.degenerate, 60 * 4);
    }

    #[test]
    fn test_ring_claims_cells_near_the_boundary() {
        let mut surface = Surface::new(41, 41, Biome::Plains).unwrap();
        let mut grid = BackgroundGrid::new(IVec2::new(41, 41), 20.0).unwrap();
        grid.insert(IVec2::new(20, 20)).unwrap();
        grid.insert(IVec2::new(20, 5)).unwrap();
        let tags = [Biome::Badlands, Biome::Desert];
        let ring = BoundaryRing {
            center: IVec2::new(20, 20),
            radius: 20.0,
            sample: 0,
        };

        let report = assign_regions(&mut surface, &grid, &tags, Some(&ring), |_| {});

        assert!(report.ring_claims > 0);
        // On the ring itself the ring distance is zero.
        assert_eq!(surface.biome(20, 0), Biome::Badlands);
        assert_eq!(surface.biome(40, 20), Biome::Badlands);
        // The desert seed still owns its own cell.
        assert_eq!(surface.biome(20, 5), Biome::Desert);
    }

    #[test]
    fn test_progress_ends_at_one() {
        let mut surface = Surface::new(7, 3, Biome::Plains).unwrap();
        let mut grid = BackgroundGrid::new(IVec2::new(7, 3), 10.0).unwrap();
        grid.insert(IVec2::new(3, 1)).unwrap();

        let mut reports = Vec::new();
        assign_regions(&mut surface, &grid, &[Biome::River], None, |f| reports.push(f));

        assert_eq!(reports.len(), 7);
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reports.last().unwrap(), 1.0);
    }
}
