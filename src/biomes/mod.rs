//! Biome classification and coarse map composition.
//!
//! The coarse map is built by a global pass that splits the continent into
//! four angular sectors around its center, followed by refinement passes
//! that sprinkle rare features at ever finer spacing.

mod composer;
mod config;

pub use composer::{
    expected_pass_count, spacing_for_depth, BiomeComposer, BiomeMap, CompositionPhase,
    CompositionProgress, OverrideCounts, PassSummary,
};
pub use config::{CompositionConfig, OverrideRules};

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Biome tag stored in every surface cell. `as_u8()` is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    #[default]
    Plains = 0,
    Mountain = 1,
    Swamp = 2,
    River = 3,
    Forest = 4,
    Ruins = 5,
    Desert = 6,
    Badlands = 7,
}

impl Biome {
    /// All biomes in id order.
    pub const ALL: [Biome; 8] = [
        Biome::Plains,
        Biome::Mountain,
        Biome::Swamp,
        Biome::River,
        Biome::Forest,
        Biome::Ruins,
        Biome::Desert,
        Biome::Badlands,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(id: u8) -> Option<Biome> {
        Biome::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Biome::Plains => "plains",
            Biome::Mountain => "mountain",
            Biome::Swamp => "swamp",
            Biome::River => "river",
            Biome::Forest => "forest",
            Biome::Ruins => "ruins",
            Biome::Desert => "desert",
            Biome::Badlands => "badlands",
        }
    }

    /// RGB preview color for this biome.
    pub fn preview_rgb(self) -> [u8; 3] {
        match self {
            Biome::Plains => [173, 255, 47],
            Biome::Mountain => [128, 128, 128],
            Biome::Swamp => [60, 179, 113],
            Biome::River => [135, 206, 235],
            Biome::Forest => [34, 139, 34],
            Biome::Ruins => [250, 235, 215],
            Biome::Desert => [255, 255, 0],
            Biome::Badlands => [178, 34, 34],
        }
    }
}

/// Classify a global-pass sample by its angular sector around `center`.
///
/// Image rows grow downwards, so a negative `dy` points north. North takes
/// both upper diagonals; the lower diagonals fall through to forest.
pub fn classify_sector(center: IVec2, p: IVec2) -> Biome {
    let d = p - center;
    if -d.y >= d.x.abs() {
        Biome::Desert
    } else if d.x > d.y.abs() {
        Biome::Plains
    } else if -d.x > d.y.abs() {
        Biome::Swamp
    } else {
        Biome::Forest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for biome in Biome::ALL {
            assert_eq!(Biome::from_u8(biome.as_u8()), Some(biome));
        }
        assert_eq!(Biome::from_u8(8), None);
    }

    #[test]
    fn test_preview_colors_are_distinct() {
        for a in Biome::ALL {
            for b in Biome::ALL {
                if a != b {
                    assert_ne!(a.preview_rgb(), b.preview_rgb(), "{} vs {}", a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn test_sectors_follow_compass_directions() {
        let c = IVec2::new(50, 50);
        assert_eq!(classify_sector(c, IVec2::new(50, 10)), Biome::Desert);
        assert_eq!(classify_sector(c, IVec2::new(90, 50)), Biome::Plains);
        assert_eq!(classify_sector(c, IVec2::new(10, 50)), Biome::Swamp);
        assert_eq!(classify_sector(c, IVec2::new(50, 90)), Biome::Forest);
    }

    #[test]
    fn test_diagonal_ties() {
        let c = IVec2::new(0, 0);
        // Upper diagonals belong to the north sector.
        assert_eq!(classify_sector(c, IVec2::new(5, -5)), Biome::Desert);
        assert_eq!(classify_sector(c, IVec2::new(-5, -5)), Biome::Desert);
        // Lower diagonals fall through to forest.
        assert_eq!(classify_sector(c, IVec2::new(5, 5)), Biome::Forest);
        assert_eq!(classify_sector(c, IVec2::new(-5, 5)), Biome::Forest);
        // The center itself counts as north.
        assert_eq!(classify_sector(c, c), Biome::Desert);
    }
}
