//! Composition configuration for the coarse biome map.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Biome;
use crate::error::GenerationError;
use crate::sampling::DEFAULT_ATTEMPTS;

/// Probabilistic overrides applied to refinement-pass seeds.
///
/// Each rule is an independent trial in priority order: ruins, mountain,
/// river. A rule only fires when the seed's current biome is not protected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRules {
    pub ruins_probability: f64,
    pub mountain_probability: f64,
    pub river_probability: f64,
    /// Biomes that no rule may replace.
    pub protected: Vec<Biome>,
    /// Additional biomes the river rule may not replace.
    pub river_protected: Vec<Biome>,
}

impl Default for OverrideRules {
    fn default() -> Self {
        Self::with_probability(0.01)
    }
}

impl OverrideRules {
    /// Same probability for all three rules, default protection sets.
    pub fn with_probability(p: f64) -> Self {
        Self {
            ruins_probability: p,
            mountain_probability: p,
            river_probability: p,
            protected: vec![Biome::Badlands, Biome::Ruins, Biome::Mountain, Biome::River],
            river_protected: vec![Biome::Desert],
        }
    }

    /// Resolves the tag of a refinement seed whose cell currently holds
    /// `current`. Draws one uniform float per rule reached.
    pub fn resolve<R: Rng + ?Sized>(&self, current: Biome, rng: &mut R) -> Biome {
        let protected = self.protected.contains(&current);
        if rng.random::<f64>() < self.ruins_probability && !protected {
            return Biome::Ruins;
        }
        if rng.random::<f64>() < self.mountain_probability && !protected {
            return Biome::Mountain;
        }
        if rng.random::<f64>() < self.river_probability
            && !protected
            && !self.river_protected.contains(&current)
        {
            return Biome::River;
        }
        current
    }

    fn validate(&self) -> Result<(), GenerationError> {
        for (name, p) in [
            ("ruins_probability", self.ruins_probability),
            ("mountain_probability", self.mountain_probability),
            ("river_probability", self.river_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenerationError::config(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for [`BiomeComposer`](super::BiomeComposer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Radius of the continent in coarse cells. The map is `2*depth + 1` wide.
    pub depth: u32,
    /// Refinement stops once the pass depth drops below this.
    pub min_depth: u32,
    /// Optional cap on the number of refinement passes.
    pub max_refinements: Option<u32>,
    /// Candidate attempts per active sample.
    pub attempts: usize,
    /// Badlands ring radius as a multiple of `depth`.
    pub ring_scale: f32,
    /// Paint every cell outside the ring as badlands once composition ends.
    pub mask_outside_ring: bool,
    /// Paint global-pass seed cells with this color override.
    pub seed_marker: Option<[u8; 3]>,
    pub overrides: OverrideRules,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            depth: 64,
            min_depth: 4,
            max_refinements: None,
            attempts: DEFAULT_ATTEMPTS,
            ring_scale: 1.0,
            mask_outside_ring: true,
            seed_marker: None,
            overrides: OverrideRules::default(),
        }
    }
}

impl CompositionConfig {
    /// Full refinement down to `min_depth` with sparse overrides.
    pub fn fine(depth: u32) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    /// A single refinement pass with denser overrides.
    pub fn coarse(depth: u32) -> Self {
        Self {
            depth,
            max_refinements: Some(1),
            overrides: OverrideRules::with_probability(0.03),
            ..Default::default()
        }
    }

    /// Width and height of the coarse map.
    pub fn domain_size(&self) -> u32 {
        self.depth * 2 + 1
    }

    /// Radius of the badlands ring in cells.
    pub fn ring_radius(&self) -> f32 {
        self.depth as f32 * self.ring_scale
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.depth == 0 {
            return Err(GenerationError::config("depth must be positive"));
        }
        if self.depth > (u32::MAX - 1) / 2 {
            return Err(GenerationError::config(format!("depth {} is too large", self.depth)));
        }
        if self.min_depth == 0 {
            return Err(GenerationError::config("min_depth must be positive"));
        }
        if self.attempts == 0 {
            return Err(GenerationError::config("attempts must be positive"));
        }
        if !self.ring_scale.is_finite() || self.ring_scale < 0.0 {
            return Err(GenerationError::config(format!(
                "ring_scale must be a non-negative number, got {}",
                self.ring_scale
            )));
        }
        self.overrides.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_config() {
        let config = CompositionConfig::default();
        assert_eq!(config.min_depth, 4);
        assert_eq!(config.attempts, 30);
        assert_eq!(config.overrides.ruins_probability, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_coarse_preset() {
        let config = CompositionConfig::coarse(720);
        assert_eq!(config.domain_size(), 1441);
        assert_eq!(config.max_refinements, Some(1));
        assert_eq!(config.overrides.river_probability, 0.03);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let zero_depth = CompositionConfig { depth: 0, ..Default::default() };
        assert!(matches!(zero_depth.validate(), Err(GenerationError::Configuration(_))));

        let zero_min = CompositionConfig { min_depth: 0, ..Default::default() };
        assert!(zero_min.validate().is_err());

        let mut bad_p = CompositionConfig::default();
        bad_p.overrides.mountain_probability = 1.5;
        assert!(bad_p.validate().is_err());
    }

    fn rules(ruins: f64, mountain: f64, river: f64) -> OverrideRules {
        OverrideRules {
            ruins_probability: ruins,
            mountain_probability: mountain,
            river_probability: river,
            ..OverrideRules::default()
        }
    }

    #[test]
    fn test_rules_fire_in_priority_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(rules(1.0, 1.0, 1.0).resolve(Biome::Plains, &mut rng), Biome::Ruins);
        assert_eq!(rules(0.0, 1.0, 1.0).resolve(Biome::Plains, &mut rng), Biome::Mountain);
        assert_eq!(rules(0.0, 0.0, 1.0).resolve(Biome::Forest, &mut rng), Biome::River);
        assert_eq!(rules(0.0, 0.0, 0.0).resolve(Biome::Swamp, &mut rng), Biome::Swamp);
    }

    #[test]
    fn test_protected_biomes_are_never_replaced() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let always = rules(1.0, 1.0, 1.0);
        for biome in [Biome::Badlands, Biome::Ruins, Biome::Mountain, Biome::River] {
            assert_eq!(always.resolve(biome, &mut rng), biome);
        }
        // Desert only resists rivers.
        assert_eq!(rules(0.0, 0.0, 1.0).resolve(Biome::Desert, &mut rng), Biome::Desert);
        assert_eq!(rules(0.0, 1.0, 0.0).resolve(Biome::Desert, &mut rng), Biome::Mountain);
    }

    #[test]
    fn test_override_rate_matches_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let rules = OverrideRules::with_probability(0.03);
        let trials = 20_000;
        let changed = (0..trials)
            .filter(|_| rules.resolve(Biome::Plains, &mut rng) != Biome::Plains)
            .count();
        // 1 - 0.97^3 ≈ 0.0873
        let rate = changed as f64 / trials as f64;
        assert!((rate - 0.0873).abs() < 0.01, "override rate {rate}");
    }
}
