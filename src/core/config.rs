//! Generator configuration with documented defaults
//!
//! Every tunable of a generation run lives here. Values can come from
//! `Default`, a TOML file, or CLI overrides layered on top of either.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::error::{DungeonError, Result};

/// Configuration for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    // === CAPS ===
    /// Maximum number of accepted non-wall pieces, the seed included
    pub max_pieces: usize,

    /// Maximum number of growth loop iterations
    ///
    /// Guards against a queue that never drains. Hitting it is not fatal:
    /// the final sealing sweep still runs.
    pub max_attempts: usize,

    // === SELECTION ===
    /// Probability of preferring a room over a corridor for a new piece
    ///
    /// Ignored when the catalog has no room templates.
    pub room_probability: f64,

    // === COLLISION ===
    /// Fraction by which a candidate's bounding box is shrunk before querying
    ///
    /// At 0.05 the box is tested at 95% of its size, so two pieces sharing a
    /// connector plane do not register as overlapping.
    pub overlap_margin: f32,

    /// Size of each broadphase grid cell (world units)
    ///
    /// Roughly the footprint of a typical piece works well.
    pub grid_cell_size: f32,

    // === INSTANTIATION ===
    /// Provisional position new candidates are spawned at before alignment
    pub staging_position: [f32; 3],

    /// Container name accepted pieces are reparented into
    pub container: String,

    /// Seed for the random source; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_pieces: 20,
            max_attempts: 500,
            room_probability: 0.5,
            overlap_margin: 0.05,
            grid_cell_size: 10.0,
            staging_position: [0.0, -1000.0, 0.0],
            container: "dungeon".to_string(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GeneratorConfig =
            toml::from_str(content).map_err(|e| DungeonError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = toml::from_str(&content)
            .map_err(|e| DungeonError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn staging_position(&self) -> Vec3 {
        Vec3::from_array(self.staging_position)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_pieces == 0 {
            return Err(DungeonError::InvalidConfig(
                "max_pieces must be positive".into(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(DungeonError::InvalidConfig(
                "max_attempts must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.room_probability) {
            return Err(DungeonError::InvalidConfig(format!(
                "room_probability ({}) must be within [0, 1]",
                self.room_probability
            )));
        }

        // A margin of 1.0 would shrink every box to a point
        if !(0.0..1.0).contains(&self.overlap_margin) {
            return Err(DungeonError::InvalidConfig(format!(
                "overlap_margin ({}) must be within [0, 1)",
                self.overlap_margin
            )));
        }

        if self.grid_cell_size.is_nan() || self.grid_cell_size <= 0.0 {
            return Err(DungeonError::InvalidConfig(format!(
                "grid_cell_size ({}) must be positive",
                self.grid_cell_size
            )));
        }

        if !self.staging_position().is_finite() {
            return Err(DungeonError::InvalidConfig(
                "staging_position must be finite".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_pieces, 20);
        assert_eq!(config.max_attempts, 500);
        assert_eq!(config.room_probability, 0.5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            max_pieces = 8
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.max_pieces, 8);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_attempts, 500);
        assert_eq!(config.container, "dungeon");
    }

    #[test]
    fn test_rejects_zero_caps() {
        let config = GeneratorConfig {
            max_pieces: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DungeonError::InvalidConfig(_))
        ));

        let config = GeneratorConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        let err = GeneratorConfig::from_toml_str("room_probability = 1.5").unwrap_err();
        assert!(err.to_string().contains("room_probability"));
    }

    #[test]
    fn test_rejects_full_margin() {
        let config = GeneratorConfig {
            overlap_margin: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
