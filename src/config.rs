use std::path::Path;

use tracing::warn;

use crate::engine::BOARD_SIZE;
use crate::error::ConfigError;

/// Tunables for board generation, match detection and scoring, loadable from TOML.
///
/// Every field has a default, so a config file only needs to name what it changes:
///
/// ```
/// use match3_engine::config::EngineConfig;
///
/// let config: EngineConfig = toml::from_str("star_score = 50").unwrap();
/// assert_eq!(config.star_score, 50);
/// assert_eq!(config.base_score, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shortest run of equal colors that counts as a match.
    pub min_match_len: usize,
    /// Points awarded per matched Flat tile.
    pub base_score: u32,
    /// Points awarded per matched Star tile.
    pub star_score: u32,
    /// A generated tile is a Star with probability `1 / star_one_in`. Zero disables stars.
    pub star_one_in: u32,
    /// Cascade steps allowed for a single player move before giving up.
    pub max_cascades: u32,
    /// Hints a player may request per level (enforced by front ends).
    pub hints_per_level: u32,
    /// Seed for the tile generator. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            min_match_len: 3,
            base_score: 5,
            star_score: 30,
            star_one_in: 20,
            max_cascades: 256,
            hints_per_level: 3,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_match_len < 3 || self.min_match_len > BOARD_SIZE {
            return Err(ConfigError::Validation(format!(
                "min_match_len must be in [3, {}]",
                BOARD_SIZE
            )));
        }
        if self.star_score <= self.base_score {
            return Err(ConfigError::Validation(
                "star_score must be > base_score".into(),
            ));
        }
        if self.max_cascades == 0 {
            return Err(ConfigError::Validation(
                "max_cascades must be > 0".into(),
            ));
        }
        Ok(())
    }
}
