//! Draw configuration
//!
//! Loaded from JSON. When `LEAGUE_DRAW_CONFIG_PATH` is set, `from_env` reads
//! the file it names; otherwise the defaults apply.

use serde::{Deserialize, Serialize};
use std::{env, fs};

use crate::error::ConfigError;
use crate::search::{FewestOpenSlots, MostPopularCountry, NextTeam, DEFAULT_MAX_ATTEMPTS, DEFAULT_RESTART_UNIT};

pub const CONFIG_PATH_ENV: &str = "LEAGUE_DRAW_CONFIG_PATH";

/// Order in which the search cascades into not-yet-revealed teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Team whose country has the most roster entries first
    #[default]
    MostPopularCountry,
    /// Team with the fewest open slots first
    FewestOpenSlots,
}

impl HeuristicKind {
    pub fn build(self) -> Box<dyn NextTeam> {
        match self {
            HeuristicKind::MostPopularCountry => Box::new(MostPopularCountry),
            HeuristicKind::FewestOpenSlots => Box::new(FewestOpenSlots),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Fixed seed for reproducible draws. `None` seeds from OS entropy;
    /// the seed actually used is still recorded on the session.
    pub seed: Option<u64>,
    /// Shuffle search candidates. Off gives an order-stable search.
    pub shuffle_candidates: bool,
    pub heuristic: HeuristicKind,
    /// Record every candidate tried by the search in the decision log.
    pub trace_search: bool,
    /// Re-check matrix invariants after every commit.
    pub check_invariants: bool,
    /// Maximum events kept in the decision log per revealed team.
    pub log_limit: usize,
    /// Nodes per unit of the search's restart budget. 0 disables restarts.
    pub restart_unit: u64,
    /// Search attempts per selection before giving up.
    pub max_attempts: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            seed: None,
            shuffle_candidates: true,
            heuristic: HeuristicKind::MostPopularCountry,
            trace_search: false,
            check_invariants: true,
            log_limit: 10_000,
            restart_unit: DEFAULT_RESTART_UNIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DrawConfig {
    /// Deterministic search with a fixed seed.
    pub fn reproducible(seed: u64) -> Self {
        Self { seed: Some(seed), shuffle_candidates: false, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DrawConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        Self::from_json(&content)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }
        tracing::info!(path, "loading draw config from {}", CONFIG_PATH_ENV);
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_limit == 0 {
            return Err(ConfigError::Invalid("log_limit must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DrawConfig::default();
        assert_eq!(config.seed, None);
        assert!(config.shuffle_candidates);
        assert!(config.check_invariants);
        assert_eq!(config.heuristic, HeuristicKind::MostPopularCountry);
        assert_eq!(config.restart_unit, 200);
        assert_eq!(config.max_attempts, 256);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DrawConfig::from_json(r#"{"seed": 7, "heuristic": "fewest_open_slots"}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.heuristic, HeuristicKind::FewestOpenSlots);
        assert!(config.shuffle_candidates);
    }

    #[test]
    fn test_validation_rejects_zero_log_limit() {
        let err = DrawConfig::from_json(r#"{"log_limit": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let ok = DrawConfig::from_json(r#"{"trace_search": true, "log_limit": 50}"#).unwrap();
        assert!(ok.trace_search);
        assert_eq!(ok.log_limit, 50);
    }

    #[test]
    fn test_restart_settings() {
        let err = DrawConfig::from_json(r#"{"max_attempts": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = DrawConfig::from_json(r#"{"restart_unit": 0, "max_attempts": 1}"#).unwrap();
        assert_eq!(config.restart_unit, 0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draw.json");
        std::fs::write(&path, r#"{"seed": 99, "shuffle_candidates": false}"#).unwrap();

        let config = DrawConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config, DrawConfig::reproducible(99));

        let missing = DrawConfig::load(dir.path().join("missing.json").to_str().unwrap());
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_heuristic_kind_builds() {
        assert_eq!(HeuristicKind::MostPopularCountry.build().name(), "most_popular_country");
        assert_eq!(HeuristicKind::FewestOpenSlots.build().name(), "fewest_open_slots");
    }
}
