// Configuration loading and parsing (teamsplit.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use teamsplit_core::{
    ClockMode, ConfigurationError, InitialAssignment, PartitionConfig, RatingBounds,
    SearchOptions, WeightedScorer,
};

/// Config file consulted when no `--config` path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/teamsplit.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// teamsplit.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchSection,
    pub scoring: WeightedScorer,
    pub ratings: RatingBounds,
}

/// The `[search]` table: default team count, budget, and search tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub num_teams: usize,
    /// Seconds.
    pub time_limit: f64,
    pub num_attempts: usize,
    pub max_swap_passes: usize,
    pub initial_assignment: InitialAssignment,
    pub seed: Option<u64>,
}

impl Default for SearchSection {
    fn default() -> Self {
        SearchSection {
            num_teams: 2,
            time_limit: 30.0,
            num_attempts: 5,
            max_swap_passes: 100,
            initial_assignment: InitialAssignment::SnakeThenShuffled,
            seed: None,
        }
    }
}

impl Config {
    /// Budget built from the `[search]` defaults.
    pub fn partition_config(&self) -> Result<PartitionConfig, ConfigurationError> {
        PartitionConfig::new(
            self.search.num_teams,
            self.search.time_limit,
            self.search.num_attempts,
        )
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            initial_assignment: self.search.initial_assignment,
            max_swap_passes: self.search.max_swap_passes,
            seed: self.search.seed,
            clock: ClockMode::WallClock,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from an explicit file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Without one, `config/teamsplit.toml` under
/// `base_dir` is used when present and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>, base_dir: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    let default_path = base_dir.join(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_config_from(&default_path)
    } else {
        Ok(Config::default())
    }
}

fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let search = &config.search;
    let counts: &[(&str, usize)] = &[
        ("search.num_teams", search.num_teams),
        ("search.num_attempts", search.num_attempts),
    ];
    for (name, val) in counts {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if !search.time_limit.is_finite() || search.time_limit <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "search.time_limit".into(),
            message: format!("must be a positive number of seconds, got {}", search.time_limit),
        });
    }

    // Weights may be zero (term disabled) but never negative.
    let s = &config.scoring;
    let weights: &[(&str, f64)] = &[
        ("scoring.rating_weight", s.rating_weight),
        ("scoring.position_weight", s.position_weight),
        ("scoring.shortfall_weight", s.shortfall_weight),
    ];
    for (name, val) in weights {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite number >= 0, got {val}"),
            });
        }
    }

    let r = &config.ratings;
    if !r.min.is_finite() || !r.max.is_finite() || r.min > r.max {
        return Err(ConfigError::ValidationError {
            field: "ratings".into(),
            message: format!("min ({}) must not exceed max ({})", r.min, r.max),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
