//! Player availability modeling pipeline
//!
//! Loads per-season player performance records into a SQLite store, derives a
//! binary low-availability label from the minutes ratio, trains baseline
//! classifiers and persists the winning model artifact.

pub mod data;
pub mod features;
pub mod model;
pub mod training;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One season of raw player performance, as read from the ingestion source.
///
/// `ppg` is `None` when the source field is empty; everything else is
/// required. `starts <= appearances` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub season: String,
    pub competition: String,
    pub club: String,
    pub appearances: u32,
    pub starts: u32,
    pub ppg: Option<f64>,
    pub minutes: u32,
}

/// A row of the precomputed feature view. Read-only to this pipeline; the
/// ratio columns and the sort key are computed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub season: String,
    pub club: String,
    pub competition: String,
    pub appearances: u32,
    pub starts: u32,
    pub ppg: Option<f64>,
    pub minutes: u32,
    pub appearance_ratio: f64,
    pub minutes_ratio: f64,
    pub season_start_year: i32,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data: {0}")]
    Insufficient(String),

    #[error("Artifact serialization error: {0}")]
    Artifact(#[from] serde_json::Error),

    #[error("Model not trained - run `litmanen train` first")]
    NoModel,

    #[error("Model is not fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub model_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Seed for the stratified split and the forest
    pub seed: u64,
    /// Fraction of labeled rows held out for evaluation
    pub test_fraction: f64,
    pub forest_trees: usize,
    pub forest_max_depth: usize,
    pub logistic_max_iter: usize,
    pub logistic_learning_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/litmanen.db".to_string(),
                model_dir: "model".to_string(),
            },
            training: TrainingConfig {
                seed: 42,
                test_fraction: 0.3,
                forest_trees: 100,
                forest_max_depth: 5,
                logistic_max_iter: 1000,
                logistic_learning_rate: 0.1,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
