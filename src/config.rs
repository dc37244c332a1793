//! Configuration management for the risk scorer
//!
//! Scoring constants are fixed in [`crate::models`]; the file only tunes
//! how results are banded, how the batch pipeline runs and how it logs.

use crate::types::alert::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Largest snapshot window chrono can represent as a duration
const MAX_WINDOW_SECONDS: u64 = i64::MAX as u64 / 1000;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// Detection configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Risk level classification thresholds
    pub risk_levels: RiskLevelThresholds,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of transactions scored concurrently
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Window of the metrics snapshot
    pub window_seconds: u64,
    /// Interval between periodic summaries
    pub report_interval_secs: u64,
    /// Prediction log entries kept in memory
    pub max_entries: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_seconds: 300,
            report_interval_secs: 30,
            max_entries: 10_000,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from `path` if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let app: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<()> {
        let levels = &self.detection.risk_levels;
        anyhow::ensure!(
            levels.medium <= levels.high && levels.high <= levels.critical,
            "risk level thresholds must be ordered: medium <= high <= critical"
        );
        anyhow::ensure!(self.pipeline.workers > 0, "pipeline.workers must be at least 1");
        anyhow::ensure!(
            (1..=MAX_WINDOW_SECONDS).contains(&self.metrics.window_seconds),
            "metrics.window_seconds must be between 1 and {}",
            MAX_WINDOW_SECONDS
        );
        Ok(())
    }
}
