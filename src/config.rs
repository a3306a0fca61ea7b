//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. Every field has a
//! serde default, so a config file only needs to name what it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TrendError, TrendResult};
use crate::extrema::MIN_HISTORY;
use crate::AssetId;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for asset in &self.assets {
            anyhow::ensure!(!asset.trim().is_empty(), "asset identifiers must not be empty");
            anyhow::ensure!(seen.insert(asset.as_str()), "duplicate asset '{}'", asset);
        }
        self.tracker.validate().context("Invalid tracker config")?;
        self.scoring.validate().context("Invalid scoring config")?;
        anyhow::ensure!(
            !self.data.price_column.trim().is_empty(),
            "data.price_column must not be empty"
        );
        Ok(())
    }

    pub fn assets(&self) -> Vec<AssetId> {
        self.assets.iter().map(AssetId::new).collect()
    }

    /// History length fetched per cycle
    pub fn history_lookback(&self) -> usize {
        self.tracker
            .critical_lookback
            .max(self.scoring.volatility_lookback)
    }
}

/// Critical point tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Periods scanned for the initial critical points (default: 50)
    #[serde(default = "default_critical_lookback")]
    pub critical_lookback: usize,
}

fn default_critical_lookback() -> usize { 50 }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            critical_lookback: default_critical_lookback(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> TrendResult<()> {
        if self.critical_lookback < MIN_HISTORY {
            return Err(TrendError::InvalidParameter(format!(
                "critical_lookback ({}) must be at least {}",
                self.critical_lookback, MIN_HISTORY
            )));
        }
        Ok(())
    }
}

/// How trend strength is derived from a breakout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Swing ratio through the saturating sigmoid, bounded to (-1, 1)
    #[default]
    Sigmoid,
    /// Breakout distance per day over drawdown volatility, unbounded
    RateOfChange,
}

/// Trend scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub mode: ScoringMode,

    /// Sigmoid steepness; higher values saturate sooner (default: 0.75)
    #[serde(default = "default_sigmoid_slope")]
    pub sigmoid_slope: f64,

    /// Rolling peak window for drawdowns (default: 50)
    #[serde(default = "default_drawdown_window")]
    pub drawdown_window: usize,

    /// Periods over which drawdown volatility is measured (default: 252)
    #[serde(default = "default_volatility_lookback")]
    pub volatility_lookback: usize,
}

fn default_sigmoid_slope() -> f64 { 0.75 }
fn default_drawdown_window() -> usize { 50 }
fn default_volatility_lookback() -> usize { 252 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::default(),
            sigmoid_slope: default_sigmoid_slope(),
            drawdown_window: default_drawdown_window(),
            volatility_lookback: default_volatility_lookback(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> TrendResult<()> {
        if !(self.sigmoid_slope > 0.0 && self.sigmoid_slope.is_finite()) {
            return Err(TrendError::InvalidParameter(format!(
                "sigmoid_slope ({}) must be positive and finite",
                self.sigmoid_slope
            )));
        }
        if self.drawdown_window == 0 {
            return Err(TrendError::InvalidParameter(
                "drawdown_window must be positive".to_string(),
            ));
        }
        if self.volatility_lookback <= self.drawdown_window {
            return Err(TrendError::InvalidParameter(format!(
                "volatility_lookback ({}) must exceed drawdown_window ({})",
                self.volatility_lookback, self.drawdown_window
            )));
        }
        Ok(())
    }
}

/// Evaluation cycle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Score assets on the rayon thread pool (default: false)
    #[serde(default)]
    pub parallel: bool,
}

/// CSV price data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Column sampled from each CSV file (default: "open")
    #[serde(default = "default_price_column")]
    pub price_column: String,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_price_column() -> String { "open".to_string() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            price_column: default_price_column(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit structured JSON instead of human-readable lines
    #[serde(default)]
    pub json: bool,

    /// Also write logs to a file in this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tracker.critical_lookback, 50);
        assert_eq!(config.scoring.mode, ScoringMode::Sigmoid);
        assert_eq!(config.scoring.sigmoid_slope, 0.75);
        assert_eq!(config.scoring.drawdown_window, 50);
        assert_eq!(config.scoring.volatility_lookback, 252);
        assert_eq!(config.data.price_column, "open");
        assert_eq!(config.history_lookback(), 252);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "assets": ["AAPL", "GLD"],
            "scoring": { "mode": "rate_of_change", "sigmoid_slope": 1.5 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.assets(), vec![AssetId::new("AAPL"), AssetId::new("GLD")]);
        assert_eq!(config.scoring.mode, ScoringMode::RateOfChange);
        assert_eq!(config.scoring.sigmoid_slope, 1.5);
        assert_eq!(config.scoring.volatility_lookback, 252);
        assert!(!config.engine.parallel);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "assets": ["QQQ"], "tracker": {{ "critical_lookback": 30 }}, "engine": {{ "parallel": true }} }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.tracker.critical_lookback, 30);
        assert!(config.engine.parallel);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.scoring.sigmoid_slope = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.volatility_lookback = 50;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracker.critical_lookback = 4;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets = vec!["GLD".to_string(), "GLD".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "scoring": {{ "sigmoid_slope": 0.0 }} }}"#).unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
