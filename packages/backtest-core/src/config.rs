//! Backtest configuration loaded from TOML.

use crate::portfolio::{MetricsEngine, Rebalance, DEFAULT_PERIODS_PER_YEAR, DEFAULT_RISK_FREE_RATE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "BACKTESTER_CONFIG";

/// Run-wide assumptions for a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting portfolio value
    pub initial_capital: f64,
    /// Annual risk-free rate (e.g., 0.02 for 2%)
    pub risk_free_rate: f64,
    /// Observations per year used for annualization
    pub periods_per_year: u32,
    /// Built-in strategy id
    pub strategy: String,
    /// How often the allocation is re-decided
    pub rebalance: Rebalance,
    /// Seed for synthetic price data
    pub seed: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            strategy: "buy_and_hold".to_string(),
            rebalance: Rebalance::Daily,
            seed: 42,
        }
    }
}

impl BacktestConfig {
    /// Get the default configuration file path.
    ///
    /// Default path: `<config dir>/backtester/config.toml`.
    /// Can be overridden with the `BACKTESTER_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("backtester/config.toml"))
            .unwrap_or_else(|| PathBuf::from("backtester.toml"))
    }

    /// Load from the default path, falling back to defaults if no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidInput(
                "risk_free_rate must be finite".to_string(),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(Error::InvalidInput(
                "periods_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Metrics engine carrying this configuration's assumptions.
    pub fn metrics_engine(&self) -> MetricsEngine {
        MetricsEngine::new(self.risk_free_rate, self.periods_per_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = BacktestConfig::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "risk_free_rate = 0.04\nrebalance = \"monthly\"\n").unwrap();

        let config = BacktestConfig::load_from_path(&path).unwrap();
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.rebalance, Rebalance::Monthly);
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.periods_per_year, 252);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "periods_per_year = \"daily\"").unwrap();

        let result = BacktestConfig::load_from_path(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "periods_per_year = 0").unwrap();

        let result = BacktestConfig::load_from_path(&path);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_metrics_engine_uses_config() {
        let config = BacktestConfig {
            risk_free_rate: 0.05,
            periods_per_year: 12,
            ..Default::default()
        };
        let engine = config.metrics_engine();
        assert_eq!(engine.risk_free_rate(), 0.05);
        assert_eq!(engine.periods_per_year(), 12);
    }
}
