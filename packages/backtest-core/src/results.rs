//! Backtest results record and its persisted form.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Snapshot of every computed metric plus the final-period weights.
///
/// Built once per run by the metrics engine and never mutated afterwards.
/// Serializes to a flat JSON object; `weights` is the only nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsRecord {
    final_value: f64,
    total_return: f64,
    annualized_return: f64,
    volatility: f64,
    sharpe_ratio: f64,
    sortino_ratio: f64,
    calmar_ratio: f64,
    max_drawdown: f64,
    var_95: f64,
    weights: BTreeMap<String, f64>,
}

impl ResultsRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        final_value: f64,
        total_return: f64,
        annualized_return: f64,
        volatility: f64,
        sharpe_ratio: f64,
        sortino_ratio: f64,
        calmar_ratio: f64,
        max_drawdown: f64,
        var_95: f64,
        weights: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            final_value,
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown,
            var_95,
            weights,
        }
    }

    /// Portfolio value at the last period
    pub fn final_value(&self) -> f64 {
        self.final_value
    }

    /// `(final_value - initial_capital) / initial_capital`
    pub fn total_return(&self) -> f64 {
        self.total_return
    }

    /// Compound annual growth rate
    pub fn annualized_return(&self) -> f64 {
        self.annualized_return
    }

    /// Annualized standard deviation of period returns
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.sharpe_ratio
    }

    pub fn sortino_ratio(&self) -> f64 {
        self.sortino_ratio
    }

    pub fn calmar_ratio(&self) -> f64 {
        self.calmar_ratio
    }

    /// Largest peak-to-trough decline as a non-negative fraction
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// One-period 95% historical Value at Risk as a positive fraction
    pub fn var_95(&self) -> f64 {
        self.var_95
    }

    /// Final-period weight per symbol
    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Flat key/value form for external reporting.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("final_value".into(), self.final_value.into());
        map.insert("total_return".into(), self.total_return.into());
        map.insert("annualized_return".into(), self.annualized_return.into());
        map.insert("volatility".into(), self.volatility.into());
        map.insert("sharpe_ratio".into(), self.sharpe_ratio.into());
        map.insert("sortino_ratio".into(), self.sortino_ratio.into());
        map.insert("calmar_ratio".into(), self.calmar_ratio.into());
        map.insert("max_drawdown".into(), self.max_drawdown.into());
        map.insert("var_95".into(), self.var_95.into());

        let weights = self
            .weights
            .iter()
            .map(|(symbol, &w)| (symbol.clone(), w.into()))
            .collect();
        map.insert("weights".into(), serde_json::Value::Object(weights));
        map
    }

    /// Write the record as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read a record previously written by [`ResultsRecord::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
pub(crate) fn sample_record() -> ResultsRecord {
    let mut weights = BTreeMap::new();
    weights.insert("AAPL".to_string(), 0.5);
    weights.insert("MSFT".to_string(), 0.5);

    ResultsRecord::new(
        112_500.0, 0.125, 0.0625, 0.18, 1.1, 1.6, 0.5, 0.125, 0.021, weights,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_to_map_is_flat() {
        let map = sample_record().to_map();

        assert_eq!(map.len(), 10);
        assert_eq!(map["total_return"], serde_json::json!(0.125));
        assert_eq!(map["weights"]["AAPL"], serde_json::json!(0.5));
        assert!(map
            .iter()
            .filter(|(key, _)| key.as_str() != "weights")
            .all(|(_, value)| value.is_number()));
    }

    #[test]
    fn test_serialized_keys_match_map() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, serde_json::Value::Object(record.to_map()));
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/results.json");

        let record = sample_record();
        record.save(&path).unwrap();

        let loaded = ResultsRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = ResultsRecord::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
