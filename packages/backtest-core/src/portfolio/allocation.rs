//! Signal-to-weight allocation.
//!
//! An allocator maps one row of signals to one row of weights. The pipeline
//! applies it to every period and then applies the rebalance schedule.

use crate::types::{SignalMatrix, WeightMatrix};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Capability to turn a signal row into a weight row.
///
/// Implementations must return one weight per symbol, each in `[0, 1]`, with
/// the row summing to at most one.
pub trait WeightAllocator {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Weights for a single period.
    fn allocate_row(&self, symbols: &[String], signals: &[f64]) -> Vec<f64>;

    /// Weights for every period of `signals`.
    fn allocate(&self, signals: &SignalMatrix) -> Result<WeightMatrix> {
        let rows = (0..signals.len())
            .map(|t| self.allocate_row(signals.symbols(), signals.row(t)))
            .collect();

        WeightMatrix::new(signals.index().to_vec(), signals.symbols().to_vec(), rows)
    }
}

/// Equal weight across every asset with a positive signal; all cash otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightAllocator;

impl WeightAllocator for EqualWeightAllocator {
    fn name(&self) -> &str {
        "equal_weight"
    }

    fn allocate_row(&self, _symbols: &[String], signals: &[f64]) -> Vec<f64> {
        let active = signals.iter().filter(|&&s| s > 0.0).count();
        if active == 0 {
            return vec![0.0; signals.len()];
        }

        let weight = 1.0 / active as f64;
        signals
            .iter()
            .map(|&s| if s > 0.0 { weight } else { 0.0 })
            .collect()
    }
}

/// Fixed target weights, renormalized over the assets that are active.
///
/// Assets without a target (or with a zero target) are never held.
#[derive(Debug, Clone)]
pub struct FixedTargetAllocator {
    targets: BTreeMap<String, f64>,
}

impl FixedTargetAllocator {
    /// Create an allocator from symbol → target weight.
    ///
    /// Targets must be finite and non-negative; symbols are matched case-insensitively.
    pub fn new(targets: BTreeMap<String, f64>) -> Result<Self> {
        let mut normalized = BTreeMap::new();
        for (symbol, target) in targets {
            if !target.is_finite() || target < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "target weight for {} must be finite and non-negative, got {}",
                    symbol, target
                )));
            }
            normalized.insert(symbol.trim().to_uppercase(), target);
        }
        Ok(Self {
            targets: normalized,
        })
    }

    /// Parse `AAPL=0.6,MSFT=0.4`.
    pub fn parse(pairs: &str) -> Result<Self> {
        let mut targets = BTreeMap::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (symbol, weight) = pair.split_once('=').ok_or_else(|| {
                Error::InvalidInput(format!("expected SYMBOL=WEIGHT, got '{}'", pair))
            })?;
            let weight: f64 = weight.trim().parse().map_err(|_| {
                Error::InvalidInput(format!("invalid target weight in '{}'", pair))
            })?;
            targets.insert(symbol.to_string(), weight);
        }
        Self::new(targets)
    }

    pub fn targets(&self) -> &BTreeMap<String, f64> {
        &self.targets
    }
}

impl WeightAllocator for FixedTargetAllocator {
    fn name(&self) -> &str {
        "fixed_target"
    }

    fn allocate_row(&self, symbols: &[String], signals: &[f64]) -> Vec<f64> {
        let raw: Vec<f64> = symbols
            .iter()
            .zip(signals)
            .map(|(symbol, &s)| {
                if s > 0.0 {
                    self.targets.get(symbol).copied().unwrap_or(0.0)
                } else {
                    0.0
                }
            })
            .collect();

        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return vec![0.0; signals.len()];
        }
        raw.into_iter().map(|w| w / total).collect()
    }
}

/// How often the allocation is re-decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rebalance {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Rebalance {
    /// Whether `current` starts a new rebalance period relative to `previous`.
    pub fn is_rebalance_point(&self, previous: NaiveDate, current: NaiveDate) -> bool {
        match self {
            Rebalance::Daily => true,
            Rebalance::Weekly => previous.iso_week() != current.iso_week(),
            Rebalance::Monthly => {
                previous.year() != current.year() || previous.month() != current.month()
            }
        }
    }

    /// Carry the last decided row forward between rebalance points.
    ///
    /// The first period is always a rebalance point.
    pub fn apply(&self, weights: WeightMatrix) -> Result<WeightMatrix> {
        if *self == Rebalance::Daily || weights.is_empty() {
            return Ok(weights);
        }

        let index = weights.index();
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(weights.len());
        let mut decided = weights.row(0).to_vec();
        rows.push(decided.clone());

        for t in 1..weights.len() {
            if self.is_rebalance_point(index[t - 1], index[t]) {
                decided = weights.row(t).to_vec();
            }
            rows.push(decided.clone());
        }

        WeightMatrix::new(index.to_vec(), weights.symbols().to_vec(), rows)
    }
}

impl fmt::Display for Rebalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rebalance::Daily => "daily",
            Rebalance::Weekly => "weekly",
            Rebalance::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for Rebalance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Rebalance::Daily),
            "weekly" => Ok(Rebalance::Weekly),
            "monthly" => Ok(Rebalance::Monthly),
            other => Err(Error::InvalidInput(format!(
                "unknown rebalance frequency '{}' (daily, weekly, monthly)",
                other
            ))),
        }
    }
}
