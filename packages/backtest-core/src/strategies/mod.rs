//! Signal policies and the built-in strategy catalog.
//!
//! A signal policy maps a price matrix to a signal matrix on the same axes.
//! New strategies are new implementations of [`SignalPolicy`].

mod builtin;

pub use builtin::{BuyAndHold, Momentum, RsiReversion, SmaCrossover};

use crate::types::{PriceMatrix, SignalMatrix};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Anything that produces per-asset signals from a price history.
///
/// A signal greater than zero means "position desired" for the allocators in
/// this crate. The returned matrix must share the index and columns of
/// `prices`; the pipeline rejects anything else.
pub trait SignalPolicy {
    /// Strategy identifier.
    fn name(&self) -> &str;

    /// Generate signals for every period of `prices`.
    fn generate(&self, prices: &PriceMatrix) -> Result<SignalMatrix>;
}

/// Built-in strategy definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of how the strategy works
    pub description: String,
    /// Default parameters
    pub parameters: StrategyParameters,
}

/// Parameters for the built-in strategies.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StrategyParameters {
    /// Lookback period for momentum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback_period: Option<usize>,
    /// Momentum threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum_threshold: Option<f64>,
    /// Short SMA period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_period: Option<usize>,
    /// Long SMA period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_period: Option<usize>,
    /// RSI period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_period: Option<usize>,
    /// RSI oversold threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversold: Option<f64>,
    /// RSI overbought threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overbought: Option<f64>,
}

/// Built-in strategies keyed by id.
pub static BUILTIN_STRATEGIES: LazyLock<BTreeMap<String, StrategyInfo>> = LazyLock::new(|| {
    let mut strategies = BTreeMap::new();

    strategies.insert(
        "buy_and_hold".to_string(),
        StrategyInfo {
            id: "buy_and_hold".to_string(),
            name: "Buy and Hold".to_string(),
            description: "Hold every asset that has a price, equally weighted".to_string(),
            parameters: StrategyParameters::default(),
        },
    );

    strategies.insert(
        "sma_crossover".to_string(),
        StrategyInfo {
            id: "sma_crossover".to_string(),
            name: "SMA Crossover Strategy".to_string(),
            description: "Hold an asset while its short SMA is above its long SMA".to_string(),
            parameters: StrategyParameters {
                short_period: Some(10),
                long_period: Some(50),
                ..Default::default()
            },
        },
    );

    strategies.insert(
        "momentum".to_string(),
        StrategyInfo {
            id: "momentum".to_string(),
            name: "Momentum Strategy".to_string(),
            description: "Hold an asset while its lookback return exceeds the threshold"
                .to_string(),
            parameters: StrategyParameters {
                lookback_period: Some(20),
                momentum_threshold: Some(0.02),
                ..Default::default()
            },
        },
    );

    strategies.insert(
        "rsi_reversion".to_string(),
        StrategyInfo {
            id: "rsi_reversion".to_string(),
            name: "RSI Mean Reversion".to_string(),
            description: "Enter when RSI is oversold (<30), exit when overbought (>70)"
                .to_string(),
            parameters: StrategyParameters {
                rsi_period: Some(14),
                oversold: Some(30.0),
                overbought: Some(70.0),
                ..Default::default()
            },
        },
    );

    strategies
});

/// List all available strategies, ordered by id.
pub fn list_strategies() -> Vec<StrategyInfo> {
    BUILTIN_STRATEGIES.values().cloned().collect()
}

/// Get a specific strategy by ID.
pub fn get_strategy(id: &str) -> Option<StrategyInfo> {
    BUILTIN_STRATEGIES.get(&id.to_lowercase()).cloned()
}

/// Instantiate a built-in strategy with its default parameters.
pub fn build_policy(id: &str) -> Result<Box<dyn SignalPolicy>> {
    let info = get_strategy(id).ok_or_else(|| Error::UnknownStrategy(id.to_string()))?;
    let p = &info.parameters;

    let policy: Box<dyn SignalPolicy> = match info.id.as_str() {
        "buy_and_hold" => Box::new(BuyAndHold),
        "sma_crossover" => Box::new(SmaCrossover::new(
            p.short_period.unwrap_or(10),
            p.long_period.unwrap_or(50),
        )?),
        "momentum" => Box::new(Momentum::new(
            p.lookback_period.unwrap_or(20),
            p.momentum_threshold.unwrap_or(0.02),
        )?),
        "rsi_reversion" => Box::new(RsiReversion::new(
            p.rsi_period.unwrap_or(14),
            p.oversold.unwrap_or(30.0),
            p.overbought.unwrap_or(70.0),
        )?),
        other => return Err(Error::UnknownStrategy(other.to_string())),
    };
    Ok(policy)
}
