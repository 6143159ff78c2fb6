//! End-to-end backtest pipeline.
//!
//! Signals → weights → lagged returns → values → metrics. Every stage is a
//! pure transformation of immutable inputs; independent runs share nothing.

use crate::config::BacktestConfig;
use crate::portfolio::{
    aggregate_returns, reconstruct_values, MetricsEngine, Rebalance, WeightAllocator,
};
use crate::results::ResultsRecord;
use crate::strategies::SignalPolicy;
use crate::types::{ensure_aligned, PriceMatrix, ReturnSeries, ValueSeries, WeightMatrix};
use crate::{Error, Result};

const COMPONENT: &str = "Backtester";

/// Everything produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    /// Weights actually held, after the rebalance schedule
    pub weights: WeightMatrix,
    /// Portfolio return per period
    pub returns: ReturnSeries,
    /// Portfolio value per period
    pub values: ValueSeries,
    /// Statistics bundle
    pub results: ResultsRecord,
}

/// Runs the pipeline with fixed capital, metric assumptions and rebalance schedule.
#[derive(Debug, Clone)]
pub struct Backtester {
    initial_capital: f64,
    engine: MetricsEngine,
    rebalance: Rebalance,
}

impl Backtester {
    pub fn new(initial_capital: f64, engine: MetricsEngine) -> Self {
        Self {
            initial_capital,
            engine,
            rebalance: Rebalance::Daily,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        Self::new(config.initial_capital, config.metrics_engine()).with_rebalance(config.rebalance)
    }

    pub fn with_rebalance(mut self, rebalance: Rebalance) -> Self {
        self.rebalance = rebalance;
        self
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Run one backtest.
    ///
    /// # Arguments
    ///
    /// * `prices` - Validated price history (at least two periods)
    /// * `policy` - Produces signals on the same axes as `prices`
    /// * `allocator` - Turns each signal row into a weight row
    ///
    /// # Returns
    ///
    /// The full run, or the first fatal error. No partial results are returned.
    pub fn run(
        &self,
        prices: &PriceMatrix,
        policy: &dyn SignalPolicy,
        allocator: &dyn WeightAllocator,
    ) -> Result<BacktestRun> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if prices.len() < 2 {
            return Err(Error::InsufficientHistory {
                component: COMPONENT,
                required: 2,
                available: prices.len(),
            });
        }

        let signals = policy.generate(prices)?;
        ensure_aligned(
            "SignalPolicy",
            prices.index(),
            prices.symbols(),
            signals.index(),
            signals.symbols(),
        )?;
        tracing::debug!(policy = policy.name(), periods = signals.len(), "generated signals");

        let weights = self.rebalance.apply(allocator.allocate(&signals)?)?;
        ensure_aligned(
            "WeightAllocator",
            prices.index(),
            prices.symbols(),
            weights.index(),
            weights.symbols(),
        )?;
        tracing::debug!(
            allocator = allocator.name(),
            rebalance = %self.rebalance,
            "allocated weights"
        );

        let returns = aggregate_returns(prices, &weights)?;
        let values = reconstruct_values(&returns, self.initial_capital)?;
        let results = self.engine.compute(&values, &weights, self.initial_capital)?;

        tracing::info!(
            policy = policy.name(),
            periods = prices.len(),
            assets = prices.symbols().len(),
            final_value = results.final_value(),
            "backtest completed"
        );

        Ok(BacktestRun {
            weights,
            returns,
            values,
            results,
        })
    }
}
