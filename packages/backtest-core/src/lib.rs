//! Backtest Core - Portfolio backtesting and performance analytics.
//!
//! This crate turns a price history, a signal policy and an initial capital
//! amount into a portfolio value series and a bundle of risk/return statistics:
//!
//! - **Allocation**: signals to weights (equal-weight on active signals by default)
//! - **Aggregation**: weighted portfolio returns with a one-period weight lag
//! - **Reconstruction**: cumulative portfolio value from returns
//! - **Metrics**: total/annualized return, volatility, Sharpe, Sortino, Calmar,
//!   max drawdown and 95% historical VaR
//!
//! # Example
//!
//! ```rust
//! use backtest_core::{
//!     BacktestConfig, Backtester, BuyAndHold, EqualWeightAllocator, PriceMatrix,
//! };
//! use chrono::NaiveDate;
//!
//! let index: Vec<NaiveDate> = (1..=5)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
//!     .collect();
//! let prices = PriceMatrix::from_columns(
//!     index,
//!     vec![
//!         ("AAPL".to_string(), vec![100.0, 101.0, 102.0, 101.0, 103.0]),
//!         ("MSFT".to_string(), vec![200.0, 198.0, 202.0, 204.0, 206.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let backtester = Backtester::from_config(&BacktestConfig::default());
//! let run = backtester
//!     .run(&prices, &BuyAndHold, &EqualWeightAllocator)
//!     .unwrap();
//!
//! assert_eq!(run.values.values()[0], 100_000.0);
//! println!("Total return: {:.2}%", run.results.total_return() * 100.0);
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod indicators;
pub mod portfolio;
pub mod report;
pub mod results;
pub mod strategies;
pub mod types;

use chrono::NaiveDate;

// Re-export commonly used types
pub use types::{PriceMatrix, ReturnSeries, SignalMatrix, ValueSeries, WeightMatrix};

// Re-export main functionality
pub use backtest::{BacktestRun, Backtester};
pub use config::BacktestConfig;
pub use data::{CsvPriceSource, PriceSource, SyntheticPriceSource};
pub use portfolio::{
    aggregate_returns, reconstruct_values, EqualWeightAllocator, FixedTargetAllocator,
    MetricsEngine, Rebalance, WeightAllocator,
};
pub use results::ResultsRecord;
pub use strategies::{
    build_policy, get_strategy, list_strategies, BuyAndHold, Momentum, RsiReversion,
    SignalPolicy, SmaCrossover, StrategyInfo, BUILTIN_STRATEGIES,
};

/// Error types for backtest-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{component}: shape mismatch: {detail}")]
    ShapeMismatch {
        component: &'static str,
        detail: String,
    },

    #[error("{component}: insufficient history: need at least {required} periods, got {available}")]
    InsufficientHistory {
        component: &'static str,
        required: usize,
        available: usize,
    },

    #[error("{component}: weight allocated to {symbol} on {date} but no price is available")]
    MissingPrice {
        component: &'static str,
        date: NaiveDate,
        symbol: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data source failure: {0}")]
    DataSource(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

impl Error {
    pub(crate) fn shape(component: &'static str, detail: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            component,
            detail: detail.into(),
        }
    }
}

/// Result type for backtest-core operations.
pub type Result<T> = std::result::Result<T, Error>;
