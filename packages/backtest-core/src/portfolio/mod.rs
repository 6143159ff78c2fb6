//! Portfolio computation pipeline.
//!
//! Provides weight allocation, lagged return aggregation, value
//! reconstruction and the performance metrics built on top.

mod allocation;
mod performance;
mod returns;
pub mod risk;
mod value;

pub use allocation::{EqualWeightAllocator, FixedTargetAllocator, Rebalance, WeightAllocator};
pub use performance::{
    MetricsEngine, DEFAULT_PERIODS_PER_YEAR, DEFAULT_RISK_FREE_RATE, VAR_TAIL_PROBABILITY,
};
pub use returns::aggregate_returns;
pub use value::reconstruct_values;
