//! Portfolio return aggregation.

use crate::types::{ensure_aligned, PriceMatrix, ReturnSeries, WeightMatrix};
use crate::{Error, Result};

const COMPONENT: &str = "ReturnAggregator";

/// Combine asset returns into one portfolio return per period.
///
/// The return realized at `t` uses the weights decided at `t - 1`:
///
/// ```text
/// r[t] = Σ_a weight[t-1][a] * (price[t][a] / price[t-1][a] - 1)
/// ```
///
/// The first period has no prior decision and returns 0. Asset returns that
/// cannot be formed (missing price) contribute 0. A non-zero weight on a cell
/// with no price is an error, never an implicit price of zero, and so is a
/// held asset whose return overflows.
///
/// # Arguments
///
/// * `prices` - Forward-filled price history
/// * `weights` - Weight matrix on the same axes as `prices`
pub fn aggregate_returns(prices: &PriceMatrix, weights: &WeightMatrix) -> Result<ReturnSeries> {
    ensure_aligned(
        COMPONENT,
        prices.index(),
        prices.symbols(),
        weights.index(),
        weights.symbols(),
    )?;
    ensure_priced(prices, weights)?;

    let n = prices.len();
    let width = prices.symbols().len();
    let mut returns = Vec::with_capacity(n);

    if n > 0 {
        returns.push(0.0);
    }

    for t in 1..n {
        let mut total = 0.0;
        for a in 0..width {
            let weight = weights.weight(t - 1, a);
            if weight == 0.0 {
                continue;
            }
            let asset_return = match (prices.price(t - 1, a), prices.price(t, a)) {
                (Some(prev), Some(curr)) => curr / prev - 1.0,
                _ => continue,
            };
            total += weight * asset_return;
        }
        if !total.is_finite() {
            return Err(Error::InvalidInput(format!(
                "{}: portfolio return on {} (row {}) is not finite",
                COMPONENT,
                prices.index()[t],
                t
            )));
        }
        returns.push(total);
    }

    tracing::debug!(
        periods = n,
        assets = width,
        "aggregated portfolio returns with one-period weight lag"
    );

    ReturnSeries::new(prices.index().to_vec(), returns)
}

fn ensure_priced(prices: &PriceMatrix, weights: &WeightMatrix) -> Result<()> {
    for t in 0..weights.len() {
        for (a, &w) in weights.row(t).iter().enumerate() {
            if w > 0.0 && prices.price(t, a).is_none() {
                return Err(Error::MissingPrice {
                    component: COMPONENT,
                    date: prices.index()[t],
                    symbol: prices.symbols()[a].clone(),
                });
            }
        }
    }
    Ok(())
}
