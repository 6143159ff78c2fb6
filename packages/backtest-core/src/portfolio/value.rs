//! Portfolio value reconstruction.

use crate::types::{ReturnSeries, ValueSeries};
use crate::{Error, Result};

/// Compound a return series into portfolio values.
///
/// `value[t] = initial_capital * Π_{k=0..=t} (1 + returns[k])`, with no cash
/// flows in between. Since the first return is always 0, `value[0]` equals
/// `initial_capital` exactly. A value at or below zero is a legitimate total
/// loss, not an error.
pub fn reconstruct_values(returns: &ReturnSeries, initial_capital: f64) -> Result<ValueSeries> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "initial capital must be positive, got {}",
            initial_capital
        )));
    }

    let mut growth = 1.0;
    let values = returns
        .values()
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            initial_capital * growth
        })
        .collect();

    ValueSeries::new(returns.index().to_vec(), values)
}
