//! Technical indicators used by the built-in signal policies.
//!
//! Every indicator is causal: the value at index `i` only reads `data[..=i]`.
//! Values that are not yet defined (warm-up) are `None`.
//!
//! - **SMA**: Simple Moving Average
//! - **Momentum**: Rate of change over a lookback window
//! - **RSI**: Relative Strength Index (Wilder smoothing)

mod rsi;
mod sma;

pub use rsi::rsi;
pub use sma::sma;

/// Calculate momentum (rate of change over n periods).
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// `(data[i] - data[i - period]) / data[i - period]`, `None` for the first
/// `period` values or when the base price is zero.
pub fn momentum(data: &[f64], period: usize) -> Vec<Option<f64>> {
    data.iter()
        .enumerate()
        .map(|(i, &price)| {
            if period == 0 || i < period {
                return None;
            }
            let base = data[i - period];
            if base == 0.0 {
                None
            } else {
                Some((price - base) / base)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentum() {
        let data = vec![100.0, 105.0, 110.0, 108.0, 112.0];
        let mom = momentum(&data, 2);

        assert_eq!(mom[0], None);
        assert_eq!(mom[1], None);
        // momentum[2] = (110 - 100) / 100 = 0.10
        assert!((mom[2].unwrap() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_is_causal() {
        let base = vec![100.0, 101.0, 99.0, 102.0, 104.0];
        let mut perturbed = base.clone();
        perturbed[4] = 50.0;

        let a = momentum(&base, 1);
        let b = momentum(&perturbed, 1);
        assert_eq!(a[..4], b[..4]);
    }
}
