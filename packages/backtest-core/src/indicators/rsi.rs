//! Relative Strength Index (RSI) indicator.

/// RSI from average gain and average loss.
/// No losses gives 100, no gains gives 0, no change gives 50.
#[inline]
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        if avg_gain <= 0.0 {
            50.0
        } else {
            100.0
        }
    } else if avg_gain <= 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Calculate Relative Strength Index.
///
/// The first average is a simple mean over `period` changes; later averages
/// use Wilder's smoothing `avg = (prev * (period - 1) + current) / period`.
///
/// # Arguments
///
/// * `prices` - Price series (typically closing prices)
/// * `period` - Lookback period (typically 14)
///
/// # Returns
///
/// RSI values on a 0-100 scale; `None` until `period + 1` prices are seen.
///
/// # Example
///
/// ```rust
/// use backtest_core::indicators::rsi;
///
/// let prices = vec![44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.5, 44.0];
/// let rsi_values = rsi(&prices, 3);
///
/// assert_eq!(rsi_values[2], None);
/// for value in rsi_values.iter().flatten() {
///     assert!((0.0..=100.0).contains(value));
/// }
/// ```
pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = prices.len();
    let mut result = vec![None; n];

    if period == 0 || n <= period {
        return result;
    }

    let change = |i: usize| prices[i] - prices[i - 1];

    let mut avg_gain = (1..=period).map(|i| change(i).max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = (1..=period).map(|i| (-change(i)).max(0.0)).sum::<f64>() / period as f64;
    result[period] = Some(rsi_value(avg_gain, avg_loss));

    let p = period as f64;
    for i in (period + 1)..n {
        avg_gain = (avg_gain * (p - 1.0) + change(i).max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change(i)).max(0.0)) / p;
        result[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_all_gains() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&prices, 14);

        assert_eq!(result[13], None);
        assert_eq!(result[14], Some(100.0));
        assert_eq!(result[19], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&prices, 14);
        assert_eq!(result[14], Some(0.0));
    }

    #[test]
    fn test_rsi_flat() {
        let result = rsi(&[10.0; 6], 3);
        assert_eq!(result[3], Some(50.0));
    }

    #[test]
    fn test_rsi_balanced() {
        // Alternating equal gains and losses over the first window
        let prices = vec![10.0, 11.0, 10.0, 11.0, 10.0];
        let result = rsi(&prices, 4);
        assert_eq!(result[4], Some(50.0));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0, 2.0], 14).iter().all(Option::is_none));
    }
}
