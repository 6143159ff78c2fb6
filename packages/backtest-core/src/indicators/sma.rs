//! Simple Moving Average (SMA) indicator.

/// Calculate Simple Moving Average.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// Vector of SMA values. The first `period - 1` values are `None`.
///
/// # Example
///
/// ```rust
/// use backtest_core::indicators::sma;
///
/// let prices = vec![10.0, 11.0, 12.0, 11.0, 10.0];
/// let sma_values = sma(&prices, 3);
///
/// assert_eq!(sma_values[1], None);
/// // SMA at index 2 = (10 + 11 + 12) / 3 = 11.0
/// assert!((sma_values[2].unwrap() - 11.0).abs() < 0.001);
/// ```
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut result = vec![None; n];

    if period == 0 || period > n {
        return result;
    }

    // Each window is summed directly so values never depend on accumulated drift
    for i in (period - 1)..n {
        let window = &data[i + 1 - period..=i];
        result[i] = Some(window.iter().sum::<f64>() / period as f64);
    }

    result
}
