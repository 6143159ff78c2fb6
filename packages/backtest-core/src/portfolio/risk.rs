//! Statistical estimators for portfolio risk and return.
//!
//! All functions are pure and sum left-to-right, so the same input always
//! yields bit-identical output.

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns exactly 0 for fewer than two observations or when every
/// observation is identical, so degenerate series never produce NaN or a
/// rounding-noise deviation.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }

    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Period-over-period returns of a value series, with a leading 0.
///
/// A period following a value of exactly zero returns 0: there is no capital
/// left to move.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut returns = Vec::with_capacity(values.len());
    returns.push(0.0);
    for w in values.windows(2) {
        let r = if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 };
        returns.push(r);
    }
    returns
}

/// Percentile with linear interpolation between order statistics.
///
/// The sorted sample is read at fractional rank `q * (n - 1)` and the two
/// neighbouring order statistics are interpolated linearly.
///
/// # Arguments
///
/// * `values` - Sample
/// * `q` - Quantile in `[0, 1]` (e.g. 0.05 for the 5th percentile)
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }

    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Fractional decline from the running peak for each period.
///
/// Values are zero or negative, e.g. -0.25 for 25% below the peak.
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&value| {
            peak = peak.max(value);
            if peak > 0.0 {
                (value - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Maximum drawdown of a value series as a non-negative fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values)
        .into_iter()
        .fold(0.0_f64, f64::min)
        .abs()
}

/// Annualized volatility of period returns.
pub fn volatility(returns: &[f64], periods_per_year: u32) -> f64 {
    sample_std(returns) * f64::from(periods_per_year).sqrt()
}

/// Annualize a total return earned over `periods` observations.
///
/// A total return at or below -100% annualizes to -1 (total loss).
pub fn annualize_return(total_return: f64, periods: usize, periods_per_year: u32) -> f64 {
    let years = periods as f64 / f64::from(periods_per_year);
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio.
///
/// # Arguments
///
/// * `returns` - Period returns
/// * `risk_free_rate` - Annual risk-free rate, de-annualized per period
/// * `periods_per_year` - Observations per year (252 for daily)
///
/// # Returns
///
/// `mean(excess) * P / (std(excess) * sqrt(P))`, or 0 when the excess
/// returns have zero deviation.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> f64 {
    let ppy = f64::from(periods_per_year);
    let per_period_rf = risk_free_rate / ppy;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

    let std = sample_std(&excess);
    if std == 0.0 {
        return 0.0;
    }
    (mean(&excess) * ppy) / (std * ppy.sqrt())
}

/// Annualized Sortino ratio.
///
/// Uses the deviation of the strictly negative returns only. Returns 0 when
/// there are no negative returns or their deviation is zero.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> f64 {
    let ppy = f64::from(periods_per_year);
    let downside: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
    if downside.is_empty() {
        return 0.0;
    }

    let downside_deviation = sample_std(&downside) * ppy.sqrt();
    if downside_deviation == 0.0 {
        return 0.0;
    }
    (mean(returns) * ppy - risk_free_rate) / downside_deviation
}

/// Calmar ratio. Zero when there was no drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 {
        return 0.0;
    }
    annualized_return / max_drawdown
}

/// Historical Value at Risk as a positive fraction.
///
/// # Arguments
///
/// * `returns` - Period returns
/// * `tail_probability` - Lower-tail probability (0.05 for 95% VaR)
pub fn value_at_risk(returns: &[f64], tail_probability: f64) -> f64 {
    percentile(returns, tail_probability).abs()
}
