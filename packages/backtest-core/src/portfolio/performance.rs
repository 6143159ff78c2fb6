//! Portfolio performance analytics.

use super::risk::{
    annualize_return, calmar_ratio, max_drawdown, period_returns, sharpe_ratio, sortino_ratio,
    value_at_risk, volatility,
};
use crate::results::ResultsRecord;
use crate::types::{ensure_aligned, ValueSeries, WeightMatrix};
use crate::{Error, Result};

const COMPONENT: &str = "MetricsEngine";

/// Default annual risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Default number of periods per year (trading days).
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Lower-tail probability used for the reported VaR.
pub const VAR_TAIL_PROBABILITY: f64 = 0.05;

/// Computes the statistics bundle for a finished value series.
///
/// The risk-free rate and annualization factor are fixed at construction so
/// that concurrent backtests with different assumptions never interfere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsEngine {
    risk_free_rate: f64,
    periods_per_year: u32,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE, DEFAULT_PERIODS_PER_YEAR)
    }
}

impl MetricsEngine {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `risk_free_rate` - Annual risk-free rate (e.g., 0.02 for 2%)
    /// * `periods_per_year` - Observations per year (252 for daily data)
    pub fn new(risk_free_rate: f64, periods_per_year: u32) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
        }
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Calculate every metric for a value series and its weights.
    ///
    /// # Arguments
    ///
    /// * `values` - Portfolio value per period
    /// * `weights` - Weight matrix on the same dates; its last row becomes the final weights
    /// * `initial_capital` - Capital the run started with
    ///
    /// # Returns
    ///
    /// The results record, or an error when there are fewer than two periods,
    /// the axes disagree, or the configuration cannot annualize.
    pub fn compute(
        &self,
        values: &ValueSeries,
        weights: &WeightMatrix,
        initial_capital: f64,
    ) -> Result<ResultsRecord> {
        if values.len() < 2 {
            return Err(Error::InsufficientHistory {
                component: COMPONENT,
                required: 2,
                available: values.len(),
            });
        }
        if self.periods_per_year == 0 {
            return Err(Error::InvalidInput(
                "periods per year must be positive to annualize".to_string(),
            ));
        }
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "initial capital must be positive, got {}",
                initial_capital
            )));
        }
        ensure_aligned(
            COMPONENT,
            values.index(),
            weights.symbols(),
            weights.index(),
            weights.symbols(),
        )?;

        let series = values.values();
        let final_value = series[series.len() - 1];
        let total_return = (final_value - initial_capital) / initial_capital;
        let annualized_return = annualize_return(total_return, series.len(), self.periods_per_year);

        let returns = period_returns(series);
        let volatility = volatility(&returns, self.periods_per_year);
        let sharpe = sharpe_ratio(&returns, self.risk_free_rate, self.periods_per_year);
        let sortino = sortino_ratio(&returns, self.risk_free_rate, self.periods_per_year);

        let max_drawdown = max_drawdown(series);
        let calmar = calmar_ratio(annualized_return, max_drawdown);
        let var_95 = value_at_risk(&returns, VAR_TAIL_PROBABILITY);

        ensure_finite(&[
            ("final_value", final_value),
            ("total_return", total_return),
            ("annualized_return", annualized_return),
            ("volatility", volatility),
            ("sharpe_ratio", sharpe),
            ("sortino_ratio", sortino),
            ("calmar_ratio", calmar),
            ("max_drawdown", max_drawdown),
            ("var_95", var_95),
        ])?;

        tracing::debug!(
            periods = series.len(),
            total_return,
            max_drawdown,
            "computed performance metrics"
        );

        Ok(ResultsRecord::new(
            final_value,
            total_return,
            annualized_return,
            volatility,
            sharpe,
            sortino,
            calmar,
            max_drawdown,
            var_95,
            weights.final_weights(),
        ))
    }
}

/// Reject any metric that overflowed; the record must survive a JSON round trip.
fn ensure_finite(metrics: &[(&str, f64)]) -> Result<()> {
    match metrics.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(Error::InvalidInput(format!(
            "{}: {} is not finite ({})",
            COMPONENT, name, value
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::{dates, symbols};
    use approx::assert_abs_diff_eq;

    fn hold_all(n: usize) -> WeightMatrix {
        WeightMatrix::new(dates(n), symbols(&["A", "B"]), vec![vec![0.5, 0.5]; n]).unwrap()
    }

    #[test]
    fn test_constant_values() {
        let values = ValueSeries::new(dates(30), vec![1000.0; 30]).unwrap();
        let results = MetricsEngine::default()
            .compute(&values, &hold_all(30), 1000.0)
            .unwrap();

        assert_eq!(results.total_return(), 0.0);
        assert_eq!(results.volatility(), 0.0);
        assert_eq!(results.sharpe_ratio(), 0.0);
        assert_eq!(results.sortino_ratio(), 0.0);
        assert_eq!(results.max_drawdown(), 0.0);
        assert_eq!(results.calmar_ratio(), 0.0);
        assert_eq!(results.var_95(), 0.0);
    }

    #[test]
    fn test_steady_growth_annualizes() {
        // Each of the 252 observations sits one 1% step past the previous one
        let capital = 10_000.0;
        let series: Vec<f64> = (1..=252).map(|k| capital * 1.01_f64.powi(k)).collect();
        let values = ValueSeries::new(dates(252), series).unwrap();

        let results = MetricsEngine::default()
            .compute(&values, &hold_all(252), capital)
            .unwrap();

        assert_abs_diff_eq!(
            results.annualized_return(),
            1.01_f64.powi(252) - 1.0,
            epsilon = 1e-6
        );
        assert_eq!(results.max_drawdown(), 0.0);
        assert_eq!(results.sortino_ratio(), 0.0);
        assert_eq!(results.calmar_ratio(), 0.0);
    }

    #[test]
    fn test_half_drawdown_and_recovery() {
        let values = ValueSeries::new(dates(5), vec![100.0, 80.0, 50.0, 75.0, 100.0]).unwrap();
        let results = MetricsEngine::default()
            .compute(&values, &hold_all(5), 100.0)
            .unwrap();

        assert_eq!(results.max_drawdown(), 0.5);
        assert_eq!(results.total_return(), 0.0);
        assert!(results.sortino_ratio() != 0.0);
    }

    #[test]
    fn test_final_weights_from_last_row() {
        let weights = WeightMatrix::new(
            dates(3),
            symbols(&["A", "B"]),
            vec![vec![1.0, 0.0], vec![0.5, 0.5], vec![0.0, 1.0]],
        )
        .unwrap();
        let values = ValueSeries::new(dates(3), vec![100.0, 101.0, 102.0]).unwrap();

        let results = MetricsEngine::default().compute(&values, &weights, 100.0).unwrap();
        assert_eq!(results.weights().get("A"), Some(&0.0));
        assert_eq!(results.weights().get("B"), Some(&1.0));
    }

    #[test]
    fn test_insufficient_history() {
        let values = ValueSeries::new(dates(1), vec![100.0]).unwrap();
        let result = MetricsEngine::default().compute(&values, &hold_all(1), 100.0);

        assert!(matches!(
            result,
            Err(Error::InsufficientHistory {
                required: 2,
                available: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_periods_per_year() {
        let values = ValueSeries::new(dates(3), vec![100.0, 101.0, 102.0]).unwrap();
        let result = MetricsEngine::new(0.02, 0).compute(&values, &hold_all(3), 100.0);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_misaligned_weights() {
        let values = ValueSeries::new(dates(3), vec![100.0, 101.0, 102.0]).unwrap();
        let result = MetricsEngine::default().compute(&values, &hold_all(4), 100.0);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_overflowing_annualized_return_is_rejected() {
        // A 2000x move over two daily observations annualizes past f64::MAX
        let values = ValueSeries::new(dates(2), vec![100.0, 200_000.0]).unwrap();
        let result = MetricsEngine::default().compute(&values, &hold_all(2), 100.0);

        match result {
            Err(Error::InvalidInput(message)) => {
                assert!(message.contains("MetricsEngine"));
                assert!(message.contains("annualized_return"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_total_loss_is_tolerated() {
        let values = ValueSeries::new(dates(4), vec![100.0, 50.0, 0.0, 0.0]).unwrap();
        let results = MetricsEngine::default()
            .compute(&values, &hold_all(4), 100.0)
            .unwrap();

        assert_eq!(results.total_return(), -1.0);
        assert_eq!(results.annualized_return(), -1.0);
        assert_eq!(results.max_drawdown(), 1.0);
        assert!(results.sharpe_ratio().is_finite());
        assert!(results.var_95().is_finite());
    }
}
