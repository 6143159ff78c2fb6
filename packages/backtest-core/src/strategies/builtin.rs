//! Built-in signal policies.
//!
//! All policies emit 1.0 for "hold" and 0.0 otherwise, read only prices at or
//! before the period being signalled, and emit 0.0 where an asset has no
//! price yet.

use super::SignalPolicy;
use crate::indicators::{momentum, rsi, sma};
use crate::types::{PriceMatrix, SignalMatrix};
use crate::{Error, Result};

/// Apply `rule` to each asset's priced history and lay the result out on the
/// full index, with 0.0 over any leading gap.
fn per_asset<F>(prices: &PriceMatrix, rule: F) -> Result<SignalMatrix>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = prices.len();
    let columns = (0..prices.symbols().len())
        .map(|a| {
            let column = prices.column(a);
            let mut signals = vec![0.0; n];
            if let Some(start) = column.iter().position(Option::is_some) {
                // Forward fill guarantees every cell after the first price is set
                let history: Vec<f64> = column[start..].iter().flatten().copied().collect();
                for (offset, signal) in rule(&history).into_iter().enumerate() {
                    signals[start + offset] = signal;
                }
            }
            signals
        })
        .collect();

    SignalMatrix::from_columns(prices, columns)
}

fn flag(active: bool) -> f64 {
    if active {
        1.0
    } else {
        0.0
    }
}

/// Hold every asset whenever it has a price.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalPolicy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn generate(&self, prices: &PriceMatrix) -> Result<SignalMatrix> {
        per_asset(prices, |history| vec![1.0; history.len()])
    }
}

/// Hold while the short SMA is above the long SMA.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    short: usize,
    long: usize,
}

impl SmaCrossover {
    pub fn new(short: usize, long: usize) -> Result<Self> {
        if short == 0 || short >= long {
            return Err(Error::InvalidInput(format!(
                "SMA crossover needs 0 < short < long, got {} and {}",
                short, long
            )));
        }
        Ok(Self { short, long })
    }
}

impl SignalPolicy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn generate(&self, prices: &PriceMatrix) -> Result<SignalMatrix> {
        per_asset(prices, |history| {
            let fast = sma(history, self.short);
            let slow = sma(history, self.long);
            fast.iter()
                .zip(&slow)
                .map(|pair| match pair {
                    (Some(f), Some(s)) => flag(f > s),
                    _ => 0.0,
                })
                .collect()
        })
    }
}

/// Hold while the lookback rate of change exceeds a threshold.
#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
    threshold: f64,
}

impl Momentum {
    pub fn new(lookback: usize, threshold: f64) -> Result<Self> {
        if lookback == 0 || !threshold.is_finite() {
            return Err(Error::InvalidInput(format!(
                "momentum needs a positive lookback and finite threshold, got {} and {}",
                lookback, threshold
            )));
        }
        Ok(Self {
            lookback,
            threshold,
        })
    }
}

impl SignalPolicy for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn generate(&self, prices: &PriceMatrix) -> Result<SignalMatrix> {
        per_asset(prices, |history| {
            momentum(history, self.lookback)
                .into_iter()
                .map(|m| flag(m.is_some_and(|m| m > self.threshold)))
                .collect()
        })
    }
}

/// Enter on an oversold RSI, exit on an overbought RSI.
#[derive(Debug, Clone)]
pub struct RsiReversion {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self> {
        let thresholds_ok = (0.0..=100.0).contains(&oversold)
            && oversold < overbought
            && overbought <= 100.0;
        if period == 0 || !thresholds_ok {
            return Err(Error::InvalidInput(format!(
                "RSI reversion needs period > 0 and 0 <= oversold < overbought <= 100, \
                 got {}, {}, {}",
                period, oversold, overbought
            )));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
        })
    }
}

impl SignalPolicy for RsiReversion {
    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn generate(&self, prices: &PriceMatrix) -> Result<SignalMatrix> {
        per_asset(prices, |history| {
            let mut holding = false;
            rsi(history, self.period)
                .into_iter()
                .map(|value| {
                    if let Some(v) = value {
                        if !holding && v < self.oversold {
                            holding = true;
                        } else if holding && v > self.overbought {
                            holding = false;
                        }
                    }
                    flag(holding)
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::{dates, symbols};

    fn single(prices: Vec<f64>) -> PriceMatrix {
        PriceMatrix::from_columns(dates(prices.len()), vec![("A".to_string(), prices)]).unwrap()
    }

    fn column(signals: &SignalMatrix) -> Vec<f64> {
        (0..signals.len()).map(|t| signals.value(t, 0)).collect()
    }

    #[test]
    fn test_buy_and_hold_matches_shape() {
        let prices = PriceMatrix::new(
            dates(3),
            symbols(&["A", "B"]),
            vec![
                vec![Some(1.0), None],
                vec![Some(1.1), Some(2.0)],
                vec![Some(1.2), Some(2.1)],
            ],
        )
        .unwrap();

        let signals = BuyAndHold.generate(&prices).unwrap();
        assert_eq!(signals.index(), prices.index());
        assert_eq!(signals.symbols(), prices.symbols());
        assert_eq!(signals.row(0), &[1.0, 0.0]);
        assert_eq!(signals.row(2), &[1.0, 1.0]);
    }

    #[test]
    fn test_sma_crossover() {
        let prices = single(vec![10.0, 10.0, 10.0, 12.0, 14.0, 9.0, 6.0]);
        let signals = SmaCrossover::new(2, 3).unwrap().generate(&prices).unwrap();

        // Long SMA warms at index 2; fast catches up on the rise and drops on the fall
        assert_eq!(column(&signals), vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sma_crossover_rejects_bad_periods() {
        assert!(SmaCrossover::new(5, 5).is_err());
        assert!(SmaCrossover::new(0, 5).is_err());
    }

    #[test]
    fn test_momentum_threshold() {
        let prices = single(vec![100.0, 101.0, 105.0, 104.0, 90.0]);
        let signals = Momentum::new(1, 0.02).unwrap().generate(&prices).unwrap();

        // Only the +3.96% day clears a 2% threshold
        assert_eq!(column(&signals), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rsi_reversion_holds_between_thresholds() {
        // Falls hard (oversold), then drifts, then rallies hard (overbought)
        let prices = single(vec![
            100.0, 95.0, 90.0, 85.0, 86.0, 85.5, 95.0, 105.0, 115.0, 125.0,
        ]);
        let signals = RsiReversion::new(3, 30.0, 70.0).unwrap().generate(&prices).unwrap();
        let signals = column(&signals);

        assert_eq!(signals[..3], [0.0, 0.0, 0.0]);
        assert_eq!(signals[3], 1.0);
        assert_eq!(signals[9], 0.0);
    }

    #[test]
    fn test_policies_are_causal() {
        let base: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let mut perturbed = base.clone();
        for p in perturbed.iter_mut().skip(25) {
            *p *= 1.5;
        }

        let policies: Vec<Box<dyn SignalPolicy>> = vec![
            Box::new(BuyAndHold),
            Box::new(SmaCrossover::new(3, 8).unwrap()),
            Box::new(Momentum::new(5, 0.0).unwrap()),
            Box::new(RsiReversion::new(5, 40.0, 60.0).unwrap()),
        ];
        for policy in policies {
            let a = policy.generate(&single(base.clone())).unwrap();
            let b = policy.generate(&single(perturbed.clone())).unwrap();
            for t in 0..25 {
                assert_eq!(a.row(t), b.row(t), "{} looked ahead at row {}", policy.name(), t);
            }
        }
    }
}
