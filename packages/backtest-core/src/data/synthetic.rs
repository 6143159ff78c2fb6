//! Seeded synthetic price data for demonstrations.

use super::{ensure_range, PriceSource};
use crate::types::PriceMatrix;
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand_distr::Normal;

/// Mean daily log-return of the generated paths.
const DRIFT: f64 = 0.0005;

/// Daily log-return standard deviation.
const DAILY_VOLATILITY: f64 = 0.02;

/// Cumulative extra trend added linearly over the whole range.
const TOTAL_TREND: f64 = 0.1;

/// Generates geometric random-walk prices on business days.
///
/// The same seed, symbols and range always produce the same matrix.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPriceSource {
    seed: u64,
}

impl SyntheticPriceSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SyntheticPriceSource {
    fn default() -> Self {
        Self::new(42)
    }
}

impl PriceSource for SyntheticPriceSource {
    fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix> {
        ensure_range(start, end)?;

        let index = business_days(start, end);
        let n = index.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = Normal::new(DRIFT, DAILY_VOLATILITY)
            .map_err(|e| Error::DataSource(format!("invalid return distribution: {}", e)))?;

        let columns = symbols
            .iter()
            .map(|symbol| {
                let base = 100.0 + f64::from(rng.gen_range(50..200_u32));
                let mut log_growth = 0.0;
                let prices = (0..n)
                    .map(|t| {
                        let trend = if n > 1 {
                            TOTAL_TREND * t as f64 / (n - 1) as f64
                        } else {
                            0.0
                        };
                        log_growth += noise.sample(&mut rng) + trend / n as f64;
                        base * f64::exp(log_growth)
                    })
                    .collect();
                (symbol.clone(), prices)
            })
            .collect();

        tracing::debug!(
            seed = self.seed,
            rows = n,
            symbols = symbols.len(),
            "generated synthetic prices"
        );

        PriceMatrix::from_columns(index, columns)
    }
}

/// Monday to Friday dates from `start` to `end` inclusive.
fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}
