//! Price data sources.
//!
//! A source either returns a fully validated [`PriceMatrix`] or an error; the
//! pipeline never sees partially shaped data. Choosing to fall back to
//! synthetic data after a failure is left to the caller.

mod csv_file;
mod synthetic;

pub use csv_file::CsvPriceSource;
pub use synthetic::SyntheticPriceSource;

use crate::types::PriceMatrix;
use crate::{Error, Result};
use chrono::NaiveDate;

/// Anything that can provide a price history for a symbol list and date range.
pub trait PriceSource {
    /// Fetch prices for `symbols` between `start` and `end` (inclusive).
    ///
    /// Columns come back in the order of `symbols`.
    fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix>;
}

fn ensure_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}
