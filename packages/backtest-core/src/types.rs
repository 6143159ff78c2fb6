//! Core data types for the backtesting pipeline.
//!
//! Every matrix is indexed by an ascending list of dates (rows) and an ordered
//! list of symbols (columns). The column order is the summation order used by
//! every downstream computation.

use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// Price history for a set of assets.
///
/// Missing cells are forward-filled from the prior period at construction.
/// A leading gap (no earlier price for that asset) stays `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    index: Vec<NaiveDate>,
    symbols: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Build a price matrix from row-major cells.
    ///
    /// # Arguments
    ///
    /// * `index` - Strictly ascending dates, one per row
    /// * `symbols` - Asset symbols (upper-cased, must be unique)
    /// * `rows` - One row per date, one cell per symbol; `None` marks a missing price
    ///
    /// # Returns
    ///
    /// The forward-filled matrix, or an error if the shape or any price is invalid.
    pub fn new(
        index: Vec<NaiveDate>,
        symbols: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        let symbols = normalize_symbols(symbols)?;
        ensure_ascending(&index)?;

        if rows.len() != index.len() {
            return Err(Error::shape(
                "PriceMatrix",
                format!("{} rows for {} dates", rows.len(), index.len()),
            ));
        }

        let mut cells: Vec<Vec<Option<f64>>> = Vec::with_capacity(rows.len());
        for (t, row) in rows.into_iter().enumerate() {
            if row.len() != symbols.len() {
                return Err(Error::shape(
                    "PriceMatrix",
                    format!(
                        "row {} ({}) has {} cells, expected {}",
                        t,
                        index[t],
                        row.len(),
                        symbols.len()
                    ),
                ));
            }

            let mut filled = Vec::with_capacity(row.len());
            for (a, cell) in row.into_iter().enumerate() {
                let price = match cell {
                    Some(p) if p.is_nan() => None,
                    Some(p) if !p.is_finite() || p <= 0.0 => {
                        return Err(Error::InvalidInput(format!(
                            "price for {} on {} must be positive and finite, got {}",
                            symbols[a], index[t], p
                        )));
                    }
                    other => other,
                };
                // Forward fill from the previous period
                let prior = cells.last().and_then(|prev| prev[a]);
                filled.push(price.or(prior));
            }
            cells.push(filled);
        }

        Ok(Self {
            index,
            symbols,
            cells,
        })
    }

    /// Build a price matrix from complete per-symbol columns.
    pub fn from_columns(index: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = index.len();
        for (symbol, column) in &columns {
            if column.len() != n {
                return Err(Error::shape(
                    "PriceMatrix",
                    format!("column {} has {} prices for {} dates", symbol, column.len(), n),
                ));
            }
        }

        let rows = (0..n)
            .map(|t| columns.iter().map(|(_, column)| Some(column[t])).collect())
            .collect();
        let symbols = columns.into_iter().map(|(symbol, _)| symbol).collect();

        Self::new(index, symbols, rows)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of time points.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Price at row `t`, column `a` (after forward fill).
    pub fn price(&self, t: usize, a: usize) -> Option<f64> {
        self.cells.get(t).and_then(|row| row.get(a).copied().flatten())
    }

    pub fn row(&self, t: usize) -> &[Option<f64>] {
        &self.cells[t]
    }

    /// All prices of one asset in time order.
    pub fn column(&self, a: usize) -> Vec<Option<f64>> {
        self.cells.iter().map(|row| row[a]).collect()
    }
}

/// Per-asset, per-period signal values produced by a signal policy.
///
/// A value greater than zero means "position desired". NaN counts as inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMatrix {
    index: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SignalMatrix {
    /// Build a signal matrix from row-major values.
    pub fn new(index: Vec<NaiveDate>, symbols: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self> {
        ensure_rectangular("SignalMatrix", &index, symbols.len(), &values)?;
        Ok(Self {
            index,
            symbols,
            values,
        })
    }

    /// Build a signal matrix on the axes of `prices` from per-symbol columns.
    pub fn from_columns(prices: &PriceMatrix, columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.len() != prices.symbols().len() {
            return Err(Error::shape(
                "SignalMatrix",
                format!(
                    "{} signal columns for {} symbols",
                    columns.len(),
                    prices.symbols().len()
                ),
            ));
        }
        if let Some((a, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != prices.len())
        {
            return Err(Error::shape(
                "SignalMatrix",
                format!(
                    "column {} has {} signals for {} dates",
                    prices.symbols()[a],
                    column.len(),
                    prices.len()
                ),
            ));
        }

        let values = (0..prices.len())
            .map(|t| columns.iter().map(|column| column[t]).collect())
            .collect();

        Ok(Self {
            index: prices.index().to_vec(),
            symbols: prices.symbols().to_vec(),
            values,
        })
    }

    /// A signal matrix with every cell set to `value`.
    pub fn filled(index: Vec<NaiveDate>, symbols: Vec<String>, value: f64) -> Self {
        let values = vec![vec![value; symbols.len()]; index.len()];
        Self {
            index,
            symbols,
            values,
        }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn row(&self, t: usize) -> &[f64] {
        &self.values[t]
    }

    pub fn value(&self, t: usize, a: usize) -> f64 {
        self.values[t][a]
    }
}

/// Weight row tolerance for the "sums to at most one" invariant.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Portfolio weights per period and asset.
///
/// Every weight is in `[0, 1]` and every row sums to at most one; the
/// remainder is held as cash.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    index: Vec<NaiveDate>,
    symbols: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl WeightMatrix {
    /// Build a weight matrix, validating every row.
    pub fn new(index: Vec<NaiveDate>, symbols: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        ensure_rectangular("WeightMatrix", &index, symbols.len(), &rows)?;

        for (t, row) in rows.iter().enumerate() {
            for (a, &w) in row.iter().enumerate() {
                if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                    return Err(Error::InvalidInput(format!(
                        "weight for {} on {} must be in [0, 1], got {}",
                        symbols[a], index[t], w
                    )));
                }
            }
            let total: f64 = row.iter().sum();
            if total > 1.0 + WEIGHT_TOLERANCE {
                return Err(Error::InvalidInput(format!(
                    "weights on {} sum to {}, more than fully invested",
                    index[t], total
                )));
            }
        }

        Ok(Self {
            index,
            symbols,
            rows,
        })
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn row(&self, t: usize) -> &[f64] {
        &self.rows[t]
    }

    pub fn weight(&self, t: usize, a: usize) -> f64 {
        self.rows[t][a]
    }

    /// Weights of the last period keyed by symbol. Empty if there are no rows.
    pub fn final_weights(&self) -> BTreeMap<String, f64> {
        self.rows
            .last()
            .map(|row| {
                self.symbols
                    .iter()
                    .cloned()
                    .zip(row.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Portfolio return per period. The first value is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    index: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        ensure_series_len("ReturnSeries", &index, &values)?;
        if let Some(&first) = values.first() {
            if first != 0.0 {
                return Err(Error::InvalidInput(format!(
                    "first period return must be 0, got {}",
                    first
                )));
            }
        }
        if let Some(t) = values.iter().position(|r| !r.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "return on {} is not finite",
                index[t]
            )));
        }
        Ok(Self { index, values })
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Portfolio value per period.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSeries {
    index: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ValueSeries {
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        ensure_series_len("ValueSeries", &index, &values)?;
        if let Some(t) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "portfolio value on {} is not finite",
                index[t]
            )));
        }
        Ok(Self { index, values })
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the last period.
    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Check that `index`/`symbols` match the expected axes exactly.
///
/// The error names the first mismatching row or the mismatching columns.
pub(crate) fn ensure_aligned(
    component: &'static str,
    expected_index: &[NaiveDate],
    expected_symbols: &[String],
    index: &[NaiveDate],
    symbols: &[String],
) -> Result<()> {
    if symbols != expected_symbols {
        return Err(Error::shape(
            component,
            format!(
                "columns {:?} do not match price columns {:?}",
                symbols, expected_symbols
            ),
        ));
    }
    if index.len() != expected_index.len() {
        return Err(Error::shape(
            component,
            format!("{} rows, expected {}", index.len(), expected_index.len()),
        ));
    }
    if let Some(t) = index
        .iter()
        .zip(expected_index)
        .position(|(got, want)| got != want)
    {
        return Err(Error::shape(
            component,
            format!(
                "row {} is dated {}, expected {}",
                t, index[t], expected_index[t]
            ),
        ));
    }
    Ok(())
}

fn normalize_symbols(symbols: Vec<String>) -> Result<Vec<String>> {
    let symbols: Vec<String> = symbols
        .into_iter()
        .map(|s| s.trim().to_uppercase())
        .collect();

    let mut seen = HashSet::new();
    for symbol in &symbols {
        if symbol.is_empty() {
            return Err(Error::InvalidInput("empty symbol".to_string()));
        }
        if !seen.insert(symbol.as_str()) {
            return Err(Error::InvalidInput(format!("duplicate symbol {}", symbol)));
        }
    }
    Ok(symbols)
}

fn ensure_ascending(index: &[NaiveDate]) -> Result<()> {
    if let Some(t) = index.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::InvalidInput(format!(
            "index must be strictly ascending: {} is followed by {}",
            index[t],
            index[t + 1]
        )));
    }
    Ok(())
}

fn ensure_rectangular(
    component: &'static str,
    index: &[NaiveDate],
    width: usize,
    rows: &[Vec<f64>],
) -> Result<()> {
    if rows.len() != index.len() {
        return Err(Error::shape(
            component,
            format!("{} rows for {} dates", rows.len(), index.len()),
        ));
    }
    if let Some(t) = rows.iter().position(|row| row.len() != width) {
        return Err(Error::shape(
            component,
            format!(
                "row {} ({}) has {} cells, expected {}",
                t,
                index[t],
                rows[t].len(),
                width
            ),
        ));
    }
    Ok(())
}

fn ensure_series_len(component: &'static str, index: &[NaiveDate], values: &[f64]) -> Result<()> {
    if values.len() != index.len() {
        return Err(Error::shape(
            component,
            format!("{} values for {} dates", values.len(), index.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};

    /// Consecutive calendar days starting 2024-01-01.
    pub fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    pub fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{dates, symbols};
    use super::*;

    #[test]
    fn test_price_matrix_forward_fill() {
        let prices = PriceMatrix::new(
            dates(4),
            symbols(&["aapl", "msft"]),
            vec![
                vec![Some(100.0), None],
                vec![None, Some(50.0)],
                vec![Some(102.0), None],
                vec![Some(f64::NAN), Some(51.0)],
            ],
        )
        .unwrap();

        assert_eq!(prices.symbols(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(prices.price(1, 0), Some(100.0));
        assert_eq!(prices.price(3, 0), Some(102.0));
        // Leading gap stays missing
        assert_eq!(prices.price(0, 1), None);
        assert_eq!(prices.price(2, 1), Some(50.0));
    }

    #[test]
    fn test_price_matrix_rejects_non_positive_price() {
        let result = PriceMatrix::new(
            dates(2),
            symbols(&["A"]),
            vec![vec![Some(1.0)], vec![Some(0.0)]],
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_price_matrix_rejects_unsorted_index() {
        let mut index = dates(3);
        index.swap(1, 2);
        let result = PriceMatrix::new(
            index,
            symbols(&["A"]),
            vec![vec![Some(1.0)], vec![Some(1.0)], vec![Some(1.0)]],
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_price_matrix_rejects_ragged_rows() {
        let result = PriceMatrix::new(
            dates(2),
            symbols(&["A", "B"]),
            vec![vec![Some(1.0), Some(2.0)], vec![Some(1.0)]],
        );
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_price_matrix_rejects_duplicate_symbols() {
        let result = PriceMatrix::from_columns(
            dates(1),
            vec![("A".to_string(), vec![1.0]), ("a".to_string(), vec![2.0])],
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_weight_matrix_validation() {
        let over = WeightMatrix::new(dates(1), symbols(&["A", "B"]), vec![vec![0.7, 0.7]]);
        assert!(matches!(over, Err(Error::InvalidInput(_))));

        let negative = WeightMatrix::new(dates(1), symbols(&["A", "B"]), vec![vec![-0.1, 0.5]]);
        assert!(matches!(negative, Err(Error::InvalidInput(_))));

        let partial = WeightMatrix::new(dates(1), symbols(&["A", "B"]), vec![vec![0.3, 0.3]]);
        assert!(partial.is_ok());
    }

    #[test]
    fn test_final_weights() {
        let weights = WeightMatrix::new(
            dates(2),
            symbols(&["B", "A"]),
            vec![vec![1.0, 0.0], vec![0.5, 0.5]],
        )
        .unwrap();

        let last = weights.final_weights();
        assert_eq!(last.get("A"), Some(&0.5));
        assert_eq!(last.get("B"), Some(&0.5));
    }

    #[test]
    fn test_return_series_first_value_must_be_zero() {
        let result = ReturnSeries::new(dates(2), vec![0.01, 0.02]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_ensure_aligned_reports_row() {
        let expected = dates(3);
        let mut got = dates(3);
        got[2] = got[2] + chrono::Duration::days(10);

        let err = ensure_aligned("Test", &expected, &symbols(&["A"]), &got, &symbols(&["A"]))
            .unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }
}
