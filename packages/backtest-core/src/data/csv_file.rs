//! Wide-format CSV price files.

use super::{ensure_range, PriceSource};
use crate::types::PriceMatrix;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads a CSV file laid out as `date,SYM1,SYM2,...`.
///
/// Dates are ISO `YYYY-MM-DD`; an empty cell is a missing price.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix> {
        ensure_range(start, end)?;

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            Error::DataSource(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        let headers = reader
            .headers()
            .map_err(|e| {
                Error::DataSource(format!("unreadable header in {}: {}", self.path.display(), e))
            })?
            .clone();

        let columns = symbols
            .iter()
            .map(|symbol| {
                headers
                    .iter()
                    .skip(1)
                    .position(|h| h.trim().eq_ignore_ascii_case(symbol.trim()))
                    .map(|i| i + 1)
                    .ok_or_else(|| {
                        Error::DataSource(format!(
                            "unknown symbol {} in {}",
                            symbol,
                            self.path.display()
                        ))
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut dated_rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                Error::DataSource(format!(
                    "row {}: malformed record in {}: {}",
                    line + 1,
                    self.path.display(),
                    e
                ))
            })?;
            let raw_date = record.get(0).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
                Error::DataSource(format!(
                    "row {}: invalid date '{}' in {}",
                    line + 1,
                    raw_date,
                    self.path.display()
                ))
            })?;
            if date < start || date > end {
                continue;
            }

            let cells = columns
                .iter()
                .map(|&c| parse_cell(record.get(c).unwrap_or_default(), line + 1, &headers[c]))
                .collect::<Result<Vec<_>>>()?;
            dated_rows.push((date, cells));
        }

        dated_rows.sort_by_key(|(date, _)| *date);
        let (index, rows): (Vec<_>, Vec<_>) = dated_rows.into_iter().unzip();

        tracing::debug!(
            path = %self.path.display(),
            rows = index.len(),
            symbols = symbols.len(),
            "loaded prices from CSV"
        );

        PriceMatrix::new(index, symbols.to_vec(), rows)
    }
}

fn parse_cell(raw: &str, line: usize, symbol: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        Error::DataSource(format!(
            "row {}: invalid price '{}' for {}",
            line, raw, symbol
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PRICES: &str = "\
date,AAPL,MSFT,GOOGL
2024-01-03,101.0,201.0,
2024-01-02,100.0,200.0,
2024-01-04,,202.0,50.0
2024-01-05,103.0,203.0,51.0
";

    fn write_prices(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("prices.csv");
        fs::write(&path, PRICES).unwrap();
        path
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_fetch_orders_and_fills() {
        let dir = tempdir().unwrap();
        let source = CsvPriceSource::new(write_prices(&dir));

        let symbols = vec!["msft".to_string(), "AAPL".to_string()];
        let prices = source.fetch(&symbols, date(1), date(31)).unwrap();

        assert_eq!(prices.index(), &[date(2), date(3), date(4), date(5)]);
        assert_eq!(prices.symbols(), &["MSFT".to_string(), "AAPL".to_string()]);
        assert_eq!(prices.price(0, 0), Some(200.0));
        // Forward filled gap
        assert_eq!(prices.price(2, 1), Some(101.0));
    }

    #[test]
    fn test_fetch_filters_range() {
        let dir = tempdir().unwrap();
        let source = CsvPriceSource::new(write_prices(&dir));

        let prices = source
            .fetch(&["GOOGL".to_string()], date(3), date(4))
            .unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.price(0, 0), None);
        assert_eq!(prices.price(1, 0), Some(50.0));
    }

    #[test]
    fn test_unknown_symbol() {
        let dir = tempdir().unwrap();
        let source = CsvPriceSource::new(write_prices(&dir));

        let result = source.fetch(&["TSLA".to_string()], date(1), date(31));
        assert!(matches!(result, Err(Error::DataSource(_))));
    }

    #[test]
    fn test_missing_file() {
        let source = CsvPriceSource::new("/nonexistent/prices.csv");
        let result = source.fetch(&["AAPL".to_string()], date(1), date(31));
        assert!(matches!(result, Err(Error::DataSource(_))));
    }

    #[test]
    fn test_ragged_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "date,AAPL,MSFT\n2024-01-02,100.0,200.0\n2024-01-03,101.0\n").unwrap();

        match CsvPriceSource::new(path).fetch(&["AAPL".to_string()], date(1), date(31)) {
            Err(Error::DataSource(message)) => assert!(message.contains("row 2")),
            other => panic!("expected DataSource, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_price() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "date,AAPL\n2024-01-02,abc\n").unwrap();

        let result = CsvPriceSource::new(path).fetch(&["AAPL".to_string()], date(1), date(31));
        assert!(matches!(result, Err(Error::DataSource(_))));
    }
}
