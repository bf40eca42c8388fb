//! CSV parsing module for reading series from CSV files.
//!
//! # Column Detection
//!
//! Columns are matched by header name (case-insensitive):
//! - `close`, `price`, `adj close`, `adjusted close` → close prices
//! - `open`, `high`, `low` → the matching price component
//! - `volume`, `vol` → volume
//! - `open interest`, `openinterest`, `oi` → open interest
//!
//! Date columns (`date`, `time`, `datetime`, `timestamp`, `dt`) are kept as
//! text for output alignment. Empty cells parse as NaN.

use crate::error::{CliError, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use ta_abstract::{PriceFlags, PriceSeries};

/// Parsed CSV data with column mapping.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    /// Column headers from the CSV.
    pub headers: Vec<String>,
    /// Mapping of normalized column name to column index.
    pub column_map: HashMap<String, usize>,
    /// Date column values (if found).
    pub dates: Option<Vec<String>>,
    /// All numeric data columns by index.
    pub columns: HashMap<usize, Vec<f64>>,
    /// Number of rows parsed.
    pub row_count: usize,
}

impl ParsedCsv {
    /// Get a column by name, ignoring case and surrounding whitespace.
    pub fn get_column(&self, name: &str) -> Option<&[f64]> {
        self.column_map
            .get(&normalize_header(name))
            .and_then(|idx| self.columns.get(idx))
            .map(Vec::as_slice)
    }

    fn first_of(&self, names: &[&str]) -> Option<&[f64]> {
        names.iter().find_map(|name| self.get_column(name))
    }

    /// Get close prices, trying multiple common column names.
    pub fn get_close(&self) -> Option<&[f64]> {
        self.first_of(&["close", "price", "adj close", "adjusted close"])
    }

    /// Get the column holding one price component.
    pub fn price_component(&self, flag: PriceFlags) -> Option<&[f64]> {
        if flag == PriceFlags::OPEN {
            self.get_column("open")
        } else if flag == PriceFlags::HIGH {
            self.get_column("high")
        } else if flag == PriceFlags::LOW {
            self.get_column("low")
        } else if flag == PriceFlags::CLOSE {
            self.get_close()
        } else if flag == PriceFlags::VOLUME {
            self.first_of(&["volume", "vol"])
        } else if flag == PriceFlags::OPEN_INTEREST {
            self.first_of(&["open interest", "openinterest", "oi"])
        } else {
            None
        }
    }

    /// Builds a price bundle from every component column present.
    ///
    /// # Errors
    ///
    /// Returns `CliError::CsvParseError` naming the first component in
    /// `required` that has no column.
    pub fn price_series(&self, required: PriceFlags) -> Result<PriceSeries<'_>> {
        let series = PriceSeries {
            open: self.price_component(PriceFlags::OPEN),
            high: self.price_component(PriceFlags::HIGH),
            low: self.price_component(PriceFlags::LOW),
            close: self.price_component(PriceFlags::CLOSE),
            volume: self.price_component(PriceFlags::VOLUME),
            open_interest: self.price_component(PriceFlags::OPEN_INTEREST),
        };
        if let Some((name, _)) = required
            .iter_names()
            .find(|(_, flag)| series.component(*flag).is_none())
        {
            return Err(CliError::CsvParseError {
                message: format!("no column found for price component {}", name.to_lowercase()),
                line: None,
            });
        }
        Ok(series)
    }
}

/// Normalize a column header name for matching.
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Check if a header represents a date column.
fn is_date_column(header: &str) -> bool {
    matches!(
        normalize_header(header).as_str(),
        "date" | "time" | "datetime" | "timestamp" | "dt"
    )
}

/// Parse a string value to f64, treating empty as NaN.
fn parse_value(value: &str, line: usize) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Ok(f64::NAN)
    } else {
        trimmed.parse::<f64>().map_err(|_| CliError::CsvParseError {
            message: format!("cannot parse '{trimmed}' as number"),
            line: Some(line),
        })
    }
}

/// Parse a CSV file into a structured format.
///
/// # Errors
///
/// Returns `CliError::IoError` if the file cannot be read, or
/// `CliError::CsvParseError` if the CSV is malformed.
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<ParsedCsv> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CliError::IoError {
        source: e,
        path: Some(path.display().to_string()),
    })?;
    parse_csv_from_reader(BufReader::new(file))
}

/// Parse CSV data from a reader.
///
/// # Errors
///
/// Returns `CliError::CsvParseError` for a missing header row or a
/// non-numeric cell in a data column.
pub fn parse_csv_from_reader<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| CliError::CsvParseError {
            message: e.to_string(),
            line: Some(1),
        })?
        .iter()
        .map(String::from)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CliError::CsvParseError {
            message: "CSV file has no headers".to_string(),
            line: Some(1),
        });
    }

    let mut column_map = HashMap::new();
    let mut date_column_idx: Option<usize> = None;
    for (idx, header) in headers.iter().enumerate() {
        if is_date_column(header) {
            date_column_idx = Some(idx);
        } else {
            column_map.insert(normalize_header(header), idx);
        }
    }

    let mut columns: HashMap<usize, Vec<f64>> =
        column_map.values().map(|&idx| (idx, Vec::new())).collect();
    let mut dates: Vec<String> = Vec::new();

    let mut row_count = 0;
    for (line_idx, result) in csv_reader.records().enumerate() {
        // +2 for the header row and 0-indexing
        let line = line_idx + 2;
        let record = result.map_err(|e| CliError::CsvParseError {
            message: e.to_string(),
            line: Some(line),
        })?;

        if let Some(date_idx) = date_column_idx {
            dates.push(record.get(date_idx).unwrap_or_default().to_string());
        }
        for (&col_idx, values) in &mut columns {
            values.push(parse_value(record.get(col_idx).unwrap_or(""), line)?);
        }
        row_count += 1;
    }

    Ok(ParsedCsv {
        headers,
        column_map,
        dates: date_column_idx.map(|_| dates),
        columns,
        row_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OHLCV: &str = "Date,Open,High,Low,Close,Volume\n\
        2024-01-01,10,12,9,11,1000\n\
        2024-01-02,11,13,10,12,1500\n\
        2024-01-03,12,12.5,11,,900\n";

    #[test]
    fn test_parse_ohlcv_with_dates() {
        let parsed = parse_csv_from_reader(OHLCV.as_bytes()).unwrap();
        assert_eq!(parsed.row_count, 3);
        assert_eq!(parsed.dates.as_ref().unwrap()[1], "2024-01-02");
        assert_eq!(parsed.get_column("HIGH").unwrap(), &[12.0, 13.0, 12.5]);
        assert!(parsed.get_close().unwrap()[2].is_nan());
        assert!(!parsed.column_map.contains_key("date"));
    }

    #[test]
    fn test_price_series_from_flags() {
        let parsed = parse_csv_from_reader(OHLCV.as_bytes()).unwrap();
        let hlcv = PriceFlags::HIGH | PriceFlags::LOW | PriceFlags::CLOSE | PriceFlags::VOLUME;
        let series = parsed.price_series(hlcv).unwrap();
        assert_eq!(series.volume.unwrap(), &[1000.0, 1500.0, 900.0]);
        assert!(series.open_interest.is_none());
    }

    #[test]
    fn test_price_series_missing_component() {
        let parsed = parse_csv_from_reader("close\n1\n2\n".as_bytes()).unwrap();
        let err = parsed.price_series(PriceFlags::HIGH | PriceFlags::CLOSE).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_price_alias_and_no_dates() {
        let parsed = parse_csv_from_reader("price\n1.5\n2.5\n".as_bytes()).unwrap();
        assert_eq!(parsed.get_close().unwrap(), &[1.5, 2.5]);
        assert!(parsed.dates.is_none());
    }

    #[test]
    fn test_non_numeric_cell_reports_line() {
        let err = parse_csv_from_reader("close\n1\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CliError::CsvParseError { line: Some(3), .. }));
    }
}
