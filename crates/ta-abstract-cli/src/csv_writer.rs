//! CSV output module for writing function results.
//!
//! Outputs are written from index 0 of their buffers while element `k`
//! belongs to input row `beg_idx + k`. The writer re-aligns them:
//!
//! - Rows before `beg_idx` (the lookback) are dropped
//! - NaN values are written as empty cells
//! - The date column, when present, is taken from the matching input row
//!
//! Multi-output functions (BBANDS, MACD) produce one column per output.

use crate::error::{CliError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use ta_abstract::OutputRange;

/// Output destination: either stdout or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDest {
    /// Write to stdout.
    Stdout,
    /// Write to a file at the given path.
    File(String),
}

impl OutputDest {
    /// Destination for an optional `--output` path.
    pub fn from_arg(path: Option<&str>) -> Self {
        path.map_or(Self::Stdout, |p| Self::File(p.to_string()))
    }

    /// Create a writer for this output destination.
    ///
    /// # Errors
    ///
    /// Returns `CliError::IoError` if the file cannot be created.
    pub fn writer(&self) -> Result<Box<dyn Write>> {
        match self {
            Self::Stdout => Ok(Box::new(io::stdout())),
            Self::File(path) => {
                let file = File::create(path).map_err(|e| CliError::IoError {
                    source: e,
                    path: Some(path.clone()),
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

/// Values of one output column.
#[derive(Debug, Clone, Copy)]
pub enum ColumnValues<'a> {
    /// Real output buffer.
    Real(&'a [f64]),
    /// Integer output buffer.
    Integer(&'a [i32]),
}

impl ColumnValues<'_> {
    fn write_cell(&self, writer: &mut dyn Write, k: usize) -> io::Result<()> {
        match self {
            Self::Real(values) => match values.get(k) {
                Some(v) if !v.is_nan() => write!(writer, "{v}"),
                _ => Ok(()),
            },
            Self::Integer(values) => match values.get(k) {
                Some(v) => write!(writer, "{v}"),
                None => Ok(()),
            },
        }
    }
}

/// A named output column.
#[derive(Debug, Clone, Copy)]
pub struct OutputColumn<'a> {
    /// Header name, usually the output parameter name.
    pub name: &'a str,
    /// Values, element `k` belonging to input row `beg_idx + k`.
    pub values: ColumnValues<'a>,
}

/// Write the produced range of every column, aligned to the input rows.
///
/// # Errors
///
/// Returns `CliError::IoError` if writing fails.
pub fn write_outputs(
    writer: &mut dyn Write,
    columns: &[OutputColumn<'_>],
    dates: Option<&[String]>,
    range: OutputRange,
) -> Result<()> {
    if dates.is_some() {
        write!(writer, "date")?;
        for column in columns {
            write!(writer, ",{}", column.name)?;
        }
    } else {
        let headers: Vec<&str> = columns.iter().map(|c| c.name).collect();
        write!(writer, "{}", headers.join(","))?;
    }
    writeln!(writer)?;

    for k in 0..range.nb_element {
        let row = range.beg_idx + k;
        if let Some(dates) = dates {
            write!(writer, "{}", dates.get(row).map_or("", String::as_str))?;
        }
        for (idx, column) in columns.iter().enumerate() {
            if dates.is_some() || idx > 0 {
                write!(writer, ",")?;
            }
            column.values.write_cell(writer, k)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
