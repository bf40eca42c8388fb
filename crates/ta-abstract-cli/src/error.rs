//! CLI error types for file I/O, parsing, and function-call errors.
//!
//! [`CliError`] wraps every error the front-end can hit. Messages say what
//! went wrong and, where it helps, how to fix it.

use std::fmt;
use std::io;

/// CLI error type encompassing all possible error conditions.
#[derive(Debug)]
pub enum CliError {
    /// An I/O error occurred while reading or writing files.
    IoError {
        /// The underlying I/O error.
        source: io::Error,
        /// Path that caused the error, if known.
        path: Option<String>,
    },
    /// An error occurred while parsing CSV data.
    CsvParseError {
        /// Description of the parse error.
        message: String,
        /// Line number where the error occurred, if known.
        line: Option<usize>,
    },
    /// The abstract layer rejected a lookup, binding or call.
    FunctionError {
        /// The underlying ta-abstract error.
        source: ta_abstract::Error,
    },
    /// Metadata could not be rendered as JSON.
    JsonError {
        /// The underlying serde_json error.
        source: serde_json::Error,
    },
    /// An invalid argument was provided.
    InvalidArgument {
        /// Name of the invalid argument.
        argument: String,
        /// Description of why it's invalid.
        reason: String,
        /// Suggestion for valid values.
        suggestion: Option<String>,
    },
}

impl CliError {
    /// Shorthand for an [`CliError::InvalidArgument`] without suggestion.
    pub fn invalid(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError { source, path } => {
                if let Some(p) = path {
                    write!(f, "I/O error with file '{p}': {source}. ")?;
                    write!(f, "Check that the file exists and you have read permissions.")
                } else {
                    write!(f, "I/O error: {source}")
                }
            }
            Self::CsvParseError { message, line } => {
                if let Some(l) = line {
                    write!(f, "CSV parse error on line {l}: {message}. ")?;
                } else {
                    write!(f, "CSV parse error: {message}. ")?;
                }
                write!(f, "Ensure your CSV has a header row and numeric data columns.")
            }
            Self::FunctionError { source } => match source {
                ta_abstract::Error::FunctionNotFound { name } => write!(
                    f,
                    "Unknown function '{name}'. Run `ta-abstract functions` to list the catalogue."
                ),
                other => write!(f, "Function error (code {}): {other}", other.ret_code()),
            },
            Self::JsonError { source } => write!(f, "JSON rendering error: {source}"),
            Self::InvalidArgument {
                argument,
                reason,
                suggestion,
            } => {
                write!(f, "Invalid argument '{argument}': {reason}")?;
                if let Some(s) = suggestion {
                    write!(f, ". {s}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError { source, .. } => Some(source),
            Self::FunctionError { source } => Some(source),
            Self::JsonError { source } => Some(source),
            Self::CsvParseError { .. } | Self::InvalidArgument { .. } => None,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            source: err,
            path: None,
        }
    }
}

impl From<ta_abstract::Error> for CliError {
    fn from(err: ta_abstract::Error) -> Self {
        Self::FunctionError { source: err }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError { source: err }
    }
}

impl From<csv::Error> for CliError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .and_then(|p| usize::try_from(p.line()).ok());
        Self::CsvParseError {
            message: err.to_string(),
            line,
        }
    }
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_io_error_with_path() {
        let err = CliError::IoError {
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
            path: Some("/path/to/file.csv".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("/path/to/file.csv"));
        assert!(display.contains("file not found"));
        assert!(display.contains("Check that the file exists"));
    }

    #[test]
    fn test_display_csv_parse_error_with_line() {
        let err = CliError::CsvParseError {
            message: "invalid float".to_string(),
            line: Some(10),
        };
        let display = err.to_string();
        assert!(display.contains("line 10"));
        assert!(display.contains("invalid float"));
    }

    #[test]
    fn test_display_unknown_function() {
        let err: CliError = ta_abstract::Error::FunctionNotFound {
            name: "FOO".to_string(),
        }
        .into();
        let display = err.to_string();
        assert!(display.contains("'FOO'"));
        assert!(display.contains("ta-abstract functions"));
    }

    #[test]
    fn test_display_function_error_carries_code() {
        let err: CliError = ta_abstract::Error::InvalidHandle.into();
        assert!(err.to_string().contains("code 6"));
    }

    #[test]
    fn test_display_invalid_argument_with_suggestion() {
        let err = CliError::InvalidArgument {
            argument: "opt".to_string(),
            reason: "expected NAME=VALUE".to_string(),
            suggestion: Some("Try --opt optInTimePeriod=20".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("'opt'"));
        assert!(display.contains("optInTimePeriod=20"));
    }

    #[test]
    fn test_from_csv_error() {
        let result: std::result::Result<csv::StringRecord, csv::Error> = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\n1,2,3".as_bytes())
            .records()
            .last()
            .unwrap();
        let csv_err = result.unwrap_err();
        let cli_err: CliError = csv_err.into();
        assert!(matches!(cli_err, CliError::CsvParseError { .. }));
    }

    #[test]
    fn test_error_sources() {
        let io_err = CliError::from(io::Error::other("boom"));
        assert!(io_err.source().is_some());
        let fn_err = CliError::from(ta_abstract::Error::InvalidParamHolder);
        assert!(fn_err.source().is_some());
        assert!(CliError::invalid("x", "y").source().is_none());
    }
}
