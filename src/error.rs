//! Error taxonomy for loading and writing typed tables

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while importing or exporting a typed table
#[derive(Debug, Error)]
pub enum TableError {
    /// The source is missing, not a regular file, or its container is unreadable
    #[error("source unavailable: {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// Malformed declarations or values; `line` is set for line-oriented formats
    #[error("{}{message}", line.map(|l| format!("line {}: ", l)).unwrap_or_default())]
    StructuralParse { line: Option<usize>, message: String },

    /// The selected sheet or section holds no rows at all
    #[error("no rows found in {0}")]
    EmptySource(String),

    #[error("{0} cannot read data sets incrementally")]
    IncrementalUnsupported(&'static str),

    /// A raw value reached a column whose type cannot hold it
    #[error("row {row}, column '{column}': expected {expected} value, found {found}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: &'static str,
        found: String,
    },

    /// A table whose rows do not all match the column count
    #[error("row {row} has {found} values but the table has {expected} columns")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to write output: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TableError {
    /// Shorthand for a structural error tied to a source line
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        TableError::StructuralParse {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Shorthand for a structural error without line information
    pub fn structural(message: impl Into<String>) -> Self {
        TableError::StructuralParse {
            line: None,
            message: message.into(),
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line() as usize);
        TableError::StructuralParse {
            line,
            message: e.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for TableError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        TableError::Write(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_includes_line() {
        let err = TableError::at_line(7, "bad attribute");
        assert_eq!(err.to_string(), "line 7: bad attribute");
        let err = TableError::structural("bad attribute");
        assert_eq!(err.to_string(), "bad attribute");
    }
}
