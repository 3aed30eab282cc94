//! Error type shared by the table, the collaborators and the converter.

use thiserror::Error;

use crate::formats::ParseError;

/// Errors raised by table construction and matrix conversion.
#[derive(Error, Debug)]
pub enum CharmError {
    /// An unsupported data type or alphabet name.
    #[error("Invalid {kind} '{value}' (expected one of: {expected})")]
    InvalidArgument {
        kind: &'static str,
        value: String,
        expected: String,
    },

    /// Sequences or columns of unequal length.
    #[error("{context}: expected length {expected}, found {found}")]
    Shape {
        context: String,
        expected: usize,
        found: usize,
    },

    /// A missing-value marker where a concrete symbol is required.
    #[error("Column '{column}' has a missing value at position {position}")]
    MissingData { column: String, position: usize },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Position {position} is out of range for column '{column}' ({nrows} rows)")]
    PositionOutOfRange {
        column: String,
        position: usize,
        nrows: usize,
    },

    /// A categorical column holding a value outside its declared categories.
    #[error("Value '{value}' at position {position} is not a declared category")]
    InvalidCategory { value: String, position: usize },

    /// A symbol the character matrix's data type does not define.
    #[error("Invalid {data_type} symbol '{symbol}' for taxon '{taxon}' at position {position}")]
    InvalidSymbol {
        taxon: String,
        position: usize,
        symbol: char,
        data_type: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, CharmError>;

impl CharmError {
    pub(crate) fn invalid_argument(
        kind: &'static str,
        value: &str,
        expected: &[&str],
    ) -> Self {
        CharmError::InvalidArgument {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = CharmError::invalid_argument("data type", "unknown", &["dna", "rna"]);
        assert_eq!(
            err.to_string(),
            "Invalid data type 'unknown' (expected one of: dna, rna)"
        );
    }

    #[test]
    fn test_missing_data_message() {
        let err = CharmError::MissingData {
            column: "t3".to_string(),
            position: 4,
        };
        assert_eq!(err.to_string(), "Column 't3' has a missing value at position 4");
    }

    #[test]
    fn test_position_out_of_range_message() {
        let err = CharmError::PositionOutOfRange {
            column: "t1".to_string(),
            position: 5,
            nrows: 5,
        };
        assert_eq!(
            err.to_string(),
            "Position 5 is out of range for column 't1' (5 rows)"
        );
    }
}
