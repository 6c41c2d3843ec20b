#![forbid(unsafe_code)]

use crate::value::ColumnType;
use thiserror::Error;

/// Errors produced by frame operations.
///
/// Operations never unwind: a failing operation returns a frame carrying the
/// error, and every subsequent operation on that frame passes the error
/// through unchanged (see [`crate::Frame::result`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("no such column: {name}")]
    ColumnNotFound { name: String },

    #[error("type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("invalid comparator {name:?} for column type {column_type}")]
    InvalidComparator {
        name: String,
        column_type: ColumnType,
    },

    #[error("invalid match pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("enum column holds {count} distinct values, exceeding the max cardinality 255")]
    CardinalityExceeded { count: usize },

    #[error("unknown enum value: {value:?}")]
    UnknownEnumValue { value: String },

    #[error("aggregation over column {column:?} failed: {reason}")]
    AggregationFailure { column: String, reason: String },

    #[error("transform into column {dst:?} failed: {reason}")]
    TransformFailure { dst: String, reason: String },

    #[error("column {name:?} has length {actual} but the frame has length {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column name: {name}")]
    DuplicateColumn { name: String },

    #[error("slice {start}..{end} out of bounds for frame of length {len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
}

impl Error {
    pub(crate) fn type_mismatch(
        context: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            context,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
