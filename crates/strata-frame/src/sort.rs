#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::Error;
use crate::frame::Frame;
use crate::index::RowIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// One sort key: a column name and a direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub reverse: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reverse: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reverse: true,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl Frame {
    /// Reorder rows by the given keys, first non-equal key deciding.
    ///
    /// The sort is stable: rows with equal key tuples keep their original
    /// relative order. Each column's comparator pins nulls (strings, enums)
    /// and NaNs (floats) to the smallest position; a reversed key flips the
    /// whole ordering, moving them to the other end exactly as regular
    /// values move. Produces a new index; column storage is untouched.
    pub fn sort(&self, keys: &[SortKey]) -> Frame {
        self.chain(|frame| {
            let resolved: SmallVec<[(&Column, bool); 4]> = keys
                .iter()
                .map(|key| {
                    frame
                        .column_ref(&key.column)
                        .map(|column| (column, key.reverse))
                })
                .collect::<Result<_, Error>>()?;

            let mut positions: Vec<u32> = frame.index().positions().to_vec();
            positions.sort_by(|&a, &b| {
                for (column, reverse) in &resolved {
                    let mut ord = column.compare(a, b);
                    if *reverse {
                        ord = ord.reverse();
                    }
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });

            Ok(frame.with_index(RowIndex::from_positions(positions)))
        })
    }
}
