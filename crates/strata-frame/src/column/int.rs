#![forbid(unsafe_code)]

use crate::index::RowIndex;
use std::cmp::Ordering;
use std::sync::Arc;

/// Immutable signed 64-bit integer column storage.
#[derive(Clone, Debug)]
pub struct IntColumn {
    values: Arc<[i64]>,
}

impl IntColumn {
    pub fn new(values: Vec<i64>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub(crate) fn value_at(&self, pos: u32) -> i64 {
        self.values[pos as usize]
    }

    pub(crate) fn subset(&self, index: &RowIndex) -> IntColumn {
        IntColumn::new(index.iter().map(|pos| self.value_at(pos)).collect())
    }

    pub(crate) fn equals(&self, index: &RowIndex, other: &IntColumn, other_index: &RowIndex) -> bool {
        index
            .iter()
            .zip(other_index.iter())
            .all(|(a, b)| self.value_at(a) == other.value_at(b))
    }

    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        self.value_at(i).cmp(&self.value_at(j))
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<i64>()
    }
}
