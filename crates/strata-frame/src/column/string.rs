#![forbid(unsafe_code)]

use crate::index::RowIndex;
use std::cmp::Ordering;
use std::sync::Arc;

/// Immutable nullable string column storage.
///
/// Values are shared `Arc<str>` so subset/aggregation never re-allocates the
/// character data itself. Null orders before every value.
#[derive(Clone, Debug)]
pub struct StrColumn {
    values: Arc<[Option<Arc<str>>]>,
}

/// Null-first ordering shared by the string and enum variants.
pub(crate) fn null_first_cmp(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

impl StrColumn {
    pub fn new(values: Vec<Option<Arc<str>>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn from_options(values: &[Option<&str>]) -> Self {
        Self::new(values.iter().map(|v| v.map(Arc::from)).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn value_at(&self, pos: u32) -> Option<&str> {
        self.values[pos as usize].as_deref()
    }

    pub(crate) fn arc_at(&self, pos: u32) -> Option<Arc<str>> {
        self.values[pos as usize].clone()
    }

    pub(crate) fn subset(&self, index: &RowIndex) -> StrColumn {
        StrColumn::new(index.iter().map(|pos| self.arc_at(pos)).collect())
    }

    pub(crate) fn equals(&self, index: &RowIndex, other: &StrColumn, other_index: &RowIndex) -> bool {
        index
            .iter()
            .zip(other_index.iter())
            .all(|(a, b)| self.value_at(a) == other.value_at(b))
    }

    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        null_first_cmp(self.value_at(i), self.value_at(j))
    }

    pub(crate) fn byte_size(&self) -> usize {
        let data: usize = self
            .values
            .iter()
            .map(|v| v.as_deref().map_or(0, str::len))
            .sum();
        data + self.values.len() * std::mem::size_of::<Option<Arc<str>>>()
    }
}
