#![forbid(unsafe_code)]

use crate::index::RowIndex;
use std::cmp::Ordering;
use std::sync::Arc;

/// Immutable IEEE double column storage. NaN is a valid, special value: it
/// pins to one end in sorts and equals itself structurally, while remaining
/// IEEE (never matching) under filter comparison.
#[derive(Clone, Debug)]
pub struct FloatColumn {
    values: Arc<[f64]>,
}

/// Total ordering with every NaN smaller than every number, used by the sort
/// engine so NaNs pin first ascending and last descending.
pub(crate) fn nan_first_cmp(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Structural equality: NaN equals NaN, unlike IEEE comparison.
pub(crate) fn structural_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl FloatColumn {
    pub fn new(values: Vec<f64>) -> Self {
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

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn value_at(&self, pos: u32) -> f64 {
        self.values[pos as usize]
    }

    pub(crate) fn subset(&self, index: &RowIndex) -> FloatColumn {
        FloatColumn::new(index.iter().map(|pos| self.value_at(pos)).collect())
    }

    pub(crate) fn equals(
        &self,
        index: &RowIndex,
        other: &FloatColumn,
        other_index: &RowIndex,
    ) -> bool {
        index
            .iter()
            .zip(other_index.iter())
            .all(|(a, b)| structural_eq(self.value_at(a), other.value_at(b)))
    }

    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        nan_first_cmp(self.value_at(i), self.value_at(j))
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_sorts_first_and_equals_itself() {
        assert_eq!(nan_first_cmp(f64::NAN, -1.0), Ordering::Less);
        assert_eq!(nan_first_cmp(1.0, f64::NAN), Ordering::Greater);
        assert_eq!(nan_first_cmp(f64::NAN, f64::NAN), Ordering::Equal);
        assert!(structural_eq(f64::NAN, f64::NAN));
        assert!(!structural_eq(f64::NAN, 1.0));
    }
}
