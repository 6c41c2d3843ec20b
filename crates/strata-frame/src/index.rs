#![forbid(unsafe_code)]

use crate::error::Error;
use crate::mask::Mask;
use std::sync::Arc;

/// Logical-to-physical row mapping.
///
/// Every frame owns one index shared by all its columns; filter, sort, slice
/// and distinct produce a new index over the same column storage. Entries are
/// physical offsets into column storage, duplicates and arbitrary
/// permutations allowed. Invariant: entries are always `< N` for the owning
/// columns' physical length `N`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIndex {
    positions: Arc<[u32]>,
}

impl RowIndex {
    /// The identity mapping `0..n` used by freshly constructed frames.
    pub fn identity(n: usize) -> Self {
        Self {
            positions: (0..n as u32).collect(),
        }
    }

    pub fn from_positions(positions: Vec<u32>) -> Self {
        Self {
            positions: positions.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Physical position of logical row `i`.
    pub fn get(&self, i: usize) -> u32 {
        self.positions[i]
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.positions.iter().copied()
    }

    /// Contiguous logical subrange, used by `Frame::slice`. O(end - start).
    pub fn slice(&self, start: usize, end: usize) -> Result<RowIndex, Error> {
        if start > end || end > self.len() {
            return Err(Error::OutOfBounds {
                start,
                end,
                len: self.len(),
            });
        }
        Ok(RowIndex::from_positions(self.positions[start..end].to_vec()))
    }

    /// Keep the positions whose logical row is set in `mask`, in order.
    ///
    /// This is how a filter result becomes a new index: the mask is indexed by
    /// logical row, the output carries the surviving physical positions.
    pub fn retain_by_mask(&self, mask: &Mask) -> RowIndex {
        debug_assert_eq!(mask.len(), self.len(), "mask length mismatch");
        let mut out = Vec::with_capacity(mask.count_ones());
        for i in mask.iter_ones() {
            out.push(self.positions[i]);
        }
        RowIndex::from_positions(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_slice() {
        let index = RowIndex::identity(5);
        assert_eq!(index.positions(), &[0, 1, 2, 3, 4]);

        let sliced = index.slice(1, 3).unwrap();
        assert_eq!(sliced.positions(), &[1, 2]);

        assert_eq!(
            index.slice(2, 9),
            Err(Error::OutOfBounds {
                start: 2,
                end: 9,
                len: 5
            })
        );
    }

    #[test]
    fn retain_by_mask_maps_logical_to_physical() {
        let index = RowIndex::from_positions(vec![4, 2, 0]);
        let mut mask = Mask::with_len_all_false(3);
        mask.set(0, true);
        mask.set(2, true);
        assert_eq!(index.retain_by_mask(&mask).positions(), &[4, 0]);
    }
}
