#![forbid(unsafe_code)]

use crate::column::{EnumColumn, EnumDict, StrColumn};
use std::sync::Arc;

/// Read-only projection of one column through one index.
///
/// Construction is O(1) (no copy); `item_at` is an index lookup plus a
/// storage lookup. `to_vec` materializes a flat sequence in the current
/// logical order. The generic parameter covers the copyable element domains
/// (int, float, bool); strings and enums have dedicated view types below.
#[derive(Clone, Copy, Debug)]
pub struct View<'a, T> {
    values: &'a [T],
    positions: &'a [u32],
}

impl<'a, T: Copy> View<'a, T> {
    pub(crate) fn new(values: &'a [T], positions: &'a [u32]) -> Self {
        Self { values, positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn item_at(&self, i: usize) -> T {
        self.values[self.positions[i] as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let values = self.values;
        self.positions.iter().map(move |&pos| values[pos as usize])
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// Read-only projection of a nullable string column.
#[derive(Clone, Copy, Debug)]
pub struct StrView<'a> {
    column: &'a StrColumn,
    positions: &'a [u32],
}

impl<'a> StrView<'a> {
    pub(crate) fn new(column: &'a StrColumn, positions: &'a [u32]) -> Self {
        Self { column, positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn item_at(&self, i: usize) -> Option<&'a str> {
        self.column.value_at(self.positions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let column = self.column;
        self.positions.iter().map(move |&pos| column.value_at(pos))
    }

    pub fn to_vec(&self) -> Vec<Option<Arc<str>>> {
        let column = self.column;
        self.positions
            .iter()
            .map(|&pos| column.arc_at(pos))
            .collect()
    }
}

/// Read-only projection of a dictionary-encoded enum column. Items decode
/// through the dictionary; `dictionary` exposes the value ordering.
#[derive(Clone, Copy, Debug)]
pub struct EnumView<'a> {
    column: &'a EnumColumn,
    positions: &'a [u32],
}

impl<'a> EnumView<'a> {
    pub(crate) fn new(column: &'a EnumColumn, positions: &'a [u32]) -> Self {
        Self { column, positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn dictionary(&self) -> &'a EnumDict {
        self.column.dictionary()
    }

    pub fn item_at(&self, i: usize) -> Option<&'a str> {
        self.column.value_at(self.positions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let column = self.column;
        self.positions.iter().map(move |&pos| column.value_at(pos))
    }

    pub fn to_vec(&self) -> Vec<Option<&'a str>> {
        self.iter().collect()
    }
}
