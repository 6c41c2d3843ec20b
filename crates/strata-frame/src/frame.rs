#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::Error;
use crate::index::RowIndex;
use crate::value::{ColumnType, Scalar};
use crate::view::{EnumView, StrView, View};
use ahash::AHashMap;

#[derive(Clone, Debug)]
struct NamedColumn {
    name: String,
    column: Column,
}

/// An immutable mapping from column name to typed column, plus the current
/// logical row order.
///
/// Every operation returns a new frame; column storage is shared between the
/// input and the result wherever the operation permits it (filter, sort,
/// slice, select, distinct, copy). A frame additionally carries a latched
/// error: once an operation fails, every subsequent operation passes the
/// same error through unchanged, so pipelines check [`Frame::result`] once at
/// the end.
#[derive(Clone, Debug)]
pub struct Frame {
    columns: Vec<NamedColumn>,
    by_name: AHashMap<String, usize>,
    index: RowIndex,
    err: Option<Error>,
}

impl Frame {
    /// Build a frame from `(name, column)` pairs, in insertion order.
    ///
    /// Unequal column lengths or duplicate names latch an error on the
    /// returned frame rather than panicking, so ingestion code can hand the
    /// result straight into a pipeline.
    pub fn new<S: Into<String>>(columns: Vec<(S, Column)>) -> Frame {
        let mut named: Vec<NamedColumn> = Vec::with_capacity(columns.len());
        let mut by_name = AHashMap::with_capacity(columns.len());
        let mut expected_len: Option<usize> = None;

        for (name, column) in columns {
            let name = name.into();
            if by_name.contains_key(&name) {
                return Frame::from_error(Error::DuplicateColumn { name });
            }
            let len = column.len();
            match expected_len {
                None => expected_len = Some(len),
                Some(expected) if expected != len => {
                    return Frame::from_error(Error::LengthMismatch {
                        name,
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
            by_name.insert(name.clone(), named.len());
            named.push(NamedColumn { name, column });
        }

        let len = expected_len.unwrap_or(0);
        Frame {
            columns: named,
            by_name,
            index: RowIndex::identity(len),
            err: None,
        }
    }

    /// A frame carrying only a latched error.
    pub fn from_error(err: Error) -> Frame {
        Frame {
            columns: Vec::new(),
            by_name: AHashMap::new(),
            index: RowIndex::identity(0),
            err: Some(err),
        }
    }

    /// The latched error, if any operation in the chain failed.
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Resolve the chain: the frame itself, or the first error that latched.
    pub fn result(self) -> Result<Frame, Error> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Number of logical rows (the current index length).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType, Error> {
        self.column_ref(name).map(Column::column_type)
    }

    /// Declared byte footprint across all column storage (informational).
    pub fn byte_size(&self) -> usize {
        self.columns.iter().map(|c| c.column.byte_size()).sum()
    }

    /// The value at logical row `row` of column `name`.
    pub fn cell(&self, row: usize, name: &str) -> Result<Scalar, Error> {
        let column = self.column_ref(name)?;
        if row >= self.len() {
            return Err(Error::OutOfBounds {
                start: row,
                end: row + 1,
                len: self.len(),
            });
        }
        Ok(column.scalar_at(self.index.get(row)))
    }

    /// Render the value at logical row `row` of column `name`; nulls render
    /// as `na_rep`. This is the contract emission layers read a frame
    /// through, together with [`Frame::column_names`] and [`Frame::len`].
    pub fn cell_text(&self, row: usize, name: &str, na_rep: &str) -> Result<String, Error> {
        let column = self.column_ref(name)?;
        if row >= self.len() {
            return Err(Error::OutOfBounds {
                start: row,
                end: row + 1,
                len: self.len(),
            });
        }
        Ok(column.string_at(self.index.get(row), na_rep).into_owned())
    }

    /// Keep only `names`, in the given order, sharing column storage.
    pub fn select(&self, names: &[&str]) -> Frame {
        self.chain(|frame| {
            let mut columns = Vec::with_capacity(names.len());
            let mut by_name = AHashMap::with_capacity(names.len());
            for &name in names {
                if by_name.contains_key(name) {
                    return Err(Error::DuplicateColumn {
                        name: name.to_owned(),
                    });
                }
                let column = frame.column_ref(name)?.clone();
                by_name.insert(name.to_owned(), columns.len());
                columns.push(NamedColumn {
                    name: name.to_owned(),
                    column,
                });
            }
            Ok(Frame {
                columns,
                by_name,
                index: frame.index.clone(),
                err: None,
            })
        })
    }

    /// Rows `start..end` of the current logical order. O(end - start), no
    /// column copy.
    pub fn slice(&self, start: usize, end: usize) -> Frame {
        self.chain(|frame| Ok(frame.with_index(frame.index.slice(start, end)?)))
    }

    /// Structural equality: same column names in order, same variants, equal
    /// values row by row through both frames' indexes (NaN equals NaN).
    /// Frames carrying an error compare unequal to everything.
    pub fn equals(&self, other: &Frame) -> bool {
        if self.err.is_some() || other.err.is_some() {
            return false;
        }
        if self.columns.len() != other.columns.len() {
            return false;
        }
        if !self.columns.is_empty() && self.len() != other.len() {
            return false;
        }
        self.columns.iter().zip(other.columns.iter()).all(|(a, b)| {
            a.name == b.name && a.column.equals(&self.index, &b.column, &other.index)
        })
    }

    /// Typed read-only view over an int column. O(1).
    pub fn int_view(&self, name: &str) -> Result<View<'_, i64>, Error> {
        match self.column_ref(name)? {
            Column::Int(col) => Ok(View::new(col.values(), self.index.positions())),
            other => Err(self.view_mismatch(ColumnType::Int, other)),
        }
    }

    /// Typed read-only view over a float column. O(1).
    pub fn float_view(&self, name: &str) -> Result<View<'_, f64>, Error> {
        match self.column_ref(name)? {
            Column::Float(col) => Ok(View::new(col.values(), self.index.positions())),
            other => Err(self.view_mismatch(ColumnType::Float, other)),
        }
    }

    /// Typed read-only view over a bool column. O(1).
    pub fn bool_view(&self, name: &str) -> Result<View<'_, bool>, Error> {
        match self.column_ref(name)? {
            Column::Bool(col) => Ok(View::new(col.values(), self.index.positions())),
            other => Err(self.view_mismatch(ColumnType::Bool, other)),
        }
    }

    /// Typed read-only view over a nullable string column. O(1).
    pub fn str_view(&self, name: &str) -> Result<StrView<'_>, Error> {
        match self.column_ref(name)? {
            Column::Str(col) => Ok(StrView::new(col, self.index.positions())),
            other => Err(self.view_mismatch(ColumnType::Str, other)),
        }
    }

    /// Typed read-only view over an enum column. O(1).
    pub fn enum_view(&self, name: &str) -> Result<EnumView<'_>, Error> {
        match self.column_ref(name)? {
            Column::Enum(col) => Ok(EnumView::new(col, self.index.positions())),
            other => Err(self.view_mismatch(ColumnType::Enum, other)),
        }
    }

    fn view_mismatch(&self, expected: ColumnType, actual: &Column) -> Error {
        Error::type_mismatch(
            "view",
            expected.to_string(),
            actual.column_type().to_string(),
        )
    }

    /// Run `op` unless an error is already latched; latch any failure.
    pub(crate) fn chain(&self, op: impl FnOnce(&Frame) -> Result<Frame, Error>) -> Frame {
        if self.err.is_some() {
            return self.clone();
        }
        match op(self) {
            Ok(frame) => frame,
            Err(err) => Frame::from_error(err),
        }
    }

    /// Same columns, new logical order.
    pub(crate) fn with_index(&self, index: RowIndex) -> Frame {
        Frame {
            columns: self.columns.clone(),
            by_name: self.by_name.clone(),
            index,
            err: None,
        }
    }

    pub(crate) fn index(&self) -> &RowIndex {
        &self.index
    }

    pub(crate) fn column_ref(&self, name: &str) -> Result<&Column, Error> {
        self.by_name
            .get(name)
            .map(|&slot| &self.columns[slot].column)
            .ok_or_else(|| Error::ColumnNotFound {
                name: name.to_owned(),
            })
    }

    pub(crate) fn columns_with_names(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.columns.iter().map(|c| (c.name.as_str(), &c.column))
    }

    /// Physical storage length shared by all columns (0 for a column-less
    /// frame).
    pub(crate) fn physical_len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.column.len())
    }

    /// Replace `name` in place or append it, preserving column order.
    pub(crate) fn with_column(&self, name: &str, column: Column) -> Frame {
        let mut out = self.clone();
        match out.by_name.get(name) {
            Some(&slot) => out.columns[slot].column = column,
            None => {
                out.by_name.insert(name.to_owned(), out.columns.len());
                out.columns.push(NamedColumn {
                    name: name.to_owned(),
                    column,
                });
            }
        }
        out
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Incremental frame construction: the ingestion-facing contract.
///
/// External readers supply, per column, a name, an element type and a value
/// sequence (with null markers); enum columns optionally carry a fixed
/// dictionary. Construction failures (cardinality, strict-mode unknown
/// values, unequal lengths) latch on the built frame instead of unwinding.
#[derive(Default)]
pub struct FrameBuilder {
    columns: Vec<(String, Result<Column, Error>)>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Self {
        self.columns.push((name.into(), Ok(column.into())));
        self
    }

    /// Enum column with an inferred (sorted distinct) dictionary.
    pub fn enumeration(mut self, name: impl Into<String>, values: &[Option<&str>]) -> Self {
        self.columns
            .push((name.into(), Column::enum_inferred(values)));
        self
    }

    /// Enum column bound to an explicit dictionary; strict about unknown
    /// values, and the dictionary order defines comparison order.
    pub fn enumeration_with(
        mut self,
        name: impl Into<String>,
        dict_values: &[&str],
        values: &[Option<&str>],
    ) -> Self {
        self.columns
            .push((name.into(), Column::enum_with_values(dict_values, values)));
        self
    }

    pub fn build(self) -> Frame {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, column) in self.columns {
            match column {
                Ok(column) => columns.push((name, column)),
                Err(err) => return Frame::from_error(err),
            }
        }
        Frame::new(columns)
    }
}
