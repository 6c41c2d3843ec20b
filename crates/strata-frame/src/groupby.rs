#![forbid(unsafe_code)]

use crate::column::{Column, IntColumn, FloatColumn, StrColumn};
use crate::error::Error;
use crate::frame::Frame;
use crate::index::RowIndex;
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

/// One group-key component with structural equality and hashing: floats
/// canonicalize NaN and signed zero (`NaN == NaN` as a key), enum values
/// compare by dictionary code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyPart {
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Str(Option<Arc<str>>),
    Code(u8),
}

type GroupKey = SmallVec<[KeyPart; 4]>;

fn key_part(column: &Column, pos: u32) -> KeyPart {
    match column {
        Column::Int(c) => KeyPart::Int(c.value_at(pos)),
        Column::Float(c) => KeyPart::Float(OrderedFloat(c.value_at(pos))),
        Column::Bool(c) => KeyPart::Bool(c.value_at(pos)),
        Column::Str(c) => KeyPart::Str(c.arc_at(pos)),
        Column::Enum(c) => KeyPart::Code(c.code_at(pos)),
    }
}

/// Partition rows in current logical order by key-tuple equality. Groups are
/// emitted in first-occurrence order; each group holds the physical row
/// positions of its members, in logical order.
fn partition(frame: &Frame, key_columns: &[&Column]) -> Vec<Vec<u32>> {
    let mut slots: AHashMap<GroupKey, usize> = AHashMap::new();
    let mut groups: Vec<Vec<u32>> = Vec::new();

    for pos in frame.index().iter() {
        let key: GroupKey = key_columns.iter().map(|c| key_part(c, pos)).collect();
        match slots.entry(key) {
            Entry::Occupied(slot) => groups[*slot.get()].push(pos),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(vec![pos]);
            }
        }
    }
    groups
}

/// A reduction paired with its source column.
#[derive(Clone, Debug)]
pub struct Aggregation {
    pub(crate) function: AggFn,
    pub(crate) column: String,
}

impl Aggregation {
    /// A named built-in reduction: `"sum"`, `"min"` or `"max"` over int and
    /// float columns. Unknown names fail the aggregation.
    pub fn new(function: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            function: AggFn::Named(function.into()),
            column: column.into(),
        }
    }

    /// Join the non-null strings of each group with `separator` (string and
    /// enum columns); the result is a plain string column.
    pub fn str_join(separator: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            function: AggFn::StrJoin(separator.into()),
            column: column.into(),
        }
    }

    /// Custom reduction over an int column.
    pub fn with_int_fn(
        f: impl Fn(&[i64]) -> Result<i64, String> + Send + Sync + 'static,
        column: impl Into<String>,
    ) -> Self {
        Self {
            function: AggFn::IntFn(Arc::new(f)),
            column: column.into(),
        }
    }

    /// Custom reduction over a float column.
    pub fn with_float_fn(
        f: impl Fn(&[f64]) -> Result<f64, String> + Send + Sync + 'static,
        column: impl Into<String>,
    ) -> Self {
        Self {
            function: AggFn::FloatFn(Arc::new(f)),
            column: column.into(),
        }
    }

    /// Custom reduction over a string or enum column; produces a string
    /// column.
    pub fn with_str_fn(
        f: impl Fn(&[Option<&str>]) -> Result<Option<String>, String> + Send + Sync + 'static,
        column: impl Into<String>,
    ) -> Self {
        Self {
            function: AggFn::StrFn(Arc::new(f)),
            column: column.into(),
        }
    }
}

#[derive(Clone)]
pub(crate) enum AggFn {
    Named(String),
    StrJoin(String),
    IntFn(Arc<dyn Fn(&[i64]) -> Result<i64, String> + Send + Sync>),
    FloatFn(Arc<dyn Fn(&[f64]) -> Result<f64, String> + Send + Sync>),
    StrFn(Arc<dyn Fn(&[Option<&str>]) -> Result<Option<String>, String> + Send + Sync>),
}

impl fmt::Debug for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFn::Named(name) => f.debug_tuple("Named").field(name).finish(),
            AggFn::StrJoin(sep) => f.debug_tuple("StrJoin").field(sep).finish(),
            AggFn::IntFn(_) => f.write_str("IntFn(..)"),
            AggFn::FloatFn(_) => f.write_str("FloatFn(..)"),
            AggFn::StrFn(_) => f.write_str("StrFn(..)"),
        }
    }
}

/// The partition produced by [`Frame::group_by`], awaiting reductions.
#[derive(Debug)]
pub struct Grouped {
    frame: Frame,
    keys: Vec<String>,
    groups: Vec<Vec<u32>>,
}

impl Frame {
    /// Partition rows by the tuple of values in `keys`.
    ///
    /// A new group is created the first time a key tuple is seen and groups
    /// keep that first-occurrence order (stable, not sorted). Key equality is
    /// structural: enum values compare by dictionary code, NaN keys collapse
    /// into one group.
    pub fn group_by(&self, keys: &[&str]) -> Grouped {
        if let Some(err) = self.error() {
            return Grouped {
                frame: Frame::from_error(err.clone()),
                keys: Vec::new(),
                groups: Vec::new(),
            };
        }

        let mut key_columns: Vec<&Column> = Vec::with_capacity(keys.len());
        for &name in keys {
            match self.column_ref(name) {
                Ok(column) => key_columns.push(column),
                Err(err) => {
                    return Grouped {
                        frame: Frame::from_error(err),
                        keys: Vec::new(),
                        groups: Vec::new(),
                    }
                }
            }
        }

        let groups = partition(self, &key_columns);
        Grouped {
            frame: self.clone(),
            keys: keys.iter().map(|&k| k.to_owned()).collect(),
            groups,
        }
    }

    /// Keep the first row of every distinct row-value tuple, over all
    /// columns. Index-only: the result shares column storage. Idempotent.
    pub fn distinct(&self) -> Frame {
        self.chain(|frame| {
            let all_columns: Vec<&Column> =
                frame.columns_with_names().map(|(_, c)| c).collect();
            let groups = partition(frame, &all_columns);
            let firsts = groups.iter().map(|g| g[0]).collect();
            Ok(frame.with_index(RowIndex::from_positions(firsts)))
        })
    }
}

impl Grouped {
    /// Reduce every group to one row.
    ///
    /// The result has one row per group: the group-key columns carry the
    /// original values (materialized on the first-occurrence rows), followed
    /// by one new column per aggregation. A 0-row input yields a 0-row frame
    /// with the same column set and types.
    pub fn aggregate(&self, aggregations: &[Aggregation]) -> Frame {
        self.frame.chain(|frame| {
            let firsts = RowIndex::from_positions(self.groups.iter().map(|g| g[0]).collect());

            let mut columns: Vec<(String, Column)> = Vec::with_capacity(
                self.keys.len() + aggregations.len(),
            );
            for name in &self.keys {
                let column = frame.column_ref(name)?;
                columns.push((name.clone(), column.subset(&firsts)));
            }
            for agg in aggregations {
                let source = frame.column_ref(&agg.column)?;
                let reduced =
                    aggregate_column(&agg.column, source, &self.groups, &agg.function)?;
                columns.push((agg.column.clone(), reduced));
            }

            Ok(Frame::new(columns))
        })
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

fn aggregate_column(
    name: &str,
    column: &Column,
    groups: &[Vec<u32>],
    function: &AggFn,
) -> Result<Column, Error> {
    match (function, column) {
        (AggFn::Named(fn_name), Column::Int(c)) => {
            let reduce = int_builtin(name, fn_name)?;
            let mut out = Vec::with_capacity(groups.len());
            for group in groups {
                let values: Vec<i64> = group.iter().map(|&pos| c.value_at(pos)).collect();
                out.push(reduce(&values));
            }
            Ok(Column::Int(IntColumn::new(out)))
        }
        (AggFn::Named(fn_name), Column::Float(c)) => {
            let reduce = float_builtin(name, fn_name)?;
            let mut out = Vec::with_capacity(groups.len());
            for group in groups {
                let values: Vec<f64> = group.iter().map(|&pos| c.value_at(pos)).collect();
                out.push(reduce(&values));
            }
            Ok(Column::Float(FloatColumn::new(out)))
        }
        (AggFn::Named(_), other) => Err(Error::type_mismatch(
            "aggregation source",
            "int or float column",
            other.column_type().to_string(),
        )),
        (AggFn::StrJoin(separator), column) => {
            let values_at = str_values_fn(name, column)?;
            let mut out: Vec<Option<Arc<str>>> = Vec::with_capacity(groups.len());
            for group in groups {
                let mut joined = String::new();
                let mut first = true;
                for &pos in group {
                    if let Some(v) = values_at(pos) {
                        if !first {
                            joined.push_str(separator);
                        }
                        joined.push_str(v);
                        first = false;
                    }
                }
                out.push(Some(Arc::from(joined.as_str())));
            }
            Ok(Column::Str(StrColumn::new(out)))
        }
        (AggFn::IntFn(f), Column::Int(c)) => {
            let mut out = Vec::with_capacity(groups.len());
            for group in groups {
                let values: Vec<i64> = group.iter().map(|&pos| c.value_at(pos)).collect();
                out.push(f(&values).map_err(|reason| Error::AggregationFailure {
                    column: name.to_owned(),
                    reason,
                })?);
            }
            Ok(Column::Int(IntColumn::new(out)))
        }
        (AggFn::FloatFn(f), Column::Float(c)) => {
            let mut out = Vec::with_capacity(groups.len());
            for group in groups {
                let values: Vec<f64> = group.iter().map(|&pos| c.value_at(pos)).collect();
                out.push(f(&values).map_err(|reason| Error::AggregationFailure {
                    column: name.to_owned(),
                    reason,
                })?);
            }
            Ok(Column::Float(FloatColumn::new(out)))
        }
        (AggFn::StrFn(f), column) => {
            let values_at = str_values_fn(name, column)?;
            let mut out: Vec<Option<Arc<str>>> = Vec::with_capacity(groups.len());
            for group in groups {
                let values: Vec<Option<&str>> =
                    group.iter().map(|&pos| values_at(pos)).collect();
                let reduced = f(&values).map_err(|reason| Error::AggregationFailure {
                    column: name.to_owned(),
                    reason,
                })?;
                out.push(reduced.map(|s| Arc::from(s.as_str())));
            }
            Ok(Column::Str(StrColumn::new(out)))
        }
        (AggFn::IntFn(_), other) => Err(Error::type_mismatch(
            "aggregation source",
            "int column",
            other.column_type().to_string(),
        )),
        (AggFn::FloatFn(_), other) => Err(Error::type_mismatch(
            "aggregation source",
            "float column",
            other.column_type().to_string(),
        )),
    }
}

fn int_builtin(column: &str, name: &str) -> Result<fn(&[i64]) -> i64, Error> {
    match name {
        "sum" => Ok(|values| values.iter().fold(0i64, |acc, v| acc.wrapping_add(*v))),
        "min" => Ok(|values| values.iter().copied().min().unwrap_or(0)),
        "max" => Ok(|values| values.iter().copied().max().unwrap_or(0)),
        _ => Err(Error::AggregationFailure {
            column: column.to_owned(),
            reason: format!("unknown aggregation function: {name}"),
        }),
    }
}

fn float_builtin(column: &str, name: &str) -> Result<fn(&[f64]) -> f64, Error> {
    match name {
        "sum" => Ok(|values| values.iter().sum()),
        // `f64::min`/`max` prefer the non-NaN operand.
        "min" => Ok(|values| values.iter().copied().fold(f64::NAN, f64::min)),
        "max" => Ok(|values| values.iter().copied().fold(f64::NAN, f64::max)),
        _ => Err(Error::AggregationFailure {
            column: column.to_owned(),
            reason: format!("unknown aggregation function: {name}"),
        }),
    }
}

fn str_values_fn<'a>(
    name: &str,
    column: &'a Column,
) -> Result<Box<dyn Fn(u32) -> Option<&'a str> + 'a>, Error> {
    match column {
        Column::Str(c) => Ok(Box::new(move |pos| c.value_at(pos))),
        Column::Enum(c) => Ok(Box::new(move |pos| c.value_at(pos))),
        other => Err(Error::type_mismatch(
            "aggregation source",
            "string or enum column",
            other.column_type().to_string(),
        )),
    }
}
