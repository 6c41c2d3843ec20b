#![forbid(unsafe_code)]

mod boolean;
mod enumeration;
mod float;
mod int;
mod string;

pub use boolean::BoolColumn;
pub use enumeration::{EnumColumn, EnumDict};
pub use float::FloatColumn;
pub use int::IntColumn;
pub use string::StrColumn;

pub(crate) use enumeration::NULL_CODE;

use string::null_first_cmp;

use crate::error::Error;
use crate::filter::{CmpOp, Comparator, Operand, PatternMatcher};
use crate::index::RowIndex;
use crate::mask::Mask;
use crate::value::{ColumnType, Scalar};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

/// One typed, immutable sequence of values.
///
/// The five variants share a capability set (filter, subset, equals, compare,
/// aggregate, apply, render, size) dispatched by exhaustive matching; storage
/// is `Arc`-shared, so cloning a column never copies cells and `subset` is
/// the only operation that materializes values.
#[derive(Clone, Debug)]
pub enum Column {
    Int(IntColumn),
    Float(FloatColumn),
    Bool(BoolColumn),
    Str(StrColumn),
    Enum(EnumColumn),
}

impl Column {
    /// Build with an inferred enum dictionary (sorted distinct values).
    pub fn enum_inferred(values: &[Option<&str>]) -> Result<Column, Error> {
        EnumColumn::infer(values).map(Column::Enum)
    }

    /// Build against an explicit dictionary; strict about unknown values.
    pub fn enum_with_values(
        dict_values: &[&str],
        values: &[Option<&str>],
    ) -> Result<Column, Error> {
        EnumColumn::with_values(dict_values, values).map(Column::Enum)
    }

    /// Physical storage length.
    pub fn len(&self) -> usize {
        match self {
            Column::Int(c) => c.len(),
            Column::Float(c) => c.len(),
            Column::Bool(c) => c.len(),
            Column::Str(c) => c.len(),
            Column::Enum(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int(_) => ColumnType::Int,
            Column::Float(_) => ColumnType::Float,
            Column::Bool(_) => ColumnType::Bool,
            Column::Str(_) => ColumnType::Str,
            Column::Enum(_) => ColumnType::Enum,
        }
    }

    /// Declared byte footprint of the backing storage (size-accounting
    /// contract; informational only).
    pub fn byte_size(&self) -> usize {
        match self {
            Column::Int(c) => c.byte_size(),
            Column::Float(c) => c.byte_size(),
            Column::Bool(c) => c.byte_size(),
            Column::Str(c) => c.byte_size(),
            Column::Enum(c) => c.byte_size(),
        }
    }

    /// Render the value at a physical position (rendering contract). Nulls
    /// render as `na_rep`.
    pub fn string_at<'a>(&'a self, pos: u32, na_rep: &'a str) -> Cow<'a, str> {
        match self {
            Column::Int(c) => Cow::Owned(c.value_at(pos).to_string()),
            Column::Float(c) => Cow::Owned(c.value_at(pos).to_string()),
            Column::Bool(c) => Cow::Borrowed(if c.value_at(pos) { "true" } else { "false" }),
            Column::Str(c) => match c.value_at(pos) {
                Some(v) => Cow::Borrowed(v),
                None => Cow::Borrowed(na_rep),
            },
            Column::Enum(c) => match c.value_at(pos) {
                Some(v) => Cow::Borrowed(v),
                None => Cow::Borrowed(na_rep),
            },
        }
    }

    pub(crate) fn scalar_at(&self, pos: u32) -> Scalar {
        match self {
            Column::Int(c) => Scalar::Int(c.value_at(pos)),
            Column::Float(c) => Scalar::Float(c.value_at(pos)),
            Column::Bool(c) => Scalar::Bool(c.value_at(pos)),
            Column::Str(c) => Scalar::Str(c.arc_at(pos)),
            Column::Enum(c) => Scalar::Str(c.value_at(pos).map(Arc::from)),
        }
    }

    /// Materialize the elements at `index`, in that order: the one copying
    /// operation, used when the result's physical order must become canonical
    /// (group-by keys).
    pub(crate) fn subset(&self, index: &RowIndex) -> Column {
        match self {
            Column::Int(c) => Column::Int(c.subset(index)),
            Column::Float(c) => Column::Float(c.subset(index)),
            Column::Bool(c) => Column::Bool(c.subset(index)),
            Column::Str(c) => Column::Str(c.subset(index)),
            Column::Enum(c) => Column::Enum(c.subset(index)),
        }
    }

    /// Element-wise structural equality of two logical sequences.
    ///
    /// Variant-aware: NaN equals NaN, and enum columns compare decoded values
    /// so differing dictionaries with equal content are equal. Different
    /// variants are never equal. Callers guarantee equal index lengths.
    pub(crate) fn equals(&self, index: &RowIndex, other: &Column, other_index: &RowIndex) -> bool {
        match (self, other) {
            (Column::Int(a), Column::Int(b)) => a.equals(index, b, other_index),
            (Column::Float(a), Column::Float(b)) => a.equals(index, b, other_index),
            (Column::Bool(a), Column::Bool(b)) => a.equals(index, b, other_index),
            (Column::Str(a), Column::Str(b)) => a.equals(index, b, other_index),
            (Column::Enum(a), Column::Enum(b)) => a.equals(index, b, other_index),
            _ => false,
        }
    }

    /// Compare two physical positions under the variant's sort ordering:
    /// nulls and NaNs first, enum values by dictionary order. The sort engine
    /// applies `reverse` by flipping the result, which moves nulls/NaNs to
    /// the other end together with everything else.
    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        match self {
            Column::Int(c) => c.compare(i, j),
            Column::Float(c) => c.compare(i, j),
            Column::Bool(c) => c.compare(i, j),
            Column::Str(c) => c.compare(i, j),
            Column::Enum(c) => c.compare(i, j),
        }
    }

    /// Evaluate one comparison against every indexed element, OR-ing matches
    /// into `mask`. Positions already true are left untouched, which is what
    /// lets the filter engine accumulate clauses.
    pub(crate) fn filter(
        &self,
        index: &RowIndex,
        comparator: &Comparator,
        operand: Operand<'_>,
        mask: &mut Mask,
    ) -> Result<(), Error> {
        match self {
            Column::Int(col) => filter_int(col, index, comparator, operand, mask),
            Column::Float(col) => filter_float(col, index, comparator, operand, mask),
            Column::Bool(col) => filter_bool(col, index, comparator, operand, mask),
            Column::Str(col) => filter_str(col, index, comparator, operand, mask),
            Column::Enum(col) => filter_enum(col, index, comparator, operand, mask),
        }
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::Int(IntColumn::new(values))
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float(FloatColumn::new(values))
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Column::Bool(BoolColumn::new(values))
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Str(StrColumn::new(
            values.into_iter().map(|v| Some(Arc::from(v))).collect(),
        ))
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Str(StrColumn::new(
            values
                .into_iter()
                .map(|v| Some(Arc::from(v.as_str())))
                .collect(),
        ))
    }
}

impl From<Vec<Option<&str>>> for Column {
    fn from(values: Vec<Option<&str>>) -> Self {
        Column::Str(StrColumn::from_options(&values))
    }
}

fn fill(index: &RowIndex, mask: &mut Mask, mut pred: impl FnMut(u32) -> bool) {
    for (i, pos) in index.iter().enumerate() {
        if !mask.get(i) && pred(pos) {
            mask.set(i, true);
        }
    }
}

fn operand_kind(operand: &Operand<'_>) -> String {
    match operand {
        Operand::Scalar(s) => s.type_name().to_owned(),
        Operand::List(_) => "candidate list".to_owned(),
        Operand::Column(c) => format!("{} column", c.column_type()),
    }
}

fn filter_int(
    col: &IntColumn,
    index: &RowIndex,
    comparator: &Comparator,
    operand: Operand<'_>,
    mask: &mut Mask,
) -> Result<(), Error> {
    match comparator {
        Comparator::Named(name) => {
            let op = CmpOp::parse(name, ColumnType::Int)?;
            match (op, operand) {
                (CmpOp::Like | CmpOp::Ilike, _) => Err(Error::InvalidComparator {
                    name: name.clone(),
                    column_type: ColumnType::Int,
                }),
                (CmpOp::In, Operand::List(list)) => {
                    let candidates = coerce_int_list(list)?;
                    fill(index, mask, |pos| candidates.contains(&col.value_at(pos)));
                    Ok(())
                }
                (CmpOp::In, other) => Err(Error::type_mismatch(
                    "filter `in` operand",
                    "candidate list",
                    operand_kind(&other),
                )),
                (op, Operand::Scalar(s)) => {
                    let rhs = s
                        .as_int()
                        .ok_or_else(|| Error::type_mismatch("filter operand", "int", s.type_name()))?;
                    fill(index, mask, |pos| op.eval_ord(col.value_at(pos).cmp(&rhs)));
                    Ok(())
                }
                (op, Operand::Column(Column::Int(other))) => {
                    fill(index, mask, |pos| {
                        op.eval_ord(col.value_at(pos).cmp(&other.value_at(pos)))
                    });
                    Ok(())
                }
                (_, other) => Err(Error::type_mismatch(
                    "filter operand",
                    "int column",
                    operand_kind(&other),
                )),
            }
        }
        Comparator::IntFn(f) => match operand {
            Operand::Column(Column::Int(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            other => Err(Error::type_mismatch(
                "custom int comparator operand",
                "int column",
                operand_kind(&other),
            )),
        },
        _ => Err(Error::type_mismatch(
            "filter comparator",
            "int comparator",
            "comparator for another column type",
        )),
    }
}

fn filter_float(
    col: &FloatColumn,
    index: &RowIndex,
    comparator: &Comparator,
    operand: Operand<'_>,
    mask: &mut Mask,
) -> Result<(), Error> {
    match comparator {
        Comparator::Named(name) => {
            let op = CmpOp::parse(name, ColumnType::Float)?;
            match (op, operand) {
                (CmpOp::Like | CmpOp::Ilike, _) => Err(Error::InvalidComparator {
                    name: name.clone(),
                    column_type: ColumnType::Float,
                }),
                (CmpOp::In, Operand::List(list)) => {
                    let candidates = coerce_float_list(list)?;
                    // IEEE membership: a NaN candidate never matches.
                    fill(index, mask, |pos| {
                        let v = col.value_at(pos);
                        candidates.iter().any(|c| *c == v)
                    });
                    Ok(())
                }
                (CmpOp::In, other) => Err(Error::type_mismatch(
                    "filter `in` operand",
                    "candidate list",
                    operand_kind(&other),
                )),
                (op, Operand::Scalar(s)) => {
                    let rhs = s.as_float().ok_or_else(|| {
                        Error::type_mismatch("filter operand", "float", s.type_name())
                    })?;
                    fill(index, mask, |pos| {
                        op.eval_partial(col.value_at(pos).partial_cmp(&rhs))
                    });
                    Ok(())
                }
                (op, Operand::Column(Column::Float(other))) => {
                    fill(index, mask, |pos| {
                        op.eval_partial(col.value_at(pos).partial_cmp(&other.value_at(pos)))
                    });
                    Ok(())
                }
                (_, other) => Err(Error::type_mismatch(
                    "filter operand",
                    "float column",
                    operand_kind(&other),
                )),
            }
        }
        Comparator::FloatFn(f) => match operand {
            Operand::Column(Column::Float(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            other => Err(Error::type_mismatch(
                "custom float comparator operand",
                "float column",
                operand_kind(&other),
            )),
        },
        _ => Err(Error::type_mismatch(
            "filter comparator",
            "float comparator",
            "comparator for another column type",
        )),
    }
}

fn filter_bool(
    col: &BoolColumn,
    index: &RowIndex,
    comparator: &Comparator,
    operand: Operand<'_>,
    mask: &mut Mask,
) -> Result<(), Error> {
    match comparator {
        Comparator::Named(name) => {
            let op = CmpOp::parse(name, ColumnType::Bool)?;
            match (op, operand) {
                (CmpOp::Eq | CmpOp::Neq, Operand::Scalar(s)) => {
                    let rhs = s.as_bool().ok_or_else(|| {
                        Error::type_mismatch("filter operand", "bool", s.type_name())
                    })?;
                    fill(index, mask, |pos| {
                        op.eval_ord(col.value_at(pos).cmp(&rhs))
                    });
                    Ok(())
                }
                (CmpOp::Eq | CmpOp::Neq, Operand::Column(Column::Bool(other))) => {
                    fill(index, mask, |pos| {
                        op.eval_ord(col.value_at(pos).cmp(&other.value_at(pos)))
                    });
                    Ok(())
                }
                (CmpOp::In, Operand::List(list)) => {
                    let candidates = coerce_bool_list(list)?;
                    fill(index, mask, |pos| candidates.contains(&col.value_at(pos)));
                    Ok(())
                }
                (CmpOp::Eq | CmpOp::Neq, other) => Err(Error::type_mismatch(
                    "filter operand",
                    "bool",
                    operand_kind(&other),
                )),
                // Booleans are not ordered: only equality, membership and
                // custom predicates apply.
                _ => Err(Error::InvalidComparator {
                    name: name.clone(),
                    column_type: ColumnType::Bool,
                }),
            }
        }
        Comparator::BoolFn(f) => match operand {
            Operand::Column(Column::Bool(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            other => Err(Error::type_mismatch(
                "custom bool comparator operand",
                "bool column",
                operand_kind(&other),
            )),
        },
        _ => Err(Error::type_mismatch(
            "filter comparator",
            "bool comparator",
            "comparator for another column type",
        )),
    }
}

fn filter_str(
    col: &StrColumn,
    index: &RowIndex,
    comparator: &Comparator,
    operand: Operand<'_>,
    mask: &mut Mask,
) -> Result<(), Error> {
    match comparator {
        Comparator::Named(name) => {
            let op = CmpOp::parse(name, ColumnType::Str)?;
            match (op, operand) {
                (CmpOp::Like | CmpOp::Ilike, Operand::Scalar(s)) => {
                    let pattern = require_pattern(s)?;
                    let matcher = PatternMatcher::compile(pattern, op == CmpOp::Ilike)?;
                    // Nulls never match a pattern.
                    fill(index, mask, |pos| {
                        col.value_at(pos).is_some_and(|v| matcher.matches(v))
                    });
                    Ok(())
                }
                (CmpOp::Like | CmpOp::Ilike, other) => Err(Error::type_mismatch(
                    "pattern operand",
                    "string",
                    operand_kind(&other),
                )),
                (CmpOp::In, Operand::List(list)) => {
                    let candidates = coerce_str_list(list)?;
                    // Nulls never match a membership test.
                    fill(index, mask, |pos| {
                        col.value_at(pos)
                            .is_some_and(|v| candidates.iter().any(|c| c.as_ref() == v))
                    });
                    Ok(())
                }
                (CmpOp::In, other) => Err(Error::type_mismatch(
                    "filter `in` operand",
                    "candidate list",
                    operand_kind(&other),
                )),
                (op, Operand::Scalar(s)) => {
                    let rhs = s.as_str().ok_or_else(|| {
                        Error::type_mismatch("filter operand", "string", s.type_name())
                    })?;
                    // Null orders before every value, so e.g. `< "b"`
                    // retains null rows.
                    fill(index, mask, |pos| {
                        op.eval_ord(null_first_cmp(col.value_at(pos), rhs))
                    });
                    Ok(())
                }
                (op, Operand::Column(Column::Str(other))) => {
                    fill(index, mask, |pos| {
                        op.eval_ord(null_first_cmp(col.value_at(pos), other.value_at(pos)))
                    });
                    Ok(())
                }
                (_, other) => Err(Error::type_mismatch(
                    "filter operand",
                    "string column",
                    operand_kind(&other),
                )),
            }
        }
        Comparator::StrFn(f) => match operand {
            Operand::Column(Column::Str(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            Operand::Column(Column::Enum(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            other => Err(Error::type_mismatch(
                "custom string comparator operand",
                "string or enum column",
                operand_kind(&other),
            )),
        },
        _ => Err(Error::type_mismatch(
            "filter comparator",
            "string comparator",
            "comparator for another column type",
        )),
    }
}

fn filter_enum(
    col: &EnumColumn,
    index: &RowIndex,
    comparator: &Comparator,
    operand: Operand<'_>,
    mask: &mut Mask,
) -> Result<(), Error> {
    match comparator {
        Comparator::Named(name) => {
            let op = CmpOp::parse(name, ColumnType::Enum)?;
            match (op, operand) {
                (CmpOp::Like | CmpOp::Ilike, Operand::Scalar(s)) => {
                    let pattern = require_pattern(s)?;
                    let matcher = PatternMatcher::compile(pattern, op == CmpOp::Ilike)?;
                    // Dictionary fast path: run the pattern once per distinct
                    // value, then scan codes.
                    let table = col.matching_codes(|v| matcher.matches(v));
                    fill(index, mask, |pos| table[col.code_at(pos) as usize]);
                    Ok(())
                }
                (CmpOp::Like | CmpOp::Ilike, other) => Err(Error::type_mismatch(
                    "pattern operand",
                    "string",
                    operand_kind(&other),
                )),
                (CmpOp::In, Operand::List(list)) => {
                    let candidates = coerce_str_list(list)?;
                    let table =
                        col.matching_codes(|v| candidates.iter().any(|c| c.as_ref() == v));
                    fill(index, mask, |pos| table[col.code_at(pos) as usize]);
                    Ok(())
                }
                (CmpOp::In, other) => Err(Error::type_mismatch(
                    "filter `in` operand",
                    "candidate list",
                    operand_kind(&other),
                )),
                (CmpOp::Eq | CmpOp::Neq, Operand::Scalar(s)) => {
                    let value = s.as_str().ok_or_else(|| {
                        Error::type_mismatch("filter operand", "string", s.type_name())
                    })?;
                    let code = match value {
                        None => Some(NULL_CODE),
                        Some(v) => col.dictionary().code_of(v),
                    };
                    match code {
                        Some(code) => {
                            fill(index, mask, |pos| {
                                op.eval_ord(col.code_at(pos).cmp(&code))
                            });
                        }
                        // A value outside the dictionary equals nothing.
                        None => {
                            if op == CmpOp::Neq {
                                fill(index, mask, |_| true);
                            }
                        }
                    }
                    Ok(())
                }
                (op, Operand::Scalar(s)) => {
                    let value = s.as_str().ok_or_else(|| {
                        Error::type_mismatch("filter operand", "string", s.type_name())
                    })?;
                    // Relational comparison needs a dictionary position for
                    // the operand; unseen values have none.
                    let rank = match value {
                        None => -1i16,
                        Some(v) => match col.dictionary().code_of(v) {
                            Some(code) => code as i16,
                            None => {
                                return Err(Error::UnknownEnumValue {
                                    value: v.to_owned(),
                                })
                            }
                        },
                    };
                    fill(index, mask, |pos| {
                        op.eval_ord(col.rank_at(pos).cmp(&rank))
                    });
                    Ok(())
                }
                (op, Operand::Column(Column::Enum(other))) => {
                    if col.dictionary() != other.dictionary() {
                        return Err(Error::type_mismatch(
                            "enum column comparison",
                            "enum columns sharing one dictionary",
                            "columns with differing dictionaries",
                        ));
                    }
                    fill(index, mask, |pos| {
                        op.eval_ord(col.rank_at(pos).cmp(&other.rank_at(pos)))
                    });
                    Ok(())
                }
                (_, other) => Err(Error::type_mismatch(
                    "filter operand",
                    "enum column",
                    operand_kind(&other),
                )),
            }
        }
        Comparator::StrFn(f) => match operand {
            Operand::Column(Column::Enum(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            Operand::Column(Column::Str(other)) => {
                fill(index, mask, |pos| {
                    f(col.value_at(pos), other.value_at(pos))
                });
                Ok(())
            }
            other => Err(Error::type_mismatch(
                "custom string comparator operand",
                "string or enum column",
                operand_kind(&other),
            )),
        },
        _ => Err(Error::type_mismatch(
            "filter comparator",
            "string comparator",
            "comparator for another column type",
        )),
    }
}

fn require_pattern<'a>(s: &'a Scalar) -> Result<&'a str, Error> {
    match s {
        Scalar::Str(Some(p)) => Ok(p.as_ref()),
        other => Err(Error::type_mismatch(
            "pattern operand",
            "string",
            other.type_name(),
        )),
    }
}

fn coerce_int_list(list: &[Scalar]) -> Result<Vec<i64>, Error> {
    list.iter()
        .map(|s| {
            s.as_int()
                .ok_or_else(|| Error::type_mismatch("filter `in` candidate", "int", s.type_name()))
        })
        .collect()
}

fn coerce_float_list(list: &[Scalar]) -> Result<Vec<f64>, Error> {
    list.iter()
        .map(|s| {
            s.as_float().ok_or_else(|| {
                Error::type_mismatch("filter `in` candidate", "float", s.type_name())
            })
        })
        .collect()
}

fn coerce_bool_list(list: &[Scalar]) -> Result<Vec<bool>, Error> {
    list.iter()
        .map(|s| {
            s.as_bool()
                .ok_or_else(|| Error::type_mismatch("filter `in` candidate", "bool", s.type_name()))
        })
        .collect()
}

fn coerce_str_list(list: &[Scalar]) -> Result<Vec<Arc<str>>, Error> {
    let mut out = Vec::with_capacity(list.len());
    for s in list {
        match s {
            Scalar::Str(Some(v)) => out.push(v.clone()),
            // A null candidate matches nothing; drop it.
            Scalar::Str(None) => {}
            other => {
                return Err(Error::type_mismatch(
                    "filter `in` candidate",
                    "string",
                    other.type_name(),
                ))
            }
        }
    }
    Ok(out)
}
