#![forbid(unsafe_code)]

use crate::error::Error;
use crate::frame::Frame;
use crate::mask::Mask;
use crate::value::{ColumnType, Scalar};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Built-in comparator names.
///
/// `Lt..Neq` apply to every ordered variant; `In` takes a candidate list;
/// `Like`/`Ilike` apply to string and enum columns only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    In,
    Like,
    Ilike,
}

impl CmpOp {
    pub(crate) fn parse(name: &str, column_type: ColumnType) -> Result<CmpOp, Error> {
        match name {
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Lte),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Gte),
            "=" | "==" => Ok(CmpOp::Eq),
            "!=" => Ok(CmpOp::Neq),
            "in" => Ok(CmpOp::In),
            "like" => Ok(CmpOp::Like),
            "ilike" => Ok(CmpOp::Ilike),
            _ => Err(Error::InvalidComparator {
                name: name.to_owned(),
                column_type,
            }),
        }
    }

    /// Evaluate a relational operator against a total ordering.
    pub(crate) fn eval_ord(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Lte => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Gte => ord != Ordering::Less,
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Neq => ord != Ordering::Equal,
            CmpOp::In | CmpOp::Like | CmpOp::Ilike => false,
        }
    }

    /// Evaluate a relational operator under IEEE partial ordering: an
    /// unordered pair (NaN on either side) matches only `!=`.
    pub(crate) fn eval_partial(self, ord: Option<Ordering>) -> bool {
        match ord {
            Some(ord) => self.eval_ord(ord),
            None => self == CmpOp::Neq,
        }
    }
}

/// Comparator for one filter clause: a named built-in, or a user-supplied
/// two-argument predicate typed to the column's element domain (the custom
/// variants are valid for column-vs-column comparison only).
#[derive(Clone)]
pub enum Comparator {
    Named(String),
    IntFn(Arc<dyn Fn(i64, i64) -> bool + Send + Sync>),
    FloatFn(Arc<dyn Fn(f64, f64) -> bool + Send + Sync>),
    BoolFn(Arc<dyn Fn(bool, bool) -> bool + Send + Sync>),
    StrFn(Arc<dyn Fn(Option<&str>, Option<&str>) -> bool + Send + Sync>),
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Comparator::IntFn(_) => f.write_str("IntFn(..)"),
            Comparator::FloatFn(_) => f.write_str("FloatFn(..)"),
            Comparator::BoolFn(_) => f.write_str("BoolFn(..)"),
            Comparator::StrFn(_) => f.write_str("StrFn(..)"),
        }
    }
}

impl From<&str> for Comparator {
    fn from(name: &str) -> Self {
        Comparator::Named(name.to_owned())
    }
}

/// Right-hand side of a filter clause.
#[derive(Clone, Debug)]
pub enum FilterArg {
    Scalar(Scalar),
    List(Vec<Scalar>),
    /// Compare against another column of the same frame, row by row.
    Column(String),
}

/// One filter clause: `{column, comparator, arg, invert}`.
///
/// Multiple clauses passed to a single [`Frame::filter`] call are combined
/// with logical OR; conjunction is expressed by chaining `filter` calls.
/// `invert` complements this clause's own contribution before the OR.
#[derive(Clone, Debug)]
pub struct Filter {
    pub column: String,
    pub comparator: Comparator,
    pub arg: FilterArg,
    pub invert: bool,
}

impl Filter {
    /// Compare a column against a constant: `Filter::new("COL1", ">", 3)`.
    pub fn new(
        column: impl Into<String>,
        comparator: impl Into<Comparator>,
        arg: impl Into<Scalar>,
    ) -> Self {
        Self {
            column: column.into(),
            comparator: comparator.into(),
            arg: FilterArg::Scalar(arg.into()),
            invert: false,
        }
    }

    /// Membership against a candidate list, coerced to the column type.
    pub fn is_in<I, S>(column: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        Self {
            column: column.into(),
            comparator: Comparator::Named("in".to_owned()),
            arg: FilterArg::List(candidates.into_iter().map(Into::into).collect()),
            invert: false,
        }
    }

    /// Compare a column against another column, row by row.
    pub fn vs_column(
        column: impl Into<String>,
        comparator: impl Into<Comparator>,
        other: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            comparator: comparator.into(),
            arg: FilterArg::Column(other.into()),
            invert: false,
        }
    }

    /// Complement this clause's contribution to the filter result.
    pub fn invert(mut self) -> Self {
        self.invert = !self.invert;
        self
    }
}

/// Compiled `like`/`ilike` matcher.
///
/// A pattern containing `%` is SQL-style: literal segments are regex-escaped
/// and `%` becomes `.*`. A pattern without `%` is taken as a raw regular
/// expression. Matching is always full-string; `ilike` adds `(?i)` which
/// gives Unicode-aware case folding.
pub(crate) struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<Self, Error> {
        let body = if pattern.contains('%') {
            pattern
                .split('%')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*")
        } else {
            pattern.to_owned()
        };
        let flags = if case_insensitive { "(?i)" } else { "" };
        let regex = Regex::new(&format!("{flags}^(?:{body})$")).map_err(|e| {
            Error::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { regex })
    }

    pub(crate) fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl Frame {
    /// Keep the rows matching any of `clauses` (logical OR across clauses).
    ///
    /// The result shares column storage with `self` and carries a new index:
    /// the subsequence of row positions where the combined mask is true, in
    /// the current logical order. Conjunctions are chained `filter` calls.
    pub fn filter(&self, clauses: &[Filter]) -> Frame {
        self.chain(|frame| {
            let mut mask = Mask::with_len_all_false(frame.len());
            for clause in clauses {
                frame.apply_clause(clause, &mut mask)?;
            }
            Ok(frame.with_index(frame.index().retain_by_mask(&mask)))
        })
    }

    pub(crate) fn apply_clause(&self, clause: &Filter, mask: &mut Mask) -> Result<(), Error> {
        let column = self.column_ref(&clause.column)?;
        let operand = match &clause.arg {
            FilterArg::Scalar(s) => Operand::Scalar(s),
            FilterArg::List(l) => Operand::List(l),
            FilterArg::Column(name) => Operand::Column(self.column_ref(name)?),
        };

        if clause.invert {
            let mut scratch = Mask::with_len_all_false(mask.len());
            column.filter(self.index(), &clause.comparator, operand, &mut scratch)?;
            scratch.not_inplace();
            mask.or_inplace(&scratch);
        } else {
            column.filter(self.index(), &clause.comparator, operand, mask)?;
        }
        Ok(())
    }
}

/// A clause operand with column references resolved.
#[derive(Clone, Copy)]
pub(crate) enum Operand<'a> {
    Scalar(&'a Scalar),
    List(&'a [Scalar]),
    Column(&'a crate::column::Column),
}
