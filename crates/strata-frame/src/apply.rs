#![forbid(unsafe_code)]

use crate::column::{BoolColumn, Column, EnumColumn, FloatColumn, IntColumn, StrColumn};
use crate::error::Error;
use crate::filter::Filter;
use crate::frame::Frame;
use crate::mask::Mask;
use std::fmt;
use std::sync::Arc;

type Fallible<I, O> = Arc<dyn Fn(I) -> Result<O, String> + Send + Sync>;
type Fallible2<I, O> = Arc<dyn Fn(I, I) -> Result<O, String> + Send + Sync>;

/// The function of one transformation instruction: a closed set of typed
/// variants plus named built-ins resolved against a fixed registry at call
/// time (`"to_upper"`, `"to_lower"`, `"abs"`).
///
/// Nullary variants broadcast one value per row and are how a column is
/// initialized from a scalar. String-consuming variants accept nullable and
/// dictionary-encoded string columns interchangeably; a custom string
/// function over an enum column produces a plain string column, while a
/// named built-in keeps it dictionary-encoded (the transform runs once per
/// distinct value).
#[derive(Clone)]
pub enum ApplyFn {
    Named(String),
    Int0(Arc<dyn Fn() -> i64 + Send + Sync>),
    Float0(Arc<dyn Fn() -> f64 + Send + Sync>),
    Bool0(Arc<dyn Fn() -> bool + Send + Sync>),
    Str0(Arc<dyn Fn() -> Option<String> + Send + Sync>),
    Int1(Fallible<i64, i64>),
    Float1(Fallible<f64, f64>),
    Bool1(Fallible<bool, bool>),
    Str1(Arc<dyn for<'a> Fn(Option<&'a str>) -> Result<Option<String>, String> + Send + Sync>),
    StrToBool(Arc<dyn for<'a> Fn(Option<&'a str>) -> Result<bool, String> + Send + Sync>),
    Int2(Fallible2<i64, i64>),
    Float2(Fallible2<f64, f64>),
    Bool2(Fallible2<bool, bool>),
    Str2(
        Arc<
            dyn for<'a> Fn(Option<&'a str>, Option<&'a str>) -> Result<Option<String>, String>
                + Send
                + Sync,
        >,
    ),
}

impl ApplyFn {
    pub fn named(name: impl Into<String>) -> Self {
        ApplyFn::Named(name.into())
    }

    /// Broadcast a constant integer.
    pub fn int_const(value: i64) -> Self {
        ApplyFn::Int0(Arc::new(move || value))
    }

    pub fn float_const(value: f64) -> Self {
        ApplyFn::Float0(Arc::new(move || value))
    }

    pub fn bool_const(value: bool) -> Self {
        ApplyFn::Bool0(Arc::new(move || value))
    }

    pub fn str_const(value: Option<&str>) -> Self {
        let value: Option<String> = value.map(str::to_owned);
        ApplyFn::Str0(Arc::new(move || value.clone()))
    }

    fn arity(&self) -> usize {
        match self {
            ApplyFn::Int0(_) | ApplyFn::Float0(_) | ApplyFn::Bool0(_) | ApplyFn::Str0(_) => 0,
            ApplyFn::Named(_)
            | ApplyFn::Int1(_)
            | ApplyFn::Float1(_)
            | ApplyFn::Bool1(_)
            | ApplyFn::Str1(_)
            | ApplyFn::StrToBool(_) => 1,
            ApplyFn::Int2(_) | ApplyFn::Float2(_) | ApplyFn::Bool2(_) | ApplyFn::Str2(_) => 2,
        }
    }
}

impl fmt::Debug for ApplyFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyFn::Named(name) => return f.debug_tuple("Named").field(name).finish(),
            ApplyFn::Int0(_) => "Int0(..)",
            ApplyFn::Float0(_) => "Float0(..)",
            ApplyFn::Bool0(_) => "Bool0(..)",
            ApplyFn::Str0(_) => "Str0(..)",
            ApplyFn::Int1(_) => "Int1(..)",
            ApplyFn::Float1(_) => "Float1(..)",
            ApplyFn::Bool1(_) => "Bool1(..)",
            ApplyFn::Str1(_) => "Str1(..)",
            ApplyFn::StrToBool(_) => "StrToBool(..)",
            ApplyFn::Int2(_) => "Int2(..)",
            ApplyFn::Float2(_) => "Float2(..)",
            ApplyFn::Bool2(_) => "Bool2(..)",
            ApplyFn::Str2(_) => "Str2(..)",
        };
        f.write_str(name)
    }
}

/// One transformation: apply `function` to `src1`(/`src2`) and write the
/// result into `dst`.
///
/// Assigning to an existing name replaces that column in place (same
/// position in column order, new storage); a new name appends at the end.
#[derive(Clone, Debug)]
pub struct Instruction {
    pub function: ApplyFn,
    pub dst: String,
    pub src1: Option<String>,
    pub src2: Option<String>,
}

impl Instruction {
    /// Arity-0: broadcast a constant or nullary function over every row.
    pub fn broadcast(function: ApplyFn, dst: impl Into<String>) -> Self {
        Self {
            function,
            dst: dst.into(),
            src1: None,
            src2: None,
        }
    }

    /// Arity-1: map one source column.
    pub fn unary(function: ApplyFn, dst: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            function,
            dst: dst.into(),
            src1: Some(src.into()),
            src2: None,
        }
    }

    /// Arity-2: combine two source columns row by row.
    pub fn binary(
        function: ApplyFn,
        dst: impl Into<String>,
        src1: impl Into<String>,
        src2: impl Into<String>,
    ) -> Self {
        Self {
            function,
            dst: dst.into(),
            src1: Some(src1.into()),
            src2: Some(src2.into()),
        }
    }
}

impl Frame {
    /// Apply `instructions` in order; later instructions see the columns
    /// written by earlier ones.
    pub fn assign(&self, instructions: &[Instruction]) -> Frame {
        self.chain(|frame| {
            let positions: Vec<u32> = frame.index().iter().collect();
            frame.run_assign(instructions, &positions)
        })
    }

    /// Apply `instructions` only to the rows matching `clauses` (combined
    /// with OR, exactly as in [`Frame::filter`], and evaluated once against
    /// this frame).
    ///
    /// Rows that do not match are written as the destination type's
    /// null/zero value, also when `dst` names an existing column: replacement
    /// rather than preservation keeps the result type-consistent across
    /// chained filtered transforms.
    pub fn filtered_assign(&self, clauses: &[Filter], instructions: &[Instruction]) -> Frame {
        self.chain(|frame| {
            let mut mask = Mask::with_len_all_false(frame.len());
            for clause in clauses {
                frame.apply_clause(clause, &mut mask)?;
            }
            let positions: Vec<u32> = mask.iter_ones().map(|i| frame.index().get(i)).collect();
            frame.run_assign(instructions, &positions)
        })
    }

    /// Duplicate `src` into `dst` (replacing `dst` if it exists). Zero-copy:
    /// both names share the same immutable storage afterwards.
    pub fn copy_column(&self, dst: &str, src: &str) -> Frame {
        self.chain(|frame| {
            let column = frame.column_ref(src)?.clone();
            Ok(frame.with_column(dst, column))
        })
    }

    fn run_assign(&self, instructions: &[Instruction], positions: &[u32]) -> Result<Frame, Error> {
        let mut current = self.clone();
        for instruction in instructions {
            let column = apply_instruction(&current, instruction, positions)?;
            current = current.with_column(&instruction.dst, column);
        }
        Ok(current)
    }
}

fn transform_failure(instruction: &Instruction, reason: impl Into<String>) -> Error {
    Error::TransformFailure {
        dst: instruction.dst.clone(),
        reason: reason.into(),
    }
}

/// Build the destination column for one instruction.
///
/// The result always spans the frame's physical storage length: values are
/// computed at `positions` (the current index, or its filtered subset) and
/// every other slot holds the destination type's null/zero value, so the
/// frame's shared index stays valid for the new column.
fn apply_instruction(
    frame: &Frame,
    instruction: &Instruction,
    positions: &[u32],
) -> Result<Column, Error> {
    let arity = instruction.function.arity();
    let supplied = instruction.src1.iter().count() + instruction.src2.iter().count();
    if arity != supplied {
        return Err(transform_failure(
            instruction,
            format!("function takes {arity} argument(s) but {supplied} source column(s) given"),
        ));
    }

    let physical_len = frame.physical_len();
    match arity {
        0 => Ok(apply_nullary(
            &instruction.function,
            positions,
            physical_len,
        )),
        1 => {
            let src = frame.column_ref(instruction.src1.as_deref().unwrap_or_default())?;
            apply_unary(instruction, src, positions, physical_len)
        }
        _ => {
            let src1 = frame.column_ref(instruction.src1.as_deref().unwrap_or_default())?;
            let src2 = frame.column_ref(instruction.src2.as_deref().unwrap_or_default())?;
            apply_binary(instruction, src1, src2, positions, physical_len)
        }
    }
}

fn apply_nullary(function: &ApplyFn, positions: &[u32], physical_len: usize) -> Column {
    match function {
        ApplyFn::Int0(f) => {
            let mut out = vec![0i64; physical_len];
            for &pos in positions {
                out[pos as usize] = f();
            }
            Column::Int(IntColumn::new(out))
        }
        ApplyFn::Float0(f) => {
            let mut out = vec![0f64; physical_len];
            for &pos in positions {
                out[pos as usize] = f();
            }
            Column::Float(FloatColumn::new(out))
        }
        ApplyFn::Bool0(f) => {
            let mut out = vec![false; physical_len];
            for &pos in positions {
                out[pos as usize] = f();
            }
            Column::Bool(BoolColumn::new(out))
        }
        ApplyFn::Str0(f) => {
            let mut out: Vec<Option<Arc<str>>> = vec![None; physical_len];
            for &pos in positions {
                out[pos as usize] = f().map(|s| Arc::from(s.as_str()));
            }
            Column::Str(StrColumn::new(out))
        }
        // Callers have already ruled the other arities out.
        _ => unreachable!("apply_nullary called with non-nullary function"),
    }
}

fn apply_unary(
    instruction: &Instruction,
    src: &Column,
    positions: &[u32],
    physical_len: usize,
) -> Result<Column, Error> {
    match (&instruction.function, src) {
        (ApplyFn::Named(name), src) => apply_named(instruction, name, src, positions, physical_len),
        (ApplyFn::Int1(f), Column::Int(c)) => {
            let mut out = vec![0i64; physical_len];
            for &pos in positions {
                out[pos as usize] = f(c.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Int(IntColumn::new(out)))
        }
        (ApplyFn::Float1(f), Column::Float(c)) => {
            let mut out = vec![0f64; physical_len];
            for &pos in positions {
                out[pos as usize] = f(c.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Float(FloatColumn::new(out)))
        }
        (ApplyFn::Bool1(f), Column::Bool(c)) => {
            let mut out = vec![false; physical_len];
            for &pos in positions {
                out[pos as usize] = f(c.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Bool(BoolColumn::new(out)))
        }
        (ApplyFn::Str1(f), src @ (Column::Str(_) | Column::Enum(_))) => {
            let value_at = str_value_fn(instruction, src)?;
            let mut out: Vec<Option<Arc<str>>> = vec![None; physical_len];
            for &pos in positions {
                out[pos as usize] = f(value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?
                    .map(|s| Arc::from(s.as_str()));
            }
            Ok(Column::Str(StrColumn::new(out)))
        }
        (ApplyFn::StrToBool(f), src @ (Column::Str(_) | Column::Enum(_))) => {
            let value_at = str_value_fn(instruction, src)?;
            let mut out = vec![false; physical_len];
            for &pos in positions {
                out[pos as usize] = f(value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Bool(BoolColumn::new(out)))
        }
        (function, src) => Err(Error::type_mismatch(
            "transform function",
            format!("{function:?}-compatible column"),
            src.column_type().to_string(),
        )),
    }
}

/// Fixed registry of named built-in transforms.
fn apply_named(
    instruction: &Instruction,
    name: &str,
    src: &Column,
    positions: &[u32],
    physical_len: usize,
) -> Result<Column, Error> {
    match (name, src) {
        ("abs", Column::Int(c)) => {
            let mut out = vec![0i64; physical_len];
            for &pos in positions {
                out[pos as usize] = c.value_at(pos).wrapping_abs();
            }
            Ok(Column::Int(IntColumn::new(out)))
        }
        ("abs", Column::Float(c)) => {
            let mut out = vec![0f64; physical_len];
            for &pos in positions {
                out[pos as usize] = c.value_at(pos).abs();
            }
            Ok(Column::Float(FloatColumn::new(out)))
        }
        ("to_upper" | "to_lower", Column::Str(c)) => {
            let fold = case_fold(name);
            let mut out: Vec<Option<Arc<str>>> = vec![None; physical_len];
            for &pos in positions {
                out[pos as usize] = c.value_at(pos).map(|v| Arc::from(fold(v).as_str()));
            }
            Ok(Column::Str(StrColumn::new(out)))
        }
        ("to_upper" | "to_lower", Column::Enum(c)) => {
            // Dictionary fast path: transform each distinct value once and
            // stay dictionary-encoded.
            let fold = case_fold(name);
            let mapped = c.map_dictionary(fold);
            Ok(Column::Enum(remap_at_positions(&mapped, positions, physical_len)))
        }
        ("abs" | "to_upper" | "to_lower", src) => Err(Error::type_mismatch(
            "transform function",
            format!("column type supported by {name:?}"),
            src.column_type().to_string(),
        )),
        (_, _) => Err(transform_failure(
            instruction,
            format!("unknown function: {name}"),
        )),
    }
}

fn case_fold(name: &str) -> fn(&str) -> String {
    if name == "to_upper" {
        str::to_uppercase
    } else {
        str::to_lowercase
    }
}

/// New code array carrying `mapped`'s codes at `positions` and null
/// everywhere else, sharing `mapped`'s dictionary.
fn remap_at_positions(mapped: &EnumColumn, positions: &[u32], physical_len: usize) -> EnumColumn {
    let mut codes = vec![crate::column::NULL_CODE; physical_len];
    for &pos in positions {
        codes[pos as usize] = mapped.code_at(pos);
    }
    EnumColumn::from_parts(mapped.dict_arc(), codes)
}

fn apply_binary(
    instruction: &Instruction,
    src1: &Column,
    src2: &Column,
    positions: &[u32],
    physical_len: usize,
) -> Result<Column, Error> {
    match (&instruction.function, src1, src2) {
        (ApplyFn::Int2(f), Column::Int(a), Column::Int(b)) => {
            let mut out = vec![0i64; physical_len];
            for &pos in positions {
                out[pos as usize] = f(a.value_at(pos), b.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Int(IntColumn::new(out)))
        }
        (ApplyFn::Float2(f), Column::Float(a), Column::Float(b)) => {
            let mut out = vec![0f64; physical_len];
            for &pos in positions {
                out[pos as usize] = f(a.value_at(pos), b.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Float(FloatColumn::new(out)))
        }
        (ApplyFn::Bool2(f), Column::Bool(a), Column::Bool(b)) => {
            let mut out = vec![false; physical_len];
            for &pos in positions {
                out[pos as usize] = f(a.value_at(pos), b.value_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?;
            }
            Ok(Column::Bool(BoolColumn::new(out)))
        }
        (
            ApplyFn::Str2(f),
            a @ (Column::Str(_) | Column::Enum(_)),
            b @ (Column::Str(_) | Column::Enum(_)),
        ) => {
            let a_at = str_value_fn(instruction, a)?;
            let b_at = str_value_fn(instruction, b)?;
            let mut out: Vec<Option<Arc<str>>> = vec![None; physical_len];
            for &pos in positions {
                out[pos as usize] = f(a_at(pos), b_at(pos))
                    .map_err(|reason| transform_failure(instruction, reason))?
                    .map(|s| Arc::from(s.as_str()));
            }
            Ok(Column::Str(StrColumn::new(out)))
        }
        (function, src1, src2) => Err(Error::type_mismatch(
            "transform function",
            format!("{function:?}-compatible columns"),
            format!(
                "{} and {} columns",
                src1.column_type(),
                src2.column_type()
            ),
        )),
    }
}

fn str_value_fn<'a>(
    instruction: &Instruction,
    column: &'a Column,
) -> Result<Box<dyn Fn(u32) -> Option<&'a str> + 'a>, Error> {
    match column {
        Column::Str(c) => Ok(Box::new(move |pos| c.value_at(pos))),
        Column::Enum(c) => Ok(Box::new(move |pos| c.value_at(pos))),
        other => Err(Error::type_mismatch(
            "transform function",
            "string or enum column",
            format!("{} column ({})", other.column_type(), instruction.dst),
        )),
    }
}
