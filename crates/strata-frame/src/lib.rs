#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! `strata-frame` is an immutable, in-memory columnar table engine.
//!
//! A [`Frame`] maps column names to typed columns (int, float, bool,
//! nullable string, dictionary-encoded enum) of equal length, plus a logical
//! row index. Operations never mutate their input:
//! - [`Frame::filter`], [`Frame::sort`], [`Frame::slice`], [`Frame::select`]
//!   and [`Frame::distinct`] return new frames that share column storage and
//!   carry a new index (zero-copy on cell data);
//! - [`Frame::group_by`] + [`Grouped::aggregate`] reduce each group to one
//!   row with genuinely new storage;
//! - [`Frame::assign`] / [`Frame::filtered_assign`] map built-in or
//!   user-supplied functions over one or two columns into a new or replaced
//!   column.
//!
//! Failures latch instead of unwinding: a failed operation returns a frame
//! carrying the error, every later operation passes it through unchanged, and
//! pipelines check [`Frame::result`] once at the end:
//!
//! ```
//! use strata_frame::{Column, Filter, Frame, SortKey};
//!
//! let frame = Frame::new(vec![
//!     ("name", Column::from(vec!["ada", "grace", "edsger"])),
//!     ("score", Column::from(vec![3i64, 1, 2])),
//! ]);
//!
//! let top = frame
//!     .filter(&[Filter::new("score", ">", 1)])
//!     .sort(&[SortKey::desc("score")])
//!     .result()
//!     .unwrap();
//!
//! assert_eq!(top.len(), 2);
//! assert_eq!(top.int_view("score").unwrap().to_vec(), vec![3, 2]);
//! ```

mod apply;
mod column;
mod error;
mod filter;
mod frame;
mod groupby;
mod index;
mod mask;
mod sort;
mod value;
mod view;

pub use crate::apply::{ApplyFn, Instruction};
pub use crate::column::{BoolColumn, Column, EnumColumn, EnumDict, FloatColumn, IntColumn, StrColumn};
pub use crate::error::Error;
pub use crate::filter::{CmpOp, Comparator, Filter, FilterArg};
pub use crate::frame::{Frame, FrameBuilder};
pub use crate::groupby::{Aggregation, Grouped};
pub use crate::index::RowIndex;
pub use crate::mask::Mask;
pub use crate::sort::SortKey;
pub use crate::value::{ColumnType, Scalar};
pub use crate::view::{EnumView, StrView, View};
