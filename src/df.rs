//! # df
//!
//! the labelled tabular core: a [`frame::DataFrame`] composes one row
//! [`index::Index`], one column [`index::Index`] and a [`store::ColumnStore`]
//! of typed, null-masked columns

pub mod column;
pub mod frame;
pub mod index;
pub mod source;
pub mod store;

pub use column::{Column, DataType, Scalar};
pub use frame::DataFrame;
pub use index::{Index, Label};
pub use store::ColumnStore;

/// Rows shown by a preview when the caller has no opinion.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
