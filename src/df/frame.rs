use crate::df::index::Index;
use crate::df::store::ColumnStore;
use std::sync::Arc;

mod indexing;
mod meta;
mod ops;

pub use meta::{ColumnSummary, Summary};
pub use ops::{ElementwiseApply, UnaryOptions};

/// The core tabular unit: one row index, one column index and the store of
/// typed columns.
///
/// Shape-changing operations produce a new frame sharing untouched columns
/// by reference count; [`DataFrame::set_index`] is the single documented
/// in-place mutation. The private fields uphold the shape invariant: every
/// column label in the column index has exactly one stored column whose
/// length equals the row index.
#[derive(Debug, Clone)]
pub struct DataFrame {
    index: Arc<Index>,
    columns: Arc<Index>,
    store: ColumnStore,
}
