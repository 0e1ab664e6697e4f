use crate::df::column::{Column, DataType, Scalar};
use crate::df::index::Label;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// The mapping from column label to column.
///
/// Columns are immutable once constructed and shared by reference count:
/// duplicating a frame, re-indexing it or swapping a single column never
/// copies the untouched buffers. Any mutation path must build a fresh
/// [`Column`] first. Ordering lives in the owning frame's column index, not
/// here.
#[derive(Debug, Clone, Default)]
pub struct ColumnStore {
    columns: HashMap<Label, Arc<Column>>,
}

impl ColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Build a column from `values` and insert it under `label`, replacing
    /// any previous column. With a declared type the values are coerced;
    /// without one the type is inferred.
    pub fn insert(
        &mut self,
        label: Label,
        values: Vec<Scalar>,
        declared_type: Option<DataType>,
    ) -> Result<Arc<Column>> {
        let column = match declared_type {
            Some(dtype) => Column::from_scalars_typed(values, dtype)?,
            None => Column::from_scalars(values)?,
        };
        let column = Arc::new(column);
        self.columns.insert(label, Arc::clone(&column));
        Ok(column)
    }

    /// Insert an already-built column under `label`.
    pub fn insert_column(&mut self, label: Label, column: Arc<Column>) {
        self.columns.insert(label, column);
    }

    pub fn get(&self, label: &Label) -> Result<&Arc<Column>> {
        self.columns
            .get(label)
            .ok_or_else(|| Error::KeyNotFound(label.clone()))
    }

    /// Lookup that relies on the owning frame's invariant that every column
    /// label in the column index is present here.
    pub(crate) fn expect_get(&self, label: &Label) -> &Arc<Column> {
        &self.columns[label]
    }

    /// A new store with `column` under `label`, sharing every other column
    /// with `self`.
    pub fn with_column(&self, label: Label, column: Arc<Column>) -> ColumnStore {
        let mut next = self.clone();
        next.insert_column(label, column);
        next
    }
}
