use super::DataFrame;
use crate::df::column::{DataType, Scalar};
use crate::df::index::{Index, Label};
use crate::df::store::ColumnStore;
use crate::errors::{Error, Result};
use itertools::{enumerate, izip};
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

impl DataFrame {
    /// Compose a frame from its three parts, validating the shape
    /// invariant.
    pub fn new(index: Index, columns: Index, store: ColumnStore) -> Result<Self> {
        if columns.len() != store.len() {
            return Err(Error::shape_mismatch(format!(
                "column index has {} labels but the store holds {} columns",
                columns.len(),
                store.len()
            )));
        }
        for label in columns.labels() {
            let column = store.get(label)?;
            if column.len() != index.len() {
                return Err(Error::shape_mismatch(format!(
                    "column '{label}' has {} rows, expected {}",
                    column.len(),
                    index.len()
                )));
            }
        }
        Ok(Self {
            index: Arc::new(index),
            columns: Arc::new(columns),
            store,
        })
    }

    /// Build a frame from label→sequence pairs. All sequences must have
    /// equal length; the row index defaults to `0..n` and the column index
    /// follows the input key order.
    pub fn from_mapping<L, I>(pairs: I) -> Result<Self>
    where
        L: Into<Label>,
        I: IntoIterator<Item = (L, Vec<Scalar>)>,
    {
        let pairs: Vec<(Label, Vec<Scalar>)> =
            pairs.into_iter().map(|(l, v)| (l.into(), v)).collect();
        let row_count = pairs.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut labels = Vec::with_capacity(pairs.len());
        let mut store = ColumnStore::new();
        for (label, values) in pairs {
            if values.len() != row_count {
                return Err(Error::shape_mismatch(format!(
                    "column '{label}' has {} values, expected {row_count}",
                    values.len()
                )));
            }
            labels.push(label.clone());
            store.insert(label, values, None)?;
        }
        let columns = Index::build(labels, false)?;
        let frame = Self::new(Index::default_range(row_count), columns, store)?;
        debug!(
            rows = frame.row_count(),
            columns = frame.column_count(),
            "built frame from mapping"
        );
        Ok(frame)
    }

    /// Build a frame by transposing a rectangular record stream. When
    /// `row_label_column` is given, that column's values become the
    /// (possibly non-unique) row index and leave the store.
    pub fn from_records<I>(
        records: I,
        header: Vec<Label>,
        row_label_column: Option<Label>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<Scalar>>,
    {
        if header.is_empty() {
            return Err(Error::invalid_argument(
                "an empty header cannot describe records",
            ));
        }
        let width = header.len();
        let mut buffers: Vec<Vec<Scalar>> = (0..width).map(|_| Vec::new()).collect();
        let mut rows = 0;
        for (row, record) in enumerate(records) {
            if record.len() != width {
                return Err(Error::shape_mismatch(format!(
                    "record {row} has {} fields, expected {width}",
                    record.len()
                )));
            }
            for (buffer, value) in izip!(buffers.iter_mut(), record) {
                buffer.push(value);
            }
            rows += 1;
        }

        let mut store = ColumnStore::new();
        let mut labels = Vec::with_capacity(width);
        let mut row_index = None;
        for (label, values) in izip!(header, buffers) {
            if row_label_column.as_ref() == Some(&label) {
                row_index = Some(index_from_scalars(values)?);
            } else {
                labels.push(label.clone());
                store.insert(label, values, None)?;
            }
        }
        if let Some(wanted) = &row_label_column {
            if row_index.is_none() {
                return Err(Error::KeyNotFound(wanted.clone()));
            }
        }
        let index = row_index.unwrap_or_else(|| Index::default_range(rows));
        let columns = Index::build(labels, false)?;
        let frame = Self::new(index, columns, store)?;
        debug!(
            rows = frame.row_count(),
            columns = frame.column_count(),
            "built frame from records"
        );
        Ok(frame)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn columns(&self) -> &Index {
        &self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Replace the row index wholesale. The single in-place mutation of a
    /// frame; columns stay shared.
    pub fn set_index(&mut self, index: Index) -> Result<()> {
        if index.len() != self.row_count() {
            return Err(Error::shape_mismatch(format!(
                "index has {} labels for {} rows",
                index.len(),
                self.row_count()
            )));
        }
        self.index = Arc::new(index);
        Ok(())
    }

    /// The frame's numeric values as a dense row-major matrix, nulls as
    /// NaN. Fails with [`Error::TypeMismatch`] when a non-numeric column is
    /// present.
    pub fn values_matrix(&self) -> Result<Array2<f64>> {
        let (rows, cols) = self.shape();
        let mut parts = Vec::with_capacity(cols);
        for label in self.columns.labels() {
            let part = self
                .store
                .expect_get(label)
                .float_values()
                .map_err(|_| Error::type_mismatch(format!("column '{label}' is not numeric")))?;
            parts.push(part);
        }
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for (values, nulls) in &parts {
                data.push(if nulls.is_set(row) {
                    f64::NAN
                } else {
                    values[row]
                });
            }
        }
        Ok(Array2::from_shape_vec((rows, cols), data).expect("row-major fill matches the shape"))
    }

    /// Summary metadata: row count, per-column type and non-null count,
    /// and an estimated memory footprint. Pure read.
    pub fn summary(&self) -> Summary {
        let columns: Vec<ColumnSummary> = self
            .columns
            .labels()
            .iter()
            .map(|label| {
                let column = self.store.expect_get(label);
                ColumnSummary {
                    label: label.clone(),
                    dtype: column.data_type(),
                    non_null_count: column.non_null_count(),
                }
            })
            .collect();
        let estimated_bytes = self
            .columns
            .labels()
            .iter()
            .map(|label| self.store.expect_get(label).estimated_nbytes())
            .sum::<usize>()
            + self.index.estimated_nbytes()
            + self.columns.estimated_nbytes();
        Summary {
            row_count: self.row_count(),
            columns,
            estimated_bytes,
        }
    }
}

fn index_from_scalars(values: Vec<Scalar>) -> Result<Index> {
    let labels = values
        .into_iter()
        .map(|value| match value {
            Scalar::Int(v) => Ok(Label::Int(v)),
            Scalar::Text(v) => Ok(Label::Text(v)),
            other => Err(Error::invalid_argument(format!(
                "'{other}' cannot be used as a row label"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Index::build(labels, true)
}

/// Per-column introspection record.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub label: Label,
    pub dtype: DataType,
    pub non_null_count: usize,
}

/// The introspector's output for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub row_count: usize,
    pub columns: Vec<ColumnSummary>,
    pub estimated_bytes: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} entries, {} columns", self.row_count, self.columns.len())?;
        let width = self
            .columns
            .iter()
            .map(|column| column.label.to_string().len())
            .max()
            .unwrap_or(0);
        for column in &self.columns {
            writeln!(
                f,
                "{:<width$}  {} non-null  {}",
                column.label.to_string(),
                column.non_null_count,
                column.dtype,
                width = width
            )?;
        }
        write!(f, "memory usage: ~{} bytes", self.estimated_bytes)
    }
}
