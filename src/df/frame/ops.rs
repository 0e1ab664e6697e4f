//! The elementwise engine.
//!
//! Transforms apply independently to every non-null numeric position and
//! preserve shape. Domain errors of the numeric function surface as NaN at
//! the offending position, never as an abort. Columns are independent, so
//! large frames evaluate column-partitioned on a bounded pool.

use super::DataFrame;
use crate::df::column::{Column, TypedBuffer};
use crate::df::store::ColumnStore;
use crate::errors::{Error, Result};
use crate::toolkit::array::{self, UnsafeSlice};
use ndarray::Array2;
use std::sync::Arc;
use tracing::trace;

/// Policy knobs for a unary elementwise transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnaryOptions {
    /// Pass non-numeric columns through unchanged instead of failing.
    pub numeric_only: bool,
}

/// The protocol of values a unary numeric transform can run over; frames
/// and raw numeric buffers share it.
pub trait ElementwiseApply: Sized {
    fn apply_unary<F>(&self, f: F, options: UnaryOptions) -> Result<Self>
    where
        F: Fn(f64) -> f64 + Send + Sync;
}

const PARALLEL_CELL_LIMIT: usize = 1 << 16;

impl ElementwiseApply for DataFrame {
    fn apply_unary<F>(&self, f: F, options: UnaryOptions) -> Result<Self>
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        if !options.numeric_only {
            for label in self.columns.labels() {
                let column = self.store.expect_get(label);
                if !column.data_type().is_numeric() {
                    return Err(Error::type_mismatch(format!(
                        "column '{label}' is {}; set numeric_only to pass non-numeric columns through",
                        column.data_type()
                    )));
                }
            }
        }
        let labels = self.columns.labels();
        let tasks: Vec<&Arc<Column>> = labels.iter().map(|l| self.store.expect_get(l)).collect();
        let cells = self.row_count() * self.column_count();
        trace!(cells, columns = tasks.len(), "elementwise unary over frame");
        let transformed = if cells >= PARALLEL_CELL_LIMIT && tasks.len() > 1 {
            transform_columns_parallel(&tasks, &f)
        } else {
            tasks
                .iter()
                .map(|column| transform_column(column, &f))
                .collect()
        };
        let mut store = ColumnStore::new();
        for (label, column) in labels.iter().zip(transformed) {
            store.insert_column(label.clone(), column);
        }
        Ok(DataFrame {
            index: Arc::clone(&self.index),
            columns: Arc::clone(&self.columns),
            store,
        })
    }
}

impl ElementwiseApply for Array2<f64> {
    /// The raw-buffer form: a dense matrix is all numeric, so `options`
    /// has nothing to skip.
    fn apply_unary<F>(&self, f: F, _options: UnaryOptions) -> Result<Self>
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        Ok(array::map_unary_view(self.view(), f))
    }
}

impl DataFrame {
    /// Pair `self` and `other` positionwise under `f`, aligning columns by
    /// label regardless of store order; the result keeps `self`'s column
    /// order. Requires equal row indexes and equal column-label sets.
    pub fn apply_binary<F>(&self, other: &DataFrame, f: F) -> Result<DataFrame>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.index.labels() != other.index.labels() {
            return Err(Error::shape_mismatch(
                "row indexes are not aligned".to_string(),
            ));
        }
        if self.column_count() != other.column_count() {
            return Err(Error::shape_mismatch(format!(
                "operands have {} and {} columns",
                self.column_count(),
                other.column_count()
            )));
        }
        let mut store = ColumnStore::new();
        for label in self.columns.labels() {
            let lhs = self.store.expect_get(label);
            let rhs = other.store.get(label).map_err(|_| {
                Error::shape_mismatch(format!("column '{label}' is missing from the right operand"))
            })?;
            let (lhs_values, lhs_nulls) = lhs
                .float_values()
                .map_err(|_| Error::type_mismatch(format!("column '{label}' is not numeric")))?;
            let (rhs_values, rhs_nulls) = rhs
                .float_values()
                .map_err(|_| Error::type_mismatch(format!("column '{label}' is not numeric")))?;
            let (values, nulls) =
                array::zip_binary(&lhs_values, &rhs_values, &lhs_nulls, &rhs_nulls, &f);
            store.insert_column(
                label.clone(),
                Arc::new(Column::Float(TypedBuffer::new(values, nulls))),
            );
        }
        Ok(DataFrame {
            index: Arc::clone(&self.index),
            columns: Arc::clone(&self.columns),
            store,
        })
    }

    /// The scalar-broadcast form of [`DataFrame::apply_binary`]: `rhs` is
    /// paired with every position.
    pub fn apply_scalar<F>(&self, rhs: f64, f: F, options: UnaryOptions) -> Result<DataFrame>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync,
    {
        self.apply_unary(move |x| f(x, rhs), options)
    }
}

fn transform_column<F>(column: &Arc<Column>, f: &F) -> Arc<Column>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    match column.as_ref() {
        Column::Int(buffer) => {
            let widened: Vec<f64> = buffer.values().iter().map(|&v| v as f64).collect();
            let out = array::map_unary(&widened, buffer.nulls(), f);
            Arc::new(Column::Float(TypedBuffer::new(out, buffer.nulls().clone())))
        }
        Column::Float(buffer) => {
            let out = array::map_unary(buffer.values(), buffer.nulls(), f);
            Arc::new(Column::Float(TypedBuffer::new(out, buffer.nulls().clone())))
        }
        // non-numeric pass-through under numeric_only
        _ => Arc::clone(column),
    }
}

fn transform_columns_parallel<F>(tasks: &[&Arc<Column>], f: &F) -> Vec<Arc<Column>>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    let mut out: Vec<Option<Arc<Column>>> = vec![None; tasks.len()];
    let mut slots = UnsafeSlice::new(out.as_mut_slice());
    let num_threads = array::suggested_threads(tasks.len());
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => {
            pool.scope(|s| {
                for (i, column) in tasks.iter().enumerate() {
                    let slot = slots.shadow();
                    s.spawn(move |_| slot.set(i, Some(transform_column(column, f))));
                }
            });
        }
        Err(_) => {
            for (i, column) in tasks.iter().enumerate() {
                slots.set(i, Some(transform_column(column, f)));
            }
        }
    }
    out.into_iter()
        .map(|slot| slot.expect("every column task writes its slot"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::meta::tests::sample_frame;
    use super::*;
    use crate::df::column::Scalar;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn log10_or_nan(x: f64) -> f64 {
        if x > 0.0 {
            x.log10()
        } else {
            f64::NAN
        }
    }

    fn float_slice(frame: &DataFrame, label: &str) -> Vec<f64> {
        let (values, _) = frame
            .column(&label.into())
            .unwrap()
            .float_values()
            .unwrap();
        values
    }

    #[test]
    fn test_unary_log10() {
        let frame = DataFrame::from_mapping(vec![(
            "v",
            vec![Scalar::Int(1), Scalar::Int(10), Scalar::Int(100)],
        )])
        .unwrap();
        let out = frame
            .apply_unary(log10_or_nan, UnaryOptions::default())
            .unwrap();
        let values = float_slice(&out, "v");
        for (got, want) in values.iter().zip([0.0, 1.0, 2.0]) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unary_domain_errors_become_nan() {
        let frame = DataFrame::from_mapping(vec![(
            "v",
            vec![Scalar::Float(0.0), Scalar::Float(-1.0)],
        )])
        .unwrap();
        let out = frame
            .apply_unary(log10_or_nan, UnaryOptions::default())
            .unwrap();
        let values = float_slice(&out, "v");
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_unary_rejects_text_by_default() {
        let err = sample_frame()
            .apply_unary(log10_or_nan, UnaryOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_unary_numeric_only_passes_text_through_shared() {
        let frame = sample_frame();
        let out = frame
            .apply_unary(log10_or_nan, UnaryOptions { numeric_only: true })
            .unwrap();
        assert!(Arc::ptr_eq(
            frame.column(&"weekday".into()).unwrap(),
            out.column(&"weekday".into()).unwrap()
        ));
        let visitors = float_slice(&out, "visitors");
        assert!((visitors[0] - 141f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn test_unary_never_invokes_on_nulls() {
        let calls = AtomicUsize::new(0);
        let frame = DataFrame::from_mapping(vec![(
            "v",
            vec![Scalar::Float(1.0), Scalar::Null],
        )])
        .unwrap();
        let out = frame
            .apply_unary(
                |x| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    x + 1.0
                },
                UnaryOptions::default(),
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let column = out.column(&"v".into()).unwrap();
        assert_eq!(column.scalar_at(0), Scalar::Float(2.0));
        assert_eq!(column.scalar_at(1), Scalar::Null);
    }

    #[test]
    fn test_binary_aligns_by_label_not_store_order() {
        let a = DataFrame::from_mapping(vec![
            ("x", vec![Scalar::Int(1), Scalar::Int(2)]),
            ("y", vec![Scalar::Int(10), Scalar::Int(20)]),
        ])
        .unwrap();
        let b = DataFrame::from_mapping(vec![
            ("y", vec![Scalar::Int(100), Scalar::Int(200)]),
            ("x", vec![Scalar::Int(1000), Scalar::Int(2000)]),
        ])
        .unwrap();
        let out = a.apply_binary(&b, |l, r| l + r).unwrap();
        // result keeps the left operand's column order
        assert_eq!(out.columns().labels(), a.columns().labels());
        assert_eq!(float_slice(&out, "x"), vec![1001.0, 2002.0]);
        assert_eq!(float_slice(&out, "y"), vec![110.0, 220.0]);
    }

    #[test]
    fn test_binary_rejects_misaligned_shapes() {
        let a = DataFrame::from_mapping(vec![("x", vec![Scalar::Int(1), Scalar::Int(2)])]).unwrap();
        let shorter =
            DataFrame::from_mapping(vec![("x", vec![Scalar::Int(1)])]).unwrap();
        assert!(matches!(
            a.apply_binary(&shorter, |l, r| l + r),
            Err(Error::ShapeMismatch(_))
        ));
        let renamed =
            DataFrame::from_mapping(vec![("z", vec![Scalar::Int(1), Scalar::Int(2)])]).unwrap();
        assert!(matches!(
            a.apply_binary(&renamed, |l, r| l + r),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_binary_propagates_nulls() {
        let a = DataFrame::from_mapping(vec![(
            "x",
            vec![Scalar::Float(1.0), Scalar::Null, Scalar::Float(3.0)],
        )])
        .unwrap();
        let b = DataFrame::from_mapping(vec![(
            "x",
            vec![Scalar::Float(10.0), Scalar::Float(20.0), Scalar::Null],
        )])
        .unwrap();
        let out = a.apply_binary(&b, |l, r| l * r).unwrap();
        let column = out.column(&"x".into()).unwrap();
        assert_eq!(column.scalar_at(0), Scalar::Float(10.0));
        assert_eq!(column.scalar_at(1), Scalar::Null);
        assert_eq!(column.scalar_at(2), Scalar::Null);
    }

    #[test]
    fn test_scalar_broadcast() {
        let frame =
            DataFrame::from_mapping(vec![("v", vec![Scalar::Int(1), Scalar::Int(2)])]).unwrap();
        let out = frame
            .apply_scalar(10.0, |l, r| l * r, UnaryOptions::default())
            .unwrap();
        assert_eq!(float_slice(&out, "v"), vec![10.0, 20.0]);
    }

    #[test]
    fn test_matrix_buffer_shares_the_engine() {
        let frame = DataFrame::from_mapping(vec![
            ("a", vec![Scalar::Int(1), Scalar::Int(100)]),
            ("b", vec![Scalar::Int(10), Scalar::Int(1000)]),
        ])
        .unwrap();
        let matrix = frame.values_matrix().unwrap();
        let out = matrix
            .apply_unary(log10_or_nan, UnaryOptions::default())
            .unwrap();
        assert!((out[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((out[[1, 1]] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_path_matches_serial() {
        // enough cells to cross the parallel threshold
        let rows = 40_000;
        let a: Vec<Scalar> = (0..rows).map(|i| Scalar::Float(i as f64 + 1.0)).collect();
        let b: Vec<Scalar> = (0..rows).map(|i| Scalar::Float((i * 2) as f64 + 1.0)).collect();
        let frame = DataFrame::from_mapping(vec![("a", a), ("b", b)]).unwrap();
        let out = frame
            .apply_unary(log10_or_nan, UnaryOptions::default())
            .unwrap();
        let values = float_slice(&out, "b");
        assert!((values[0] - 0.0).abs() < 1e-12);
        assert!((values[rows - 1] - ((rows as f64 - 1.0) * 2.0 + 1.0).log10()).abs() < 1e-12);
    }
}
