use super::DataFrame;
use crate::df::column::{Column, Scalar};
use crate::df::index::Label;
use crate::df::store::ColumnStore;
use crate::errors::{Error, Result};
use std::sync::Arc;

impl DataFrame {
    /// The first `min(n, row_count)` rows, row-index slice preserved, all
    /// columns preserved.
    pub fn head(&self, n: usize) -> DataFrame {
        self.slice_rows(0, n.min(self.row_count()))
    }

    /// The last `min(n, row_count)` rows.
    pub fn tail(&self, n: usize) -> DataFrame {
        let rows = self.row_count();
        self.slice_rows(rows - n.min(rows), rows)
    }

    fn slice_rows(&self, start: usize, end: usize) -> DataFrame {
        if start == 0 && end == self.row_count() {
            return self.clone();
        }
        let mut store = ColumnStore::new();
        for label in self.columns.labels() {
            let column = self.store.expect_get(label);
            store.insert_column(label.clone(), Arc::new(column.slice(start, end)));
        }
        DataFrame {
            index: Arc::new(self.index.slice(start, end)),
            columns: Arc::clone(&self.columns),
            store,
        }
    }

    /// The rows at `positions`, in that order, as a new frame.
    pub fn select_rows(&self, positions: &[usize]) -> Result<DataFrame> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.row_count()) {
            return Err(Error::invalid_argument(format!(
                "row position {bad} is out of bounds for {} rows",
                self.row_count()
            )));
        }
        let mut store = ColumnStore::new();
        for label in self.columns.labels() {
            let column = self.store.expect_get(label);
            store.insert_column(label.clone(), Arc::new(column.gather(positions)));
        }
        Ok(DataFrame {
            index: Arc::new(self.index.gather(positions)),
            columns: Arc::clone(&self.columns),
            store,
        })
    }

    /// The column stored under `label`.
    pub fn column(&self, label: &Label) -> Result<&Arc<Column>> {
        self.store.get(label)
    }

    /// The row labelled `label`: one value per column, in column-index
    /// order. With a non-unique row index the first matching row wins.
    pub fn row(&self, label: &Label) -> Result<Vec<Scalar>> {
        let position = self.index.position_of(label)?;
        Ok(self
            .columns
            .labels()
            .iter()
            .map(|l| self.store.expect_get(l).scalar_at(position))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::meta::tests::sample_frame;
    use super::*;
    use crate::df::index::Index;
    use crate::df::DEFAULT_PREVIEW_ROWS;

    #[test]
    fn test_head_counts() {
        let frame = sample_frame();
        assert_eq!(frame.head(2).row_count(), 2);
        assert_eq!(frame.head(10).row_count(), 4);
        assert_eq!(frame.head(4).row_count(), 4);
        assert_eq!(frame.head(DEFAULT_PREVIEW_ROWS).row_count(), 4);
    }

    #[test]
    fn test_head_zero_keeps_columns() {
        let empty = sample_frame().head(0);
        assert_eq!(empty.row_count(), 0);
        assert_eq!(empty.column_count(), 4);
        assert_eq!(empty.columns().labels(), sample_frame().columns().labels());
    }

    #[test]
    fn test_tail_preserves_index_slice() {
        let frame = sample_frame();
        let tail = frame.tail(2);
        assert_eq!(tail.row_count(), 2);
        assert_eq!(tail.index().labels(), &[Label::Int(2), Label::Int(3)]);
        assert_eq!(
            tail.column(&"visitors".into()).unwrap().scalar_at(0),
            Scalar::Int(98543)
        );
        assert_eq!(frame.tail(100).row_count(), 4);
    }

    #[test]
    fn test_full_head_shares_columns() {
        let frame = sample_frame();
        let full = frame.head(4);
        assert!(Arc::ptr_eq(
            frame.column(&"city".into()).unwrap(),
            full.column(&"city".into()).unwrap()
        ));
    }

    #[test]
    fn test_row_gathers_across_columns() {
        let frame = sample_frame();
        let row = frame.row(&Label::Int(1)).unwrap();
        assert_eq!(
            row,
            vec![
                Scalar::Text("Sun".into()),
                Scalar::Text("Lim".into()),
                Scalar::Int(12422),
                Scalar::Int(2),
            ]
        );
        assert!(matches!(
            frame.row(&Label::Int(9)),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_row_with_relabelled_index() {
        let mut frame = sample_frame();
        frame
            .set_index(Index::build(
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                false,
            )
            .unwrap())
            .unwrap();
        let row = frame.row(&"d".into()).unwrap();
        assert_eq!(row[2], Scalar::Int(1231));
    }

    #[test]
    fn test_select_rows() {
        let frame = sample_frame();
        let picked = frame.select_rows(&[3, 0]).unwrap();
        assert_eq!(picked.index().labels(), &[Label::Int(3), Label::Int(0)]);
        assert_eq!(
            picked.column(&"weekday".into()).unwrap().scalar_at(0),
            Scalar::Text("Tue".into())
        );
        assert!(matches!(
            frame.select_rows(&[7]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_column_miss() {
        let err = sample_frame().column(&"nope".into()).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }
}
