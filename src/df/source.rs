//! Source adapters: the seam between the engine and whatever produces
//! records.
//!
//! A [`RecordSource`] yields a header of labels and then a rectangular
//! stream of scalar records; reading is a single blocking drain with no
//! partial-result contract. Malformed input is the reader's concern, not
//! the engine's.

use crate::df::column::Scalar;
use crate::df::frame::DataFrame;
use crate::df::index::Label;
use crate::errors::Result;

pub mod delimited;

pub trait RecordSource {
    /// The column labels, read once before any record.
    fn header(&mut self) -> Result<Vec<Label>>;

    /// The next record, or `None` at end of stream.
    fn next_record(&mut self) -> Result<Option<Vec<Scalar>>>;
}

/// An in-memory record stream, mostly for composing frames from already
/// materialized rows.
pub struct MemSource {
    header: Vec<Label>,
    records: std::vec::IntoIter<Vec<Scalar>>,
}

impl MemSource {
    pub fn new(header: Vec<Label>, records: Vec<Vec<Scalar>>) -> Self {
        Self {
            header,
            records: records.into_iter(),
        }
    }
}

impl RecordSource for MemSource {
    fn header(&mut self) -> Result<Vec<Label>> {
        Ok(self.header.clone())
    }

    fn next_record(&mut self) -> Result<Option<Vec<Scalar>>> {
        Ok(self.records.next())
    }
}

/// Drain `source` into a frame, optionally promoting one column to the row
/// index.
pub fn read_frame<S: RecordSource>(
    source: &mut S,
    row_label_column: Option<Label>,
) -> Result<DataFrame> {
    let header = source.header()?;
    let mut records = Vec::new();
    while let Some(record) = source.next_record()? {
        records.push(record);
    }
    DataFrame::from_records(records, header, row_label_column)
}
