use super::{read_frame, RecordSource};
use crate::df::column::Scalar;
use crate::df::frame::DataFrame;
use crate::df::index::Label;
use crate::errors::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Options for [`read_delimited`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: char,
    /// Promote this column to the row index instead of storing it.
    pub row_label_column: Option<Label>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            row_label_column: None,
        }
    }
}

/// A reader over delimiter-separated text.
///
/// It only splits fields and types scalars (integer, float, boolean,
/// empty or na markers as null, anything else as text); quoting, escaping
/// and encodings are a richer reader's concern.
pub struct DelimitedReader<R> {
    lines: std::io::Lines<BufReader<R>>,
    delimiter: char,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(inner: R, delimiter: char) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            delimiter,
        }
    }
}

impl<R: Read> RecordSource for DelimitedReader<R> {
    fn header(&mut self) -> Result<Vec<Label>> {
        let line = self.lines.next().transpose()?.unwrap_or_default();
        if line.trim().is_empty() {
            return Err(Error::invalid_argument("the input has no header row"));
        }
        Ok(line
            .split(self.delimiter)
            .map(|field| Label::from(field.trim()))
            .collect())
    }

    fn next_record(&mut self) -> Result<Option<Vec<Scalar>>> {
        for line in self.lines.by_ref() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line.split(self.delimiter).map(parse_scalar).collect()));
        }
        Ok(None)
    }
}

fn parse_scalar(field: &str) -> Scalar {
    let field = field.trim();
    if field.is_empty() || matches!(field.to_ascii_lowercase().as_str(), "na" | "nan" | "null") {
        return Scalar::Null;
    }
    if let Ok(value) = field.parse::<bool>() {
        return Scalar::Bool(value);
    }
    if let Ok(value) = field.parse::<i64>() {
        return Scalar::Int(value);
    }
    if let Ok(value) = field.parse::<f64>() {
        return Scalar::Float(value);
    }
    Scalar::Text(field.to_string())
}

/// Open a delimited text file and drain it into a frame.
pub fn read_delimited(path: impl AsRef<Path>, options: ReadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading delimited source");
    let file = File::open(path)?;
    let mut reader = DelimitedReader::new(file, options.delimiter);
    read_frame(&mut reader, options.row_label_column)
}
