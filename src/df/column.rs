//! Typed columns and the scalar values they exchange.
//!
//! A column is a tagged variant over four homogeneously-typed contiguous
//! buffers, each paired with a null [`BitMask`]. Type inference collapses a
//! mixed scalar sequence to the least upper bound of the promotion order
//! boolean < integer < float < text; a missing marker only sets a null bit,
//! except that it promotes an integer column to float (integers have no
//! in-band null sentinel).

use crate::errors::{Error, Result};
use crate::toolkit::bitmap::BitMask;
use crate::toolkit::convert::to_nbytes;
use itertools::enumerate;
use std::fmt;

/// The scalar types a column may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Text,
}

impl DataType {
    /// The least upper bound of two types in the promotion order.
    pub fn promote(self, other: DataType) -> DataType {
        use DataType::*;
        match (self, other) {
            (Text, _) | (_, Text) => Text,
            (Float, _) | (_, Float) => Float,
            (Integer, _) | (_, Integer) => Integer,
            (Boolean, Boolean) => Boolean,
        }
    }

    /// Whether the elementwise engine accepts columns of this type.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Text => "text",
        };
        write!(f, "{name}")
    }
}

/// A single cell value, the exchange currency of source adapters and row
/// access.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// The type this value carries, or `None` for the missing marker.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::Int(_) => Some(DataType::Integer),
            Scalar::Float(_) => Some(DataType::Float),
            Scalar::Text(_) => Some(DataType::Text),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Text(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! scalar_from_impl {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Scalar {
            fn from(value: $ty) -> Self {
                Scalar::$variant(value)
            }
        }
    };
}
scalar_from_impl!(Bool, bool);
scalar_from_impl!(Int, i64);
scalar_from_impl!(Float, f64);
scalar_from_impl!(Text, String);

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Scalar::Null,
        }
    }
}

/// A contiguous value buffer and its parallel null mask.
///
/// A null position keeps a type-appropriate zero in the backing slot; it is
/// never read.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer<T> {
    values: Vec<T>,
    nulls: BitMask,
}

impl<T: Clone> TypedBuffer<T> {
    pub fn new(values: Vec<T>, nulls: BitMask) -> Self {
        debug_assert_eq!(values.len(), nulls.len());
        Self { values, nulls }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn nulls(&self) -> &BitMask {
        &self.nulls
    }

    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        self.nulls.is_set(i)
    }

    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            values: self.values[start..end].to_vec(),
            nulls: self.nulls.slice(start, end),
        }
    }

    pub fn gather(&self, positions: &[usize]) -> Self {
        Self {
            values: positions.iter().map(|&p| self.values[p].clone()).collect(),
            nulls: self.nulls.gather(positions),
        }
    }
}

/// A homogeneously-typed column: one variant per scalar type.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(TypedBuffer<bool>),
    Int(TypedBuffer<i64>),
    Float(TypedBuffer<f64>),
    Text(TypedBuffer<String>),
}

macro_rules! per_buffer {
    ($column:expr, $buffer:ident => $body:expr) => {
        match $column {
            Column::Bool($buffer) => $body,
            Column::Int($buffer) => $body,
            Column::Float($buffer) => $body,
            Column::Text($buffer) => $body,
        }
    };
}

macro_rules! map_buffer {
    ($column:expr, $buffer:ident => $body:expr) => {
        match $column {
            Column::Bool($buffer) => Column::Bool($body),
            Column::Int($buffer) => Column::Int($body),
            Column::Float($buffer) => Column::Float($body),
            Column::Text($buffer) => Column::Text($body),
        }
    };
}

impl Column {
    /// Build a column by inferring the narrowest common type of `values`
    /// in one scan.
    pub fn from_scalars(values: Vec<Scalar>) -> Result<Column> {
        let dtype = infer_dtype(&values);
        Column::from_scalars_typed(values, dtype)
    }

    /// Build a column of a declared type, coercing each value upward along
    /// the promotion order. Fails with [`Error::TypeMismatch`] when a value
    /// cannot be coerced (e.g. text into an integer column).
    pub fn from_scalars_typed(values: Vec<Scalar>, dtype: DataType) -> Result<Column> {
        match dtype {
            DataType::Boolean => Ok(Column::Bool(build_bool(values)?)),
            DataType::Integer => Ok(Column::Int(build_int(values)?)),
            DataType::Float => Ok(Column::Float(build_float(values)?)),
            DataType::Text => Ok(Column::Text(build_text(values))),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Bool(_) => DataType::Boolean,
            Column::Int(_) => DataType::Integer,
            Column::Float(_) => DataType::Float,
            Column::Text(_) => DataType::Text,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        per_buffer!(self, buffer => buffer.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nulls(&self) -> &BitMask {
        per_buffer!(self, buffer => buffer.nulls())
    }

    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        self.nulls().is_set(i)
    }

    pub fn null_count(&self) -> usize {
        self.nulls().count_set()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// The value at position `i`, with nulls surfaced as [`Scalar::Null`].
    pub fn scalar_at(&self, i: usize) -> Scalar {
        if self.is_null(i) {
            return Scalar::Null;
        }
        match self {
            Column::Bool(buffer) => Scalar::Bool(buffer.values()[i]),
            Column::Int(buffer) => Scalar::Int(buffer.values()[i]),
            Column::Float(buffer) => Scalar::Float(buffer.values()[i]),
            Column::Text(buffer) => Scalar::Text(buffer.values()[i].clone()),
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> Column {
        map_buffer!(self, buffer => buffer.slice(start, end))
    }

    pub fn gather(&self, positions: &[usize]) -> Column {
        map_buffer!(self, buffer => buffer.gather(positions))
    }

    /// The column as a float buffer plus its null mask, for the elementwise
    /// engine. Integer values widen to float; text and boolean columns are
    /// rejected.
    pub fn float_values(&self) -> Result<(Vec<f64>, BitMask)> {
        match self {
            Column::Int(buffer) => Ok((
                buffer.values().iter().map(|&v| v as f64).collect(),
                buffer.nulls().clone(),
            )),
            Column::Float(buffer) => Ok((buffer.values().to_vec(), buffer.nulls().clone())),
            other => Err(Error::type_mismatch(format!(
                "expected a numeric column, found {}",
                other.data_type()
            ))),
        }
    }

    /// Estimated in-memory footprint. Text columns use the average observed
    /// value length rather than exact accounting.
    pub fn estimated_nbytes(&self) -> usize {
        let data = match self {
            Column::Bool(buffer) => to_nbytes::<bool>(buffer.len()),
            Column::Int(buffer) => to_nbytes::<i64>(buffer.len()),
            Column::Float(buffer) => to_nbytes::<f64>(buffer.len()),
            Column::Text(buffer) => {
                let observed: usize = enumerate(buffer.values().iter())
                    .filter(|(i, _)| !buffer.is_null(*i))
                    .map(|(_, text)| text.len())
                    .sum();
                let non_null = buffer.len() - buffer.nulls().count_set();
                let average = if non_null == 0 { 0 } else { observed / non_null };
                to_nbytes::<String>(buffer.len()) + average * buffer.len()
            }
        };
        data + self.nulls().nbytes()
    }
}

/// The narrowest common type of a scalar sequence. An entirely missing
/// sequence is float; integer-with-missing promotes to float.
fn infer_dtype(values: &[Scalar]) -> DataType {
    let mut dtype: Option<DataType> = None;
    let mut has_null = false;
    for value in values {
        match value.data_type() {
            None => has_null = true,
            Some(dt) => dtype = Some(dtype.map_or(dt, |current| current.promote(dt))),
        }
    }
    match dtype {
        None => DataType::Float,
        Some(DataType::Integer) if has_null => DataType::Float,
        Some(dt) => dt,
    }
}

fn build_bool(values: Vec<Scalar>) -> Result<TypedBuffer<bool>> {
    let mut out = Vec::with_capacity(values.len());
    let mut nulls = BitMask::new(values.len());
    for (i, value) in enumerate(values) {
        match value {
            Scalar::Null => {
                nulls.set(i);
                out.push(false);
            }
            Scalar::Bool(v) => out.push(v),
            other => {
                return Err(Error::type_mismatch(format!(
                    "cannot store '{other}' in a boolean column"
                )))
            }
        }
    }
    Ok(TypedBuffer::new(out, nulls))
}

fn build_int(values: Vec<Scalar>) -> Result<TypedBuffer<i64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut nulls = BitMask::new(values.len());
    for (i, value) in enumerate(values) {
        match value {
            Scalar::Null => {
                nulls.set(i);
                out.push(0);
            }
            Scalar::Bool(v) => out.push(v as i64),
            Scalar::Int(v) => out.push(v),
            other => {
                return Err(Error::type_mismatch(format!(
                    "cannot store '{other}' in an integer column"
                )))
            }
        }
    }
    Ok(TypedBuffer::new(out, nulls))
}

fn build_float(values: Vec<Scalar>) -> Result<TypedBuffer<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut nulls = BitMask::new(values.len());
    for (i, value) in enumerate(values) {
        match value {
            Scalar::Null => {
                nulls.set(i);
                out.push(0.0);
            }
            Scalar::Bool(v) => out.push(if v { 1.0 } else { 0.0 }),
            Scalar::Int(v) => out.push(v as f64),
            Scalar::Float(v) => out.push(v),
            other => {
                return Err(Error::type_mismatch(format!(
                    "cannot store '{other}' in a float column"
                )))
            }
        }
    }
    Ok(TypedBuffer::new(out, nulls))
}

fn build_text(values: Vec<Scalar>) -> TypedBuffer<String> {
    let mut out = Vec::with_capacity(values.len());
    let mut nulls = BitMask::new(values.len());
    for (i, value) in enumerate(values) {
        match value {
            Scalar::Null => {
                nulls.set(i);
                out.push(String::new());
            }
            Scalar::Text(v) => out.push(v),
            other => out.push(other.to_string()),
        }
    }
    TypedBuffer::new(out, nulls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_boolean_with_null() {
        let column =
            Column::from_scalars(vec![Scalar::Bool(true), Scalar::Bool(false), Scalar::Null])
                .unwrap();
        assert_eq!(column.data_type(), DataType::Boolean);
        assert_eq!(column.null_count(), 1);
        assert!(column.is_null(2));
    }

    #[test]
    fn test_infer_integer_with_null_promotes_to_float() {
        let column =
            Column::from_scalars(vec![Scalar::Int(1), Scalar::Int(2), Scalar::Null]).unwrap();
        assert_eq!(column.data_type(), DataType::Float);
        assert_eq!(column.non_null_count(), 2);
        assert_eq!(column.scalar_at(0), Scalar::Float(1.0));
        assert_eq!(column.scalar_at(2), Scalar::Null);
    }

    #[test]
    fn test_infer_mixed_numeric_and_text_collapses_to_text() {
        let column = Column::from_scalars(vec![Scalar::Int(1), Scalar::Text("x".into())]).unwrap();
        assert_eq!(column.data_type(), DataType::Text);
        assert_eq!(column.scalar_at(0), Scalar::Text("1".into()));
        assert_eq!(column.scalar_at(1), Scalar::Text("x".into()));
    }

    #[test]
    fn test_infer_entirely_missing_is_float_all_null() {
        let column = Column::from_scalars(vec![Scalar::Null, Scalar::Null]).unwrap();
        assert_eq!(column.data_type(), DataType::Float);
        assert_eq!(column.non_null_count(), 0);
    }

    #[test]
    fn test_infer_bool_and_int_promote_to_integer() {
        let column = Column::from_scalars(vec![Scalar::Bool(true), Scalar::Int(5)]).unwrap();
        assert_eq!(column.data_type(), DataType::Integer);
        assert_eq!(column.scalar_at(0), Scalar::Int(1));
    }

    #[test]
    fn test_declared_type_rejects_downward_coercion() {
        let err =
            Column::from_scalars_typed(vec![Scalar::Float(1.5)], DataType::Integer).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        let err =
            Column::from_scalars_typed(vec![Scalar::Text("a".into())], DataType::Float).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_declared_integer_keeps_nulls() {
        // a declared type overrides promotion: integer-with-null stays integer
        let column =
            Column::from_scalars_typed(vec![Scalar::Int(3), Scalar::Null], DataType::Integer)
                .unwrap();
        assert_eq!(column.data_type(), DataType::Integer);
        assert_eq!(column.non_null_count(), 1);
    }

    #[test]
    fn test_slice_and_gather() {
        let column = Column::from_scalars(vec![
            Scalar::Int(10),
            Scalar::Int(20),
            Scalar::Int(30),
            Scalar::Int(40),
        ])
        .unwrap();
        let sliced = column.slice(1, 3);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.scalar_at(0), Scalar::Int(20));
        let gathered = column.gather(&[3, 0]);
        assert_eq!(gathered.scalar_at(0), Scalar::Int(40));
        assert_eq!(gathered.scalar_at(1), Scalar::Int(10));
    }

    #[test]
    fn test_float_values_widens_integers() {
        let column = Column::from_scalars(vec![Scalar::Int(2), Scalar::Int(4)]).unwrap();
        let (values, nulls) = column.float_values().unwrap();
        assert_eq!(values, vec![2.0, 4.0]);
        assert_eq!(nulls.count_set(), 0);
        let text = Column::from_scalars(vec![Scalar::Text("a".into())]).unwrap();
        assert!(matches!(
            text.float_values(),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_estimated_nbytes() {
        let ints = Column::from_scalars(vec![Scalar::Int(1), Scalar::Int(2)]).unwrap();
        assert!(ints.estimated_nbytes() >= 16);
        let texts =
            Column::from_scalars(vec![Scalar::Text("ab".into()), Scalar::Text("cd".into())])
                .unwrap();
        assert!(texts.estimated_nbytes() >= 2 * core::mem::size_of::<String>() + 4);
    }
}
