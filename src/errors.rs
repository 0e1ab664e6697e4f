//! The crate error type and `Result` alias.
//!
//! A single catchable [`Error`] enum funnels the engine's five distinct
//! failure modes — duplicate labels, missing keys, shape/alignment
//! mismatches, invalid arguments, and type mismatches — plus an [`Io`]
//! variant carrying stream failures from the delimited reader.
//!
//! [`Io`]: Error::Io

use crate::df::index::Label;
use thiserror::Error;

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the engine can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// A unique index was given two equal labels.
    #[error("duplicate label: {0}")]
    DuplicateLabel(Label),

    /// A lookup named a label the index does not contain.
    #[error("key not found: {0}")]
    KeyNotFound(Label),

    /// Two operands (rows, columns, or lengths) did not line up.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An argument was outside the contract of the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value or column was not of the expected type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A source stream failed while reading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::TypeMismatch`] from any message.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Error::TypeMismatch(message.into())
    }

    /// Build a [`Error::ShapeMismatch`] from any message.
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Error::ShapeMismatch(message.into())
    }

    /// Build a [`Error::InvalidArgument`] from any message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}
