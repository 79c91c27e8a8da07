//! The module contains the error the engine can throw.
//!
//! The errors fall in a few classes:
//!
//! - validation: [`InvalidField`], [`InvalidFilter`], [`InvalidSort`],
//!   [`InvalidLimit`], [`UnsupportedMediaType`] and [`NoOp`]. They are raised
//!   before any storage or database I/O takes place.
//! - [`KeyNotFound`] thrown when a record does not exist.
//! - [`Storage`] thrown when the blob backend fails.
//! - [`Consistency`] thrown when a row and its receipt blob diverged.
//!
//!  [`InvalidField`]: EngineError::InvalidField
//!  [`InvalidFilter`]: EngineError::InvalidFilter
//!  [`InvalidSort`]: EngineError::InvalidSort
//!  [`InvalidLimit`]: EngineError::InvalidLimit
//!  [`UnsupportedMediaType`]: EngineError::UnsupportedMediaType
//!  [`NoOp`]: EngineError::NoOp
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Storage`]: EngineError::Storage
//!  [`Consistency`]: EngineError::Consistency
use sea_orm::DbErr;
use thiserror::Error;

use crate::storage::StorageError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Invalid record type: {0}")]
    InvalidFilter(String),
    #[error("Invalid sorting: {0}")]
    InvalidSort(String),
    #[error("Invalid limit number: {0}")]
    InvalidLimit(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Nothing to update: {0}")]
    NoOp(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("Consistency violation: {0}")]
    Consistency(String),
    #[error("Engine misconfigured: {0}")]
    Misconfigured(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// True for errors caused by the request itself rather than by the
    /// service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidField(_)
                | Self::InvalidFilter(_)
                | Self::InvalidSort(_)
                | Self::InvalidLimit(_)
                | Self::UnsupportedMediaType(_)
                | Self::NoOp(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidField(a), Self::InvalidField(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::InvalidSort(a), Self::InvalidSort(b)) => a == b,
            (Self::InvalidLimit(a), Self::InvalidLimit(b)) => a == b,
            (Self::UnsupportedMediaType(a), Self::UnsupportedMediaType(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::NoOp(a), Self::NoOp(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Consistency(a), Self::Consistency(b)) => a == b,
            (Self::Misconfigured(a), Self::Misconfigured(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
