//! Blob storage for receipt images.
//!
//! A backend stores opaque bytes under a caller-chosen name and hands back a
//! locator (URL or path) that is persisted in the record row. Two variants
//! exist:
//! - [`LocalDiskStorage`]: a directory on the local filesystem
//! - [`CloudObjectStorage`]: a Google Cloud Storage bucket
//!
//! The variant is picked once at startup; the engine only sees
//! `Arc<dyn StorageBackend>`.

mod cloud;
mod local;
mod media;

pub use cloud::CloudObjectStorage;
pub use local::LocalDiskStorage;
pub use media::{MediaType, blob_name};

use async_trait::async_trait;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The blob does not exist. Callers deleting a blob treat this as done.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// The backend could not complete the call; the operation may be retried.
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("invalid blob name: {0}")]
    InvalidName(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Transient(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transient(err.to_string())
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Short backend identifier used in logs (e.g. "local", "cloud").
    fn kind(&self) -> &'static str;

    /// Write `bytes` as a blob named `name` and return its locator.
    ///
    /// Does not retry. On error no blob is left behind under `name`.
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> StorageResult<String>;

    /// Remove the blob referenced by `locator`.
    ///
    /// A missing blob is reported as [`StorageError::NotFound`].
    async fn delete(&self, locator: &str) -> StorageResult<()>;
}

/// Object key referenced by a locator: its last `/`-separated segment.
///
/// Locators without a separator (including the empty string) reference
/// nothing.
pub(crate) fn object_key(locator: &str) -> Option<&str> {
    let (_, key) = locator.rsplit_once('/')?;
    (!key.is_empty()).then_some(key)
}

/// Reject names that could escape the bucket or directory.
pub(crate) fn ensure_plain_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
