//! Record operations.
//!
//! Mutations that touch both the database row and the receipt blob follow
//! the same progression, logged at debug level as they advance:
//!
//! `START -> BLOB_STAGED -> ROW_COMMITTED -> BLOB_RECONCILED`
//!
//! A row never references a blob that was not written, and a blob is only
//! removed once no committed row points at it anymore (plain deletes excepted).

use std::{fmt, sync::Arc};

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::{
    EngineError, RecordStore, ResultEngine,
    commands::PreparedReceipt,
    storage::{StorageBackend, StorageError, blob_name},
};

mod create;
mod delete;
mod read;
mod update;

pub use update::UpdateOutcome;

/// Where a mutation stands with respect to the row and the blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStage {
    Start,
    BlobStaged,
    RowCommitted,
    BlobReconciled,
}

impl fmt::Display for MutationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Start => "START",
            Self::BlobStaged => "BLOB_STAGED",
            Self::RowCommitted => "ROW_COMMITTED",
            Self::BlobReconciled => "BLOB_RECONCILED",
        };
        f.write_str(stage)
    }
}

#[derive(Debug)]
pub struct Engine {
    store: RecordStore,
    storage: Arc<dyn StorageBackend>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Write a validated receipt under a fresh name and return its locator.
    async fn stage_receipt(&self, receipt: PreparedReceipt) -> ResultEngine<String> {
        let name = blob_name(Utc::now(), receipt.media);
        let locator = self.storage.upload(receipt.bytes, &name).await?;
        tracing::debug!(
            backend = self.storage.kind(),
            %locator,
            "{}",
            MutationStage::BlobStaged
        );
        Ok(locator)
    }

    /// Best-effort removal of a blob whose row write failed.
    async fn discard_staged(&self, locator: &str) {
        if let Err(err) = self.remove_blob(locator).await {
            tracing::warn!(%locator, "failed to remove orphaned receipt: {err}");
        }
    }

    /// Delete a blob; a blob that is already gone counts as removed.
    async fn remove_blob(&self, locator: &str) -> Result<(), StorageError> {
        match self.storage.delete(locator).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(key)) => {
                tracing::debug!(%key, "receipt already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the receipt storage backend
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> EngineBuilder {
        self.storage = Some(storage);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let storage = self.storage.ok_or_else(|| {
            EngineError::Misconfigured("a receipt storage backend is required".to_string())
        })?;
        tracing::info!("Engine ready with {} receipt storage", storage.kind());

        Ok(Engine {
            store: RecordStore::new(self.database),
            storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_render_as_upper_snake_case() {
        assert_eq!(MutationStage::Start.to_string(), "START");
        assert_eq!(MutationStage::BlobStaged.to_string(), "BLOB_STAGED");
        assert_eq!(MutationStage::RowCommitted.to_string(), "ROW_COMMITTED");
        assert_eq!(MutationStage::BlobReconciled.to_string(), "BLOB_RECONCILED");
    }

    #[tokio::test]
    async fn build_without_storage_is_misconfigured() {
        let err = Engine::builder().build().await.unwrap_err();
        assert!(matches!(err, EngineError::Misconfigured(_)));
    }
}
