use crate::{EngineError, Record, ResultEngine};

use super::{Engine, MutationStage};

impl Engine {
    /// Delete a record and its receipt.
    ///
    /// The receipt goes first; if removing it fails the row is kept and the
    /// storage error is returned. A row that was found but could not be
    /// deleted afterwards is reported as a consistency violation.
    pub async fn delete_record(&self, id: i64) -> ResultEngine<Record> {
        let existing = self.store.get(id).await?;
        tracing::debug!(id, "delete: {}", MutationStage::Start);

        if existing.has_attachment() {
            self.remove_blob(&existing.attachment).await?;
            tracing::debug!(id, "delete: {}", MutationStage::BlobReconciled);
        }

        match self.store.delete(id).await {
            Ok(record) => {
                tracing::debug!(id, "delete: {}", MutationStage::RowCommitted);
                Ok(record)
            }
            Err(EngineError::KeyNotFound(_)) => {
                tracing::error!(
                    id,
                    locator = %existing.attachment,
                    "record row was not deleted after the receipt step"
                );
                Err(EngineError::Consistency(format!(
                    "record #{id} was found but no row was deleted (receipt: '{}')",
                    existing.attachment
                )))
            }
            Err(err) => Err(err),
        }
    }
}
