use crate::{CreateRecordCmd, Record, ResultEngine};

use super::{Engine, MutationStage};

impl Engine {
    /// Create a record, storing its receipt first when one is supplied.
    ///
    /// Fields and media type are validated before any I/O. If the row insert
    /// fails after the receipt was written, the receipt is removed again
    /// (best effort) and the insert error is returned.
    pub async fn create_record(&self, cmd: CreateRecordCmd) -> ResultEngine<Record> {
        let fields = cmd.fields.validate()?;
        let receipt = cmd.receipt.map(|receipt| receipt.prepare()).transpose()?;
        tracing::debug!(name = %fields.name, "create: {}", MutationStage::Start);

        let locator = match receipt {
            Some(receipt) => Some(self.stage_receipt(receipt).await?),
            None => None,
        };

        let record = match self
            .store
            .insert(&fields, locator.as_deref().unwrap_or_default())
            .await
        {
            Ok(record) => record,
            Err(err) => {
                if let Some(locator) = &locator {
                    self.discard_staged(locator).await;
                }
                return Err(err);
            }
        };

        tracing::debug!(id = record.id, "create: {}", MutationStage::RowCommitted);
        Ok(record)
    }
}
