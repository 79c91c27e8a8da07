use std::collections::BTreeMap;

use crate::{FieldChange, Record, RecordDiff, ResultEngine, UpdateRecordCmd};

use super::{Engine, MutationStage};

/// Result of a successful update.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOutcome {
    /// The row as stored after the update.
    pub record: Record,
    /// `{old, new}` for every field that changed, keyed by field name.
    pub changes: BTreeMap<String, FieldChange>,
    /// Set when the replaced receipt could not be removed.
    pub warning: Option<String>,
}

impl Engine {
    /// Replace the fields of a record, and its receipt when one is supplied.
    ///
    /// The new receipt is written before the row is touched; a failed row
    /// update removes it again. Once the row is committed, the receipt it no
    /// longer references is deleted. Failing that last step does not fail the
    /// update, it is returned as a warning.
    pub async fn update_record(&self, cmd: UpdateRecordCmd) -> ResultEngine<UpdateOutcome> {
        let existing = self.store.get(cmd.id).await?;
        let fields = cmd.fields.validate()?;
        let receipt = cmd.receipt.map(|receipt| receipt.prepare()).transpose()?;
        let mut diff = RecordDiff::compute(&existing, &fields, receipt.is_some())?;
        tracing::debug!(id = cmd.id, "update: {}", MutationStage::Start);

        let staged = match receipt {
            Some(receipt) => {
                let locator = self.stage_receipt(receipt).await?;
                diff.stage_attachment(locator.clone());
                Some(locator)
            }
            None => None,
        };

        let record = match self.store.update(cmd.id, diff.changes()).await {
            Ok(record) => record,
            Err(err) => {
                if let Some(locator) = &staged {
                    self.discard_staged(locator).await;
                }
                return Err(err);
            }
        };
        tracing::debug!(id = record.id, "update: {}", MutationStage::RowCommitted);

        let mut warning = None;
        if let Some(previous) = diff.replaced_attachment() {
            match self.remove_blob(previous).await {
                Ok(()) => {
                    tracing::debug!(id = record.id, "update: {}", MutationStage::BlobReconciled);
                }
                Err(err) => {
                    tracing::warn!(
                        id = record.id,
                        locator = previous,
                        "failed to remove replaced receipt: {err}"
                    );
                    warning = Some(format!(
                        "record updated, but the previous receipt {previous} could not be removed: {err}"
                    ));
                }
            }
        }

        Ok(UpdateOutcome {
            record,
            changes: diff.into_report(),
            warning,
        })
    }
}
