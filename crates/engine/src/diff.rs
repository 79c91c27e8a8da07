//! Field-level diff between a stored record and requested values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{EngineError, Record, RecordFields, ResultEngine};

/// Old and new value of one changed field, as reported to the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Columns to write; `None` leaves the column untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
    pub attachment: Option<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.notes.is_none()
            && self.attachment.is_none()
    }
}

/// Minimal update for a record plus the audit report of what changes.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDiff {
    changes: ChangeSet,
    report: BTreeMap<String, FieldChange>,
    previous_attachment: String,
}

impl RecordDiff {
    /// Compare `existing` with `fields`.
    ///
    /// `replaces_attachment` tells whether a new receipt accompanies the
    /// request; the new locator is filled in by [`RecordDiff::stage_attachment`]
    /// once the blob is written. Fails with `NoOp` when nothing would change.
    pub fn compute(
        existing: &Record,
        fields: &RecordFields,
        replaces_attachment: bool,
    ) -> ResultEngine<Self> {
        let mut changes = ChangeSet::default();
        let mut report = BTreeMap::new();

        if existing.name != fields.name {
            report.insert(
                "name".to_string(),
                FieldChange {
                    old: json!(existing.name),
                    new: json!(fields.name),
                },
            );
            changes.name = Some(fields.name.clone());
        }
        if existing.amount != fields.amount {
            report.insert(
                "amount".to_string(),
                FieldChange {
                    old: json!(existing.amount),
                    new: json!(fields.amount),
                },
            );
            changes.amount = Some(fields.amount);
        }
        if existing.date != fields.date {
            report.insert(
                "date".to_string(),
                FieldChange {
                    old: json!(existing.date),
                    new: json!(fields.date),
                },
            );
            changes.date = Some(fields.date);
        }
        if existing.notes != fields.notes {
            report.insert(
                "notes".to_string(),
                FieldChange {
                    old: json!(existing.notes),
                    new: json!(fields.notes),
                },
            );
            changes.notes = Some(fields.notes.clone());
        }

        if report.is_empty() && !replaces_attachment {
            return Err(EngineError::NoOp(format!(
                "record #{} already has these values",
                existing.id
            )));
        }

        Ok(Self {
            changes,
            report,
            previous_attachment: existing.attachment.clone(),
        })
    }

    /// Record the locator of the newly written receipt.
    pub(crate) fn stage_attachment(&mut self, locator: String) {
        self.report.insert(
            "attachment".to_string(),
            FieldChange {
                old: json!(self.previous_attachment),
                new: json!(locator),
            },
        );
        self.changes.attachment = Some(locator);
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn report(&self) -> &BTreeMap<String, FieldChange> {
        &self.report
    }

    pub fn into_report(self) -> BTreeMap<String, FieldChange> {
        self.report
    }

    /// Locator to delete once the row update is committed: the previous
    /// receipt, when the attachment is being replaced.
    pub fn replaced_attachment(&self) -> Option<&str> {
        self.changes
            .attachment
            .as_ref()
            .filter(|new| **new != self.previous_attachment)
            .map(|_| self.previous_attachment.as_str())
            .filter(|previous| !previous.is_empty())
    }
}
