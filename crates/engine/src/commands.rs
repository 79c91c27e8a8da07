//! Command structs for engine write operations.
//!
//! Field values arrive as raw text (the way a form submits them) and are
//! validated by the engine before any storage or database I/O.

use crate::{
    RecordFields, ResultEngine,
    storage::MediaType,
    util::{normalize_optional_text, normalize_required_text, parse_amount, parse_date},
};

/// Raw field values of a create or update request.
#[derive(Clone, Debug, Default)]
pub struct RecordInput {
    pub name: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl RecordInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: impl ToString) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks required fields (name, amount, date) and normalizes all of them.
    pub(crate) fn validate(&self) -> ResultEngine<RecordFields> {
        Ok(RecordFields {
            name: normalize_required_text(self.name.as_deref(), "name")?,
            amount: parse_amount(self.amount.as_deref())?,
            date: parse_date(self.date.as_deref())?,
            notes: normalize_optional_text(self.notes.as_deref()),
        })
    }
}

/// A receipt image received with a request.
#[derive(Clone, Debug)]
pub struct ReceiptUpload {
    pub bytes: Vec<u8>,
    /// File name reported by the client, used only in error messages.
    pub file_name: Option<String>,
}

impl ReceiptUpload {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: None,
        }
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Detects the media type, rejecting anything outside the allow-list.
    pub(crate) fn prepare(self) -> ResultEngine<PreparedReceipt> {
        let media = MediaType::detect(&self.bytes, self.file_name.as_deref())?;
        Ok(PreparedReceipt {
            bytes: self.bytes,
            media,
        })
    }
}

/// A receipt that passed media validation and may be written to storage.
#[derive(Debug)]
pub(crate) struct PreparedReceipt {
    pub(crate) bytes: Vec<u8>,
    pub(crate) media: MediaType,
}

/// Create a record, optionally with a receipt.
#[derive(Clone, Debug)]
pub struct CreateRecordCmd {
    pub fields: RecordInput,
    pub receipt: Option<ReceiptUpload>,
}

impl CreateRecordCmd {
    #[must_use]
    pub fn new(fields: RecordInput) -> Self {
        Self {
            fields,
            receipt: None,
        }
    }

    #[must_use]
    pub fn receipt(mut self, receipt: ReceiptUpload) -> Self {
        self.receipt = Some(receipt);
        self
    }
}

/// Replace the fields of an existing record.
///
/// Name, amount and date are required; absent notes clear the stored notes.
/// Without a receipt the current attachment is kept.
#[derive(Clone, Debug)]
pub struct UpdateRecordCmd {
    pub id: i64,
    pub fields: RecordInput,
    pub receipt: Option<ReceiptUpload>,
}

impl UpdateRecordCmd {
    #[must_use]
    pub fn new(id: i64, fields: RecordInput) -> Self {
        Self {
            id,
            fields,
            receipt: None,
        }
    }

    #[must_use]
    pub fn receipt(mut self, receipt: ReceiptUpload) -> Self {
        self.receipt = Some(receipt);
        self
    }
}
