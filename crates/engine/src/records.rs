//! Record primitives.
//!
//! A `Record` is one ledger entry: a labeled signed amount on a date, with
//! optional notes and an optional receipt locator.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    /// Minor units; negative values are outflows.
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    /// Locator of the receipt blob, empty when the record has none.
    pub attachment: String,
}

impl Record {
    pub fn has_attachment(&self) -> bool {
        !self.attachment.is_empty()
    }
}

/// Validated, normalized field values of a record (everything but `id` and
/// `attachment`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFields {
    pub name: String,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub amount: i64,
    pub date: DateTimeUtc,
    pub notes: Option<String>,
    pub attachment: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Insert model for a new row; `id` is left to the database.
    pub(crate) fn new_row(fields: &RecordFields, attachment: &str) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(fields.name.clone()),
            amount: ActiveValue::Set(fields.amount),
            date: ActiveValue::Set(fields.date),
            notes: ActiveValue::Set(fields.notes.clone()),
            attachment: ActiveValue::Set(attachment.to_string()),
        }
    }
}

impl From<Model> for Record {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            amount: model.amount,
            date: model.date,
            notes: model.notes,
            attachment: model.attachment,
        }
    }
}
