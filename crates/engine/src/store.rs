//! Relational access to the `records` table.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseConnection, DbErr, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};

use crate::{
    EngineError, ListQuery, Record, RecordFields, RecordKind, ResultEngine, diff::ChangeSet,
    records,
};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Aggregates over the whole ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Records dated within the current calendar month (UTC).
    pub count_this_month: u64,
    /// Sum of all amounts; 0 for an empty ledger.
    pub total_balance: i64,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    database: DatabaseConnection,
}

impl RecordStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub async fn list(&self, query: &ListQuery) -> ResultEngine<Vec<Record>> {
        let mut select = records::Entity::find();

        match query.kind {
            Some(RecordKind::In) => select = select.filter(records::Column::Amount.gte(0)),
            Some(RecordKind::Out) => select = select.filter(records::Column::Amount.lt(0)),
            None => {}
        }
        if let Some(sort) = query.sort {
            select = select.order_by(sort.column.column(), sort.direction.order());
        }
        // Tie-breaker keeps pages stable for equal sort keys.
        select = select.order_by_asc(records::Column::Id);
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        Ok(select
            .all(&self.database)
            .await?
            .into_iter()
            .map(Record::from)
            .collect())
    }

    /// Records whose name or notes contain `needle` (case-insensitive for
    /// ASCII, LIKE wildcards in `needle` match literally).
    pub async fn search(&self, needle: &str) -> ResultEngine<Vec<Record>> {
        let pattern = like_pattern(needle);
        let models = records::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Expr::col(records::Column::Name)
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(Expr::col(records::Column::Notes).like(LikeExpr::new(pattern).escape('\\'))),
            )
            .order_by_asc(records::Column::Id)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(Record::from).collect())
    }

    pub async fn get(&self, id: i64) -> ResultEngine<Record> {
        records::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Record::from)
            .ok_or_else(|| not_found(id))
    }

    pub async fn insert(&self, fields: &RecordFields, attachment: &str) -> ResultEngine<Record> {
        let model = records::ActiveModel::new_row(fields, attachment)
            .insert(&self.database)
            .await?;
        Ok(model.into())
    }

    /// Write only the columns present in `changes`.
    pub async fn update(&self, id: i64, changes: &ChangeSet) -> ResultEngine<Record> {
        if changes.is_empty() {
            return Err(EngineError::NoOp(format!(
                "no columns to update for record #{id}"
            )));
        }

        let mut active = records::ActiveModel {
            id: ActiveValue::Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            active.name = ActiveValue::Set(name.clone());
        }
        if let Some(amount) = changes.amount {
            active.amount = ActiveValue::Set(amount);
        }
        if let Some(date) = changes.date {
            active.date = ActiveValue::Set(date);
        }
        if let Some(notes) = &changes.notes {
            active.notes = ActiveValue::Set(notes.clone());
        }
        if let Some(attachment) = &changes.attachment {
            active.attachment = ActiveValue::Set(attachment.clone());
        }

        match active.update(&self.database).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => Err(not_found(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the row and return it as it was.
    pub async fn delete(&self, id: i64) -> ResultEngine<Record> {
        with_tx!(self, |db_tx| {
            match records::Entity::find_by_id(id).one(&db_tx).await? {
                None => Err(not_found(id)),
                Some(model) => {
                    let res = records::Entity::delete_by_id(id).exec(&db_tx).await?;
                    if res.rows_affected == 0 {
                        Err(not_found(id))
                    } else {
                        Ok(Record::from(model))
                    }
                }
            }
        })
    }

    /// Aggregate read; `now` decides which month counts as current.
    pub async fn summary(&self, now: DateTime<Utc>) -> ResultEngine<Summary> {
        let (month_start, next_month_start) = month_bounds(now)?;

        let count_this_month = records::Entity::find()
            .filter(records::Column::Date.gte(month_start))
            .filter(records::Column::Date.lt(next_month_start))
            .count(&self.database)
            .await?;

        let total_balance = records::Entity::find()
            .select_only()
            .column_as(records::Column::Amount.sum(), "balance")
            .into_tuple::<Option<i64>>()
            .one(&self.database)
            .await?
            .flatten()
            .unwrap_or(0);

        Ok(Summary {
            count_this_month,
            total_balance,
        })
    }
}

fn not_found(id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("record #{id}"))
}

fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn month_bounds(now: DateTime<Utc>) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let midnight = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    };

    match (midnight(now.year(), now.month()), midnight(next_year, next_month)) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(EngineError::InvalidField(format!(
            "cannot compute month bounds for {now}"
        ))),
    }
}
