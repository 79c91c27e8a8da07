//! Record API endpoints.

use api_types::record::{
    FieldChange, ListParams, Record, RecordDeleted, RecordUpdated, Summary,
};
use axum::{
    Json,
    extract::{
        Multipart, OriginalUri, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use engine::{CreateRecordCmd, EngineError, ListQuery, ReceiptUpload, RecordInput, UpdateRecordCmd};

use crate::{ServerError, server::ServerState};

fn record_view(record: engine::Record) -> Record {
    Record {
        id: record.id,
        name: record.name,
        amount: record.amount,
        date: record.date,
        notes: record.notes,
        attachment: record.attachment,
    }
}

fn records_view(records: Vec<engine::Record>) -> Vec<Record> {
    records.into_iter().map(record_view).collect()
}

/// Ids are digits only; anything else is not a record route at all.
fn parse_id(raw: &str, uri: &OriginalUri) -> Result<i64, ServerError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServerError::PathNotFound(uri.path().to_string()));
    }
    raw.parse::<i64>()
        .map_err(|_| EngineError::KeyNotFound(format!("record #{raw}")).into())
}

fn multipart_error(err: MultipartError, max_receipt_bytes: usize) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::ReceiptTooLarge(max_receipt_bytes)
    } else {
        err.into()
    }
}

/// Text fields and optional receipt of an add/edit form.
struct RecordForm {
    input: RecordInput,
    receipt: Option<ReceiptUpload>,
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_receipt_bytes: usize,
) -> Result<RecordForm, ServerError> {
    let mut multipart =
        multipart.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    let mut input = RecordInput::new();
    let mut receipt = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, max_receipt_bytes))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "receipt" => {
                let file_name = field.file_name().map(ToString::to_string);
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|err| multipart_error(err, max_receipt_bytes))?
                {
                    if bytes.len() + chunk.len() > max_receipt_bytes {
                        return Err(ServerError::ReceiptTooLarge(max_receipt_bytes));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    let mut upload = ReceiptUpload::new(bytes);
                    if let Some(file_name) = file_name {
                        upload = upload.file_name(file_name);
                    }
                    receipt = Some(upload);
                }
            }
            "name" | "amount" | "date" | "notes" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| multipart_error(err, max_receipt_bytes))?;
                match field_name.as_str() {
                    "name" => input.name = Some(value),
                    "amount" => input.amount = Some(value),
                    "date" => input.date = Some(value),
                    _ => input.notes = Some(value),
                }
            }
            other => tracing::debug!("ignoring unknown form field '{other}'"),
        }
    }

    Ok(RecordForm { input, receipt })
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ServerError> {
    let query = ListQuery::parse(
        params.kind.as_deref(),
        params.order_by.as_deref(),
        params.limit.as_deref(),
    )?;
    let records = state.engine.list(&query).await?;
    Ok(Json(records_view(records)))
}

pub async fn summary(State(state): State<ServerState>) -> Result<Json<Summary>, ServerError> {
    let summary = state.engine.summary().await?;
    Ok(Json(Summary {
        number_of_records: summary.count_this_month,
        balance: summary.total_balance,
    }))
}

pub async fn search(
    State(state): State<ServerState>,
    Path(q): Path<String>,
) -> Result<Json<Vec<Record>>, ServerError> {
    let records = state.engine.search(&q).await?;
    Ok(Json(records_view(records)))
}

pub async fn get(
    State(state): State<ServerState>,
    uri: OriginalUri,
    Path(raw_id): Path<String>,
) -> Result<Json<Record>, ServerError> {
    let id = parse_id(&raw_id, &uri)?;
    let record = state.engine.record(id).await?;
    Ok(Json(record_view(record)))
}

pub async fn delete(
    State(state): State<ServerState>,
    uri: OriginalUri,
    Path(raw_id): Path<String>,
) -> Result<Json<RecordDeleted>, ServerError> {
    let id = parse_id(&raw_id, &uri)?;
    let deleted = state.engine.delete_record(id).await?;
    tracing::info!("Record #{id} deleted");
    Ok(Json(RecordDeleted {
        message: format!("Record #{id} is successfully deleted"),
        deleted: record_view(deleted),
    }))
}

pub async fn add(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let form = read_form(multipart, state.max_receipt_bytes).await?;
    let mut cmd = CreateRecordCmd::new(form.input);
    if let Some(receipt) = form.receipt {
        cmd = cmd.receipt(receipt);
    }

    let record = state.engine.create_record(cmd).await?;
    tracing::info!("Record #{} inserted", record.id);
    Ok((StatusCode::CREATED, Json(record_view(record))))
}

pub async fn edit(
    State(state): State<ServerState>,
    uri: OriginalUri,
    Path(raw_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecordUpdated>, ServerError> {
    let id = parse_id(&raw_id, &uri)?;
    let form = read_form(multipart, state.max_receipt_bytes).await?;
    let mut cmd = UpdateRecordCmd::new(id, form.input);
    if let Some(receipt) = form.receipt {
        cmd = cmd.receipt(receipt);
    }

    let outcome = state.engine.update_record(cmd).await?;
    tracing::info!("Record #{id} updated");
    Ok(Json(RecordUpdated {
        message: format!("Record #{id} is successfully updated"),
        updated: outcome
            .changes
            .into_iter()
            .map(|(field, change)| {
                (
                    field,
                    FieldChange {
                        old: change.old,
                        new: change.new,
                    },
                )
            })
            .collect(),
        warning: outcome.warning,
    }))
}
