use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;

pub use server::{
    DEFAULT_MAX_RECEIPT_BYTES, ServedReceipts, ServerOptions, ServerState, app, run_with_listener,
    spawn_with_listener,
};

mod ping;
mod records;
mod server;

pub mod types {
    pub mod record {
        pub use api_types::record::{
            FieldChange, ListParams, Record, RecordDeleted, RecordUpdated, Summary,
        };
    }

    pub mod ping {
        pub use api_types::ping::Pong;
    }

    pub mod error {
        pub use api_types::error::ErrorBody;
    }
}

use types::error::ErrorBody;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request that never reached the engine.
    Generic(String),
    /// The receipt exceeded the configured limit (in bytes).
    ReceiptTooLarge(usize),
    PathNotFound(String),
}

/// Attached to every error response so the detail layer can expose the
/// underlying failure outside production.
#[derive(Clone, Debug)]
pub(crate) struct ErrorReport {
    pub(crate) status: StatusCode,
    pub(crate) body: ErrorBody,
    pub(crate) detail: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Storage(_)
        | EngineError::Consistency(_)
        | EngineError::Misconfigured(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidField(_)
        | EngineError::InvalidFilter(_)
        | EngineError::InvalidSort(_)
        | EngineError::InvalidLimit(_)
        | EngineError::UnsupportedMediaType(_)
        | EngineError::NoOp(_) => StatusCode::BAD_REQUEST,
    }
}

fn code_for_engine_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::InvalidField(_) => "INVALID_FIELD",
        EngineError::InvalidFilter(_) => "INVALID_TYPE",
        EngineError::InvalidSort(_) => "INVALID_SORT",
        EngineError::InvalidLimit(_) => "INVALID_LIMIT",
        EngineError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
        EngineError::NoOp(_) => "NO_CHANGES",
        EngineError::KeyNotFound(_) => "ID404",
        EngineError::Storage(_) => "STORAGE_FAILURE",
        EngineError::Consistency(_) => "CONSISTENCY_VIOLATION",
        EngineError::Misconfigured(_) | EngineError::Database(_) => "INTERNAL",
    }
}

fn message_for_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Consistency(msg) => {
            tracing::error!("consistency violation: {msg}");
            err.to_string()
        }
        EngineError::Storage(storage_err) => {
            tracing::error!("storage error: {storage_err}");
            err.to_string()
        }
        EngineError::KeyNotFound(key) => format!("{key} is not found"),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::Engine(err) => (
                status_for_engine_error(err),
                code_for_engine_error(err),
                message_for_engine_error(err),
            ),
            ServerError::Generic(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ServerError::ReceiptTooLarge(limit) => (
                StatusCode::BAD_REQUEST,
                "FILE_TOO_LARGE",
                format!("receipt exceeds the limit of {limit} bytes"),
            ),
            ServerError::PathNotFound(path) => (
                StatusCode::NOT_FOUND,
                "PATH404",
                format!("Path '{path}' is not found"),
            ),
        };

        let body = ErrorBody {
            error: true,
            code: code.to_string(),
            message,
            detail: None,
        };
        let report = ErrorReport {
            status,
            body: body.clone(),
            detail: format!("{self:?}"),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<MultipartError> for ServerError {
    fn from(value: MultipartError) -> Self {
        Self::Generic(format!("invalid multipart body: {}", value.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use engine::StorageError;

    use super::*;

    fn code_of(res: &Response) -> String {
        res.extensions()
            .get::<ErrorReport>()
            .map(|report| report.body.code.clone())
            .unwrap()
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res =
            ServerError::from(EngineError::KeyNotFound("record #3".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(code_of(&res), "ID404");
    }

    #[test]
    fn engine_validation_maps_to_400() {
        for err in [
            EngineError::InvalidField("x".to_string()),
            EngineError::InvalidFilter("x".to_string()),
            EngineError::InvalidSort("x".to_string()),
            EngineError::InvalidLimit("x".to_string()),
            EngineError::UnsupportedMediaType("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn no_op_is_reported_as_no_changes() {
        let res = ServerError::from(EngineError::NoOp("same".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(code_of(&res), "NO_CHANGES");
    }

    #[test]
    fn storage_and_consistency_map_to_500() {
        let res = ServerError::from(EngineError::Storage(StorageError::Transient(
            "down".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = ServerError::from(EngineError::Consistency("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code_of(&res), "CONSISTENCY_VIOLATION");
    }

    #[test]
    fn database_message_is_masked() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("secret table".to_string()));
        let res = ServerError::from(err).into_response();
        let report = res.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(report.body.message, "internal server error");
        assert!(report.detail.contains("secret table"));
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_path_maps_to_path404() {
        let res = ServerError::PathNotFound("/nope".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(code_of(&res), "PATH404");
    }
}
