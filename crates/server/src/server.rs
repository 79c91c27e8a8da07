use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use crate::{ErrorReport, ServerError, ping, records};
use engine::Engine;

/// Room left in the request body for the text fields next to the receipt.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub const DEFAULT_MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub max_receipt_bytes: usize,
}

/// Local receipts directory exposed over HTTP.
#[derive(Clone, Debug)]
pub struct ServedReceipts {
    /// Route prefix, e.g. `/receipts`.
    pub mount: String,
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Add the debug rendering of failures to error bodies.
    pub expose_detail: bool,
    pub max_receipt_bytes: usize,
    pub receipts: Option<ServedReceipts>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            expose_detail: true,
            max_receipt_bytes: DEFAULT_MAX_RECEIPT_BYTES,
            receipts: None,
        }
    }
}

async fn not_found(uri: Uri) -> ServerError {
    ServerError::PathNotFound(uri.path().to_string())
}

/// Fill in `detail` on error bodies when the service does not run in
/// production.
async fn error_detail(State(expose_detail): State<bool>, response: Response) -> Response {
    if !expose_detail {
        return response;
    }
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let mut body = report.body.clone();
    body.detail = Some(report.detail.clone());
    let mut response = (report.status, Json(body)).into_response();
    response.extensions_mut().insert(report);
    response
}

/// Build the HTTP application around `engine`.
pub fn app(engine: Engine, options: ServerOptions) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        max_receipt_bytes: options.max_receipt_bytes,
    };

    let record = Router::new()
        .route("/list", get(records::list))
        .route("/summary", get(records::summary))
        .route("/search/{q}", get(records::search))
        .route("/add", post(records::add))
        .route("/edit/{id}", put(records::edit))
        .route("/{id}", get(records::get).delete(records::delete))
        .layer(DefaultBodyLimit::max(
            options.max_receipt_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ));

    let mut router = Router::new()
        .route("/ping", get(ping::ping))
        .nest("/record", record);

    if let Some(receipts) = options.receipts {
        tracing::info!(
            "Serving receipts from {} under {}",
            receipts.dir.display(),
            receipts.mount
        );
        router = router.nest_service(&receipts.mount, ServeDir::new(receipts.dir));
    }

    router
        .fallback(not_found)
        .layer(middleware::map_response_with_state(
            options.expose_detail,
            error_detail,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app(engine, options).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

pub fn spawn_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, options, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
