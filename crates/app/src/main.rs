use std::{path::PathBuf, sync::Arc};

use engine::{CloudObjectStorage, LocalDiskStorage, StorageBackend};
use migration::{Migrator, MigratorTrait};
use server::{DEFAULT_MAX_RECEIPT_BYTES, ServedReceipts, ServerOptions};
use settings::{Database, Mode, Storage};

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerbook={level},server={level},engine={level},migration={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("Starting in {:?} mode", settings.app.mode);
    let server = settings.server;

    let db = parse_database(&server.database).await.inspect_err(|err| {
        tracing::error!("failed to initialize database: {err}");
    })?;
    let (storage, receipts) = parse_storage(&settings.storage).await.inspect_err(|err| {
        tracing::error!("failed to initialize receipt storage: {err}");
    })?;

    let engine = engine::Engine::builder()
        .database(db)
        .storage(storage)
        .build()
        .await?;

    let options = ServerOptions {
        expose_detail: settings.app.mode != Mode::Production,
        max_receipt_bytes: server.max_receipt_bytes.unwrap_or(DEFAULT_MAX_RECEIPT_BYTES),
        receipts,
    };

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await.inspect_err(|err| {
        tracing::error!("failed to bind server listener: {err}");
    })?;

    server::run_with_listener(engine, options, listener).await?;
    Ok(())
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

async fn parse_storage(
    config: &Storage,
) -> Result<(Arc<dyn StorageBackend>, Option<ServedReceipts>), BoxError> {
    match config {
        Storage::Local {
            path,
            public_url,
            mount,
        } => {
            let storage = LocalDiskStorage::init(PathBuf::from(path), public_url.as_str()).await?;
            let receipts = match mount.as_deref().map(|m| m.trim_end_matches('/')) {
                Some("") => return Err("storage.mount must not be the root path".into()),
                Some(mount) => Some(ServedReceipts {
                    mount: mount.to_string(),
                    dir: storage.root().to_path_buf(),
                }),
                None => None,
            };
            let storage: Arc<dyn StorageBackend> = Arc::new(storage);
            Ok((storage, receipts))
        }
        Storage::Cloud {
            bucket,
            token,
            api_url,
        } => {
            let mut storage = CloudObjectStorage::new(bucket.as_str(), token.as_str())?;
            if let Some(api_url) = api_url {
                storage = storage.with_api_url(api_url.as_str());
            }
            tracing::info!("Using cloud storage bucket {bucket}");
            let storage: Arc<dyn StorageBackend> = Arc::new(storage);
            Ok((storage, None))
        }
    }
}
