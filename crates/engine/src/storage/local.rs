//! Local filesystem storage backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{StorageBackend, StorageError, StorageResult, ensure_plain_name, object_key};

/// Stores receipts as files in a single directory ("local bucket").
///
/// Locators are `<public_url>/<name>`, so the directory can be served
/// statically under `public_url`.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalDiskStorage {
    /// Open the bucket directory, creating it when missing.
    pub async fn init(
        root: impl Into<PathBuf>,
        public_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let root = root.into();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {
                tracing::info!("Use existing local storage bucket {}", root.display());
            }
            Ok(_) => {
                return Err(StorageError::Transient(format!(
                    "{} exists and is not a directory",
                    root.display()
                )));
            }
            Err(_) => {
                tracing::info!(
                    "Local storage bucket {} doesn't exist, creating one",
                    root.display()
                );
                fs::create_dir_all(&root).await?;
            }
        }

        Ok(Self {
            root,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locator(&self, name: &str) -> String {
        format!("{}/{}", self.public_url, name)
    }
}

#[async_trait]
impl StorageBackend for LocalDiskStorage {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, bytes: Vec<u8>, name: &str) -> StorageResult<String> {
        ensure_plain_name(name)?;
        let target = self.root.join(name);
        let partial = self.root.join(format!(".{name}.part"));

        // Written under a hidden name first so a failed write never leaves a
        // truncated blob under the final name.
        if let Err(err) = fs::write(&partial, &bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::Transient(format!(
                "failed to write {}: {err}",
                partial.display()
            )));
        }
        if let Err(err) = fs::rename(&partial, &target).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::Transient(format!(
                "failed to move blob into {}: {err}",
                target.display()
            )));
        }

        Ok(self.locator(name))
    }

    async fn delete(&self, locator: &str) -> StorageResult<()> {
        let Some(key) = object_key(locator) else {
            return Ok(());
        };
        ensure_plain_name(key)?;
        fs::remove_file(self.root.join(key)).await?;
        Ok(())
    }
}
