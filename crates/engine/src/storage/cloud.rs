//! Google Cloud Storage backend (JSON API).

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use std::time::Duration;

use super::{StorageBackend, StorageError, StorageResult, ensure_plain_name, object_key};

/// Public GCS endpoint, used both for API calls and for blob locators.
pub const GCS_API_URL: &str = "https://storage.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stores receipts as objects in a GCS bucket.
///
/// Locators are `<api_url>/<bucket>/<name>`, the public object URL.
#[derive(Debug, Clone)]
pub struct CloudObjectStorage {
    client: Client,
    api_url: String,
    bucket: String,
    token: String,
}

impl CloudObjectStorage {
    pub fn new(bucket: impl Into<String>, token: impl Into<String>) -> StorageResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: GCS_API_URL.to_string(),
            bucket: bucket.into(),
            token: token.into(),
        })
    }

    /// Point the backend at another endpoint (emulators, tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, segments: &[&str]) -> StorageResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|err| StorageError::Transient(format!("invalid api url: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| StorageError::Transient("api url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn locator(&self, name: &str) -> String {
        format!("{}/{}/{}", self.api_url, self.bucket, name)
    }
}

#[async_trait]
impl StorageBackend for CloudObjectStorage {
    fn kind(&self) -> &'static str {
        "cloud"
    }

    async fn upload(&self, bytes: Vec<u8>, name: &str) -> StorageResult<String> {
        ensure_plain_name(name)?;
        let url = self.url(&["upload", "storage", "v1", "b", &self.bucket, "o"])?;

        let resp = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", name)])
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::Transient(format!(
                "upload of {name} to bucket {} failed with {status}",
                self.bucket
            )));
        }

        Ok(self.locator(name))
    }

    async fn delete(&self, locator: &str) -> StorageResult<()> {
        let Some(key) = object_key(locator) else {
            return Ok(());
        };
        let url = self.url(&["storage", "v1", "b", &self.bucket, "o", key])?;

        let resp = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Transient(format!(
                "delete of {key} from bucket {} failed with {status}",
                self.bucket
            ))),
        }
    }
}
