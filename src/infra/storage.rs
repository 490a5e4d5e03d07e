//! Blob storage client for uploaded files.
//!
//! Objects are written with a single authenticated `PUT {base}/{key}`.
//! The public URL of an object is the same address.

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Location of a stored object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<StoredObject>;
}

/// Blob storage reached over HTTP.
pub struct HttpBlobStorage {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBlobStorage {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// `None` when no storage URL is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .blob_storage_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.blob_storage_token().map(str::to_string)))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl BlobStorage for HttpBlobStorage {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<StoredObject> {
        let url = self.object_url(key);

        let mut request = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Blob storage request failed");
            AppError::Unavailable("File storage".to_string())
        })?;

        if !response.status().is_success() {
            tracing::error!(key = %key, status = %response.status(), "Blob storage rejected upload");
            return Err(AppError::Unavailable("File storage".to_string()));
        }

        tracing::debug!(key = %key, "Object stored");

        Ok(StoredObject {
            key: key.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_joins_base_and_key() {
        let storage = HttpBlobStorage::new("https://blobs.example.com/bucket/", None);
        assert_eq!(
            storage.object_url("uploads/u/f.png"),
            "https://blobs.example.com/bucket/uploads/u/f.png"
        );
    }

    #[test]
    fn storage_is_optional() {
        let config = Config::for_secrets("a-very-long-jwt-secret-for-tests-only", "whsec");
        assert!(HttpBlobStorage::from_config(&config).is_none());
    }
}
