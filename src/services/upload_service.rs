//! File uploads (product images, fulfillment proof).

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::infra::BlobStorage;

/// Stored upload
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UploadedFile {
    #[schema(example = "https://files.example.com/uploads/3f2a.../9c1b....png")]
    pub url: String,
    pub key: String,
    pub size: usize,
    #[schema(example = "image/png")]
    pub content_type: String,
}

#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(
        &self,
        user_id: Uuid,
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> AppResult<UploadedFile>;
}

pub struct UploadManager {
    storage: Option<Arc<dyn BlobStorage>>,
    max_bytes: usize,
}

impl UploadManager {
    /// `storage = None` disables uploads.
    pub fn new(storage: Option<Arc<dyn BlobStorage>>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }
}

fn is_allowed(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/pdf"
}

/// File extension for the stored key. Taken from the accepted content type
/// only; the client's file name never reaches the key.
fn extension(content_type: &str) -> &str {
    match content_type {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/svg+xml" => "svg",
        other => other
            .strip_prefix("image/")
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}

#[async_trait]
impl UploadService for UploadManager {
    async fn upload(
        &self,
        user_id: Uuid,
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> AppResult<UploadedFile> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| AppError::Unavailable("File storage".to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::bad_request("File is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge);
        }
        let content_type = content_type
            .map(|ct| ct.to_ascii_lowercase())
            .filter(|ct| is_allowed(ct))
            .ok_or_else(|| AppError::bad_request("Only images and PDF files can be uploaded"))?;

        let key = format!(
            "uploads/{}/{}.{}",
            user_id,
            Uuid::new_v4(),
            extension(&content_type)
        );
        let size = bytes.len();
        let stored = storage.put(&key, &content_type, bytes).await?;

        tracing::info!(
            user_id = %user_id,
            key = %stored.key,
            original_name = ?file_name,
            size,
            "File uploaded"
        );
        Ok(UploadedFile {
            url: stored.url,
            key: stored.key,
            size,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockBlobStorage, StoredObject};

    fn manager(storage: MockBlobStorage) -> UploadManager {
        UploadManager::new(Some(Arc::new(storage)), 16)
    }

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension("application/pdf"), "pdf");
        assert_eq!(extension("image/jpeg"), "jpg");
        assert_eq!(extension("image/webp"), "webp");
        assert_eq!(extension("image/x-icon"), "bin");
    }

    fn echo_key(storage: &mut MockBlobStorage, suffix: &'static str) {
        storage
            .expect_put()
            .withf(move |key, _, _| key.ends_with(suffix))
            .times(1)
            .returning(|key, _, _| {
                Ok(StoredObject {
                    key: key.to_string(),
                    url: format!("https://files.test/{}", key),
                })
            });
    }

    #[tokio::test]
    async fn client_file_name_does_not_pick_the_extension() {
        let mut storage = MockBlobStorage::new();
        echo_key(&mut storage, ".png");
        let file = manager(storage)
            .upload(Uuid::new_v4(), Some("evil.html".into()), Some("image/png".into()), vec![1])
            .await
            .unwrap();
        assert!(file.key.ends_with(".png"));

        let mut storage = MockBlobStorage::new();
        echo_key(&mut storage, ".pdf");
        let file = manager(storage)
            .upload(Uuid::new_v4(), Some("x.exe".into()), Some("application/pdf".into()), vec![1])
            .await
            .unwrap();
        assert!(file.key.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn accepts_file_of_exactly_the_limit() {
        let mut storage = MockBlobStorage::new();
        echo_key(&mut storage, ".png");
        let file = manager(storage)
            .upload(Uuid::new_v4(), None, Some("image/png".into()), vec![0; 16])
            .await
            .unwrap();
        assert_eq!(file.size, 16);
    }

    #[tokio::test]
    async fn stores_images_under_the_user_prefix() {
        let user_id = Uuid::new_v4();
        let mut storage = MockBlobStorage::new();
        storage
            .expect_put()
            .withf(move |key, ct, bytes| {
                key.starts_with(&format!("uploads/{}/", user_id))
                    && key.ends_with(".png")
                    && ct == "image/png"
                    && bytes.len() == 3
            })
            .times(1)
            .returning(|key, _, _| {
                Ok(StoredObject {
                    key: key.to_string(),
                    url: format!("https://files.test/{}", key),
                })
            });

        let file = manager(storage)
            .upload(user_id, Some("a.png".into()), Some("image/png".into()), vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(file.size, 3);
        assert_eq!(file.content_type, "image/png");
        assert!(file.url.ends_with(&file.key));
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let mut storage = MockBlobStorage::new();
        storage.expect_put().never();

        let result = manager(storage)
            .upload(Uuid::new_v4(), None, Some("image/png".into()), vec![0; 17])
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge)));
    }

    #[tokio::test]
    async fn rejects_other_content_types() {
        let mut storage = MockBlobStorage::new();
        storage.expect_put().never();

        let result = manager(storage)
            .upload(Uuid::new_v4(), None, Some("text/html".into()), vec![1])
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn unavailable_without_storage() {
        let result = UploadManager::new(None, 16)
            .upload(Uuid::new_v4(), None, Some("image/png".into()), vec![1])
            .await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }
}
