//! File upload handler (fulfillment proofs, product images).

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Extension, Router,
};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::config::{UPLOAD_FIELD_NAME, UPLOAD_FRAMING_ALLOWANCE};
use crate::domain::CurrentUser;
use crate::errors::{AppError, AppResult};
use crate::services::UploadedFile;
use crate::types::Created;

/// Multipart form accepted by the upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/", post(upload_file))
}

/// Request body limit for the upload routes. The multipart framing gets its
/// own allowance; the file size itself is checked by the upload service.
pub fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_bytes.saturating_add(UPLOAD_FRAMING_ALLOWANCE))
}

/// Store a file and return its public URL
#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "Uploads",
    security(("bearer_auth" = [])),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadedFile),
        (status = 400, description = "Missing, empty or unsupported file"),
        (status = 413, description = "File too large"),
        (status = 503, description = "File storage not configured")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Created<UploadedFile>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let stored = state
            .services
            .uploads()
            .upload(current_user.id, file_name, content_type, bytes.to_vec())
            .await?;
        return Ok(Created(stored));
    }

    Err(AppError::bad_request(format!(
        "Multipart field '{}' is required",
        UPLOAD_FIELD_NAME
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::bad_request(err.body_text())
    }
}
