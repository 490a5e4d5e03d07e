//! The one error type every layer returns, and its JSON rendering:
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Account is suspended")]
    AccountSuspended,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Business rules
    #[error("Cannot {action} an order that is {from}")]
    InvalidTransition { from: String, action: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    error: Payload<'a>,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    code: &'a str,
    message: String,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        AppError::InsufficientStock(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// HTTP status and machine-readable code, in one table.
    fn classify(&self) -> (StatusCode, &'static str) {
        use AppError::*;

        match self {
            Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Jwt(_) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AccountSuspended => (StatusCode::FORBIDDEN, "ACCOUNT_SUSPENDED"),
            NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            InsufficientStock(_) => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
            Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            InvalidSignature => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn code(&self) -> &'static str {
        self.classify().1
    }

    pub fn status(&self) -> StatusCode {
        self.classify().0
    }

    /// Text sent to the client. Server-side failures are logged here and
    /// replaced with a generic sentence.
    fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) | AppError::InvalidState(msg) => {
                msg.clone()
            }
            AppError::Conflict(entity) => format!("{} already exists", entity),
            AppError::Database(e) => {
                tracing::error!(error = ?e, "Database error");
                "A database error occurred".to_string()
            }
            AppError::Jwt(e) => {
                tracing::debug!(error = ?e, "Token rejected");
                "Invalid or expired token".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let body = Envelope {
            error: Payload {
                code,
                message: self.client_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}
