//! Query string extractor reporting errors in the API error format.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Like `Query<T>`, but a bad query string is a 400 `VALIDATION_ERROR`
/// instead of axum's plain-text rejection.
///
/// Several can be combined in one handler since each reads the whole
/// query string and ignores unknown keys, e.g. pagination plus filters.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(QueryParams(value))
    }
}
