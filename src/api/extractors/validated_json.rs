use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// Request body that deserialized and passed its `validator` rules.
///
/// A body that fails either step is answered with 400 `VALIDATION_ERROR`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let payload = match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => payload,
            Err(rejection) => return Err(AppError::validation(rejection.body_text())),
        };

        match payload.validate() {
            Ok(()) => Ok(ValidatedJson(payload)),
            Err(errors) => Err(AppError::validation(describe(&errors))),
        }
    }
}

// Messages are ordered by field name so clients see a stable string
fn describe(errors: &ValidationErrors) -> String {
    let by_field: BTreeMap<_, _> = errors.field_errors().into_iter().collect();

    let mut messages = Vec::new();
    for (field, failures) in by_field {
        for failure in failures {
            messages.push(match &failure.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            });
        }
    }
    messages.join(", ")
}
