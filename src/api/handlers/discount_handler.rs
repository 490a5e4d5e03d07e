//! Discount code handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{CurrentUser, DiscountCode, DiscountKind, DiscountUpdate, NewDiscount};
use crate::errors::AppResult;
use crate::services::DiscountQuote;
use crate::types::{Created, NoContent};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDiscountRequest {
    /// Stored uppercase
    #[validate(length(min = 1, max = 50, message = "Code must be 1-50 characters"))]
    #[schema(example = "SPRING10")]
    pub code: String,
    pub kind: DiscountKind,
    /// Percent (0-100] or fixed amount (> 0)
    #[schema(value_type = String, example = "10")]
    pub value: Decimal,
    #[schema(value_type = Option<String>, example = "50.00")]
    pub min_subtotal: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDiscountRequest {
    pub active: Option<bool>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateDiscountRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "SPRING10")]
    pub code: String,
    #[schema(value_type = String, example = "80.00")]
    pub subtotal: Decimal,
}

/// Discount routes available to every signed-in user
pub fn discount_routes() -> Router<AppState> {
    Router::new().route("/validate", post(validate_discount))
}

/// Admin discount management routes
pub fn admin_discount_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/:id", put(update_discount).delete(delete_discount))
}

/// Check a code against a subtotal without using it
#[utoipa::path(
    post,
    path = "/api/discounts/validate",
    tag = "Discounts",
    security(("bearer_auth" = [])),
    request_body = ValidateDiscountRequest,
    responses(
        (status = 200, description = "Discount that would apply", body = DiscountQuote),
        (status = 400, description = "Code not usable for this subtotal"),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn validate_discount(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ValidateDiscountRequest>,
) -> AppResult<Json<DiscountQuote>> {
    let quote = state
        .services
        .discounts()
        .quote(&payload.code, payload.subtotal)
        .await?;
    Ok(Json(quote))
}

/// List discount codes (admin)
#[utoipa::path(
    get,
    path = "/api/admin/discounts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Discount codes", body = Vec<DiscountCode>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<DiscountCode>>> {
    require_admin(&current_user)?;
    let codes = state.services.discounts().list().await?;
    Ok(Json(codes))
}

/// Create a discount code (admin)
#[utoipa::path(
    post,
    path = "/api/admin/discounts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Discount code created", body = DiscountCode),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Code already exists")
    )
)]
pub async fn create_discount(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateDiscountRequest>,
) -> AppResult<Created<DiscountCode>> {
    require_admin(&current_user)?;
    let code = state
        .services
        .discounts()
        .create(NewDiscount {
            code: payload.code,
            kind: payload.kind,
            value: payload.value,
            min_subtotal: payload.min_subtotal,
            max_uses: payload.max_uses,
            starts_at: payload.starts_at,
            expires_at: payload.expires_at,
        })
        .await?;
    Ok(Created(code))
}

/// Update a discount code (admin)
#[utoipa::path(
    put,
    path = "/api/admin/discounts/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Discount code id")),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Discount code updated", body = DiscountCode),
        (status = 404, description = "Discount code not found")
    )
)]
pub async fn update_discount(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateDiscountRequest>,
) -> AppResult<Json<DiscountCode>> {
    require_admin(&current_user)?;
    let code = state
        .services
        .discounts()
        .update(
            id,
            DiscountUpdate {
                active: payload.active,
                max_uses: payload.max_uses,
                expires_at: payload.expires_at,
            },
        )
        .await?;
    Ok(Json(code))
}

/// Delete a discount code (admin)
#[utoipa::path(
    delete,
    path = "/api/admin/discounts/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Discount code id")),
    responses(
        (status = 204, description = "Discount code deleted"),
        (status = 404, description = "Discount code not found")
    )
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state.services.discounts().delete(id).await?;
    Ok(NoContent)
}
