//! Wholesale account applications.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{QueryParams, ValidatedJson};
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{ApplicationStatus, CurrentUser, WholesaleApplication};
use crate::errors::AppResult;
use crate::services::ApplicationForm;
use crate::types::{Created, Paginated, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyRequest {
    #[validate(length(min = 1, max = 200, message = "Business name is required"))]
    #[schema(example = "Corner Cafe LLC")]
    pub business_name: String,
    #[validate(length(max = 50, message = "Tax id must be at most 50 characters"))]
    pub tax_id: Option<String>,
    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
}

pub fn wholesale_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", post(apply))
        .route("/applications/me", get(my_application))
}

pub fn admin_wholesale_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/:id/approve", post(approve_application))
        .route("/applications/:id/reject", post(reject_application))
}

/// Apply for wholesale pricing
#[utoipa::path(
    post,
    path = "/api/wholesale/applications",
    tag = "Wholesale",
    security(("bearer_auth" = [])),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application submitted", body = WholesaleApplication),
        (status = 409, description = "Already wholesale, or an application is pending")
    )
)]
pub async fn apply(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ApplyRequest>,
) -> AppResult<Created<WholesaleApplication>> {
    let application = state
        .services
        .wholesale()
        .apply(
            current_user.id,
            current_user.role,
            ApplicationForm {
                business_name: payload.business_name,
                tax_id: payload.tax_id,
                message: payload.message,
            },
        )
        .await?;
    Ok(Created(application))
}

/// The caller's most recent application
#[utoipa::path(
    get,
    path = "/api/wholesale/applications/me",
    tag = "Wholesale",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Latest application", body = WholesaleApplication),
        (status = 404, description = "No application on file")
    )
)]
pub async fn my_application(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<WholesaleApplication>> {
    let application = state
        .services
        .wholesale()
        .my_latest(current_user.id)
        .await?;
    Ok(Json(application))
}

/// Applications awaiting or past review (admin)
#[utoipa::path(
    get,
    path = "/api/admin/wholesale/applications",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(ApplicationQuery, PaginationParams),
    responses(
        (status = 200, description = "Applications", body = ApplicationPage),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<ApplicationQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<WholesaleApplication>>> {
    require_admin(&current_user)?;
    let page = state
        .services
        .wholesale()
        .list(query.status, params)
        .await?;
    Ok(Json(page))
}

/// Approve an application and upgrade the applicant (admin)
#[utoipa::path(
    post,
    path = "/api/admin/wholesale/applications/{id}/approve",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Application approved", body = WholesaleApplication),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already reviewed")
    )
)]
pub async fn approve_application(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<WholesaleApplication>> {
    require_admin(&current_user)?;
    let application = state
        .services
        .wholesale()
        .approve(current_user.id, id, payload.note)
        .await?;
    Ok(Json(application))
}

/// Reject an application (admin)
#[utoipa::path(
    post,
    path = "/api/admin/wholesale/applications/{id}/reject",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Application rejected", body = WholesaleApplication),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already reviewed")
    )
)]
pub async fn reject_application(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<WholesaleApplication>> {
    require_admin(&current_user)?;
    let application = state
        .services
        .wholesale()
        .reject(current_user.id, id, payload.note)
        .await?;
    Ok(Json(application))
}
