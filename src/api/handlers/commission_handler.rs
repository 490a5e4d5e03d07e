//! Referral commission handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::extractors::QueryParams;
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{Commission, CommissionStatus, CurrentUser};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionQuery {
    pub status: Option<CommissionStatus>,
}

pub fn commission_routes() -> Router<AppState> {
    Router::new().route("/", get(list_my_commissions))
}

pub fn admin_commission_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_commissions))
        .route("/:id/pay", post(pay_commission))
        .route("/:id/cancel", post(cancel_commission))
}

/// Commissions earned by the signed-in user
#[utoipa::path(
    get,
    path = "/api/commissions",
    tag = "Commissions",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses((status = 200, description = "Commissions", body = CommissionPage))
)]
pub async fn list_my_commissions(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Commission>>> {
    let page = state
        .services
        .commissions()
        .list_mine(current_user.id, params)
        .await?;
    Ok(Json(page))
}

/// All commissions (admin)
#[utoipa::path(
    get,
    path = "/api/admin/commissions",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(CommissionQuery, PaginationParams),
    responses(
        (status = 200, description = "Commissions", body = CommissionPage),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_commissions(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<CommissionQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Commission>>> {
    require_admin(&current_user)?;
    let page = state
        .services
        .commissions()
        .list(query.status, params)
        .await?;
    Ok(Json(page))
}

/// Record a commission payout (admin)
#[utoipa::path(
    post,
    path = "/api/admin/commissions/{id}/pay",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Commission id")),
    responses(
        (status = 200, description = "Commission paid", body = Commission),
        (status = 404, description = "Commission not found"),
        (status = 409, description = "Commission is not pending payout")
    )
)]
pub async fn pay_commission(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Commission>> {
    require_admin(&current_user)?;
    let commission = state.services.commissions().mark_paid(id).await?;
    Ok(Json(commission))
}

/// Cancel a pending commission (admin)
#[utoipa::path(
    post,
    path = "/api/admin/commissions/{id}/cancel",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Commission id")),
    responses(
        (status = 200, description = "Commission cancelled", body = Commission),
        (status = 404, description = "Commission not found"),
        (status = 409, description = "Commission is not pending payout")
    )
)]
pub async fn cancel_commission(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Commission>> {
    require_admin(&current_user)?;
    let commission = state.services.commissions().cancel(id).await?;
    Ok(Json(commission))
}
