//! Account handlers: the caller's own profile and admin user management.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{QueryParams, ValidatedJson};
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{CurrentUser, ReferralSummary, UserFilter, UserResponse, UserRole, UserStatus};
use crate::errors::AppResult;
use crate::types::{NoContent, Paginated, PaginationParams};

/// Admin user listing filters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

/// Routes for the signed-in user
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_current_user))
        .route("/me/referrals", get(get_referrals))
}

/// Admin user management routes
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/activate", post(activate_user))
        .route("/:id/suspend", post(suspend_user))
        .route("/:id/role", put(set_role))
        .route("/:id/restore", post(restore_user))
}

/// Get the signed-in user
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users().get_user(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Referral code and commission totals of the signed-in user
#[utoipa::path(
    get,
    path = "/api/users/me/referrals",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Referral summary", body = ReferralSummary),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_referrals(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ReferralSummary>> {
    let summary = state
        .services
        .users()
        .referral_summary(current_user.id)
        .await?;
    Ok(Json(summary))
}

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(UserQuery, PaginationParams),
    responses(
        (status = 200, description = "Users", body = UserPage),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<UserQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    require_admin(&current_user)?;

    let filter = UserFilter {
        role: query.role,
        status: query.status,
    };
    let page = state.services.users().list_users(filter, params).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Get a user by id (admin)
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state.services.users().get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Reactivate a suspended account (admin)
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/activate",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn activate_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state.services.users().activate_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Suspend an account (admin)
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/suspend",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User suspended", body = UserResponse),
        (status = 400, description = "Cannot suspend yourself"),
        (status = 404, description = "User not found")
    )
)]
pub async fn suspend_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state
        .services
        .users()
        .suspend_user(current_user.id, id)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Change a user's role (admin)
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_role(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state
        .services
        .users()
        .set_role(current_user.id, id, payload.role)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Soft delete a user (admin)
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state
        .services
        .users()
        .delete_user(current_user.id, id)
        .await?;
    Ok(NoContent)
}

/// Restore a soft-deleted user (admin)
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/restore",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User restored", body = UserResponse),
        (status = 404, description = "User not found or not deleted")
    )
)]
pub async fn restore_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state.services.users().restore_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}
