use axum::{extract::State, response::Json, routing::get, Extension, Router};

use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::CurrentUser;
use crate::errors::AppResult;
use crate::services::DashboardStats;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

/// Back-office summary figures (admin)
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<DashboardStats>> {
    require_admin(&current_user)?;
    let stats = state.services.dashboard().stats().await?;
    Ok(Json(stats))
}
