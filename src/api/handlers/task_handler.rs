//! Back-office task handlers.

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
use crate::domain::{CurrentUser, Task};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Include completed tasks
    #[serde(default)]
    pub all: bool,
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/", get(list_tasks))
}

pub fn admin_task_routes() -> Router<AppState> {
    Router::new().route("/:id/complete", post(complete_task))
}

/// Tasks for the signed-in user; admins also see the shared admin queue
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    security(("bearer_auth" = [])),
    params(TaskQuery, PaginationParams),
    responses((status = 200, description = "Tasks", body = TaskPage))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<TaskQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Task>>> {
    let page = state
        .services
        .tasks()
        .list(&current_user, query.all, params)
        .await?;
    Ok(Json(page))
}

/// Close a task by hand (admin)
#[utoipa::path(
    post,
    path = "/api/admin/tasks/{id}/complete",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task completed", body = Task),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task already completed")
    )
)]
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    require_admin(&current_user)?;
    let task = state
        .services
        .tasks()
        .complete(current_user.id, id)
        .await?;
    Ok(Json(task))
}
