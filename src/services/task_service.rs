//! Task inbox.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{CurrentUser, Task};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Tasks the viewer should see: their own, plus the admin pool for
    /// admins. Open tasks only unless `include_closed`.
    async fn list(
        &self,
        viewer: &CurrentUser,
        include_closed: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Task>>;

    async fn complete(&self, actor_id: Uuid, id: Uuid) -> AppResult<Task>;
}

pub struct TaskManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> TaskManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> TaskService for TaskManager<U> {
    async fn list(
        &self,
        viewer: &CurrentUser,
        include_closed: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Task>> {
        let page = self
            .uow
            .tasks()
            .list_visible(viewer.id, viewer.is_admin(), !include_closed, &params)
            .await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn complete(&self, actor_id: Uuid, id: Uuid) -> AppResult<Task> {
        let tasks = self.uow.tasks();
        let task = tasks.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if !task.is_open() {
            return Err(AppError::invalid_state(format!("Task is already {}", task.status)));
        }

        let task = tasks.complete(id, actor_id).await?;
        tracing::info!(task_id = %id, kind = %task.kind, "Task completed");
        Ok(task)
    }
}
