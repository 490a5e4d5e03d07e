//! Back-office task repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, fetch_page};
use super::entities::task::{self, Entity as TaskEntity};
use crate::domain::{NewTask, Task, TaskKind, TaskStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks assigned to `user_id`, plus the admin pool when `include_pool`.
    async fn list_visible(
        &self,
        user_id: Uuid,
        include_pool: bool,
        open_only: bool,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Task>, u64)>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>>;

    async fn count_open(&self) -> AppResult<u64>;

    /// Mark an open task completed. Fails if it is no longer open.
    async fn complete(&self, id: Uuid, actor_id: Uuid) -> AppResult<Task>;
}

pub struct TaskStore {
    db: DatabaseConnection,
}

impl TaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for TaskStore {
    async fn list_visible(
        &self,
        user_id: Uuid,
        include_pool: bool,
        open_only: bool,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Task>, u64)> {
        let mut visible = Condition::any().add(task::Column::AssigneeId.eq(user_id));
        if include_pool {
            visible = visible.add(task::Column::AssigneeId.is_null());
        }

        let mut select = TaskEntity::find().filter(visible);
        if open_only {
            select = select.filter(task::Column::Status.eq(TaskStatus::Open.as_str()));
        }
        let select = select.order_by_desc(task::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let model = TaskEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn count_open(&self) -> AppResult<u64> {
        let count = TaskEntity::find()
            .filter(task::Column::Status.eq(TaskStatus::Open.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn complete(&self, id: Uuid, actor_id: Uuid) -> AppResult<Task> {
        let affected = close_tasks(
            &self.db,
            Condition::all().add(task::Column::Id.eq(id)),
            TaskStatus::Completed,
            Some(actor_id),
        )
        .await?;
        if affected == 0 {
            return Err(AppError::invalid_state("Task is not open"));
        }
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }
}

/// Task changes made by the order and wholesale workflows.
pub struct TxTaskRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxTaskRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn create(&self, new_task: NewTask) -> AppResult<()> {
        let row = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(new_task.kind.as_str().to_string()),
            status: Set(TaskStatus::Open.as_str().to_string()),
            assignee_id: Set(new_task.assignee_id),
            order_id: Set(new_task.order_id),
            application_id: Set(new_task.application_id),
            title: Set(new_task.title),
            created_at: Set(chrono::Utc::now()),
            completed_at: Set(None),
            completed_by: Set(None),
        };
        TaskEntity::insert(row)
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }

    /// Complete the open tasks of `kind` for an order.
    pub async fn complete_open(
        &self,
        order_id: Uuid,
        kind: TaskKind,
        actor_id: Option<Uuid>,
    ) -> AppResult<u64> {
        close_tasks(
            self.txn,
            Condition::all()
                .add(task::Column::OrderId.eq(order_id))
                .add(task::Column::Kind.eq(kind.as_str())),
            TaskStatus::Completed,
            actor_id,
        )
        .await
    }

    /// Cancel open tasks for an order, all kinds when `kind` is `None`.
    pub async fn cancel_open(&self, order_id: Uuid, kind: Option<TaskKind>) -> AppResult<u64> {
        let mut scope = Condition::all().add(task::Column::OrderId.eq(order_id));
        if let Some(kind) = kind {
            scope = scope.add(task::Column::Kind.eq(kind.as_str()));
        }
        close_tasks(self.txn, scope, TaskStatus::Cancelled, None).await
    }

    /// Complete the review task of a wholesale application.
    pub async fn complete_for_application(
        &self,
        application_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<u64> {
        close_tasks(
            self.txn,
            Condition::all().add(task::Column::ApplicationId.eq(application_id)),
            TaskStatus::Completed,
            Some(actor_id),
        )
        .await
    }
}

/// Move the open tasks in `scope` to `status`. Returns how many changed.
async fn close_tasks<C: ConnectionTrait>(
    db: &C,
    scope: Condition,
    status: TaskStatus,
    actor_id: Option<Uuid>,
) -> AppResult<u64> {
    let result = TaskEntity::update_many()
        .col_expr(task::Column::Status, Expr::value(status.as_str()))
        .col_expr(task::Column::CompletedAt, Expr::value(chrono::Utc::now()))
        .col_expr(task::Column::CompletedBy, Expr::value(actor_id))
        .filter(scope)
        .filter(task::Column::Status.eq(TaskStatus::Open.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
