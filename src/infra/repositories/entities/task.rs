//! Back-office task entity.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::Task;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    /// NULL = admin pool
    pub assignee_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub completed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Task {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Task {
            id: model.id,
            kind: parse_column(&model.kind)?,
            status: parse_column(&model.status)?,
            assignee_id: model.assignee_id,
            order_id: model.order_id,
            application_id: model.application_id,
            title: model.title,
            created_at: model.created_at,
            completed_at: model.completed_at,
            completed_by: model.completed_by,
        })
    }
}
