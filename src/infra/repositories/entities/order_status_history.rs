//! Order status history entity.

use sea_orm::entity::prelude::*;

use super::{parse_column, parse_optional_column};
use crate::domain::OrderStatusChange;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "order_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for OrderStatusChange {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(OrderStatusChange {
            id: model.id,
            order_id: model.order_id,
            from_status: parse_optional_column(model.from_status.as_deref())?,
            to_status: parse_column(&model.to_status)?,
            actor_id: model.actor_id,
            note: model.note,
            created_at: model.created_at,
        })
    }
}
