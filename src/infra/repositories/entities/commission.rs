//! Referral commission entity.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::Commission;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// One commission per order
    #[sea_orm(unique)]
    pub order_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 4)))")]
    pub rate: Decimal,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Commission {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Commission {
            id: model.id,
            user_id: model.user_id,
            order_id: model.order_id,
            amount: model.amount,
            rate: model.rate,
            status: parse_column(&model.status)?,
            created_at: model.created_at,
            paid_at: model.paid_at,
        })
    }
}
