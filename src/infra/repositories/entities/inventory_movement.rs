//! Inventory movement ledger entity.

use sea_orm::entity::prelude::*;

use super::parse_optional_column;
use crate::domain::InventoryMovement;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variation_id: Uuid,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub quantity: i32,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for InventoryMovement {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(InventoryMovement {
            id: model.id,
            variation_id: model.variation_id,
            from_location: parse_optional_column(model.from_location.as_deref())?,
            to_location: parse_optional_column(model.to_location.as_deref())?,
            quantity: model.quantity,
            reason: model.reason,
            order_id: model.order_id,
            actor_id: model.actor_id,
            created_at: model.created_at,
        })
    }
}

