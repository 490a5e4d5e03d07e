//! Stock level entity (quantity per variation and location).

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::StockLevel;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_levels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variation_id: Uuid,
    pub location: String,
    pub quantity: i32,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for StockLevel {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(StockLevel {
            id: model.id,
            variation_id: model.variation_id,
            location: parse_column(&model.location)?,
            quantity: model.quantity,
            updated_at: model.updated_at,
        })
    }
}
