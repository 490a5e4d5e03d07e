//! Discount code entity.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::DiscountCode;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discount_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored uppercase
    #[sea_orm(unique)]
    pub code: String,
    /// `percentage` or `fixed`
    pub kind: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub min_subtotal: Option<Decimal>,
    /// NULL = unlimited
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub active: bool,
    pub starts_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for DiscountCode {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(DiscountCode {
            id: model.id,
            code: model.code,
            kind: parse_column(&model.kind)?,
            value: model.value,
            min_subtotal: model.min_subtotal,
            max_uses: model.max_uses,
            used_count: model.used_count,
            active: model.active,
            starts_at: model.starts_at,
            expires_at: model.expires_at,
            created_at: model.created_at,
        })
    }
}
