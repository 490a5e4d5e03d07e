//! Product variation entity.

use sea_orm::entity::prelude::*;

use crate::domain::ProductVariation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_variations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub strength: Option<String>,
    pub flavor: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub price_override: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ProductVariation {
    fn from(model: Model) -> Self {
        ProductVariation {
            id: model.id,
            product_id: model.product_id,
            sku: model.sku,
            strength: model.strength,
            flavor: model.flavor,
            price_override: model.price_override,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
