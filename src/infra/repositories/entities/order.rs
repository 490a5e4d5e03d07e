//! Order entity.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::Order;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub shipping: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub discount_code: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub shipping_address: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub distributor_id: Option<Uuid>,
    pub payment_id: Option<String>,
    pub paid_at: Option<DateTimeUtc>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub fulfillment_proof_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub fulfillment_notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Order {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Order {
            id: model.id,
            user_id: model.user_id,
            status: parse_column(&model.status)?,
            payment_status: parse_column(&model.payment_status)?,
            subtotal: model.subtotal,
            discount: model.discount,
            shipping: model.shipping,
            tax: model.tax,
            total: model.total,
            discount_code: model.discount_code,
            shipping_address: model.shipping_address,
            notes: model.notes,
            distributor_id: model.distributor_id,
            payment_id: model.payment_id,
            paid_at: model.paid_at,
            tracking_number: model.tracking_number,
            carrier: model.carrier,
            fulfillment_proof_url: model.fulfillment_proof_url,
            fulfillment_notes: model.fulfillment_notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
