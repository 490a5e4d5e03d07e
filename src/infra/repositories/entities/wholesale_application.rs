//! Wholesale application entity.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::WholesaleApplication;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wholesale_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub tax_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for WholesaleApplication {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(WholesaleApplication {
            id: model.id,
            user_id: model.user_id,
            business_name: model.business_name,
            tax_id: model.tax_id,
            message: model.message,
            status: parse_column(&model.status)?,
            reviewed_by: model.reviewed_by,
            review_note: model.review_note,
            reviewed_at: model.reviewed_at,
            created_at: model.created_at,
        })
    }
}
