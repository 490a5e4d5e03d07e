//! Discount code repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, is_unique_violation};
use super::entities::discount_code::{self, Entity as DiscountEntity};
use crate::domain::{DiscountCode, DiscountUpdate, NewDiscount};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    /// Lookup by normalized (uppercase) code
    async fn find_by_code(&self, code: &str) -> AppResult<Option<DiscountCode>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DiscountCode>>;

    /// All codes, newest first
    async fn list(&self) -> AppResult<Vec<DiscountCode>>;

    /// Insert; a duplicate code is a `Conflict`
    async fn create(&self, discount: NewDiscount) -> AppResult<DiscountCode>;

    async fn update(&self, id: Uuid, changes: DiscountUpdate) -> AppResult<DiscountCode>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct DiscountStore {
    db: DatabaseConnection,
}

impl DiscountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DiscountRepository for DiscountStore {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<DiscountCode>> {
        let model = DiscountEntity::find()
            .filter(discount_code::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        convert_one(model)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DiscountCode>> {
        let model = DiscountEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn list(&self) -> AppResult<Vec<DiscountCode>> {
        let models = DiscountEntity::find()
            .order_by_desc(discount_code::Column::CreatedAt)
            .all(&self.db)
            .await?;
        convert_all(models)
    }

    async fn create(&self, discount: NewDiscount) -> AppResult<DiscountCode> {
        let active_model = discount_code::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(DiscountCode::normalize(&discount.code)),
            kind: Set(discount.kind.as_str().to_string()),
            value: Set(discount.value),
            min_subtotal: Set(discount.min_subtotal),
            max_uses: Set(discount.max_uses),
            used_count: Set(0),
            active: Set(true),
            starts_at: Set(discount.starts_at),
            expires_at: Set(discount.expires_at),
            created_at: Set(chrono::Utc::now()),
        };
        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Discount code")
            } else {
                AppError::from(e)
            }
        })?;
        DiscountCode::try_from(model)
    }

    async fn update(&self, id: Uuid, changes: DiscountUpdate) -> AppResult<DiscountCode> {
        let record = DiscountEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: discount_code::ActiveModel = record.into();
        if let Some(flag) = changes.active {
            active.active = Set(flag);
        }
        if let Some(max_uses) = changes.max_uses {
            active.max_uses = Set(Some(max_uses));
        }
        if let Some(expires_at) = changes.expires_at {
            active.expires_at = Set(Some(expires_at));
        }

        DiscountCode::try_from(active.update(&self.db).await?)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = DiscountEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

/// Usage counter operations run inside checkout / cancellation.
pub struct TxDiscountRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxDiscountRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Lookup with the row locked until commit
    pub async fn find_by_code_for_update(&self, code: &str) -> AppResult<Option<DiscountCode>> {
        let model = DiscountEntity::find()
            .filter(discount_code::Column::Code.eq(code))
            .lock_exclusive()
            .one(self.txn)
            .await?;
        convert_one(model)
    }

    /// Count one use. Fails when the code has no uses left.
    pub async fn increment_usage(&self, id: Uuid) -> AppResult<()> {
        let result = DiscountEntity::update_many()
            .col_expr(
                discount_code::Column::UsedCount,
                Expr::col(discount_code::Column::UsedCount).add(1),
            )
            .filter(discount_code::Column::Id.eq(id))
            .filter(
                discount_code::Column::MaxUses
                    .is_null()
                    .or(Expr::col(discount_code::Column::UsedCount)
                        .lt(Expr::col(discount_code::Column::MaxUses))),
            )
            .exec(self.txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::validation("Discount code has been fully used"));
        }
        Ok(())
    }

    /// Give back one use, never going below zero.
    pub async fn release_usage(&self, code: &str) -> AppResult<()> {
        DiscountEntity::update_many()
            .col_expr(
                discount_code::Column::UsedCount,
                Expr::col(discount_code::Column::UsedCount).sub(1),
            )
            .filter(discount_code::Column::Code.eq(code))
            .filter(discount_code::Column::UsedCount.gt(0))
            .exec(self.txn)
            .await?;
        Ok(())
    }
}
