//! Referral commission repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, fetch_page};
use super::entities::commission::{self, Entity as CommissionEntity};
use crate::domain::{Commission, CommissionStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Newest first, optionally scoped to one referrer and/or status
    async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Commission>, u64)>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Commission>>;

    /// Move a commission from `from` to `to`. Fails if the row is no longer in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: CommissionStatus,
        to: CommissionStatus,
    ) -> AppResult<Commission>;

    /// (pending, paid) totals for one referrer
    async fn totals_for(&self, user_id: Uuid) -> AppResult<(Decimal, Decimal)>;

    /// Total awaiting payout across all referrers
    async fn pending_total(&self) -> AppResult<Decimal>;
}

pub struct CommissionStore {
    db: DatabaseConnection,
}

impl CommissionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommissionRepository for CommissionStore {
    async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<CommissionStatus>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Commission>, u64)> {
        let mut select = CommissionEntity::find();
        if let Some(user_id) = user_id {
            select = select.filter(commission::Column::UserId.eq(user_id));
        }
        if let Some(status) = status {
            select = select.filter(commission::Column::Status.eq(status.as_str()));
        }
        let select = select.order_by_desc(commission::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Commission>> {
        let model = CommissionEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: CommissionStatus,
        to: CommissionStatus,
    ) -> AppResult<Commission> {
        let paid_at = (to == CommissionStatus::Paid).then(chrono::Utc::now);
        let result = CommissionEntity::update_many()
            .col_expr(commission::Column::Status, Expr::value(to.as_str()))
            .col_expr(commission::Column::PaidAt, Expr::value(paid_at))
            .filter(commission::Column::Id.eq(id))
            .filter(commission::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::invalid_state(format!(
                "Commission is no longer {}",
                from
            )));
        }
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn totals_for(&self, user_id: Uuid) -> AppResult<(Decimal, Decimal)> {
        let pending =
            sum_amount(&self.db, Some(user_id), CommissionStatus::PendingPayout).await?;
        let paid = sum_amount(&self.db, Some(user_id), CommissionStatus::Paid).await?;
        Ok((pending, paid))
    }

    async fn pending_total(&self) -> AppResult<Decimal> {
        sum_amount(&self.db, None, CommissionStatus::PendingPayout).await
    }
}

pub struct TxCommissionRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxCommissionRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn exists_for_order(&self, order_id: Uuid) -> AppResult<bool> {
        let count = CommissionEntity::find()
            .filter(commission::Column::OrderId.eq(order_id))
            .count(self.txn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount: Decimal,
        rate: Decimal,
    ) -> AppResult<Commission> {
        let row = commission::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            order_id: Set(order_id),
            amount: Set(amount),
            rate: Set(rate),
            status: Set(CommissionStatus::PendingPayout.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
            paid_at: Set(None),
        };
        Commission::try_from(row.insert(self.txn).await?)
    }

    /// Cancel the order's commission if it has not been paid out.
    pub async fn cancel_for_order(&self, order_id: Uuid) -> AppResult<u64> {
        let result = CommissionEntity::update_many()
            .col_expr(
                commission::Column::Status,
                Expr::value(CommissionStatus::Cancelled.as_str()),
            )
            .filter(commission::Column::OrderId.eq(order_id))
            .filter(commission::Column::Status.eq(CommissionStatus::PendingPayout.as_str()))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected)
    }
}

async fn sum_amount<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
    status: CommissionStatus,
) -> AppResult<Decimal> {
    let mut select = CommissionEntity::find()
        .select_only()
        .column_as(Expr::col(commission::Column::Amount).sum(), "total")
        .filter(commission::Column::Status.eq(status.as_str()));
    if let Some(user_id) = user_id {
        select = select.filter(commission::Column::UserId.eq(user_id));
    }
    let total: Option<Option<Decimal>> = select.into_tuple().one(db).await?;
    Ok(total.flatten().unwrap_or(Decimal::ZERO))
}
