//! Wholesale application repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, fetch_page, is_unique_violation};
use super::entities::wholesale_application::{self, Entity as ApplicationEntity};
use crate::domain::{ApplicationStatus, WholesaleApplication};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WholesaleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WholesaleApplication>>;

    /// Most recent application of a user
    async fn latest_for_user(&self, user_id: Uuid) -> AppResult<Option<WholesaleApplication>>;

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<WholesaleApplication>, u64)>;

    async fn count_pending(&self) -> AppResult<u64>;
}

pub struct WholesaleStore {
    db: DatabaseConnection,
}

impl WholesaleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WholesaleRepository for WholesaleStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WholesaleApplication>> {
        let model = ApplicationEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn latest_for_user(&self, user_id: Uuid) -> AppResult<Option<WholesaleApplication>> {
        let model = ApplicationEntity::find()
            .filter(wholesale_application::Column::UserId.eq(user_id))
            .order_by_desc(wholesale_application::Column::CreatedAt)
            .one(&self.db)
            .await?;
        convert_one(model)
    }

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<WholesaleApplication>, u64)> {
        let mut select = ApplicationEntity::find();
        if let Some(status) = status {
            select = select.filter(wholesale_application::Column::Status.eq(status.as_str()));
        }
        let select = select.order_by_asc(wholesale_application::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }

    async fn count_pending(&self) -> AppResult<u64> {
        let count = ApplicationEntity::find()
            .filter(wholesale_application::Column::Status.eq(ApplicationStatus::Pending.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

pub struct TxWholesaleRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxWholesaleRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn has_pending(&self, user_id: Uuid) -> AppResult<bool> {
        let count = ApplicationEntity::find()
            .filter(wholesale_application::Column::UserId.eq(user_id))
            .filter(wholesale_application::Column::Status.eq(ApplicationStatus::Pending.as_str()))
            .count(self.txn)
            .await?;
        Ok(count > 0)
    }

    /// Insert a pending application. A second pending one is a `Conflict`.
    pub async fn create(
        &self,
        user_id: Uuid,
        business_name: String,
        tax_id: Option<String>,
        message: Option<String>,
    ) -> AppResult<WholesaleApplication> {
        let row = wholesale_application::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            business_name: Set(business_name),
            tax_id: Set(tax_id),
            message: Set(message),
            status: Set(ApplicationStatus::Pending.as_str().to_string()),
            reviewed_by: Set(None),
            review_note: Set(None),
            reviewed_at: Set(None),
            created_at: Set(chrono::Utc::now()),
        };
        let model = row.insert(self.txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Pending wholesale application")
            } else {
                AppError::from(e)
            }
        })?;
        WholesaleApplication::try_from(model)
    }

    pub async fn find_for_update(&self, id: Uuid) -> AppResult<Option<WholesaleApplication>> {
        let model = ApplicationEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await?;
        convert_one(model)
    }

    /// Record the review decision.
    pub async fn review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        reviewer_id: Uuid,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication> {
        let existing = ApplicationEntity::find_by_id(id)
            .one(self.txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active = existing.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.reviewed_by = Set(Some(reviewer_id));
        active.review_note = Set(note);
        active.reviewed_at = Set(Some(chrono::Utc::now()));

        WholesaleApplication::try_from(active.update(self.txn).await?)
    }
}
