//! Referral commission payouts.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Commission, CommissionStatus};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait CommissionService: Send + Sync {
    /// Commissions earned by one referrer
    async fn list_mine(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Commission>>;

    async fn list(
        &self,
        status: Option<CommissionStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Commission>>;

    /// Record a payout (`pending_payout -> paid`).
    async fn mark_paid(&self, id: Uuid) -> AppResult<Commission>;

    async fn cancel(&self, id: Uuid) -> AppResult<Commission>;
}

pub struct CommissionManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CommissionManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn move_to(&self, id: Uuid, to: CommissionStatus) -> AppResult<Commission> {
        let commissions = self.uow.commissions();
        let current = commissions.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        let to = current.status.transition(to)?;

        // Conditional update guards against a concurrent payout
        let updated = commissions.update_status(id, current.status, to).await?;
        tracing::info!(commission_id = %id, status = %to, amount = %updated.amount, "Commission updated");
        Ok(updated)
    }
}

#[async_trait]
impl<U: UnitOfWork> CommissionService for CommissionManager<U> {
    async fn list_mine(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Commission>> {
        let page = self
            .uow
            .commissions()
            .list(Some(user_id), None, &params)
            .await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn list(
        &self,
        status: Option<CommissionStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Commission>> {
        let page = self.uow.commissions().list(None, status, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn mark_paid(&self, id: Uuid) -> AppResult<Commission> {
        self.move_to(id, CommissionStatus::Paid).await
    }

    async fn cancel(&self, id: Uuid) -> AppResult<Commission> {
        self.move_to(id, CommissionStatus::Cancelled).await
    }
}
