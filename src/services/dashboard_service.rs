//! Back-office dashboard figures.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::parallel;
use crate::domain::OrderStatus;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Every order status with its count, zero included
    pub orders_by_status: BTreeMap<String, u64>,
    #[schema(value_type = String, example = "1520.40")]
    pub paid_revenue: Decimal,
    #[schema(value_type = String, example = "84.10")]
    pub pending_commissions: Decimal,
    pub open_tasks: u64,
    pub pending_wholesale_applications: u64,
}

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn stats(&self) -> AppResult<DashboardStats>;
}

pub struct DashboardManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DashboardManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> DashboardService for DashboardManager<U> {
    async fn stats(&self) -> AppResult<DashboardStats> {
        let orders = self.uow.orders();
        let commissions = self.uow.commissions();
        let tasks = self.uow.tasks();
        let wholesale = self.uow.wholesale();

        let ((counts, paid_revenue), (pending_commissions, open_tasks, pending_applications)) =
            parallel::join2(
                parallel::join2(orders.count_by_status(), orders.paid_revenue()),
                parallel::join3(
                    commissions.pending_total(),
                    tasks.count_open(),
                    wholesale.count_pending(),
                ),
            )
            .await?;

        let orders_by_status = OrderStatus::ALL
            .iter()
            .map(|status| {
                (
                    status.to_string(),
                    counts.get(status).copied().unwrap_or(0),
                )
            })
            .collect();

        Ok(DashboardStats {
            orders_by_status,
            paid_revenue,
            pending_commissions,
            open_tasks,
            pending_wholesale_applications: pending_applications,
        })
    }
}
