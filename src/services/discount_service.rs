//! Discount code administration and quoting.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{DiscountCode, DiscountUpdate, NewDiscount};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Result of checking a code against a subtotal
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DiscountQuote {
    #[schema(example = "SPRING10")]
    pub code: String,
    #[schema(value_type = String, example = "5.00")]
    pub discount_amount: Decimal,
}

#[async_trait]
pub trait DiscountService: Send + Sync {
    async fn create(&self, discount: NewDiscount) -> AppResult<DiscountCode>;

    async fn list(&self) -> AppResult<Vec<DiscountCode>>;

    async fn update(&self, id: Uuid, changes: DiscountUpdate) -> AppResult<DiscountCode>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Quote a code for a subtotal without consuming a use.
    async fn quote(&self, code: &str, subtotal: Decimal) -> AppResult<DiscountQuote>;
}

pub struct DiscountManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DiscountManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> DiscountService for DiscountManager<U> {
    async fn create(&self, discount: NewDiscount) -> AppResult<DiscountCode> {
        discount.validate()?;

        let created = self.uow.discounts().create(discount).await?;
        tracing::info!(code = %created.code, "Discount code created");
        Ok(created)
    }

    async fn list(&self) -> AppResult<Vec<DiscountCode>> {
        self.uow.discounts().list().await
    }

    async fn update(&self, id: Uuid, changes: DiscountUpdate) -> AppResult<DiscountCode> {
        if changes.max_uses.is_some_and(|max| max < 1) {
            return Err(AppError::validation("max_uses must be at least 1"));
        }
        self.uow.discounts().update(id, changes).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.uow.discounts().delete(id).await
    }

    async fn quote(&self, code: &str, subtotal: Decimal) -> AppResult<DiscountQuote> {
        if subtotal < Decimal::ZERO {
            return Err(AppError::validation("Subtotal cannot be negative"));
        }

        let discount = self
            .uow
            .discounts()
            .find_by_code(&DiscountCode::normalize(code))
            .await?
            .ok_or(AppError::NotFound)?;
        let amount = discount.apply(subtotal, Utc::now())?;

        Ok(DiscountQuote {
            code: discount.code,
            discount_amount: amount,
        })
    }
}
