//! Discount codes.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::pricing::round_money;
use crate::errors::{AppError, AppResult};

// Checked after normalization, so lowercase input is accepted
static CODE_FORMAT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]{3,32}$").ok());

string_enum! {
    /// How a discount value is interpreted
    pub enum DiscountKind {
        /// `value` percent off the subtotal
        Percentage => "percentage",
        /// `value` currency units off the subtotal
        Fixed => "fixed",
    }
}

/// Discount code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscountCode {
    pub id: Uuid,
    #[schema(example = "SPRING10")]
    pub code: String,
    pub kind: DiscountKind,
    #[schema(value_type = String, example = "10")]
    pub value: Decimal,
    #[schema(value_type = Option<String>)]
    pub min_subtotal: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    /// Codes are matched case-insensitively and stored uppercase.
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Checks everything except the amount.
    pub fn ensure_usable(&self, subtotal: Decimal, now: DateTime<Utc>) -> AppResult<()> {
        if !self.active {
            return Err(AppError::validation("Discount code is not active"));
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(AppError::validation("Discount code is not valid yet"));
        }
        if self.expires_at.is_some_and(|end| now >= end) {
            return Err(AppError::validation("Discount code has expired"));
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(AppError::validation("Discount code has been fully used"));
        }
        if let Some(min) = self.min_subtotal {
            if subtotal < min {
                return Err(AppError::validation(format!(
                    "Discount code requires a subtotal of at least {}",
                    min
                )));
            }
        }
        Ok(())
    }

    /// Amount taken off `subtotal`, never more than the subtotal itself.
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Percentage => subtotal * self.value / Decimal::ONE_HUNDRED,
            DiscountKind::Fixed => self.value,
        };
        round_money(raw.min(subtotal).max(Decimal::ZERO))
    }

    /// Validate and compute in one step.
    pub fn apply(&self, subtotal: Decimal, now: DateTime<Utc>) -> AppResult<Decimal> {
        self.ensure_usable(subtotal, now)?;
        Ok(self.amount_for(subtotal))
    }
}

/// Data required to create a discount code
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_subtotal: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewDiscount {
    pub fn validate(&self) -> AppResult<()> {
        let code = DiscountCode::normalize(&self.code);
        if !CODE_FORMAT.as_ref().is_some_and(|re| re.is_match(&code)) {
            return Err(AppError::validation(
                "Code must be 3-32 letters, digits, '-' or '_'",
            ));
        }
        match self.kind {
            DiscountKind::Percentage
                if self.value <= Decimal::ZERO || self.value > Decimal::ONE_HUNDRED =>
            {
                return Err(AppError::validation(
                    "Percentage discounts must be between 0 and 100",
                ));
            }
            DiscountKind::Fixed if self.value <= Decimal::ZERO => {
                return Err(AppError::validation(
                    "Fixed discounts must be greater than zero",
                ));
            }
            _ => {}
        }
        if self.max_uses.is_some_and(|max| max < 1) {
            return Err(AppError::validation("max_uses must be at least 1"));
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.expires_at) {
            if end <= start {
                return Err(AppError::validation("expires_at must be after starts_at"));
            }
        }
        Ok(())
    }
}

/// Partial update for an existing code
#[derive(Debug, Clone, Default)]
pub struct DiscountUpdate {
    pub active: Option<bool>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}
