//! Referral commissions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

string_enum! {
    pub enum CommissionStatus {
        PendingPayout => "pending_payout",
        Paid => "paid",
        Cancelled => "cancelled",
    }
}

impl CommissionStatus {
    /// Only pending commissions can be paid or cancelled.
    pub fn transition(self, to: CommissionStatus) -> AppResult<CommissionStatus> {
        match (self, to) {
            (CommissionStatus::PendingPayout, CommissionStatus::Paid)
            | (CommissionStatus::PendingPayout, CommissionStatus::Cancelled) => Ok(to),
            (from, to) => Err(AppError::invalid_state(format!(
                "Commission is {} and cannot become {}",
                from, to
            ))),
        }
    }
}

/// Commission owed to a referrer for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Commission {
    pub id: Uuid,
    /// Referrer receiving the payout
    pub user_id: Uuid,
    pub order_id: Uuid,
    #[schema(value_type = String, example = "5.00")]
    pub amount: Decimal,
    #[schema(value_type = String, example = "0.10")]
    pub rate: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Referral overview for the signed-in user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referred_users: u64,
    #[schema(value_type = String)]
    pub pending_commission: Decimal,
    #[schema(value_type = String)]
    pub paid_commission: Decimal,
}
