//! Orders and the fulfillment state machine.
//!
//! ```text
//! pending_payment --confirm_payment--> pending_approval --approve--> awaiting_fulfillment
//! awaiting_fulfillment --submit_fulfillment--> fulfillment_submitted
//! fulfillment_submitted --approve_fulfillment--> fulfilled --ship--> shipped --deliver--> delivered
//! fulfillment_submitted --reject_fulfillment--> awaiting_fulfillment
//! pending_payment --cancel--> cancelled
//! pending_approval..=delivered --refund--> refunded
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

string_enum! {
    /// Lifecycle state of an order
    pub enum OrderStatus {
        PendingPayment => "pending_payment",
        PendingApproval => "pending_approval",
        AwaitingFulfillment => "awaiting_fulfillment",
        FulfillmentSubmitted => "fulfillment_submitted",
        Fulfilled => "fulfilled",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
}

string_enum! {
    /// Workflow actions that move an order between states
    pub enum OrderAction {
        ConfirmPayment => "confirm_payment",
        Approve => "approve",
        SubmitFulfillment => "submit_fulfillment",
        ApproveFulfillment => "approve_fulfillment",
        RejectFulfillment => "reject_fulfillment",
        Ship => "ship",
        Deliver => "deliver",
        Cancel => "cancel",
        Refund => "refund",
    }
}

string_enum! {
    /// Payment state tracked alongside the order status
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

impl OrderStatus {
    /// Next state after `action`, or `InvalidTransition`.
    pub fn apply(self, action: OrderAction) -> AppResult<OrderStatus> {
        use OrderAction as A;
        use OrderStatus as S;

        let next = match (self, action) {
            (S::PendingPayment, A::ConfirmPayment) => S::PendingApproval,
            (S::PendingApproval, A::Approve) => S::AwaitingFulfillment,
            (S::AwaitingFulfillment, A::SubmitFulfillment) => S::FulfillmentSubmitted,
            (S::FulfillmentSubmitted, A::ApproveFulfillment) => S::Fulfilled,
            (S::FulfillmentSubmitted, A::RejectFulfillment) => S::AwaitingFulfillment,
            (S::Fulfilled, A::Ship) => S::Shipped,
            (S::Shipped, A::Deliver) => S::Delivered,
            (S::PendingPayment, A::Cancel) => S::Cancelled,
            (s, A::Refund) if s.is_refundable() => S::Refunded,
            (from, action) => {
                return Err(AppError::InvalidTransition {
                    from: from.to_string(),
                    action: action.to_string(),
                })
            }
        };
        Ok(next)
    }

    pub fn is_refundable(&self) -> bool {
        matches!(
            self,
            OrderStatus::PendingApproval
                | OrderStatus::AwaitingFulfillment
                | OrderStatus::FulfillmentSubmitted
                | OrderStatus::Fulfilled
                | OrderStatus::Shipped
                | OrderStatus::Delivered
        )
    }

    /// Distributor stock has been taken for the order but not shipped yet.
    pub fn holds_distributor_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::FulfillmentSubmitted | OrderStatus::Fulfilled
        )
    }
}

/// Order header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[schema(value_type = String, example = "49.98")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "9.99")]
    pub shipping: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub tax: Decimal,
    #[schema(value_type = String, example = "59.97")]
    pub total: Decimal,
    pub discount_code: Option<String>,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub distributor_id: Option<Uuid>,
    pub payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub fulfillment_proof_url: Option<String>,
    pub fulfillment_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_assigned_to(&self, distributor_id: Uuid) -> bool {
        self.distributor_id == Some(distributor_id)
    }

    /// Amount commissions are computed from: subtotal less discount.
    pub fn commissionable_amount(&self) -> Decimal {
        (self.subtotal - self.discount).max(Decimal::ZERO)
    }
}

/// Order line with a price snapshot taken at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variation_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

/// One row of an order's audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusChange {
    pub id: Uuid,
    pub order_id: Uuid,
    /// None for the creation entry
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    /// None when the change came from a webhook
    pub actor_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order with its lines and history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusChange>,
}

/// Order listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub distributor_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Data for inserting an order at checkout
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub discount_code: Option<String>,
    pub shipping_address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub variation_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_delivered() {
        let steps = [
            OrderAction::ConfirmPayment,
            OrderAction::Approve,
            OrderAction::SubmitFulfillment,
            OrderAction::ApproveFulfillment,
            OrderAction::Ship,
            OrderAction::Deliver,
        ];
        let end = steps
            .iter()
            .try_fold(OrderStatus::PendingPayment, |s, a| s.apply(*a))
            .unwrap();
        assert_eq!(end, OrderStatus::Delivered);
    }

    #[test]
    fn rejected_fulfillment_goes_back_to_awaiting() {
        assert_eq!(
            OrderStatus::FulfillmentSubmitted
                .apply(OrderAction::RejectFulfillment)
                .unwrap(),
            OrderStatus::AwaitingFulfillment
        );
    }

    #[test]
    fn cannot_skip_approval() {
        let err = OrderStatus::PendingPayment
            .apply(OrderAction::Approve)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot approve an order that is pending_payment"
        );
    }

    #[test]
    fn cancel_only_before_payment() {
        assert_eq!(
            OrderStatus::PendingPayment.apply(OrderAction::Cancel).unwrap(),
            OrderStatus::Cancelled
        );
        assert!(OrderStatus::PendingApproval.apply(OrderAction::Cancel).is_err());
        assert!(OrderStatus::Shipped.apply(OrderAction::Cancel).is_err());
    }

    #[test]
    fn refund_allowed_only_after_payment() {
        for status in OrderStatus::ALL {
            let result = status.apply(OrderAction::Refund);
            match status {
                OrderStatus::PendingPayment
                | OrderStatus::Cancelled
                | OrderStatus::Refunded => assert!(result.is_err(), "{status}"),
                _ => assert_eq!(result.unwrap(), OrderStatus::Refunded),
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for action in OrderAction::ALL {
            assert!(OrderStatus::Cancelled.apply(*action).is_err());
            assert!(OrderStatus::Refunded.apply(*action).is_err());
        }
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(OrderStatus::FulfillmentSubmitted).unwrap(),
            "fulfillment_submitted"
        );
        assert_eq!(
            "awaiting_fulfillment".parse::<OrderStatus>().unwrap(),
            OrderStatus::AwaitingFulfillment
        );
    }
}
