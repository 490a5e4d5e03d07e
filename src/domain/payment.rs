//! Payment provider webhook events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Event types the store acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentEventKind {
    /// `None` for event types the store does not handle.
    pub fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "payment.succeeded" => Some(Self::Succeeded),
            "payment.failed" => Some(Self::Failed),
            "charge.refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

string_enum! {
    /// What processing an event did
    pub enum PaymentOutcome {
        Processed => "processed",
        /// Event id seen before
        Duplicate => "duplicate",
        /// Paid amount differs from the order total
        AmountMismatch => "amount_mismatch",
        /// Unknown type, or the order was not in a state the event applies to
        Ignored => "ignored",
    }
}

/// Webhook payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookEvent {
    /// Provider event id, unique per delivery
    #[schema(example = "evt_1NqK2b")]
    pub id: String,
    #[serde(rename = "type")]
    #[schema(example = "payment.succeeded")]
    pub event_type: String,
    pub data: WebhookEventData,
}

impl WebhookEvent {
    pub fn kind(&self) -> Option<PaymentEventKind> {
        PaymentEventKind::from_type(&self.event_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookEventData {
    pub order_id: Uuid,
    #[schema(example = "pi_3NqK2b")]
    pub payment_id: String,
    #[schema(value_type = String, example = "59.97")]
    pub amount: Decimal,
    #[serde(default)]
    #[schema(example = "usd")]
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_payload() {
        let order_id = Uuid::new_v4();
        let body = serde_json::json!({
            "id": "evt_1",
            "type": "payment.succeeded",
            "data": {"order_id": order_id, "payment_id": "pi_1", "amount": "59.97", "currency": "usd"}
        });
        let event: WebhookEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.kind(), Some(PaymentEventKind::Succeeded));
        assert_eq!(event.data.order_id, order_id);
        assert_eq!(event.data.amount, Decimal::new(5997, 2));
    }

    #[test]
    fn unknown_types_have_no_kind() {
        assert_eq!(PaymentEventKind::from_type("customer.created"), None);
        assert_eq!(
            PaymentEventKind::from_type("charge.refunded"),
            Some(PaymentEventKind::Refunded)
        );
    }
}
