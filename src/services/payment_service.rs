//! Payment webhook processing.
//!
//! The provider signs `"{timestamp}.{raw_body}"` with HMAC-SHA256. Each
//! event id is recorded before anything else happens in the transaction,
//! so a replayed delivery finds its id taken and changes nothing.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::workflow;
use crate::config::{Config, PricingConfig};
use crate::domain::{
    Order, OrderStatus, PaymentEventKind, PaymentOutcome, PaymentStatus, WebhookEvent,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{TransactionContext, UnitOfWork};
use crate::jobs::{notify, EmailJob, Notifier};
use crate::utils::signature;

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
}

/// Acknowledgement returned to the provider
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WebhookReceipt {
    /// `received`, or `duplicate` for a replayed event id
    #[schema(example = "received")]
    pub status: String,
    pub outcome: PaymentOutcome,
}

impl WebhookReceipt {
    fn new(outcome: PaymentOutcome) -> Self {
        let status = if outcome == PaymentOutcome::Duplicate {
            "duplicate"
        } else {
            "received"
        };
        Self {
            status: status.to_string(),
            outcome,
        }
    }
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Verify, parse and apply one webhook delivery.
    async fn handle_webhook(&self, signature: Option<&str>, payload: &[u8])
        -> AppResult<WebhookReceipt>;
}

pub struct PaymentProcessor<U: UnitOfWork> {
    uow: Arc<U>,
    webhook_secret: Vec<u8>,
    tolerance_seconds: i64,
    pricing: PricingConfig,
    notifier: Arc<dyn Notifier>,
}

impl<U: UnitOfWork> PaymentProcessor<U> {
    pub fn new(uow: Arc<U>, config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            uow,
            webhook_secret: config.webhook_secret_bytes().to_vec(),
            tolerance_seconds: config.webhook_tolerance_seconds,
            pricing: config.pricing.clone(),
            notifier,
        }
    }

    async fn send_confirmation(&self, order: &Order) {
        match self.uow.users().find_by_id(order.user_id).await {
            Ok(Some(customer)) => {
                notify(&*self.notifier, EmailJob::order_confirmation(&customer.email, order)).await
            }
            Ok(None) => tracing::warn!(order_id = %order.id, "Customer gone, confirmation skipped"),
            Err(e) => tracing::warn!(order_id = %order.id, error = %e, "Confirmation skipped"),
        }
    }
}

/// Apply an event whose id has just been recorded.
async fn apply_event(
    ctx: &TransactionContext<'_>,
    event: &WebhookEvent,
    kind: PaymentEventKind,
    commission_rate: Decimal,
) -> AppResult<(PaymentOutcome, Option<Order>)> {
    let order_id = event.data.order_id;
    let Some(mut order) = ctx.orders().find_for_update(order_id).await? else {
        tracing::warn!(event_id = %event.id, order_id = %order_id, "Webhook for unknown order");
        return Ok((PaymentOutcome::Ignored, None));
    };

    let outcome = match kind {
        PaymentEventKind::Succeeded => {
            if order.status != OrderStatus::PendingPayment {
                PaymentOutcome::Ignored
            } else if event.data.amount != order.total {
                tracing::warn!(
                    order_id = %order.id,
                    expected = %order.total,
                    received = %event.data.amount,
                    "Payment amount mismatch"
                );
                PaymentOutcome::AmountMismatch
            } else {
                workflow::confirm_payment(
                    ctx,
                    &mut order,
                    event.data.payment_id.clone(),
                    commission_rate,
                )
                .await?;
                PaymentOutcome::Processed
            }
        }
        PaymentEventKind::Failed => {
            if order.status == OrderStatus::PendingPayment
                && order.payment_status != PaymentStatus::Paid
            {
                order.payment_status = PaymentStatus::Failed;
                order = ctx.orders().save(&order).await?;
                PaymentOutcome::Processed
            } else {
                PaymentOutcome::Ignored
            }
        }
        PaymentEventKind::Refunded => {
            if order.status.is_refundable() {
                workflow::refund(
                    ctx,
                    &mut order,
                    None,
                    Some("Refunded by payment provider".to_string()),
                )
                .await?;
                PaymentOutcome::Processed
            } else {
                PaymentOutcome::Ignored
            }
        }
    };

    Ok((outcome, Some(order)))
}

#[async_trait]
impl<U: UnitOfWork> PaymentService for PaymentProcessor<U> {
    async fn handle_webhook(
        &self,
        signature_header: Option<&str>,
        payload: &[u8],
    ) -> AppResult<WebhookReceipt> {
        let header = signature_header.ok_or(AppError::InvalidSignature)?;
        signature::verify(
            &self.webhook_secret,
            header,
            payload,
            Utc::now().timestamp(),
            self.tolerance_seconds,
        )?;

        // Unknown event types may carry any payload shape, so only the
        // envelope is required to parse
        let envelope: EventEnvelope = serde_json::from_slice(payload)
            .map_err(|e| AppError::bad_request(format!("Malformed webhook payload: {}", e)))?;
        let handled = match PaymentEventKind::from_type(&envelope.event_type) {
            Some(kind) => {
                let event: WebhookEvent = serde_json::from_slice(payload).map_err(|e| {
                    AppError::bad_request(format!("Malformed webhook payload: {}", e))
                })?;
                Some((kind, event))
            }
            None => None,
        };
        let commission_rate = self.pricing.commission_rate;

        let (outcome, confirmed) = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let events = ctx.payment_events();
                    let order_id = handled.as_ref().map(|(_, event)| event.data.order_id);
                    let first_delivery = events
                        .record(&envelope.id, &envelope.event_type, order_id)
                        .await?;
                    if !first_delivery {
                        return Ok((PaymentOutcome::Duplicate, None));
                    }

                    let (outcome, confirmed) = match &handled {
                        Some((kind, event)) => {
                            let (outcome, order) =
                                apply_event(&ctx, event, *kind, commission_rate).await?;
                            (outcome, order.filter(|_| *kind == PaymentEventKind::Succeeded))
                        }
                        None => (PaymentOutcome::Ignored, None),
                    };
                    events.set_outcome(&envelope.id, outcome).await?;

                    tracing::info!(
                        event_id = %envelope.id,
                        event_type = %envelope.event_type,
                        outcome = %outcome,
                        "Payment event handled"
                    );
                    Ok((outcome, confirmed))
                })
            })
            .await?;

        if let (PaymentOutcome::Processed, Some(order)) = (outcome, &confirmed) {
            self.send_confirmation(order).await;
        }

        Ok(WebhookReceipt::new(outcome))
    }
}
