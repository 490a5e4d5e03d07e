//! Order workflow steps shared by the order, fulfillment and payment services.
//!
//! Every function here runs against a [`TransactionContext`] and expects the
//! order to have been loaded with [`lock_order`]. Side effects (history row,
//! tasks, commissions, stock) are written in the same transaction as the
//! status change.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::pricing::commission_for;
use crate::domain::{
    Location, NewTask, Order, OrderAction, OrderItem, PaymentStatus, StockMove, TaskKind,
};
use crate::errors::{AppError, AppResult};
use crate::infra::TransactionContext;

/// Load an order and hold its row lock until commit.
pub(crate) async fn lock_order(ctx: &TransactionContext<'_>, order_id: Uuid) -> AppResult<Order> {
    ctx.orders()
        .find_for_update(order_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Apply `action`, persist the order (including any field changes the
/// caller already made) and append the history row.
pub(crate) async fn transition(
    ctx: &TransactionContext<'_>,
    order: &mut Order,
    action: OrderAction,
    actor_id: Option<Uuid>,
    note: Option<String>,
) -> AppResult<()> {
    let from = order.status;
    order.status = from.apply(action)?;

    let orders = ctx.orders();
    *order = orders.save(order).await?;
    orders
        .record_transition(order.id, Some(from), order.status, actor_id, note)
        .await?;

    tracing::info!(
        order_id = %order.id,
        from = %from,
        to = %order.status,
        action = %action,
        "Order transitioned"
    );
    Ok(())
}

/// Mark a `pending_payment` order paid, credit the referrer and queue it
/// for approval.
pub(crate) async fn confirm_payment(
    ctx: &TransactionContext<'_>,
    order: &mut Order,
    payment_id: String,
    commission_rate: Decimal,
) -> AppResult<()> {
    order.payment_status = PaymentStatus::Paid;
    order.paid_at = Some(chrono::Utc::now());
    order.payment_id = Some(payment_id);
    transition(
        ctx,
        order,
        OrderAction::ConfirmPayment,
        None,
        Some("Payment confirmed".to_string()),
    )
    .await?;

    let referrer = ctx
        .users()
        .find_by_id(order.user_id)
        .await?
        .and_then(|customer| customer.referred_by);
    if let Some(referrer_id) = referrer {
        let commissions = ctx.commissions();
        // One commission per order
        if !commissions.exists_for_order(order.id).await? {
            let amount = commission_for(order.commissionable_amount(), commission_rate);
            if amount > Decimal::ZERO {
                commissions
                    .create(referrer_id, order.id, amount, commission_rate)
                    .await?;
                tracing::info!(order_id = %order.id, referrer_id = %referrer_id, amount = %amount, "Commission created");
            }
        }
    }

    ctx.tasks()
        .create(NewTask::for_admins(TaskKind::ApproveOrder, order.id))
        .await
}

/// Refund an order: reverses commissions, closes open tasks and puts
/// stock taken by the distributor but not yet shipped back on their shelf.
pub(crate) async fn refund(
    ctx: &TransactionContext<'_>,
    order: &mut Order,
    actor_id: Option<Uuid>,
    reason: Option<String>,
) -> AppResult<()> {
    let held_stock = order.status.holds_distributor_stock();

    order.payment_status = PaymentStatus::Refunded;
    transition(ctx, order, OrderAction::Refund, actor_id, reason).await?;

    if held_stock {
        if let Some(distributor_id) = order.distributor_id {
            let items = ctx.orders().items(order.id).await?;
            return_stock(ctx, order.id, distributor_id, &items, "refund_return", actor_id).await?;
        }
    }

    let cancelled = ctx.commissions().cancel_for_order(order.id).await?;
    if cancelled > 0 {
        tracing::info!(order_id = %order.id, "Commission cancelled by refund");
    }
    ctx.tasks().cancel_open(order.id, None).await?;
    Ok(())
}

/// Take every line from the distributor's stock. Any shortfall fails the
/// whole transaction.
pub(crate) async fn take_stock(
    ctx: &TransactionContext<'_>,
    order_id: Uuid,
    distributor_id: Uuid,
    items: &[OrderItem],
    actor_id: Uuid,
) -> AppResult<()> {
    let inventory = ctx.inventory();
    for item in items {
        let movement = StockMove::new(item.variation_id, item.quantity, "fulfillment")
            .from(Location::Distributor(distributor_id))
            .for_order(order_id)
            .by(Some(actor_id));
        inventory.apply(&movement).await.map_err(|e| match e {
            AppError::InsufficientStock(_) => AppError::insufficient_stock(format!(
                "{} (need {})",
                item.sku, item.quantity
            )),
            other => other,
        })?;
    }
    Ok(())
}

pub(crate) async fn return_stock(
    ctx: &TransactionContext<'_>,
    order_id: Uuid,
    distributor_id: Uuid,
    items: &[OrderItem],
    reason: &str,
    actor_id: Option<Uuid>,
) -> AppResult<()> {
    let inventory = ctx.inventory();
    for item in items {
        let movement = StockMove::new(item.variation_id, item.quantity, reason)
            .to(Location::Distributor(distributor_id))
            .for_order(order_id)
            .by(actor_id);
        inventory.apply(&movement).await?;
    }
    Ok(())
}

