//! Order repository: headers, lines and the status history.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, fetch_page};
use super::entities::order::{self, Entity as OrderEntity};
use super::entities::order_item::{self, Entity as OrderItemEntity};
use super::entities::order_status_history::{self, Entity as HistoryEntity};
use crate::domain::{
    NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderStatus, OrderStatusChange,
    PaymentStatus,
};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    async fn items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>>;

    /// Status changes in the order they happened
    async fn history(&self, order_id: Uuid) -> AppResult<Vec<OrderStatusChange>>;

    /// Orders matching `filter`, newest first
    async fn list(
        &self,
        filter: &OrderFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Order>, u64)>;

    async fn count_by_status(&self) -> AppResult<HashMap<OrderStatus, u64>>;

    /// Sum of totals of orders whose payment status is `paid`
    async fn paid_revenue(&self) -> AppResult<Decimal>;
}

pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let model = OrderEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        items_of(&self.db, order_id).await
    }

    async fn history(&self, order_id: Uuid) -> AppResult<Vec<OrderStatusChange>> {
        let models = HistoryEntity::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .all(&self.db)
            .await?;
        convert_all(models)
    }

    async fn list(
        &self,
        filter: &OrderFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Order>, u64)> {
        let mut select = OrderEntity::find();
        if let Some(status) = filter.status {
            select = select.filter(order::Column::Status.eq(status.as_str()));
        }
        if let Some(distributor_id) = filter.distributor_id {
            select = select.filter(order::Column::DistributorId.eq(distributor_id));
        }
        if let Some(user_id) = filter.user_id {
            select = select.filter(order::Column::UserId.eq(user_id));
        }
        let select = select.order_by_desc(order::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }

    async fn count_by_status(&self) -> AppResult<HashMap<OrderStatus, u64>> {
        let rows: Vec<(String, i64)> = OrderEntity::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(Expr::col(order::Column::Id).count(), "count")
            .group_by(order::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut counts = HashMap::new();
        for (status, count) in rows {
            let status: OrderStatus = super::entities::parse_column(&status)?;
            counts.insert(status, u64::try_from(count).unwrap_or(0));
        }
        Ok(counts)
    }

    async fn paid_revenue(&self) -> AppResult<Decimal> {
        let total: Option<Option<Decimal>> = OrderEntity::find()
            .select_only()
            .column_as(Expr::col(order::Column::Total).sum(), "revenue")
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}

/// Transaction-bound order writes used by every workflow step.
pub struct TxOrderRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxOrderRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Load the order and hold its row lock until commit.
    pub async fn find_for_update(&self, id: Uuid) -> AppResult<Option<Order>> {
        let model = OrderEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await?;
        convert_one(model)
    }

    pub async fn items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        items_of(self.txn, order_id).await
    }

    /// Insert a new `pending_payment` order with its lines.
    pub async fn insert(&self, new_order: NewOrder, lines: Vec<NewOrderItem>) -> AppResult<Order> {
        let now = chrono::Utc::now();
        let order_id = Uuid::new_v4();

        let header = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(new_order.user_id),
            status: Set(OrderStatus::PendingPayment.as_str().to_string()),
            payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
            subtotal: Set(new_order.subtotal),
            discount: Set(new_order.discount),
            shipping: Set(new_order.shipping),
            tax: Set(new_order.tax),
            total: Set(new_order.total),
            discount_code: Set(new_order.discount_code),
            shipping_address: Set(new_order.shipping_address),
            notes: Set(new_order.notes),
            distributor_id: Set(None),
            payment_id: Set(None),
            paid_at: Set(None),
            tracking_number: Set(None),
            carrier: Set(None),
            fulfillment_proof_url: Set(None),
            fulfillment_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = header.insert(self.txn).await?;

        let rows: Vec<order_item::ActiveModel> = lines
            .into_iter()
            .map(|line| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                variation_id: Set(line.variation_id),
                product_name: Set(line.product_name),
                sku: Set(line.sku),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
            })
            .collect();
        if !rows.is_empty() {
            OrderItemEntity::insert_many(rows)
                .exec_without_returning(self.txn)
                .await?;
        }

        Order::try_from(model)
    }

    /// Persist every mutable field of `order`.
    pub async fn save(&self, order: &Order) -> AppResult<Order> {
        let existing = OrderEntity::find_by_id(order.id)
            .one(self.txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active = existing.into_active_model();
        active.status = Set(order.status.as_str().to_string());
        active.payment_status = Set(order.payment_status.as_str().to_string());
        active.distributor_id = Set(order.distributor_id);
        active.payment_id = Set(order.payment_id.clone());
        active.paid_at = Set(order.paid_at);
        active.tracking_number = Set(order.tracking_number.clone());
        active.carrier = Set(order.carrier.clone());
        active.fulfillment_proof_url = Set(order.fulfillment_proof_url.clone());
        active.fulfillment_notes = Set(order.fulfillment_notes.clone());
        active.updated_at = Set(chrono::Utc::now());

        Order::try_from(active.update(self.txn).await?)
    }

    /// Append one row to the audit trail.
    pub async fn record_transition(
        &self,
        order_id: Uuid,
        from: Option<OrderStatus>,
        to: OrderStatus,
        actor_id: Option<Uuid>,
        note: Option<String>,
    ) -> AppResult<()> {
        let row = order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            from_status: Set(from.map(|s| s.as_str().to_string())),
            to_status: Set(to.as_str().to_string()),
            actor_id: Set(actor_id),
            note: Set(note),
            created_at: Set(chrono::Utc::now()),
        };
        HistoryEntity::insert(row)
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }
}

async fn items_of<C: ConnectionTrait>(db: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let models = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Sku)
        .all(db)
        .await?;
    Ok(models.into_iter().map(OrderItem::from).collect())
}
