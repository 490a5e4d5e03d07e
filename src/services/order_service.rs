//! Order service - checkout and customer-facing order operations.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{parallel, workflow};
use crate::config::PricingConfig;
use crate::domain::{
    CartLine, CurrentUser, DiscountCode, Location, NewOrder, NewOrderItem, Order, OrderAction,
    OrderDetail, OrderFilter, OrderStatus, PriceBreakdown, UserRole,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

/// Checkout input
#[derive(Debug, Clone)]
pub struct Checkout {
    pub shipping_address: String,
    pub discount_code: Option<String>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Turn the caller's cart into a `pending_payment` order.
    async fn checkout(&self, user_id: Uuid, role: UserRole, checkout: Checkout) -> AppResult<Order>;

    async fn list_mine(&self, user_id: Uuid, params: PaginationParams)
        -> AppResult<Paginated<Order>>;

    /// Order with lines and history, visible to its owner, admins and the
    /// assigned distributor.
    async fn get(&self, viewer: &CurrentUser, id: Uuid) -> AppResult<OrderDetail>;

    async fn list(&self, filter: OrderFilter, params: PaginationParams)
        -> AppResult<Paginated<Order>>;

    /// Cancel an unpaid order (owner or admin).
    async fn cancel(&self, actor: &CurrentUser, id: Uuid) -> AppResult<Order>;
}

pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
    pricing: PricingConfig,
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(uow: Arc<U>, pricing: PricingConfig) -> Self {
        Self { uow, pricing }
    }
}

fn can_view(viewer: &CurrentUser, order: &Order) -> bool {
    viewer.is_admin()
        || order.user_id == viewer.id
        || (viewer.has_role(UserRole::Distributor) && order.is_assigned_to(viewer.id))
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    async fn checkout(&self, user_id: Uuid, role: UserRole, checkout: Checkout) -> AppResult<Order> {
        let shipping_address = checkout.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(AppError::validation("Shipping address is required"));
        }
        let discount_code = checkout
            .discount_code
            .as_deref()
            .map(DiscountCode::normalize)
            .filter(|c| !c.is_empty());
        let notes = checkout.notes;
        let pricing = self.pricing.clone();

        let order = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let items = ctx.carts().items(user_id).await?;
                    if items.is_empty() {
                        return Err(AppError::bad_request("Cart is empty"));
                    }

                    let ids: Vec<Uuid> = items.iter().map(|i| i.variation_id).collect();
                    let catalog: HashMap<_, _> = ctx
                        .products()
                        .find_variations_with_products(ids.clone())
                        .await?
                        .into_iter()
                        .map(|(variation, product)| (variation.id, (variation, product)))
                        .collect();
                    let stock = ctx.inventory().quantities(ids, Location::Warehouse).await?;

                    let mut lines: Vec<CartLine> = Vec::with_capacity(items.len());
                    for item in &items {
                        let (variation, product) = catalog
                            .get(&item.variation_id)
                            .filter(|(variation, product)| product.is_purchasable(variation))
                            .ok_or_else(|| {
                                AppError::validation("An item in your cart is no longer available")
                            })?;
                        let available = stock.get(&item.variation_id).copied().unwrap_or(0);
                        if item.quantity > available {
                            return Err(AppError::insufficient_stock(format!(
                                "{} has {} available",
                                variation.sku, available
                            )));
                        }
                        lines.push(CartLine::price(item, variation, product, available, role));
                    }

                    let priced: Vec<_> = lines.iter().map(CartLine::priced).collect();
                    let subtotal = PriceBreakdown::subtotal_of(&priced);

                    let discounts = ctx.discounts();
                    let discount_amount = match &discount_code {
                        Some(code) => {
                            let discount = discounts
                                .find_by_code_for_update(code)
                                .await?
                                .ok_or_else(|| AppError::validation("Unknown discount code"))?;
                            let amount = discount.apply(subtotal, Utc::now())?;
                            discounts.increment_usage(discount.id).await?;
                            amount
                        }
                        None => Decimal::ZERO,
                    };

                    let totals = PriceBreakdown::compute(&priced, discount_amount, &pricing);
                    let order_lines = lines
                        .into_iter()
                        .map(|line| NewOrderItem {
                            variation_id: line.variation_id,
                            product_name: line.product_name,
                            sku: line.sku,
                            quantity: line.quantity,
                            unit_price: line.unit_price,
                            line_total: line.line_total,
                        })
                        .collect();

                    let orders = ctx.orders();
                    let order = orders
                        .insert(
                            NewOrder {
                                user_id,
                                subtotal: totals.subtotal,
                                discount: totals.discount,
                                shipping: totals.shipping,
                                tax: totals.tax,
                                total: totals.total,
                                discount_code,
                                shipping_address,
                                notes,
                            },
                            order_lines,
                        )
                        .await?;
                    orders
                        .record_transition(
                            order.id,
                            None,
                            OrderStatus::PendingPayment,
                            Some(user_id),
                            None,
                        )
                        .await?;

                    ctx.carts().clear(user_id).await?;
                    Ok(order)
                })
            })
            .await?;

        tracing::info!(order_id = %order.id, user_id = %user_id, total = %order.total, "Order placed");
        Ok(order)
    }

    async fn list_mine(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Order>> {
        let filter = OrderFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.list(filter, params).await
    }

    async fn get(&self, viewer: &CurrentUser, id: Uuid) -> AppResult<OrderDetail> {
        let orders = self.uow.orders();
        let order = orders.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if !can_view(viewer, &order) {
            return Err(AppError::Forbidden);
        }

        let (items, history) = parallel::join2(orders.items(id), orders.history(id)).await?;
        Ok(OrderDetail {
            order,
            items,
            history,
        })
    }

    async fn list(
        &self,
        filter: OrderFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Order>> {
        let page = self.uow.orders().list(&filter, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn cancel(&self, actor: &CurrentUser, id: Uuid) -> AppResult<Order> {
        let actor_id = actor.id;
        let is_admin = actor.is_admin();

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, id).await?;
                    if !is_admin && order.user_id != actor_id {
                        return Err(AppError::Forbidden);
                    }

                    workflow::transition(
                        &ctx,
                        &mut order,
                        OrderAction::Cancel,
                        Some(actor_id),
                        None,
                    )
                    .await?;

                    if let Some(code) = &order.discount_code {
                        ctx.discounts().release_usage(code).await?;
                    }
                    ctx.tasks().cancel_open(order.id, None).await?;
                    Ok(order)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseConnection, DbBackend, MockDatabase};

    use super::*;
    use crate::domain::UserStatus;
    use crate::infra::repositories::entities::order;
    use crate::infra::repositories::fixtures::{
        affected, cart_row, discount_row, executed_sql, matching, money, order_row, product_row,
        stock_row, variation_row,
    };
    use crate::infra::Persistence;

    fn manager(db: &DatabaseConnection) -> OrderManager<Persistence> {
        OrderManager::new(Arc::new(Persistence::new(db.clone())), PricingConfig::default())
    }

    fn checkout(code: &str) -> Checkout {
        Checkout {
            shipping_address: "1 Main St, Springfield".to_string(),
            discount_code: Some(code.to_string()),
            notes: None,
        }
    }

    /// Cart of two 25.00 units with plenty of warehouse stock.
    fn stocked_cart(user_id: Uuid) -> MockDatabase {
        let (product_id, variation_id) = (Uuid::new_v4(), Uuid::new_v4());
        MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![cart_row(user_id, variation_id, 2)]])
            .append_query_results([vec![(
                variation_row(variation_id, product_id, "CBC-STRONG"),
                product_row(product_id, 2500),
            )]])
            .append_query_results([vec![stock_row(variation_id, Location::Warehouse, 10)]])
            .append_query_results([vec![discount_row("SPRING5", 500)]])
    }

    #[tokio::test]
    async fn checkout_spends_a_discount_use_and_clears_the_cart() {
        let (user_id, order_id) = (Uuid::new_v4(), Uuid::new_v4());
        let placed = order::Model {
            discount: money(500),
            total: money(5499),
            discount_code: Some("SPRING5".to_string()),
            ..order_row(order_id, user_id, OrderStatus::PendingPayment)
        };
        let db = stocked_cart(user_id)
            .append_query_results([vec![placed]])
            // Usage, order lines, history, cart
            .append_exec_results([affected(1), affected(1), affected(1), affected(1)])
            .into_connection();

        let order = manager(&db)
            .checkout(user_id, UserRole::Retail, checkout(" spring5 "))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.discount_code.as_deref(), Some("SPRING5"));

        let sql = executed_sql(db);
        assert!(sql.last().is_some_and(|s| s == "COMMIT"));
        let locked = matching(&sql, r#"FROM "discount_codes""#);
        assert_eq!(locked.len(), 1);
        assert!(locked[0].contains("'SPRING5'") && locked[0].contains("FOR UPDATE"));
        let usage = matching(&sql, r#"UPDATE "discount_codes""#);
        assert_eq!(usage.len(), 1);
        assert!(usage[0].contains(r#""used_count" + 1"#));
        let header = matching(&sql, r#"INSERT INTO "orders""#);
        assert_eq!(header.len(), 1);
        // 50.00 - 5.00 + 9.99 shipping
        assert!(header[0].contains("5.00") && header[0].contains("54.99"));
        assert!(matching(&sql, r#"INSERT INTO "order_items""#)[0].contains("'CBC-STRONG'"));
        let cleared = matching(&sql, r#"DELETE FROM "cart_items""#);
        assert_eq!(cleared.len(), 1);
        assert!(cleared[0].contains(&user_id.to_string()));
    }

    #[tokio::test]
    async fn exhausted_discount_rolls_back_checkout() {
        let user_id = Uuid::new_v4();
        // Another checkout took the last use after the code was read
        let db = stocked_cart(user_id)
            .append_exec_results([affected(0)])
            .into_connection();

        let result = manager(&db)
            .checkout(user_id, UserRole::Retail, checkout("SPRING5"))
            .await;
        assert!(
            matches!(&result, Err(AppError::Validation(msg)) if msg.contains("fully used")),
            "got {:?}",
            result
        );

        let sql = executed_sql(db);
        assert!(sql.last().is_some_and(|s| s == "ROLLBACK"));
        assert!(matching(&sql, r#"INSERT INTO "orders""#).is_empty());
        assert_eq!(matching(&sql, "cart_items").len(), 1);
    }

    #[tokio::test]
    async fn cancelling_gives_the_discount_use_back() {
        let (user_id, order_id) = (Uuid::new_v4(), Uuid::new_v4());
        let unpaid = order::Model {
            discount_code: Some("SPRING5".to_string()),
            ..order_row(order_id, user_id, OrderStatus::PendingPayment)
        };
        let cancelled = order::Model {
            status: OrderStatus::Cancelled.as_str().to_string(),
            ..unpaid.clone()
        };
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![unpaid.clone()], vec![unpaid], vec![cancelled]])
            // History, released use, tasks
            .append_exec_results([affected(1), affected(1), affected(0)])
            .into_connection();

        let owner = CurrentUser {
            id: user_id,
            email: "retail@example.com".to_string(),
            role: UserRole::Retail,
            status: UserStatus::Active,
        };
        let order = manager(&db).cancel(&owner, order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);

        let sql = executed_sql(db);
        assert!(sql.last().is_some_and(|s| s == "COMMIT"));
        let released = matching(&sql, r#"UPDATE "discount_codes""#);
        assert_eq!(released.len(), 1);
        assert!(released[0].contains(r#""used_count" - 1"#) && released[0].contains("'SPRING5'"));
        assert!(matching(&sql, r#"UPDATE "tasks""#)[0].contains("'cancelled'"));
    }

    #[tokio::test]
    async fn customers_cannot_cancel_each_others_orders() {
        let order_id = Uuid::new_v4();
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![order_row(order_id, Uuid::new_v4(), OrderStatus::PendingPayment)]])
            .into_connection();

        let stranger = CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role: UserRole::Retail,
            status: UserStatus::Active,
        };
        let result = manager(&db).cancel(&stranger, order_id).await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let sql = executed_sql(db);
        assert!(sql.last().is_some_and(|s| s == "ROLLBACK"));
        assert!(matching(&sql, "discount_codes").is_empty());
    }
}
