//! Fulfillment service - the back-office side of the order state machine.
//!
//! Admins approve orders and assign distributors, distributors submit
//! fulfillment against their own stock, admins verify it, and either side
//! ships and marks delivery. Each step is one transaction over the locked
//! order row.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::workflow;
use crate::domain::{
    CurrentUser, Location, NewTask, Order, OrderAction, OrderFilter, OrderStatus, StockLevel,
    TaskKind, UserRole, UserStatus,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::jobs::{notify, EmailJob, Notifier};
use crate::types::{Paginated, PaginationParams};

/// Proof submitted with a fulfillment
#[derive(Debug, Clone, Default)]
pub struct FulfillmentReport {
    pub proof_url: Option<String>,
    pub notes: Option<String>,
}

/// Carrier details for a shipment
#[derive(Debug, Clone)]
pub struct Shipment {
    pub tracking_number: String,
    pub carrier: Option<String>,
}

#[async_trait]
pub trait FulfillmentService: Send + Sync {
    async fn approve(&self, admin_id: Uuid, order_id: Uuid, note: Option<String>)
        -> AppResult<Order>;

    /// Assign (or re-assign) the distributor of an `awaiting_fulfillment` order.
    async fn assign_distributor(
        &self,
        admin_id: Uuid,
        order_id: Uuid,
        distributor_id: Uuid,
    ) -> AppResult<Order>;

    /// Distributor reports the order packed, taking stock from their location.
    async fn submit_fulfillment(
        &self,
        distributor_id: Uuid,
        order_id: Uuid,
        report: FulfillmentReport,
    ) -> AppResult<Order>;

    async fn verify_fulfillment(
        &self,
        admin_id: Uuid,
        order_id: Uuid,
        approved: bool,
        note: Option<String>,
    ) -> AppResult<Order>;

    async fn ship(&self, actor: &CurrentUser, order_id: Uuid, shipment: Shipment)
        -> AppResult<Order>;

    async fn deliver(&self, actor: &CurrentUser, order_id: Uuid) -> AppResult<Order>;

    async fn refund(&self, admin_id: Uuid, order_id: Uuid, reason: String) -> AppResult<Order>;

    async fn distributor_orders(
        &self,
        distributor_id: Uuid,
        status: Option<OrderStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Order>>;

    async fn distributor_inventory(&self, distributor_id: Uuid) -> AppResult<Vec<StockLevel>>;
}

pub struct FulfillmentManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Arc<dyn Notifier>,
}

impl<U: UnitOfWork> FulfillmentManager<U> {
    pub fn new(uow: Arc<U>, notifier: Arc<dyn Notifier>) -> Self {
        Self { uow, notifier }
    }

    async fn send_shipping_notice(&self, order: &Order) {
        match self.uow.users().find_by_id(order.user_id).await {
            Ok(Some(customer)) => {
                notify(&*self.notifier, EmailJob::order_shipped(&customer.email, order)).await
            }
            Ok(None) => tracing::warn!(order_id = %order.id, "Customer gone, shipping email skipped"),
            Err(e) => tracing::warn!(order_id = %order.id, error = %e, "Shipping email skipped"),
        }
    }
}

/// Admins act on any order, distributors only on their own.
fn ensure_handler(order: &Order, actor_id: Uuid, is_admin: bool) -> AppResult<()> {
    if is_admin || order.is_assigned_to(actor_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn assigned_distributor(order: &Order) -> AppResult<Uuid> {
    order
        .distributor_id
        .ok_or_else(|| AppError::invalid_state("Order has no distributor assigned"))
}

#[async_trait]
impl<U: UnitOfWork> FulfillmentService for FulfillmentManager<U> {
    async fn approve(
        &self,
        admin_id: Uuid,
        order_id: Uuid,
        note: Option<String>,
    ) -> AppResult<Order> {
        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    workflow::transition(&ctx, &mut order, OrderAction::Approve, Some(admin_id), note)
                        .await?;

                    let tasks = ctx.tasks();
                    tasks
                        .complete_open(order.id, TaskKind::ApproveOrder, Some(admin_id))
                        .await?;
                    tasks
                        .create(NewTask::for_admins(TaskKind::AssignDistributor, order.id))
                        .await?;
                    Ok(order)
                })
            })
            .await
    }

    async fn assign_distributor(
        &self,
        admin_id: Uuid,
        order_id: Uuid,
        distributor_id: Uuid,
    ) -> AppResult<Order> {
        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    if order.status != OrderStatus::AwaitingFulfillment {
                        return Err(AppError::InvalidTransition {
                            from: order.status.to_string(),
                            action: "assign a distributor to".to_string(),
                        });
                    }

                    let distributor = ctx
                        .users()
                        .find_by_id(distributor_id)
                        .await?
                        .filter(|u| u.role == UserRole::Distributor && u.status == UserStatus::Active)
                        .ok_or_else(|| AppError::validation("Target user is not an active distributor"))?;

                    if order.is_assigned_to(distributor.id) {
                        return Ok(order);
                    }

                    let tasks = ctx.tasks();
                    let previous = order.distributor_id;
                    if previous.is_some() {
                        // The old assignee's work item goes away with the assignment
                        tasks
                            .cancel_open(order.id, Some(TaskKind::FulfillOrder))
                            .await?;
                    }

                    order.distributor_id = Some(distributor.id);
                    let orders = ctx.orders();
                    order = orders.save(&order).await?;
                    orders
                        .record_transition(
                            order.id,
                            Some(order.status),
                            order.status,
                            Some(admin_id),
                            Some(format!("Assigned to distributor {}", distributor.id)),
                        )
                        .await?;

                    tasks
                        .complete_open(order.id, TaskKind::AssignDistributor, Some(admin_id))
                        .await?;
                    tasks
                        .create(NewTask::for_user(
                            TaskKind::FulfillOrder,
                            distributor.id,
                            order.id,
                        ))
                        .await?;

                    tracing::info!(
                        order_id = %order.id,
                        distributor_id = %distributor.id,
                        reassigned = previous.is_some(),
                        "Distributor assigned"
                    );
                    Ok(order)
                })
            })
            .await
    }

    async fn submit_fulfillment(
        &self,
        distributor_id: Uuid,
        order_id: Uuid,
        report: FulfillmentReport,
    ) -> AppResult<Order> {
        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    if !order.is_assigned_to(distributor_id) {
                        return Err(AppError::Forbidden);
                    }

                    order.fulfillment_proof_url = report.proof_url;
                    order.fulfillment_notes = report.notes;
                    workflow::transition(
                        &ctx,
                        &mut order,
                        OrderAction::SubmitFulfillment,
                        Some(distributor_id),
                        None,
                    )
                    .await?;

                    let items = ctx.orders().items(order.id).await?;
                    workflow::take_stock(&ctx, order.id, distributor_id, &items, distributor_id)
                        .await?;

                    let tasks = ctx.tasks();
                    tasks
                        .complete_open(order.id, TaskKind::FulfillOrder, Some(distributor_id))
                        .await?;
                    tasks
                        .create(NewTask::for_admins(TaskKind::VerifyFulfillment, order.id))
                        .await?;
                    Ok(order)
                })
            })
            .await
    }

    async fn verify_fulfillment(
        &self,
        admin_id: Uuid,
        order_id: Uuid,
        approved: bool,
        note: Option<String>,
    ) -> AppResult<Order> {
        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    let action = if approved {
                        OrderAction::ApproveFulfillment
                    } else {
                        OrderAction::RejectFulfillment
                    };
                    workflow::transition(&ctx, &mut order, action, Some(admin_id), note).await?;

                    let distributor_id = assigned_distributor(&order)?;
                    let tasks = ctx.tasks();
                    tasks
                        .complete_open(order.id, TaskKind::VerifyFulfillment, Some(admin_id))
                        .await?;

                    if approved {
                        tasks
                            .create(NewTask::for_user(TaskKind::ShipOrder, distributor_id, order.id))
                            .await?;
                    } else {
                        let items = ctx.orders().items(order.id).await?;
                        workflow::return_stock(
                            &ctx,
                            order.id,
                            distributor_id,
                            &items,
                            "fulfillment_rejected",
                            Some(admin_id),
                        )
                        .await?;
                        tasks
                            .create(NewTask::for_user(
                                TaskKind::FulfillOrder,
                                distributor_id,
                                order.id,
                            ))
                            .await?;
                    }
                    Ok(order)
                })
            })
            .await
    }

    async fn ship(
        &self,
        actor: &CurrentUser,
        order_id: Uuid,
        shipment: Shipment,
    ) -> AppResult<Order> {
        let tracking_number = shipment.tracking_number.trim().to_string();
        if tracking_number.is_empty() {
            return Err(AppError::validation("Tracking number is required"));
        }
        let carrier = shipment.carrier;
        let actor_id = actor.id;
        let is_admin = actor.is_admin();

        let order = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    ensure_handler(&order, actor_id, is_admin)?;

                    order.tracking_number = Some(tracking_number);
                    order.carrier = carrier;
                    workflow::transition(&ctx, &mut order, OrderAction::Ship, Some(actor_id), None)
                        .await?;

                    ctx.tasks()
                        .complete_open(order.id, TaskKind::ShipOrder, Some(actor_id))
                        .await?;
                    Ok(order)
                })
            })
            .await?;

        self.send_shipping_notice(&order).await;
        Ok(order)
    }

    async fn deliver(&self, actor: &CurrentUser, order_id: Uuid) -> AppResult<Order> {
        let actor_id = actor.id;
        let is_admin = actor.is_admin();

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    ensure_handler(&order, actor_id, is_admin)?;
                    workflow::transition(
                        &ctx,
                        &mut order,
                        OrderAction::Deliver,
                        Some(actor_id),
                        None,
                    )
                    .await?;
                    Ok(order)
                })
            })
            .await
    }

    async fn refund(&self, admin_id: Uuid, order_id: Uuid, reason: String) -> AppResult<Order> {
        let reason = Some(reason.trim().to_string()).filter(|r| !r.is_empty());

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut order = workflow::lock_order(&ctx, order_id).await?;
                    workflow::refund(&ctx, &mut order, Some(admin_id), reason).await?;
                    Ok(order)
                })
            })
            .await
    }

    async fn distributor_orders(
        &self,
        distributor_id: Uuid,
        status: Option<OrderStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Order>> {
        let filter = OrderFilter {
            status,
            distributor_id: Some(distributor_id),
            user_id: None,
        };
        let page = self.uow.orders().list(&filter, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn distributor_inventory(&self, distributor_id: Uuid) -> AppResult<Vec<StockLevel>> {
        self.uow
            .inventory()
            .list_levels(None, Some(Location::Distributor(distributor_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseConnection, DbBackend, MockDatabase};

    use super::*;
    use crate::domain::Location;
    use crate::infra::repositories::entities::order;
    use crate::infra::repositories::fixtures::{
        affected, assigned_order_row, executed_sql, item_row, matching, order_row, user_row,
    };
    use crate::infra::Persistence;
    use crate::jobs::MockNotifier;

    fn manager(db: &DatabaseConnection, notifier: MockNotifier) -> FulfillmentManager<Persistence> {
        FulfillmentManager::new(Arc::new(Persistence::new(db.clone())), Arc::new(notifier))
    }

    fn distributor(id: Uuid) -> CurrentUser {
        CurrentUser {
            id,
            email: "distributor@example.com".to_string(),
            role: UserRole::Distributor,
            status: UserStatus::Active,
        }
    }

    /// Lock, re-read for the save, and the `RETURNING` row of the save.
    fn transition_rows(before: order::Model, after: order::Model) -> [Vec<order::Model>; 3] {
        [vec![before.clone()], vec![before], vec![after]]
    }

    fn committed(sql: &[String]) -> bool {
        sql.last().is_some_and(|s| s == "COMMIT")
    }

    fn rolled_back(sql: &[String]) -> bool {
        sql.last().is_some_and(|s| s == "ROLLBACK")
    }

    #[tokio::test]
    async fn approval_hands_the_order_to_assignment() {
        let (id, customer) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                order_row(id, customer, OrderStatus::PendingApproval),
                order_row(id, customer, OrderStatus::AwaitingFulfillment),
            ))
            .append_exec_results([affected(1), affected(1), affected(1)])
            .into_connection();

        let order = manager(&db, MockNotifier::new())
            .approve(Uuid::new_v4(), id, Some("Looks fine".to_string()))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingFulfillment);

        let sql = executed_sql(db);
        assert!(committed(&sql));
        let closed = matching(&sql, r#"UPDATE "tasks""#);
        assert_eq!(closed.len(), 1);
        assert!(closed[0].contains("'approve_order'") && closed[0].contains("'completed'"));
        let opened = matching(&sql, r#"INSERT INTO "tasks""#);
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("'assign_distributor'"));
    }

    #[tokio::test]
    async fn short_distributor_stock_rolls_back_the_submission() {
        let (id, dist, variation) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::AwaitingFulfillment, dist),
                assigned_order_row(id, OrderStatus::FulfillmentSubmitted, dist),
            ))
            .append_query_results([vec![item_row(id, variation, "CBC-STRONG", 3)]])
            // History row, then the guarded decrement finds too few units
            .append_exec_results([affected(1), affected(0)])
            .into_connection();

        let result = manager(&db, MockNotifier::new())
            .submit_fulfillment(dist, id, FulfillmentReport::default())
            .await;
        assert!(
            matches!(&result, Err(AppError::InsufficientStock(msg)) if msg == "CBC-STRONG (need 3)"),
            "got {:?}",
            result
        );

        let sql = executed_sql(db);
        assert!(rolled_back(&sql));
        assert!(matching(&sql, "inventory_movements").is_empty());
        assert!(matching(&sql, r#"INSERT INTO "tasks""#).is_empty());
        let decrement = matching(&sql, r#"UPDATE "stock_levels""#);
        assert_eq!(decrement.len(), 1);
        assert!(decrement[0].contains(&Location::Distributor(dist).to_string()));
    }

    #[tokio::test]
    async fn submission_from_another_distributor_is_forbidden() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![assigned_order_row(
                id,
                OrderStatus::AwaitingFulfillment,
                Uuid::new_v4(),
            )]])
            .into_connection();

        let result = manager(&db, MockNotifier::new())
            .submit_fulfillment(Uuid::new_v4(), id, FulfillmentReport::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let sql = executed_sql(db);
        assert!(rolled_back(&sql));
        assert!(matching(&sql, r#"UPDATE "orders""#).is_empty());
    }

    #[tokio::test]
    async fn rejected_fulfillment_puts_stock_back_and_reopens_the_task() {
        let (id, dist, variation) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::FulfillmentSubmitted, dist),
                assigned_order_row(id, OrderStatus::AwaitingFulfillment, dist),
            ))
            .append_query_results([vec![item_row(id, variation, "CBC-STRONG", 3)]])
            .append_exec_results([affected(1), affected(1)])
            .append_exec_results([affected(1), affected(1), affected(1)])
            .into_connection();

        let order = manager(&db, MockNotifier::new())
            .verify_fulfillment(Uuid::new_v4(), id, false, Some("Blurry photo".to_string()))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingFulfillment);

        let sql = executed_sql(db);
        assert!(committed(&sql));
        let restock = matching(&sql, r#"INSERT INTO "stock_levels""#);
        assert_eq!(restock.len(), 1);
        assert!(restock[0].contains("ON CONFLICT"));
        let movement = matching(&sql, r#"INSERT INTO "inventory_movements""#);
        assert_eq!(movement.len(), 1);
        assert!(movement[0].contains("'fulfillment_rejected'"));
        assert!(movement[0].contains(&Location::Distributor(dist).to_string()));
        let reopened = matching(&sql, r#"INSERT INTO "tasks""#);
        assert_eq!(reopened.len(), 1);
        assert!(reopened[0].contains("'fulfill_order'"));
        assert!(reopened[0].contains(&dist.to_string()));
    }

    #[tokio::test]
    async fn reassignment_moves_the_fulfillment_task() {
        let (id, previous, next) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let held = assigned_order_row(id, OrderStatus::AwaitingFulfillment, previous);
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![held.clone()]])
            .append_query_results([vec![user_row(next, UserRole::Distributor)]])
            .append_query_results([
                vec![held],
                vec![assigned_order_row(id, OrderStatus::AwaitingFulfillment, next)],
            ])
            .append_exec_results([affected(1), affected(1), affected(0), affected(1)])
            .into_connection();

        let order = manager(&db, MockNotifier::new())
            .assign_distributor(Uuid::new_v4(), id, next)
            .await
            .unwrap();
        assert_eq!(order.distributor_id, Some(next));

        let sql = executed_sql(db);
        assert!(committed(&sql));
        let closed = matching(&sql, r#"UPDATE "tasks""#);
        assert_eq!(closed.len(), 2);
        assert!(closed[0].contains("'cancelled'") && closed[0].contains("'fulfill_order'"));
        assert!(closed[1].contains("'completed'") && closed[1].contains("'assign_distributor'"));
        let opened = matching(&sql, r#"INSERT INTO "tasks""#);
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains(&next.to_string()));
    }

    #[tokio::test]
    async fn only_active_distributors_can_be_assigned() {
        let (id, retail) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![order_row(
                id,
                Uuid::new_v4(),
                OrderStatus::AwaitingFulfillment,
            )]])
            .append_query_results([vec![user_row(retail, UserRole::Retail)]])
            .into_connection();

        let result = manager(&db, MockNotifier::new())
            .assign_distributor(Uuid::new_v4(), id, retail)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let sql = executed_sql(db);
        assert!(rolled_back(&sql));
        assert!(matching(&sql, r#"UPDATE "orders""#).is_empty());
        assert!(matching(&sql, r#""tasks""#).is_empty());
    }

    #[tokio::test]
    async fn shipping_records_tracking_and_emails_the_customer() {
        let (id, dist) = (Uuid::new_v4(), Uuid::new_v4());
        let shipped = order::Model {
            tracking_number: Some("1Z999".to_string()),
            carrier: Some("UPS".to_string()),
            ..assigned_order_row(id, OrderStatus::Shipped, dist)
        };
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::Fulfilled, dist),
                shipped,
            ))
            .append_exec_results([affected(1), affected(1)])
            // Customer lookup for the email, after commit
            .append_query_results([vec![user_row(Uuid::new_v4(), UserRole::Retail)]])
            .into_connection();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|job| job.to == "retail@example.com" && job.body.contains("UPS tracking number 1Z999"))
            .times(1)
            .returning(|_| Ok(()));

        let shipment = Shipment {
            tracking_number: " 1Z999 ".to_string(),
            carrier: Some("UPS".to_string()),
        };
        let order = manager(&db, notifier)
            .ship(&distributor(dist), id, shipment)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);

        let sql = executed_sql(db);
        let saved = matching(&sql, r#"UPDATE "orders""#);
        assert_eq!(saved.len(), 1);
        assert!(saved[0].contains("'1Z999'"));
        assert!(matching(&sql, r#"UPDATE "tasks""#)[0].contains("'ship_order'"));
    }

    #[tokio::test]
    async fn delivery_by_an_unassigned_distributor_is_forbidden() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![assigned_order_row(id, OrderStatus::Shipped, Uuid::new_v4())]])
            .into_connection();

        let result = manager(&db, MockNotifier::new())
            .deliver(&distributor(Uuid::new_v4()), id)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
        assert!(rolled_back(&executed_sql(db)));
    }

    #[tokio::test]
    async fn assigned_distributor_marks_delivery() {
        let (id, dist) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::Shipped, dist),
                assigned_order_row(id, OrderStatus::Delivered, dist),
            ))
            .append_exec_results([affected(1)])
            .into_connection();

        let order = manager(&db, MockNotifier::new())
            .deliver(&distributor(dist), id)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        let sql = executed_sql(db);
        assert!(committed(&sql));
        let history = matching(&sql, r#"INSERT INTO "order_status_history""#);
        assert_eq!(history.len(), 1);
        assert!(history[0].contains("'shipped'") && history[0].contains("'delivered'"));
    }

    #[tokio::test]
    async fn refund_after_shipping_leaves_stock_alone() {
        let (id, dist) = (Uuid::new_v4(), Uuid::new_v4());
        let refunded = order::Model {
            payment_status: "refunded".to_string(),
            ..assigned_order_row(id, OrderStatus::Refunded, dist)
        };
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::Shipped, dist),
                refunded,
            ))
            .append_exec_results([affected(1), affected(1), affected(0)])
            .into_connection();

        let order = manager(&db, MockNotifier::new())
            .refund(Uuid::new_v4(), id, "Damaged in transit".to_string())
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);

        let sql = executed_sql(db);
        assert!(committed(&sql));
        assert!(matching(&sql, "stock_levels").is_empty());
        assert!(matching(&sql, "inventory_movements").is_empty());
        let commission = matching(&sql, r#"UPDATE "commissions""#);
        assert_eq!(commission.len(), 1);
        assert!(commission[0].contains("'cancelled'") && commission[0].contains("'pending_payout'"));
        let tasks = matching(&sql, r#"UPDATE "tasks""#);
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].contains("'cancelled'"));
    }

    #[tokio::test]
    async fn refund_before_shipping_returns_held_stock() {
        let (id, dist, variation) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results(transition_rows(
                assigned_order_row(id, OrderStatus::Fulfilled, dist),
                assigned_order_row(id, OrderStatus::Refunded, dist),
            ))
            .append_query_results([vec![item_row(id, variation, "CBC-STRONG", 2)]])
            // History, restock, movement, commission, tasks
            .append_exec_results([affected(1), affected(1), affected(1), affected(1), affected(1)])
            .into_connection();

        manager(&db, MockNotifier::new())
            .refund(Uuid::new_v4(), id, String::new())
            .await
            .unwrap();

        let sql = executed_sql(db);
        assert!(committed(&sql));
        assert_eq!(matching(&sql, r#"INSERT INTO "stock_levels""#).len(), 1);
        let movement = matching(&sql, r#"INSERT INTO "inventory_movements""#);
        assert_eq!(movement.len(), 1);
        assert!(movement[0].contains("'refund_return'"));
        assert_eq!(matching(&sql, r#"UPDATE "commissions""#).len(), 1);
    }
}
