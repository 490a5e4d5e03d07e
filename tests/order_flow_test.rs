//! Order, fulfillment, inventory and payment service tests.
//!
//! Writes run inside database transactions, which the test unit of work
//! refuses; these tests cover visibility rules, input checks and reads.

mod common;

use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use storefront::config::{Config, PricingConfig};
use storefront::domain::{Location, OrderStatus, UserRole};
use storefront::errors::AppError;
use storefront::infra::{MockInventoryRepository, MockOrderRepository, MockProductRepository};
use storefront::services::{
    Checkout, FulfillmentManager, FulfillmentService, InventoryManager, InventoryService,
    OrderManager, OrderService, PaymentProcessor, PaymentService, Shipment, Transfer,
};
use storefront::types::PaginationParams;
use storefront::utils::signature;

use common::{current, idle_cache, order, silent_notifier, TestUnitOfWork};

const WEBHOOK_SECRET: &str = "whsec_test_secret_for_signatures";

fn orders_returning(found: storefront::domain::Order) -> MockOrderRepository {
    let mut orders = MockOrderRepository::new();
    orders
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    orders
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_owner_sees_order_detail() {
    let owner = current(UserRole::Retail);
    let placed = order(owner.id, OrderStatus::PendingApproval);
    let order_id = placed.id;

    let mut orders = orders_returning(placed);
    orders
        .expect_items()
        .with(eq(order_id))
        .returning(|_| Ok(vec![]));
    orders
        .expect_history()
        .with(eq(order_id))
        .returning(|_| Ok(vec![]));

    let service = OrderManager::new(
        TestUnitOfWork::new().with_orders(orders).build(),
        PricingConfig::default(),
    );
    let detail = service.get(&owner, order_id).await.unwrap();

    assert_eq!(detail.order.id, order_id);
    assert_eq!(detail.order.status, OrderStatus::PendingApproval);
}

#[tokio::test]
async fn test_other_customer_cannot_see_order() {
    let stranger = current(UserRole::Retail);
    let placed = order(Uuid::new_v4(), OrderStatus::PendingApproval);
    let order_id = placed.id;

    let mut orders = orders_returning(placed);
    orders.expect_items().never();

    let service = OrderManager::new(
        TestUnitOfWork::new().with_orders(orders).build(),
        PricingConfig::default(),
    );

    assert!(matches!(
        service.get(&stranger, order_id).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_assigned_distributor_sees_order() {
    let distributor = current(UserRole::Distributor);
    let mut placed = order(Uuid::new_v4(), OrderStatus::AwaitingFulfillment);
    placed.distributor_id = Some(distributor.id);
    let order_id = placed.id;

    let mut orders = orders_returning(placed);
    orders.expect_items().returning(|_| Ok(vec![]));
    orders.expect_history().returning(|_| Ok(vec![]));

    let service = OrderManager::new(
        TestUnitOfWork::new().with_orders(orders).build(),
        PricingConfig::default(),
    );

    assert!(service.get(&distributor, order_id).await.is_ok());
}

#[tokio::test]
async fn test_unassigned_distributor_is_forbidden() {
    let distributor = current(UserRole::Distributor);
    let mut placed = order(Uuid::new_v4(), OrderStatus::AwaitingFulfillment);
    placed.distributor_id = Some(Uuid::new_v4());
    let order_id = placed.id;

    let service = OrderManager::new(
        TestUnitOfWork::new()
            .with_orders(orders_returning(placed))
            .build(),
        PricingConfig::default(),
    );

    assert!(matches!(
        service.get(&distributor, order_id).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_list_mine_filters_by_owner() {
    let user_id = Uuid::new_v4();

    let mut orders = MockOrderRepository::new();
    orders
        .expect_list()
        .withf(move |filter, _| filter.user_id == Some(user_id) && filter.status.is_none())
        .returning(move |_, _| Ok((vec![order(user_id, OrderStatus::Delivered)], 1)));

    let service = OrderManager::new(
        TestUnitOfWork::new().with_orders(orders).build(),
        PricingConfig::default(),
    );
    let page = service
        .list_mine(user_id, PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(page.data[0].user_id, user_id);
}

#[tokio::test]
async fn test_checkout_requires_shipping_address() {
    let service = OrderManager::new(TestUnitOfWork::new().build(), PricingConfig::default());
    let result = service
        .checkout(
            Uuid::new_v4(),
            UserRole::Retail,
            Checkout {
                shipping_address: "   ".to_string(),
                discount_code: None,
                notes: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

// =============================================================================
// Fulfillment
// =============================================================================

#[tokio::test]
async fn test_ship_requires_tracking_number() {
    let service = FulfillmentManager::new(TestUnitOfWork::new().build(), silent_notifier());
    let result = service
        .ship(
            &current(UserRole::Admin),
            Uuid::new_v4(),
            Shipment {
                tracking_number: " ".to_string(),
                carrier: Some("An Post".to_string()),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_distributor_queue_is_scoped_to_distributor() {
    let distributor_id = Uuid::new_v4();

    let mut orders = MockOrderRepository::new();
    orders
        .expect_list()
        .withf(move |filter, _| {
            filter.distributor_id == Some(distributor_id)
                && filter.status == Some(OrderStatus::AwaitingFulfillment)
                && filter.user_id.is_none()
        })
        .returning(|_, _| Ok((vec![], 0)));

    let service = FulfillmentManager::new(
        TestUnitOfWork::new().with_orders(orders).build(),
        silent_notifier(),
    );
    let page = service
        .distributor_orders(
            distributor_id,
            Some(OrderStatus::AwaitingFulfillment),
            PaginationParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(page.meta.total, 0);
}

#[tokio::test]
async fn test_distributor_inventory_reads_own_location() {
    let distributor_id = Uuid::new_v4();

    let mut inventory = MockInventoryRepository::new();
    inventory
        .expect_list_levels()
        .with(eq(None), eq(Some(Location::Distributor(distributor_id))))
        .returning(|_, _| Ok(vec![]));

    let service = FulfillmentManager::new(
        TestUnitOfWork::new().with_inventory(inventory).build(),
        silent_notifier(),
    );

    assert!(service
        .distributor_inventory(distributor_id)
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_stock_cannot_be_set_negative() {
    let service = InventoryManager::new(TestUnitOfWork::new().build(), idle_cache());
    let result = service
        .set_quantity(Uuid::new_v4(), Uuid::new_v4(), Location::Warehouse, -1, None)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_transfer_to_same_location_is_rejected() {
    let service = InventoryManager::new(TestUnitOfWork::new().build(), idle_cache());
    let result = service
        .transfer(
            Uuid::new_v4(),
            Transfer {
                variation_id: Uuid::new_v4(),
                from: Location::Warehouse,
                to: Location::Warehouse,
                quantity: 3,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_transfer_of_unknown_variation() {
    let mut products = MockProductRepository::new();
    products.expect_find_variation().returning(|_| Ok(None));

    let service = InventoryManager::new(
        TestUnitOfWork::new().with_products(products).build(),
        idle_cache(),
    );
    let result = service
        .transfer(
            Uuid::new_v4(),
            Transfer {
                variation_id: Uuid::new_v4(),
                from: Location::Warehouse,
                to: Location::Distributor(Uuid::new_v4()),
                quantity: 3,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

// =============================================================================
// Payment webhooks
// =============================================================================

fn payment_processor() -> PaymentProcessor<TestUnitOfWork> {
    let config = Config::for_secrets("test-secret-key-for-testing-only-32chars", WEBHOOK_SECRET);
    PaymentProcessor::new(TestUnitOfWork::new().build(), &config, silent_notifier())
}

#[tokio::test]
async fn test_webhook_without_signature() {
    let result = payment_processor()
        .handle_webhook(None, br#"{"id":"evt_1","type":"payment.succeeded"}"#)
        .await;

    assert!(matches!(result, Err(AppError::InvalidSignature)));
}

#[tokio::test]
async fn test_webhook_signed_with_wrong_secret() {
    let payload = br#"{"id":"evt_1","type":"payment.succeeded"}"#;
    let header = signature::sign(b"some-other-secret", Utc::now().timestamp(), payload);

    let result = payment_processor()
        .handle_webhook(Some(&header), payload)
        .await;

    assert!(matches!(result, Err(AppError::InvalidSignature)));
}

#[tokio::test]
async fn test_webhook_with_stale_timestamp() {
    let payload = br#"{"id":"evt_1","type":"payment.succeeded"}"#;
    let header = signature::sign(
        WEBHOOK_SECRET.as_bytes(),
        Utc::now().timestamp() - 3600,
        payload,
    );

    let result = payment_processor()
        .handle_webhook(Some(&header), payload)
        .await;

    assert!(matches!(result, Err(AppError::InvalidSignature)));
}

#[tokio::test]
async fn test_webhook_with_malformed_body() {
    let payload = b"not json";
    let header = signature::sign(WEBHOOK_SECRET.as_bytes(), Utc::now().timestamp(), payload);

    let result = payment_processor()
        .handle_webhook(Some(&header), payload)
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
