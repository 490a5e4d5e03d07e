//! Catalog and cart service tests.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use mockall::predicate::eq;
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront::domain::{Location, NewProduct, ProductUpdate, UserRole, VariationUpdate};
use storefront::errors::AppError;
use storefront::infra::{
    MockCacheInvalidator, MockCartRepository, MockInventoryRepository, MockProductRepository,
};
use storefront::services::{CartManager, CartService, CatalogManager, CatalogService};

use common::{cart_item, idle_cache, money, product, variation, TestUnitOfWork};

fn warehouse_stock(entries: Vec<(Uuid, i32)>) -> MockInventoryRepository {
    let stock: HashMap<Uuid, i32> = entries.into_iter().collect();
    let mut inventory = MockInventoryRepository::new();
    inventory
        .expect_quantities()
        .withf(|_, location| *location == Location::Warehouse)
        .returning(move |_, _| Ok(stock.clone()));
    inventory
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_inactive_product_is_hidden_from_shoppers() {
    let mut hidden = product(money(1999), None);
    hidden.active = false;
    let id = hidden.id;

    let mut products = MockProductRepository::new();
    products
        .expect_find_by_id()
        .with(eq(id))
        .returning(move |_| Ok(Some(hidden.clone())));

    let service = CatalogManager::new(
        TestUnitOfWork::new().with_products(products).build(),
        idle_cache(),
    );

    assert!(matches!(
        service.get_product(id, false).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_product_detail_reports_warehouse_stock() {
    let item = product(money(1999), None);
    let id = item.id;
    let stocked = variation(&item, "MANGO-3");
    let sold_out = variation(&item, "MANGO-6");
    let stocked_id = stocked.id;
    let variations = vec![stocked, sold_out];

    let mut products = MockProductRepository::new();
    products
        .expect_find_by_id()
        .returning(move |_| Ok(Some(item.clone())));
    products
        .expect_variations()
        .with(eq(id), eq(false))
        .returning(move |_, _| Ok(variations.clone()));

    let uow = TestUnitOfWork::new()
        .with_products(products)
        .with_inventory(warehouse_stock(vec![(stocked_id, 5)]))
        .build();
    let detail = CatalogManager::new(uow, idle_cache()).get_product(id, false).await.unwrap();

    assert_eq!(detail.variations.len(), 2);
    assert_eq!(detail.variations[0].stock, 5);
    assert_eq!(detail.variations[1].stock, 0);
}

#[tokio::test]
async fn test_create_product_rejects_blank_name() {
    let service = CatalogManager::new(TestUnitOfWork::new().build(), idle_cache());
    let result = service
        .create_product(NewProduct {
            name: "   ".to_string(),
            description: None,
            category: "E-liquid".to_string(),
            price: money(1999),
            wholesale_price: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_update_checks_wholesale_price_against_stored_price() {
    let stored = product(money(2000), None);
    let id = stored.id;

    let mut products = MockProductRepository::new();
    products
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    products.expect_update().never();

    let service = CatalogManager::new(
        TestUnitOfWork::new().with_products(products).build(),
        idle_cache(),
    );
    let result = service
        .update_product(
            id,
            ProductUpdate {
                wholesale_price: Some(money(2500)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_deactivating_a_product_evicts_cached_detail() {
    let mut updated = product(money(2000), None);
    updated.active = false;
    let id = updated.id;

    let mut products = MockProductRepository::new();
    products
        .expect_update()
        .withf(move |product_id, changes| *product_id == id && changes.active == Some(false))
        .times(1)
        .returning(move |_, _| Ok(updated.clone()));

    let mut cache = MockCacheInvalidator::new();
    cache
        .expect_forget_product()
        .with(eq(id))
        .times(1)
        .returning(|_| ());

    let service = CatalogManager::new(
        TestUnitOfWork::new().with_products(products).build(),
        Arc::new(cache),
    );
    let product = service
        .update_product(
            id,
            ProductUpdate {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!product.active);
}

#[tokio::test]
async fn test_variation_change_evicts_its_product() {
    let parent = product(money(2000), None);
    let mut changed = variation(&parent, "CBC-1");
    changed.price_override = Some(money(2500));
    let variation_id = changed.id;
    let product_id = parent.id;

    let mut products = MockProductRepository::new();
    products
        .expect_update_variation()
        .returning(move |_, _| Ok(changed.clone()));

    let mut cache = MockCacheInvalidator::new();
    cache
        .expect_forget_product()
        .with(eq(product_id))
        .times(1)
        .returning(|_| ());

    let service = CatalogManager::new(
        TestUnitOfWork::new().with_products(products).build(),
        Arc::new(cache),
    );
    service
        .update_variation(
            variation_id,
            VariationUpdate {
                price_override: Some(money(2500)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_empty_cart_skips_catalog_lookup() {
    let mut carts = MockCartRepository::new();
    carts.expect_items().returning(|_| Ok(vec![]));

    let service = CartManager::new(TestUnitOfWork::new().with_carts(carts).build());
    let cart = service.view(Uuid::new_v4(), UserRole::Retail).await.unwrap();

    assert!(cart.items.is_empty());
    assert_eq!(cart.subtotal, Decimal::ZERO);
}

#[tokio::test]
async fn test_wholesale_buyer_sees_wholesale_price() {
    let user_id = Uuid::new_v4();
    let item = product(money(1999), Some(money(1200)));
    let variant = variation(&item, "MANGO-3");
    let line = cart_item(user_id, variant.id, 2);
    let variant_id = variant.id;

    let mut carts = MockCartRepository::new();
    carts
        .expect_items()
        .with(eq(user_id))
        .returning(move |_| Ok(vec![line.clone()]));

    let mut products = MockProductRepository::new();
    products
        .expect_find_variations_with_products()
        .returning(move |_| Ok(vec![(variant.clone(), item.clone())]));

    let uow = TestUnitOfWork::new()
        .with_carts(carts)
        .with_products(products)
        .with_inventory(warehouse_stock(vec![(variant_id, 10)]))
        .build();
    let cart = CartManager::new(uow)
        .view(user_id, UserRole::Wholesale)
        .await
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].unit_price, money(1200));
    assert_eq!(cart.items[0].available, 10);
    assert_eq!(cart.subtotal, money(2400));
}

#[tokio::test]
async fn test_cart_skips_lines_for_removed_variations() {
    let user_id = Uuid::new_v4();
    let item = product(money(1000), None);
    let kept = variation(&item, "KEPT-1");
    let lines = vec![
        cart_item(user_id, kept.id, 1),
        cart_item(user_id, Uuid::new_v4(), 4),
    ];
    let kept_id = kept.id;

    let mut carts = MockCartRepository::new();
    carts.expect_items().returning(move |_| Ok(lines.clone()));

    let mut products = MockProductRepository::new();
    products
        .expect_find_variations_with_products()
        .returning(move |_| Ok(vec![(kept.clone(), item.clone())]));

    let uow = TestUnitOfWork::new()
        .with_carts(carts)
        .with_products(products)
        .with_inventory(warehouse_stock(vec![(kept_id, 3)]))
        .build();
    let cart = CartManager::new(uow).view(user_id, UserRole::Retail).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].sku, "KEPT-1");
    assert_eq!(cart.subtotal, money(1000));
}

#[tokio::test]
async fn test_add_item_rejects_out_of_range_quantity() {
    let service = CartManager::new(TestUnitOfWork::new().build());
    let result = service
        .add_item(Uuid::new_v4(), UserRole::Retail, Uuid::new_v4(), 0)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_add_item_beyond_warehouse_stock() {
    let user_id = Uuid::new_v4();
    let item = product(money(1999), None);
    let variant = variation(&item, "MANGO-3");
    let variant_id = variant.id;

    let mut carts = MockCartRepository::new();
    carts.expect_find_by_variation().returning(|_, _| Ok(None));
    carts.expect_insert().never();

    let mut products = MockProductRepository::new();
    products
        .expect_find_variations_with_products()
        .returning(move |_| Ok(vec![(variant.clone(), item.clone())]));

    let uow = TestUnitOfWork::new()
        .with_carts(carts)
        .with_products(products)
        .with_inventory(warehouse_stock(vec![(variant_id, 1)]))
        .build();
    let result = CartManager::new(uow)
        .add_item(user_id, UserRole::Retail, variant_id, 2)
        .await;

    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
}

#[tokio::test]
async fn test_add_item_rejects_inactive_variation() {
    let item = product(money(1999), None);
    let mut variant = variation(&item, "MANGO-3");
    variant.active = false;
    let variant_id = variant.id;

    let mut carts = MockCartRepository::new();
    carts.expect_find_by_variation().returning(|_, _| Ok(None));

    let mut products = MockProductRepository::new();
    products
        .expect_find_variations_with_products()
        .returning(move |_| Ok(vec![(variant.clone(), item.clone())]));

    let uow = TestUnitOfWork::new()
        .with_carts(carts)
        .with_products(products)
        .build();
    let result = CartManager::new(uow)
        .add_item(Uuid::new_v4(), UserRole::Retail, variant_id, 1)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_add_item_merges_into_existing_line() {
    let user_id = Uuid::new_v4();
    let item = product(money(1000), None);
    let variant = variation(&item, "MANGO-3");
    let variant_id = variant.id;
    let existing = cart_item(user_id, variant_id, 2);
    let existing_id = existing.id;
    let mut merged = existing.clone();
    merged.quantity = 5;
    let stored = merged.clone();

    let mut carts = MockCartRepository::new();
    carts
        .expect_find_by_variation()
        .with(eq(user_id), eq(variant_id))
        .returning(move |_, _| Ok(Some(existing.clone())));
    carts
        .expect_set_quantity()
        .with(eq(existing_id), eq(5))
        .times(1)
        .returning(move |_, _| Ok(merged.clone()));
    carts.expect_insert().never();
    carts
        .expect_items()
        .returning(move |_| Ok(vec![stored.clone()]));

    let mut products = MockProductRepository::new();
    products
        .expect_find_variations_with_products()
        .returning(move |_| Ok(vec![(variant.clone(), item.clone())]));

    let uow = TestUnitOfWork::new()
        .with_carts(carts)
        .with_products(products)
        .with_inventory(warehouse_stock(vec![(variant_id, 8)]))
        .build();
    let (cart, created) = CartManager::new(uow)
        .add_item(user_id, UserRole::Retail, variant_id, 3)
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.subtotal, money(5000));
}

#[tokio::test]
async fn test_update_item_to_zero_removes_line() {
    let user_id = Uuid::new_v4();
    let line = cart_item(user_id, Uuid::new_v4(), 2);
    let line_id = line.id;

    let mut carts = MockCartRepository::new();
    carts
        .expect_find_item()
        .with(eq(user_id), eq(line_id))
        .returning(move |_, _| Ok(Some(line.clone())));
    carts
        .expect_remove()
        .with(eq(user_id), eq(line_id))
        .times(1)
        .returning(|_, _| Ok(()));
    carts.expect_items().returning(|_| Ok(vec![]));

    let service = CartManager::new(TestUnitOfWork::new().with_carts(carts).build());
    let cart = service
        .update_item(user_id, UserRole::Retail, line_id, 0)
        .await
        .unwrap();

    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_update_unknown_item() {
    let mut carts = MockCartRepository::new();
    carts.expect_find_item().returning(|_, _| Ok(None));

    let service = CartManager::new(TestUnitOfWork::new().with_carts(carts).build());
    let result = service
        .update_item(Uuid::new_v4(), UserRole::Retail, Uuid::new_v4(), 1)
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}
