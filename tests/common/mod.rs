//! Shared fixtures for service tests.
//!
//! `TestUnitOfWork` hands out mockall repositories. Repositories a test does
//! not configure have no expectations, so any call to them fails the test.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront::domain::{
    CartItem, Commission, CommissionStatus, CurrentUser, DiscountCode, DiscountKind, Order,
    OrderStatus, PaymentStatus, Product, ProductVariation, Task, TaskKind, TaskStatus, User,
    UserRole, UserStatus,
};
use storefront::errors::{AppError, AppResult};
use storefront::infra::{
    CacheInvalidator, CartRepository, CommissionRepository, DiscountRepository,
    InventoryRepository, MockCacheInvalidator, MockCartRepository, MockCommissionRepository, MockDiscountRepository,
    MockInventoryRepository, MockOrderRepository, MockProductRepository, MockTaskRepository,
    MockUserRepository, MockWholesaleRepository, OrderRepository, ProductRepository,
    TaskRepository, TransactionContext, TxFuture, UnitOfWork, UserRepository,
    WholesaleRepository,
};
use storefront::jobs::{MockNotifier, Notifier};

pub struct TestUnitOfWork {
    users: Arc<MockUserRepository>,
    products: Arc<MockProductRepository>,
    inventory: Arc<MockInventoryRepository>,
    carts: Arc<MockCartRepository>,
    discounts: Arc<MockDiscountRepository>,
    orders: Arc<MockOrderRepository>,
    tasks: Arc<MockTaskRepository>,
    commissions: Arc<MockCommissionRepository>,
    wholesale: Arc<MockWholesaleRepository>,
}

impl TestUnitOfWork {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MockUserRepository::new()),
            products: Arc::new(MockProductRepository::new()),
            inventory: Arc::new(MockInventoryRepository::new()),
            carts: Arc::new(MockCartRepository::new()),
            discounts: Arc::new(MockDiscountRepository::new()),
            orders: Arc::new(MockOrderRepository::new()),
            tasks: Arc::new(MockTaskRepository::new()),
            commissions: Arc::new(MockCommissionRepository::new()),
            wholesale: Arc::new(MockWholesaleRepository::new()),
        }
    }

    pub fn with_users(mut self, repo: MockUserRepository) -> Self {
        self.users = Arc::new(repo);
        self
    }

    pub fn with_products(mut self, repo: MockProductRepository) -> Self {
        self.products = Arc::new(repo);
        self
    }

    pub fn with_inventory(mut self, repo: MockInventoryRepository) -> Self {
        self.inventory = Arc::new(repo);
        self
    }

    pub fn with_carts(mut self, repo: MockCartRepository) -> Self {
        self.carts = Arc::new(repo);
        self
    }

    pub fn with_discounts(mut self, repo: MockDiscountRepository) -> Self {
        self.discounts = Arc::new(repo);
        self
    }

    pub fn with_orders(mut self, repo: MockOrderRepository) -> Self {
        self.orders = Arc::new(repo);
        self
    }

    pub fn with_tasks(mut self, repo: MockTaskRepository) -> Self {
        self.tasks = Arc::new(repo);
        self
    }

    pub fn with_commissions(mut self, repo: MockCommissionRepository) -> Self {
        self.commissions = Arc::new(repo);
        self
    }

    pub fn with_wholesale(mut self, repo: MockWholesaleRepository) -> Self {
        self.wholesale = Arc::new(repo);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    fn inventory(&self) -> Arc<dyn InventoryRepository> {
        self.inventory.clone()
    }

    fn carts(&self) -> Arc<dyn CartRepository> {
        self.carts.clone()
    }

    fn discounts(&self) -> Arc<dyn DiscountRepository> {
        self.discounts.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.orders.clone()
    }

    fn tasks(&self) -> Arc<dyn TaskRepository> {
        self.tasks.clone()
    }

    fn commissions(&self) -> Arc<dyn CommissionRepository> {
        self.commissions.clone()
    }

    fn wholesale(&self) -> Arc<dyn WholesaleRepository> {
        self.wholesale.clone()
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        // Transaction not supported in test mock
        Err(AppError::internal("Transactions not supported in test mock"))
    }

    async fn transaction_serializable<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        Err(AppError::internal("Transactions not supported in test mock"))
    }
}

/// Notifier that fails the test if anything is sent.
pub fn silent_notifier() -> Arc<dyn Notifier> {
    Arc::new(MockNotifier::new())
}

/// Cache that accepts any eviction.
pub fn idle_cache() -> Arc<dyn CacheInvalidator> {
    let mut cache = MockCacheInvalidator::new();
    cache.expect_forget_user().returning(|_| ());
    cache.expect_forget_product().returning(|_| ());
    Arc::new(cache)
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn user(role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        email: "jane@example.com".to_string(),
        password_hash: "hashed".to_string(),
        name: "Jane Doe".to_string(),
        role,
        status: UserStatus::Active,
        referral_code: "K7QX2MPA".to_string(),
        referred_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

pub fn current(role: UserRole) -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        email: "viewer@example.com".to_string(),
        role,
        status: UserStatus::Active,
    }
}

pub fn product(price: Decimal, wholesale_price: Option<Decimal>) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: "Mango Ice".to_string(),
        description: None,
        category: "E-liquid".to_string(),
        price,
        wholesale_price,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn variation(product: &Product, sku: &str) -> ProductVariation {
    ProductVariation {
        id: Uuid::new_v4(),
        product_id: product.id,
        sku: sku.to_string(),
        strength: Some("3mg".to_string()),
        flavor: Some("Mango".to_string()),
        price_override: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn cart_item(user_id: Uuid, variation_id: Uuid, quantity: i32) -> CartItem {
    CartItem {
        id: Uuid::new_v4(),
        user_id,
        variation_id,
        quantity,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn discount(kind: DiscountKind, value: Decimal) -> DiscountCode {
    DiscountCode {
        id: Uuid::new_v4(),
        code: "SPRING10".to_string(),
        kind,
        value,
        min_subtotal: None,
        max_uses: None,
        used_count: 0,
        active: true,
        starts_at: None,
        expires_at: None,
        created_at: Utc::now(),
    }
}

pub fn order(user_id: Uuid, status: OrderStatus) -> Order {
    Order {
        id: Uuid::new_v4(),
        user_id,
        status,
        payment_status: PaymentStatus::Unpaid,
        subtotal: money(4000),
        discount: Decimal::ZERO,
        shipping: money(599),
        tax: money(320),
        total: money(4919),
        discount_code: None,
        shipping_address: "12 Harbour Road, Cork".to_string(),
        notes: None,
        distributor_id: None,
        payment_id: None,
        paid_at: None,
        tracking_number: None,
        carrier: None,
        fulfillment_proof_url: None,
        fulfillment_notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn commission(status: CommissionStatus) -> Commission {
    Commission {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        order_id: Uuid::new_v4(),
        amount: money(250),
        rate: Decimal::new(5, 2),
        status,
        created_at: Utc::now(),
        paid_at: None,
    }
}

pub fn task(status: TaskStatus) -> Task {
    Task {
        id: Uuid::new_v4(),
        kind: TaskKind::ApproveOrder,
        status,
        assignee_id: None,
        order_id: Some(Uuid::new_v4()),
        application_id: None,
        title: "Approve order".to_string(),
        created_at: Utc::now(),
        completed_at: None,
        completed_by: None,
    }
}
