//! Service Container - Centralized service access with parallel execution support.
//!
//! Handlers depend on the `ServiceContainer` trait, so the router can be
//! built over a mock container in tests.

use std::future::Future;
use std::sync::Arc;

use super::{
    AuthService, Authenticator, CartManager, CartService, CatalogManager, CatalogService,
    CommissionManager, CommissionService, DashboardManager, DashboardService, DiscountManager,
    DiscountService, FulfillmentManager, FulfillmentService, InventoryManager, InventoryService,
    OrderManager, OrderService, PaymentProcessor, PaymentService, TaskManager, TaskService,
    UploadManager, UploadService, UserManager, UserService, WholesaleManager, WholesaleService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{BlobStorage, CacheInvalidator, Persistence};
use crate::jobs::Notifier;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn catalog(&self) -> Arc<dyn CatalogService>;

    fn cart(&self) -> Arc<dyn CartService>;

    fn discounts(&self) -> Arc<dyn DiscountService>;

    fn orders(&self) -> Arc<dyn OrderService>;

    fn fulfillment(&self) -> Arc<dyn FulfillmentService>;

    fn payments(&self) -> Arc<dyn PaymentService>;

    fn commissions(&self) -> Arc<dyn CommissionService>;

    fn inventory(&self) -> Arc<dyn InventoryService>;

    fn tasks(&self) -> Arc<dyn TaskService>;

    fn wholesale(&self) -> Arc<dyn WholesaleService>;

    fn uploads(&self) -> Arc<dyn UploadService>;

    fn dashboard(&self) -> Arc<dyn DashboardService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    catalog: Arc<dyn CatalogService>,
    cart: Arc<dyn CartService>,
    discounts: Arc<dyn DiscountService>,
    orders: Arc<dyn OrderService>,
    fulfillment: Arc<dyn FulfillmentService>,
    payments: Arc<dyn PaymentService>,
    commissions: Arc<dyn CommissionService>,
    inventory: Arc<dyn InventoryService>,
    tasks: Arc<dyn TaskService>,
    wholesale: Arc<dyn WholesaleService>,
    uploads: Arc<dyn UploadService>,
    dashboard: Arc<dyn DashboardService>,
}

impl Services {
    /// Wire every service over one shared unit of work.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        notifier: Arc<dyn Notifier>,
        storage: Option<Arc<dyn BlobStorage>>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            users: Arc::new(UserManager::new(uow.clone(), cache.clone())),
            catalog: Arc::new(CatalogManager::new(uow.clone(), cache.clone())),
            cart: Arc::new(CartManager::new(uow.clone())),
            discounts: Arc::new(DiscountManager::new(uow.clone())),
            orders: Arc::new(OrderManager::new(uow.clone(), config.pricing.clone())),
            fulfillment: Arc::new(FulfillmentManager::new(uow.clone(), notifier.clone())),
            payments: Arc::new(PaymentProcessor::new(uow.clone(), &config, notifier.clone())),
            commissions: Arc::new(CommissionManager::new(uow.clone())),
            inventory: Arc::new(InventoryManager::new(uow.clone(), cache.clone())),
            tasks: Arc::new(TaskManager::new(uow.clone())),
            wholesale: Arc::new(WholesaleManager::new(uow.clone(), notifier.clone(), cache)),
            uploads: Arc::new(UploadManager::new(storage, config.max_upload_bytes)),
            dashboard: Arc::new(DashboardManager::new(uow.clone())),
            auth: Arc::new(Authenticator::new(uow, config, notifier)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.users.clone()
    }

    fn catalog(&self) -> Arc<dyn CatalogService> {
        self.catalog.clone()
    }

    fn cart(&self) -> Arc<dyn CartService> {
        self.cart.clone()
    }

    fn discounts(&self) -> Arc<dyn DiscountService> {
        self.discounts.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.orders.clone()
    }

    fn fulfillment(&self) -> Arc<dyn FulfillmentService> {
        self.fulfillment.clone()
    }

    fn payments(&self) -> Arc<dyn PaymentService> {
        self.payments.clone()
    }

    fn commissions(&self) -> Arc<dyn CommissionService> {
        self.commissions.clone()
    }

    fn inventory(&self) -> Arc<dyn InventoryService> {
        self.inventory.clone()
    }

    fn tasks(&self) -> Arc<dyn TaskService> {
        self.tasks.clone()
    }

    fn wholesale(&self) -> Arc<dyn WholesaleService> {
        self.wholesale.clone()
    }

    fn uploads(&self) -> Arc<dyn UploadService> {
        self.uploads.clone()
    }

    fn dashboard(&self) -> Arc<dyn DashboardService> {
        self.dashboard.clone()
    }
}

/// Run independent reads concurrently.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    ///
    /// # Example
    /// ```ignore
    /// let (items, history) = parallel::join2(
    ///     orders.items(id),
    ///     orders.history(id),
    /// ).await?;
    /// ```
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Execute three independent async operations in parallel.
    pub async fn join3<F1, F2, F3, T1, T2, T3>(
        f1: F1,
        f2: F2,
        f3: F3,
    ) -> AppResult<(T1, T2, T3)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
    {
        try_join!(f1, f2, f3)
    }
}
