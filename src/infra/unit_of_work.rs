//! Unit of Work pattern implementation.
//!
//! Centralizes access to the pooled repositories and runs multi-step
//! workflows (checkout, order transitions, webhook handling, wholesale
//! review) atomically. Everything done through a [`TransactionContext`]
//! commits or rolls back together.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::sync::Arc;

use super::repositories::{
    CartRepository, CartStore, CommissionRepository, CommissionStore, DiscountRepository,
    DiscountStore, InventoryRepository, InventoryStore, OrderRepository, OrderStore,
    ProductRepository, ProductStore, TaskRepository, TaskStore, TxCartRepository,
    TxCommissionRepository, TxDiscountRepository, TxInventoryRepository, TxOrderRepository,
    TxPaymentEventRepository, TxProductRepository, TxTaskRepository, TxUserRepository,
    TxWholesaleRepository, UserRepository, UserStore, WholesaleRepository, WholesaleStore,
};
use crate::errors::{AppError, AppResult};

/// Boxed future returned by transaction closures
pub type TxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic `transaction` methods;
/// tests implement it over the repository mocks instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn products(&self) -> Arc<dyn ProductRepository>;

    fn inventory(&self) -> Arc<dyn InventoryRepository>;

    fn carts(&self) -> Arc<dyn CartRepository>;

    fn discounts(&self) -> Arc<dyn DiscountRepository>;

    fn orders(&self) -> Arc<dyn OrderRepository>;

    fn tasks(&self) -> Arc<dyn TaskRepository>;

    fn commissions(&self) -> Arc<dyn CommissionRepository>;

    fn wholesale(&self) -> Arc<dyn WholesaleRepository>;

    /// Execute a closure within a ReadCommitted transaction.
    ///
    /// Committed on success, rolled back on error.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;

    /// Execute a closure within a Serializable transaction.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Transaction-bound repository access.
///
/// The context borrows the transaction so no repository can outlive it.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn users(&self) -> TxUserRepository<'a> {
        TxUserRepository::new(self.txn)
    }

    pub fn products(&self) -> TxProductRepository<'a> {
        TxProductRepository::new(self.txn)
    }

    pub fn inventory(&self) -> TxInventoryRepository<'a> {
        TxInventoryRepository::new(self.txn)
    }

    pub fn carts(&self) -> TxCartRepository<'a> {
        TxCartRepository::new(self.txn)
    }

    pub fn discounts(&self) -> TxDiscountRepository<'a> {
        TxDiscountRepository::new(self.txn)
    }

    pub fn orders(&self) -> TxOrderRepository<'a> {
        TxOrderRepository::new(self.txn)
    }

    pub fn tasks(&self) -> TxTaskRepository<'a> {
        TxTaskRepository::new(self.txn)
    }

    pub fn commissions(&self) -> TxCommissionRepository<'a> {
        TxCommissionRepository::new(self.txn)
    }

    pub fn wholesale(&self) -> TxWholesaleRepository<'a> {
        TxWholesaleRepository::new(self.txn)
    }

    pub fn payment_events(&self) -> TxPaymentEventRepository<'a> {
        TxPaymentEventRepository::new(self.txn)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    users: Arc<UserStore>,
    products: Arc<ProductStore>,
    inventory: Arc<InventoryStore>,
    carts: Arc<CartStore>,
    discounts: Arc<DiscountStore>,
    orders: Arc<OrderStore>,
    tasks: Arc<TaskStore>,
    commissions: Arc<CommissionStore>,
    wholesale: Arc<WholesaleStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            products: Arc::new(ProductStore::new(db.clone())),
            inventory: Arc::new(InventoryStore::new(db.clone())),
            carts: Arc::new(CartStore::new(db.clone())),
            discounts: Arc::new(DiscountStore::new(db.clone())),
            orders: Arc::new(OrderStore::new(db.clone())),
            tasks: Arc::new(TaskStore::new(db.clone())),
            commissions: Arc::new(CommissionStore::new(db.clone())),
            wholesale: Arc::new(WholesaleStore::new(db.clone())),
            db,
        }
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
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

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f)
            .await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::Serializable, f)
            .await
    }
}
