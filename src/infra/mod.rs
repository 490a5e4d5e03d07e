//! Postgres repositories behind a unit of work, the Redis cache, and the
//! blob store that receives product images.

pub mod cache;
pub mod db;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use cache::{Cache, CacheInvalidator};
pub use db::{Database, Migrator};
pub use repositories::{
    CartRepository, CommissionRepository, DiscountRepository, InventoryRepository,
    OrderRepository, ProductRepository, TaskRepository, UserRepository, WholesaleRepository,
};
pub use storage::{BlobStorage, HttpBlobStorage, StoredObject};
pub use unit_of_work::{Persistence, TransactionContext, TxFuture, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockCartRepository, MockCommissionRepository, MockDiscountRepository,
    MockInventoryRepository, MockOrderRepository, MockProductRepository, MockTaskRepository,
    MockUserRepository, MockWholesaleRepository,
};
#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheInvalidator;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockBlobStorage;
