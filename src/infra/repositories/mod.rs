//! Repository layer - Data access abstraction
//!
//! Each repository has a pooled implementation behind a mockable trait
//! (`*Store`) and a transaction-bound twin (`Tx*Repository`) handed out by
//! the unit of work for multi-step workflows.

mod base;
mod cart_repository;
mod commission_repository;
mod discount_repository;
pub(crate) mod entities;
#[cfg(test)]
pub(crate) mod fixtures;
mod inventory_repository;
mod order_repository;
mod payment_event_repository;
mod product_repository;
mod task_repository;
mod user_repository;
mod wholesale_repository;

pub use cart_repository::{CartRepository, CartStore, TxCartRepository};
pub use commission_repository::{CommissionRepository, CommissionStore, TxCommissionRepository};
pub use discount_repository::{DiscountRepository, DiscountStore, TxDiscountRepository};
pub use inventory_repository::{InventoryRepository, InventoryStore, TxInventoryRepository};
pub use order_repository::{OrderRepository, OrderStore, TxOrderRepository};
pub use payment_event_repository::TxPaymentEventRepository;
pub use product_repository::{ProductRepository, ProductStore, TxProductRepository};
pub use task_repository::{TaskRepository, TaskStore, TxTaskRepository};
pub use user_repository::{TxUserRepository, UserRepository, UserStore};
pub use wholesale_repository::{TxWholesaleRepository, WholesaleRepository, WholesaleStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use cart_repository::MockCartRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use commission_repository::MockCommissionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use discount_repository::MockDiscountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use inventory_repository::MockInventoryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use order_repository::MockOrderRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use task_repository::MockTaskRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use wholesale_repository::MockWholesaleRepository;
