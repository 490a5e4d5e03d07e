//! Storefront and back-office use cases.
//!
//! Each service is a trait plus one implementation generic over
//! `UnitOfWork`. Handlers see only the traits, through `Services`.
//! Writes that touch more than one table go through
//! `UnitOfWork::transaction` so stock, orders and ledgers move together.

mod auth_service;
mod cart_service;
mod catalog_service;
mod commission_service;
pub mod container;
mod dashboard_service;
mod discount_service;
mod fulfillment_service;
mod inventory_service;
mod order_service;
mod payment_service;
mod task_service;
mod upload_service;
mod user_service;
mod wholesale_service;
mod workflow;

pub use container::{ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims, Registration, TokenResponse};
pub use cart_service::{CartManager, CartService};
pub use catalog_service::{CatalogManager, CatalogService};
pub use commission_service::{CommissionManager, CommissionService};
pub use dashboard_service::{DashboardManager, DashboardService, DashboardStats};
pub use discount_service::{DiscountManager, DiscountQuote, DiscountService};
pub use fulfillment_service::{FulfillmentManager, FulfillmentReport, FulfillmentService, Shipment};
pub use inventory_service::{InventoryManager, InventoryService, Transfer};
pub use order_service::{Checkout, OrderManager, OrderService};
pub use payment_service::{PaymentProcessor, PaymentService, WebhookReceipt};
pub use task_service::{TaskManager, TaskService};
pub use upload_service::{UploadManager, UploadService, UploadedFile};
pub use user_service::{UserManager, UserService};
pub use wholesale_service::{ApplicationForm, WholesaleManager, WholesaleService};

// Parallel execution utilities
pub use container::parallel;

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
