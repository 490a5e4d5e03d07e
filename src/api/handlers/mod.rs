//! HTTP request handlers.

pub mod auth_handler;
pub mod cart_handler;
pub mod catalog_handler;
pub mod commission_handler;
pub mod dashboard_handler;
pub mod discount_handler;
pub mod fulfillment_handler;
pub mod inventory_handler;
pub mod order_handler;
pub mod payment_handler;
pub mod task_handler;
pub mod upload_handler;
pub mod user_handler;
pub mod wholesale_handler;

pub use auth_handler::auth_routes;
pub use cart_handler::cart_routes;
pub use catalog_handler::{admin_catalog_routes, catalog_routes};
pub use commission_handler::{admin_commission_routes, commission_routes};
pub use dashboard_handler::dashboard_routes;
pub use discount_handler::{admin_discount_routes, discount_routes};
pub use fulfillment_handler::{admin_fulfillment_routes, distributor_routes};
pub use inventory_handler::admin_inventory_routes;
pub use order_handler::{admin_order_routes, order_routes};
pub use payment_handler::payment_routes;
pub use task_handler::{admin_task_routes, task_routes};
pub use upload_handler::{upload_body_limit, upload_routes};
pub use user_handler::{admin_user_routes, user_routes};
pub use wholesale_handler::{admin_wholesale_routes, wholesale_routes};
