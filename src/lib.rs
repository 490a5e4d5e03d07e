//! Storefront - retail and wholesale storefront with a back office.
//!
//! # Layers
//!
//! - **domain**: entities, pricing rules and the order state machine
//! - **services**: use cases over a unit of work
//! - **infra**: SeaORM repositories, migrations, Redis cache, blob storage
//! - **api**: axum handlers, middleware, routes and the OpenAPI document
//! - **jobs**: queued email notifications (apalis)
//! - **cli** / **commands**: `serve`, `migrate` and `jobs`
//!
//! ```bash
//! storefront migrate up
//! storefront serve
//! storefront jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;
pub mod utils;

pub use api::AppState;
pub use config::Config;
pub use errors::{AppError, AppResult};
