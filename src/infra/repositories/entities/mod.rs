//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Enum-like columns are stored as text and parsed on the way out.

use std::str::FromStr;

use crate::errors::{AppError, AppResult};

pub mod cart_item;
pub mod commission;
pub mod discount_code;
pub mod inventory_movement;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod payment_event;
pub mod product;
pub mod product_variation;
pub mod stock_level;
pub mod task;
pub mod user;
pub mod wholesale_application;

/// Parse a text column into its domain type. Bad values mean corrupt data.
pub(crate) fn parse_column<T>(raw: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    raw.parse().map_err(|e: AppError| {
        AppError::internal(format!("Unexpected column value '{}': {}", raw, e))
    })
}

pub(crate) fn parse_optional_column<T>(raw: Option<&str>) -> AppResult<Option<T>>
where
    T: FromStr<Err = AppError>,
{
    raw.map(parse_column).transpose()
}
