//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{
    ApplicationPage, CommissionPage, MovementPage, OrderPage, Paginated, PaginationMeta,
    PaginationParams, ProductPage, TaskPage, UserPage,
};
pub use response::{Created, NoContent};
