//! `?page=&per_page=` handling and the `{data, meta}` list envelope.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{
    Commission, InventoryMovement, Order, Product, Task, UserResponse, WholesaleApplication,
};

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page (capped at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    /// Rows to skip. Page 0 is read as page 1; absurd pages saturate at
    /// the largest offset the database accepts.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    UserPage = Paginated<UserResponse>,
    ProductPage = Paginated<Product>,
    OrderPage = Paginated<Order>,
    CommissionPage = Paginated<Commission>,
    MovementPage = Paginated<InventoryMovement>,
    TaskPage = Paginated<Task>,
    ApplicationPage = Paginated<WholesaleApplication>
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = match per_page {
            0 => 0,
            n => total.div_ceil(n),
        };

        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }

    /// Wrap a `(rows, total)` page fetched with `params`.
    pub fn from_page(params: &PaginationParams, (data, total): (Vec<T>, u64)) -> Self {
        Self::new(data, params.page.max(1), params.limit(), total)
    }

    /// Convert the rows, keeping the metadata.
    pub fn map<R>(self, f: impl FnMut(T) -> R) -> Paginated<R> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_uses_capped_limit() {
        let params = PaginationParams {
            page: 3,
            per_page: 500,
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 2 * MAX_PAGE_SIZE);
    }

    #[test]
    fn page_zero_behaves_like_first_page() {
        let params = PaginationParams {
            page: 0,
            per_page: 10,
        };
        assert_eq!(params.offset(), 0);
        let page = Paginated::from_page(&params, (vec![1, 2], 12));
        assert_eq!(page.meta.page, 1);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let params = PaginationParams {
            page: u64::MAX,
            per_page: 100,
        };
        assert_eq!(params.offset(), i64::MAX as u64);
        let page = Paginated::from_page(&params, (Vec::<u8>::new(), 3));
        assert_eq!(page.meta.total_pages, 1);
        assert!(page.data.is_empty());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2, 3], 1, 3, 7).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20, 30]);
        assert_eq!(page.meta.total_pages, 3);
    }
}
