//! Stock administration: absolute adjustments, transfers and the ledger.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{InventoryMovement, Location, StockLevel, StockMove};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheInvalidator, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

const DEFAULT_ADJUSTMENT_REASON: &str = "adjustment";
const TRANSFER_REASON: &str = "transfer";

/// Stock move between two locations
#[derive(Debug, Clone)]
pub struct Transfer {
    pub variation_id: Uuid,
    pub from: Location,
    pub to: Location,
    pub quantity: i32,
}

#[async_trait]
pub trait InventoryService: Send + Sync {
    async fn list_levels(
        &self,
        variation_id: Option<Uuid>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockLevel>>;

    /// Set the absolute quantity at a location; the difference is recorded
    /// as a movement.
    async fn set_quantity(
        &self,
        actor_id: Uuid,
        variation_id: Uuid,
        location: Location,
        quantity: i32,
        reason: Option<String>,
    ) -> AppResult<StockLevel>;

    /// Move stock between locations. The source must hold enough.
    async fn transfer(&self, actor_id: Uuid, transfer: Transfer) -> AppResult<Vec<StockLevel>>;

    async fn movements(
        &self,
        variation_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<Paginated<InventoryMovement>>;
}

pub struct InventoryManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<U: UnitOfWork> InventoryManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { uow, cache }
    }

    /// Product owning the variation.
    async fn product_of(&self, variation_id: Uuid) -> AppResult<Uuid> {
        self.uow
            .products()
            .find_variation(variation_id)
            .await?
            .map(|variation| variation.product_id)
            .ok_or_else(|| AppError::validation("Unknown variation"))
    }
}

#[async_trait]
impl<U: UnitOfWork> InventoryService for InventoryManager<U> {
    async fn list_levels(
        &self,
        variation_id: Option<Uuid>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockLevel>> {
        self.uow.inventory().list_levels(variation_id, location).await
    }

    async fn set_quantity(
        &self,
        actor_id: Uuid,
        variation_id: Uuid,
        location: Location,
        quantity: i32,
        reason: Option<String>,
    ) -> AppResult<StockLevel> {
        if quantity < 0 {
            return Err(AppError::validation("Quantity cannot be negative"));
        }
        let product_id = self.product_of(variation_id).await?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ADJUSTMENT_REASON.to_string());

        let level = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    ctx.inventory()
                        .set_quantity(variation_id, location, quantity, &reason, Some(actor_id))
                        .await
                })
            })
            .await?;
        if location.is_warehouse() {
            self.cache.forget_product(product_id).await;
        }

        tracing::info!(
            variation_id = %variation_id,
            location = %location,
            quantity,
            "Stock level set"
        );
        Ok(level)
    }

    async fn transfer(&self, actor_id: Uuid, transfer: Transfer) -> AppResult<Vec<StockLevel>> {
        let movement = StockMove::new(transfer.variation_id, transfer.quantity, TRANSFER_REASON)
            .from(transfer.from)
            .to(transfer.to)
            .by(Some(actor_id));
        movement.validate()?;
        let product_id = self.product_of(transfer.variation_id).await?;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move { ctx.inventory().apply(&movement).await })
            })
            .await?;
        if transfer.from.is_warehouse() || transfer.to.is_warehouse() {
            self.cache.forget_product(product_id).await;
        }

        tracing::info!(
            variation_id = %transfer.variation_id,
            from = %transfer.from,
            to = %transfer.to,
            quantity = transfer.quantity,
            "Stock transferred"
        );

        let inventory = self.uow.inventory();
        let mut levels = inventory
            .list_levels(Some(transfer.variation_id), Some(transfer.from))
            .await?;
        levels.extend(
            inventory
                .list_levels(Some(transfer.variation_id), Some(transfer.to))
                .await?,
        );
        Ok(levels)
    }

    async fn movements(
        &self,
        variation_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<Paginated<InventoryMovement>> {
        let page = self.uow.inventory().movements(variation_id, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use sea_orm::{DatabaseConnection, DbBackend, MockDatabase};

    use super::*;
    use crate::infra::repositories::entities::product_variation;
    use crate::infra::repositories::fixtures::{
        affected, executed_sql, matching, stock_row, variation_row,
    };
    use crate::infra::{MockCacheInvalidator, Persistence};

    fn manager(db: &DatabaseConnection, cache: MockCacheInvalidator) -> InventoryManager<Persistence> {
        InventoryManager::new(Arc::new(Persistence::new(db.clone())), Arc::new(cache))
    }

    fn evicts(product_id: Uuid) -> MockCacheInvalidator {
        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_forget_product()
            .with(eq(product_id))
            .times(1)
            .returning(|_| ());
        cache
    }

    fn keeps_cache() -> MockCacheInvalidator {
        let mut cache = MockCacheInvalidator::new();
        cache.expect_forget_product().never();
        cache
    }

    /// Variation lookup, locked read of `before`, then the row after the upsert.
    fn adjustment(variation_id: Uuid, product_id: Uuid, location: Location, before: i32, after: i32) -> MockDatabase {
        MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![variation_row(variation_id, product_id, "CBC-STRONG")]])
            .append_query_results([
                vec![stock_row(variation_id, location, before)],
                vec![stock_row(variation_id, location, after)],
            ])
    }

    #[tokio::test]
    async fn warehouse_recount_evicts_the_product_detail() {
        let (variation_id, product_id) = (Uuid::new_v4(), Uuid::new_v4());
        let db = adjustment(variation_id, product_id, Location::Warehouse, 4, 10)
            .append_exec_results([affected(1), affected(1)])
            .into_connection();

        let level = manager(&db, evicts(product_id))
            .set_quantity(Uuid::new_v4(), variation_id, Location::Warehouse, 10, Some("recount".to_string()))
            .await
            .unwrap();
        assert_eq!(level.quantity, 10);

        let sql = executed_sql(db);
        assert!(sql.iter().any(|s| s == "COMMIT"));
        let movement = matching(&sql, r#"INSERT INTO "inventory_movements""#);
        assert_eq!(movement.len(), 1);
        // Six units arrived at the warehouse
        assert!(movement[0].contains("6, 'recount'"));
    }

    #[tokio::test]
    async fn distributor_recount_leaves_the_catalog_cache() {
        let (variation_id, product_id) = (Uuid::new_v4(), Uuid::new_v4());
        let shelf = Location::Distributor(Uuid::new_v4());
        let db = adjustment(variation_id, product_id, shelf, 3, 3)
            .append_exec_results([affected(1)])
            .into_connection();

        manager(&db, keeps_cache())
            .set_quantity(Uuid::new_v4(), variation_id, shelf, 3, None)
            .await
            .unwrap();

        // Unchanged quantity writes no ledger row
        assert!(matching(&executed_sql(db), "inventory_movements").is_empty());
    }

    #[tokio::test]
    async fn transfer_out_of_the_warehouse_evicts_the_product_detail() {
        let (variation_id, product_id) = (Uuid::new_v4(), Uuid::new_v4());
        let shelf = Location::Distributor(Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![variation_row(variation_id, product_id, "CBC-STRONG")]])
            .append_exec_results([affected(1), affected(1), affected(1)])
            .append_query_results([
                vec![stock_row(variation_id, Location::Warehouse, 6)],
                vec![stock_row(variation_id, shelf, 4)],
            ])
            .into_connection();

        let transfer = Transfer {
            variation_id,
            from: Location::Warehouse,
            to: shelf,
            quantity: 4,
        };
        let levels = manager(&db, evicts(product_id))
            .transfer(Uuid::new_v4(), transfer)
            .await
            .unwrap();
        assert_eq!(levels.iter().map(|l| l.quantity).collect::<Vec<_>>(), vec![6, 4]);

        let sql = executed_sql(db);
        let taken = matching(&sql, r#"UPDATE "stock_levels""#);
        assert_eq!(taken.len(), 1);
        assert!(taken[0].contains("'warehouse'"));
        assert!(matching(&sql, r#"INSERT INTO "stock_levels""#)[0].contains(&shelf.to_string()));
    }

    #[tokio::test]
    async fn unknown_variation_is_rejected_before_any_write() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<product_variation::Model>::new()])
            .into_connection();

        let result = manager(&db, keeps_cache())
            .set_quantity(Uuid::new_v4(), Uuid::new_v4(), Location::Warehouse, 5, None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!executed_sql(db).iter().any(|s| s == "BEGIN"));
    }
}
