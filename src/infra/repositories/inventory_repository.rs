//! Stock levels and the movement ledger.
//!
//! Quantities only change through `TxInventoryRepository` so that every
//! change is paired with a ledger row in the same transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{convert_all, fetch_page};
use super::entities::inventory_movement::{self, Entity as MovementEntity};
use super::entities::stock_level::{self, Entity as StockEntity};
use crate::domain::{InventoryMovement, Location, StockLevel, StockMove};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Quantity per variation at `location`. Missing rows are omitted.
    async fn quantities(
        &self,
        variation_ids: Vec<Uuid>,
        location: Location,
    ) -> AppResult<HashMap<Uuid, i32>>;

    async fn list_levels(
        &self,
        variation_id: Option<Uuid>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockLevel>>;

    /// Ledger entries, newest first
    async fn movements(
        &self,
        variation_id: Option<Uuid>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<InventoryMovement>, u64)>;
}

pub struct InventoryStore {
    db: DatabaseConnection,
}

impl InventoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryRepository for InventoryStore {
    async fn quantities(
        &self,
        variation_ids: Vec<Uuid>,
        location: Location,
    ) -> AppResult<HashMap<Uuid, i32>> {
        quantities_at(&self.db, variation_ids, location).await
    }

    async fn list_levels(
        &self,
        variation_id: Option<Uuid>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockLevel>> {
        let mut select = StockEntity::find();
        if let Some(id) = variation_id {
            select = select.filter(stock_level::Column::VariationId.eq(id));
        }
        if let Some(location) = location {
            select = select.filter(stock_level::Column::Location.eq(location.to_string()));
        }
        let models = select
            .order_by_asc(stock_level::Column::Location)
            .order_by_asc(stock_level::Column::VariationId)
            .all(&self.db)
            .await?;
        convert_all(models)
    }

    async fn movements(
        &self,
        variation_id: Option<Uuid>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<InventoryMovement>, u64)> {
        let mut select = MovementEntity::find();
        if let Some(id) = variation_id {
            select = select.filter(inventory_movement::Column::VariationId.eq(id));
        }
        let select = select.order_by_desc(inventory_movement::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }
}

/// Transaction-bound stock mutations.
pub struct TxInventoryRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxInventoryRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn quantities(
        &self,
        variation_ids: Vec<Uuid>,
        location: Location,
    ) -> AppResult<HashMap<Uuid, i32>> {
        quantities_at(self.txn, variation_ids, location).await
    }

    /// Current quantity with the row locked until commit. Missing row = 0.
    pub async fn quantity_for_update(&self, variation_id: Uuid, location: Location) -> AppResult<i32> {
        let row = StockEntity::find()
            .filter(stock_level::Column::VariationId.eq(variation_id))
            .filter(stock_level::Column::Location.eq(location.to_string()))
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(row.map(|r| r.quantity).unwrap_or(0))
    }

    /// Set an absolute quantity and record the difference in the ledger.
    pub async fn set_quantity(
        &self,
        variation_id: Uuid,
        location: Location,
        quantity: i32,
        reason: &str,
        actor_id: Option<Uuid>,
    ) -> AppResult<StockLevel> {
        if quantity < 0 {
            return Err(AppError::validation("Quantity cannot be negative"));
        }
        let current = self.quantity_for_update(variation_id, location).await?;
        let now = chrono::Utc::now();

        let row = stock_level::ActiveModel {
            id: Set(Uuid::new_v4()),
            variation_id: Set(variation_id),
            location: Set(location.to_string()),
            quantity: Set(quantity),
            updated_at: Set(now),
        };
        StockEntity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    stock_level::Column::VariationId,
                    stock_level::Column::Location,
                ])
                .update_columns([stock_level::Column::Quantity, stock_level::Column::UpdatedAt])
                .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await?;

        let delta = quantity - current;
        if delta != 0 {
            let movement = StockMove::new(variation_id, delta.abs(), reason).by(actor_id);
            let movement = if delta > 0 {
                movement.to(location)
            } else {
                movement.from(location)
            };
            self.record_movement(&movement).await?;
        }

        let level = StockEntity::find()
            .filter(stock_level::Column::VariationId.eq(variation_id))
            .filter(stock_level::Column::Location.eq(location.to_string()))
            .one(self.txn)
            .await?
            .ok_or_else(|| AppError::internal("Stock level vanished after upsert"))?;
        StockLevel::try_from(level)
    }

    /// Apply a stock move: take from the source (guarded), add to the
    /// destination and append the ledger row.
    pub async fn apply(&self, movement: &StockMove) -> AppResult<()> {
        movement.validate()?;
        if let Some(from) = movement.from {
            self.decrement(movement.variation_id, from, movement.quantity)
                .await?;
        }
        if let Some(to) = movement.to {
            self.increment(movement.variation_id, to, movement.quantity)
                .await?;
        }
        self.record_movement(movement).await
    }

    /// Guarded decrement: fails without touching the row when stock is short.
    async fn decrement(&self, variation_id: Uuid, location: Location, quantity: i32) -> AppResult<()> {
        let result = StockEntity::update_many()
            .col_expr(
                stock_level::Column::Quantity,
                Expr::col(stock_level::Column::Quantity).sub(quantity),
            )
            .col_expr(stock_level::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(stock_level::Column::VariationId.eq(variation_id))
            .filter(stock_level::Column::Location.eq(location.to_string()))
            .filter(stock_level::Column::Quantity.gte(quantity))
            .exec(self.txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::insufficient_stock(format!(
                "variation {} has fewer than {} units at {}",
                variation_id, quantity, location
            )));
        }
        Ok(())
    }

    async fn increment(&self, variation_id: Uuid, location: Location, quantity: i32) -> AppResult<()> {
        let row = stock_level::ActiveModel {
            id: Set(Uuid::new_v4()),
            variation_id: Set(variation_id),
            location: Set(location.to_string()),
            quantity: Set(quantity),
            updated_at: Set(chrono::Utc::now()),
        };
        StockEntity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    stock_level::Column::VariationId,
                    stock_level::Column::Location,
                ])
                .value(
                    stock_level::Column::Quantity,
                    Expr::col((StockEntity, stock_level::Column::Quantity)).add(quantity),
                )
                .update_column(stock_level::Column::UpdatedAt)
                .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }

    async fn record_movement(&self, movement: &StockMove) -> AppResult<()> {
        let row = inventory_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            variation_id: Set(movement.variation_id),
            from_location: Set(movement.from.map(|l| l.to_string())),
            to_location: Set(movement.to.map(|l| l.to_string())),
            quantity: Set(movement.quantity),
            reason: Set(movement.reason.clone()),
            order_id: Set(movement.order_id),
            actor_id: Set(movement.actor_id),
            created_at: Set(chrono::Utc::now()),
        };
        MovementEntity::insert(row)
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }
}

async fn quantities_at<C: ConnectionTrait>(
    db: &C,
    variation_ids: Vec<Uuid>,
    location: Location,
) -> AppResult<HashMap<Uuid, i32>> {
    if variation_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = StockEntity::find()
        .filter(stock_level::Column::VariationId.is_in(variation_ids))
        .filter(stock_level::Column::Location.eq(location.to_string()))
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.variation_id, r.quantity))
        .collect())
}
