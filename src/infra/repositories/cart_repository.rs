//! Cart repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::cart_item::{self, Entity as CartEntity};
use crate::domain::CartItem;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Items in a user's cart, oldest first
    async fn items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>>;

    /// Item by id, scoped to its owner
    async fn find_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<Option<CartItem>>;

    async fn find_by_variation(
        &self,
        user_id: Uuid,
        variation_id: Uuid,
    ) -> AppResult<Option<CartItem>>;

    async fn insert(&self, user_id: Uuid, variation_id: Uuid, quantity: i32)
        -> AppResult<CartItem>;

    async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> AppResult<CartItem>;

    async fn remove(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()>;

    async fn clear(&self, user_id: Uuid) -> AppResult<()>;
}

pub struct CartStore {
    db: DatabaseConnection,
}

impl CartStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartRepository for CartStore {
    async fn items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        items_of(&self.db, user_id).await
    }

    async fn find_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<Option<CartItem>> {
        let model = CartEntity::find_by_id(item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(CartItem::from))
    }

    async fn find_by_variation(
        &self,
        user_id: Uuid,
        variation_id: Uuid,
    ) -> AppResult<Option<CartItem>> {
        let model = CartEntity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::VariationId.eq(variation_id))
            .one(&self.db)
            .await?;
        Ok(model.map(CartItem::from))
    }

    async fn insert(
        &self,
        user_id: Uuid,
        variation_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartItem> {
        let now = chrono::Utc::now();
        let active_model = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            variation_id: Set(variation_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(CartItem::from(active_model.insert(&self.db).await?))
    }

    async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> AppResult<CartItem> {
        let record = CartEntity::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: cart_item::ActiveModel = record.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(chrono::Utc::now());

        Ok(CartItem::from(active.update(&self.db).await?))
    }

    async fn remove(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let result = CartEntity::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        clear_cart(&self.db, user_id).await
    }
}

pub struct TxCartRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxCartRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        items_of(self.txn, user_id).await
    }

    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        clear_cart(self.txn, user_id).await
    }
}

async fn items_of<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<CartItem>> {
    let models = CartEntity::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .order_by_asc(cart_item::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(CartItem::from).collect())
}

async fn clear_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<()> {
    CartEntity::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
