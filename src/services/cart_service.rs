//! Cart service - per-user cart priced for the caller's role.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::MAX_CART_LINE_QUANTITY;
use crate::domain::{CartLine, CartView, Location, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait CartService: Send + Sync {
    async fn view(&self, user_id: Uuid, role: UserRole) -> AppResult<CartView>;

    /// Add units of a variation. Returns the cart and whether a new line was created.
    async fn add_item(
        &self,
        user_id: Uuid,
        role: UserRole,
        variation_id: Uuid,
        quantity: i32,
    ) -> AppResult<(CartView, bool)>;

    /// Set a line's quantity. Zero removes the line.
    async fn update_item(
        &self,
        user_id: Uuid,
        role: UserRole,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartView>;

    async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()>;

    async fn clear(&self, user_id: Uuid) -> AppResult<()>;
}

pub struct CartManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CartManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Check that `quantity` units of a variation may sit in a cart.
    async fn ensure_sellable(&self, variation_id: Uuid, quantity: i32) -> AppResult<()> {
        if quantity > MAX_CART_LINE_QUANTITY {
            return Err(AppError::validation(format!(
                "At most {} units per item",
                MAX_CART_LINE_QUANTITY
            )));
        }

        let (variation, product) = self
            .uow
            .products()
            .find_variations_with_products(vec![variation_id])
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound)?;
        if !product.is_purchasable(&variation) {
            return Err(AppError::validation(format!(
                "{} is not available",
                variation.sku
            )));
        }

        let available = self
            .uow
            .inventory()
            .quantities(vec![variation_id], Location::Warehouse)
            .await?
            .get(&variation_id)
            .copied()
            .unwrap_or(0);
        if quantity > available {
            return Err(AppError::insufficient_stock(format!(
                "{} has {} available",
                variation.sku, available
            )));
        }
        Ok(())
    }
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if !(1..=MAX_CART_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::validation(format!(
            "Quantity must be between 1 and {}",
            MAX_CART_LINE_QUANTITY
        )));
    }
    Ok(())
}

#[async_trait]
impl<U: UnitOfWork> CartService for CartManager<U> {
    async fn view(&self, user_id: Uuid, role: UserRole) -> AppResult<CartView> {
        let items = self.uow.carts().items(user_id).await?;
        if items.is_empty() {
            return Ok(CartView::new(Vec::new()));
        }

        let variation_ids: Vec<Uuid> = items.iter().map(|i| i.variation_id).collect();
        let catalog: HashMap<_, _> = self
            .uow
            .products()
            .find_variations_with_products(variation_ids.clone())
            .await?
            .into_iter()
            .map(|(variation, product)| (variation.id, (variation, product)))
            .collect();
        let stock = self
            .uow
            .inventory()
            .quantities(variation_ids, Location::Warehouse)
            .await?;

        // Lines whose variation was removed from the catalog are skipped
        let lines = items
            .iter()
            .filter_map(|item| {
                let (variation, product) = catalog.get(&item.variation_id)?;
                let available = stock.get(&item.variation_id).copied().unwrap_or(0);
                Some(CartLine::price(item, variation, product, available, role))
            })
            .collect();

        Ok(CartView::new(lines))
    }

    async fn add_item(
        &self,
        user_id: Uuid,
        role: UserRole,
        variation_id: Uuid,
        quantity: i32,
    ) -> AppResult<(CartView, bool)> {
        validate_quantity(quantity)?;

        let carts = self.uow.carts();
        let existing = carts.find_by_variation(user_id, variation_id).await?;
        let total = existing.as_ref().map(|i| i.quantity).unwrap_or(0) + quantity;
        self.ensure_sellable(variation_id, total).await?;

        let created = match existing {
            Some(item) => {
                carts.set_quantity(item.id, total).await?;
                false
            }
            None => {
                carts.insert(user_id, variation_id, quantity).await?;
                true
            }
        };

        tracing::debug!(user_id = %user_id, variation_id = %variation_id, quantity = total, "Cart updated");
        Ok((self.view(user_id, role).await?, created))
    }

    async fn update_item(
        &self,
        user_id: Uuid,
        role: UserRole,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartView> {
        let carts = self.uow.carts();
        let item = carts
            .find_item(user_id, item_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if quantity == 0 {
            carts.remove(user_id, item.id).await?;
        } else {
            validate_quantity(quantity)?;
            self.ensure_sellable(item.variation_id, quantity).await?;
            carts.set_quantity(item.id, quantity).await?;
        }

        self.view(user_id, role).await
    }

    async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        self.uow.carts().remove(user_id, item_id).await
    }

    async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        self.uow.carts().clear(user_id).await
    }
}
