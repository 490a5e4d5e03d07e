//! Catalog service - products, variations and sellable stock.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::product::validate_prices;
use crate::domain::{
    Location, NewProduct, NewVariation, Product, ProductDetail, ProductFilter, ProductUpdate,
    ProductVariation, VariationUpdate, VariationWithStock,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheInvalidator, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_products(
        &self,
        filter: ProductFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Product>>;

    /// Product with variations and warehouse stock. Inactive products and
    /// variations are hidden unless `include_inactive`.
    async fn get_product(&self, id: Uuid, include_inactive: bool) -> AppResult<ProductDetail>;

    async fn categories(&self) -> AppResult<Vec<String>>;

    async fn create_product(&self, product: NewProduct) -> AppResult<Product>;

    async fn update_product(&self, id: Uuid, changes: ProductUpdate) -> AppResult<Product>;

    async fn create_variation(
        &self,
        product_id: Uuid,
        variation: NewVariation,
    ) -> AppResult<ProductVariation>;

    async fn update_variation(
        &self,
        id: Uuid,
        changes: VariationUpdate,
    ) -> AppResult<ProductVariation>;
}

pub struct CatalogManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<U: UnitOfWork> CatalogManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { uow, cache }
    }
}

fn ensure_not_blank(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn validate_override(price_override: Option<Decimal>) -> AppResult<()> {
    if price_override.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::validation("Price override must be greater than zero"));
    }
    Ok(())
}

#[async_trait]
impl<U: UnitOfWork> CatalogService for CatalogManager<U> {
    async fn list_products(
        &self,
        filter: ProductFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Product>> {
        let page = self.uow.products().list(&filter, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn get_product(&self, id: Uuid, include_inactive: bool) -> AppResult<ProductDetail> {
        let products = self.uow.products();
        let product = products
            .find_by_id(id)
            .await?
            .filter(|p| include_inactive || p.active)
            .ok_or(AppError::NotFound)?;

        let variations = products.variations(id, include_inactive).await?;
        let stock = self
            .uow
            .inventory()
            .quantities(variations.iter().map(|v| v.id).collect(), Location::Warehouse)
            .await?;

        let variations = variations
            .into_iter()
            .map(|variation| VariationWithStock {
                stock: stock.get(&variation.id).copied().unwrap_or(0),
                variation,
            })
            .collect();

        Ok(ProductDetail {
            product,
            variations,
        })
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        self.uow.products().categories().await
    }

    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        ensure_not_blank(&product.name, "Name")?;
        ensure_not_blank(&product.category, "Category")?;
        validate_prices(product.price, product.wholesale_price)?;

        let product = self.uow.products().create(product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductUpdate) -> AppResult<Product> {
        if let Some(name) = &changes.name {
            ensure_not_blank(name, "Name")?;
        }
        if let Some(category) = &changes.category {
            ensure_not_blank(category, "Category")?;
        }

        // The price pair is validated as it will be stored
        if changes.price.is_some() || changes.wholesale_price.is_some() {
            let existing = self
                .uow
                .products()
                .find_by_id(id)
                .await?
                .ok_or(AppError::NotFound)?;
            validate_prices(
                changes.price.unwrap_or(existing.price),
                changes.wholesale_price.or(existing.wholesale_price),
            )?;
        }

        let product = self.uow.products().update(id, changes).await?;
        self.cache.forget_product(id).await;
        Ok(product)
    }

    async fn create_variation(
        &self,
        product_id: Uuid,
        variation: NewVariation,
    ) -> AppResult<ProductVariation> {
        ensure_not_blank(&variation.sku, "SKU")?;
        validate_override(variation.price_override)?;

        if self.uow.products().find_by_id(product_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let variation = self
            .uow
            .products()
            .create_variation(product_id, variation)
            .await?;
        self.cache.forget_product(product_id).await;
        tracing::info!(product_id = %product_id, sku = %variation.sku, "Variation created");
        Ok(variation)
    }

    async fn update_variation(
        &self,
        id: Uuid,
        changes: VariationUpdate,
    ) -> AppResult<ProductVariation> {
        validate_override(changes.price_override)?;
        let variation = self.uow.products().update_variation(id, changes).await?;
        self.cache.forget_product(variation.product_id).await;
        Ok(variation)
    }
}
