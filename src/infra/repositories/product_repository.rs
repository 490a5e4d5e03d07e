//! Catalog repository: products and their variations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, is_unique_violation};
use super::entities::product::{self, Entity as ProductEntity};
use super::entities::product_variation::{self, Entity as VariationEntity};
use crate::domain::{
    NewProduct, NewVariation, Product, ProductFilter, ProductUpdate, ProductVariation,
    VariationUpdate,
};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Products matching `filter`, ordered by name
    async fn list(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)>;

    /// Distinct categories of active products
    async fn categories(&self) -> AppResult<Vec<String>>;

    /// Variations of a product ordered by SKU
    async fn variations(
        &self,
        product_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<ProductVariation>>;

    async fn find_variation(&self, id: Uuid) -> AppResult<Option<ProductVariation>>;

    /// Variations joined with their product. Unknown ids are skipped.
    async fn find_variations_with_products(
        &self,
        ids: Vec<Uuid>,
    ) -> AppResult<Vec<(ProductVariation, Product)>>;

    async fn create(&self, product: NewProduct) -> AppResult<Product>;

    async fn update(&self, id: Uuid, changes: ProductUpdate) -> AppResult<Product>;

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

pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let model = ProductEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Product::from))
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)> {
        let mut select = ProductEntity::find();
        if !filter.include_inactive {
            select = select.filter(product::Column::Active.eq(true));
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            select = select.filter(product::Column::Category.eq(category));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Name))).like(pattern),
            );
        }
        let select = select.order_by_asc(product::Column::Name);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((models.into_iter().map(Product::from).collect(), total))
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = ProductEntity::find()
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .filter(product::Column::Active.eq(true))
            .order_by_asc(product::Column::Category)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    async fn variations(
        &self,
        product_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<ProductVariation>> {
        let mut select =
            VariationEntity::find().filter(product_variation::Column::ProductId.eq(product_id));
        if !include_inactive {
            select = select.filter(product_variation::Column::Active.eq(true));
        }
        let models = select
            .order_by_asc(product_variation::Column::Sku)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(ProductVariation::from).collect())
    }

    async fn find_variation(&self, id: Uuid) -> AppResult<Option<ProductVariation>> {
        let model = VariationEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(ProductVariation::from))
    }

    async fn find_variations_with_products(
        &self,
        ids: Vec<Uuid>,
    ) -> AppResult<Vec<(ProductVariation, Product)>> {
        variations_with_products(&self.db, ids).await
    }

    async fn create(&self, new_product: NewProduct) -> AppResult<Product> {
        let now = chrono::Utc::now();
        let active_model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_product.name),
            description: Set(new_product.description),
            category: Set(new_product.category),
            price: Set(new_product.price),
            wholesale_price: Set(new_product.wholesale_price),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(Product::from(active_model.insert(&self.db).await?))
    }

    async fn update(&self, id: Uuid, changes: ProductUpdate) -> AppResult<Product> {
        let record = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: product::ActiveModel = record.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(wholesale_price) = changes.wholesale_price {
            active.wholesale_price = Set(Some(wholesale_price));
        }
        if let Some(flag) = changes.active {
            active.active = Set(flag);
        }
        active.updated_at = Set(chrono::Utc::now());

        Ok(Product::from(active.update(&self.db).await?))
    }

    async fn create_variation(
        &self,
        product_id: Uuid,
        variation: NewVariation,
    ) -> AppResult<ProductVariation> {
        let now = chrono::Utc::now();
        let active_model = product_variation::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            sku: Set(variation.sku),
            strength: Set(variation.strength),
            flavor: Set(variation.flavor),
            price_override: Set(variation.price_override),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("SKU")
            } else {
                AppError::from(e)
            }
        })?;
        Ok(ProductVariation::from(model))
    }

    async fn update_variation(
        &self,
        id: Uuid,
        changes: VariationUpdate,
    ) -> AppResult<ProductVariation> {
        let record = VariationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: product_variation::ActiveModel = record.into();
        if let Some(strength) = changes.strength {
            active.strength = Set(Some(strength));
        }
        if let Some(flavor) = changes.flavor {
            active.flavor = Set(Some(flavor));
        }
        if let Some(price_override) = changes.price_override {
            active.price_override = Set(Some(price_override));
        }
        if let Some(flag) = changes.active {
            active.active = Set(flag);
        }
        active.updated_at = Set(chrono::Utc::now());

        Ok(ProductVariation::from(active.update(&self.db).await?))
    }
}

/// Transaction-bound catalog reads used at checkout.
pub struct TxProductRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxProductRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub async fn find_variations_with_products(
        &self,
        ids: Vec<Uuid>,
    ) -> AppResult<Vec<(ProductVariation, Product)>> {
        variations_with_products(self.txn, ids).await
    }
}

async fn variations_with_products<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> AppResult<Vec<(ProductVariation, Product)>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = VariationEntity::find()
        .filter(product_variation::Column::Id.is_in(ids))
        .find_also_related(ProductEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(variation, product)| {
            product.map(|p| (ProductVariation::from(variation), Product::from(p)))
        })
        .collect())
}
