//! Catalog handlers: public browsing and admin product management.
//!
//! Public product detail is served from Redis when present; every admin
//! write drops the cached copy of the affected product.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{QueryParams, ValidatedJson};
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{
    CurrentUser, NewProduct, NewVariation, Product, ProductDetail, ProductFilter, ProductUpdate,
    ProductVariation, VariationUpdate,
};
use crate::errors::AppResult;
use crate::types::{Created, Paginated, PaginationParams};

/// Catalog listing filters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Exact category
    pub category: Option<String>,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    #[schema(example = "Cold Brew Concentrate")]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    #[schema(example = "beverages")]
    pub category: String,
    #[schema(value_type = String, example = "24.99")]
    pub price: Decimal,
    #[schema(value_type = Option<String>, example = "18.00")]
    pub wholesale_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category cannot be empty"))]
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub wholesale_price: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVariationRequest {
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    #[schema(example = "CBC-STRONG-VAN")]
    pub sku: String,
    #[schema(example = "strong")]
    pub strength: Option<String>,
    #[schema(example = "vanilla")]
    pub flavor: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price_override: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVariationRequest {
    pub strength: Option<String>,
    pub flavor: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price_override: Option<Decimal>,
    pub active: Option<bool>,
}

/// Public catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/categories", get(list_categories))
}

/// Admin catalog routes
pub fn admin_catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin_list_products).post(create_product))
        .route("/products/:id", put(update_product))
        .route("/products/:id/variations", post(create_variation))
        .route("/variations/:id", put(update_variation))
}

/// List active products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(ProductQuery, PaginationParams),
    responses((status = 200, description = "Active products", body = ProductPage))
)]
pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Product>>> {
    let filter = ProductFilter {
        category: query.category,
        search: query.search,
        include_inactive: false,
    };
    let page = state.services.catalog().list_products(filter, params).await?;
    Ok(Json(page))
}

/// Product with its active variations and sellable stock
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductDetail),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    match state.cache.get_product(&id).await {
        Ok(Some(detail)) => return Ok(Json(detail)),
        Ok(None) => {}
        Err(e) => tracing::warn!(product_id = %id, error = %e, "Product cache unavailable"),
    }

    let detail = state.services.catalog().get_product(id, false).await?;
    if let Err(e) = state.cache.set_product(&detail).await {
        tracing::warn!(product_id = %id, error = %e, "Failed to cache product");
    }
    Ok(Json(detail))
}

/// Distinct categories of active products
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses((status = 200, description = "Categories", body = Vec<String>))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.catalog().categories().await?;
    Ok(Json(categories))
}

/// List all products, inactive included (admin)
#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(ProductQuery, PaginationParams),
    responses(
        (status = 200, description = "Products", body = ProductPage),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<ProductQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Product>>> {
    require_admin(&current_user)?;
    let filter = ProductFilter {
        category: query.category,
        search: query.search,
        include_inactive: true,
    };
    let page = state.services.catalog().list_products(filter, params).await?;
    Ok(Json(page))
}

/// Create a product (admin)
#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<Created<Product>> {
    require_admin(&current_user)?;
    let product = state
        .services
        .catalog()
        .create_product(NewProduct {
            name: payload.name,
            description: payload.description,
            category: payload.category,
            price: payload.price,
            wholesale_price: payload.wholesale_price,
        })
        .await?;
    Ok(Created(product))
}

/// Update a product (admin)
#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    require_admin(&current_user)?;
    let product = state
        .services
        .catalog()
        .update_product(
            id,
            ProductUpdate {
                name: payload.name,
                description: payload.description,
                category: payload.category,
                price: payload.price,
                wholesale_price: payload.wholesale_price,
                active: payload.active,
            },
        )
        .await?;
    Ok(Json(product))
}

/// Add a variation to a product (admin)
#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/variations",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CreateVariationRequest,
    responses(
        (status = 201, description = "Variation created", body = ProductVariation),
        (status = 404, description = "Product not found"),
        (status = 409, description = "SKU already exists")
    )
)]
pub async fn create_variation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(product_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateVariationRequest>,
) -> AppResult<Created<ProductVariation>> {
    require_admin(&current_user)?;
    let variation = state
        .services
        .catalog()
        .create_variation(
            product_id,
            NewVariation {
                sku: payload.sku,
                strength: payload.strength,
                flavor: payload.flavor,
                price_override: payload.price_override,
            },
        )
        .await?;
    Ok(Created(variation))
}

/// Update a variation (admin)
#[utoipa::path(
    put,
    path = "/api/admin/variations/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Variation id")),
    request_body = UpdateVariationRequest,
    responses(
        (status = 200, description = "Variation updated", body = ProductVariation),
        (status = 404, description = "Variation not found")
    )
)]
pub async fn update_variation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateVariationRequest>,
) -> AppResult<Json<ProductVariation>> {
    require_admin(&current_user)?;
    let variation = state
        .services
        .catalog()
        .update_variation(
            id,
            VariationUpdate {
                strength: payload.strength,
                flavor: payload.flavor,
                price_override: payload.price_override,
                active: payload.active,
            },
        )
        .await?;
    Ok(Json(variation))
}
