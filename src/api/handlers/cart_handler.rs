//! Shopping cart handlers. Prices follow the caller's role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{CartView, CurrentUser};
use crate::errors::AppResult;
use crate::types::NoContent;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCartItemRequest {
    pub variation_id: Uuid,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    #[schema(example = 2, minimum = 1, maximum = 100)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemRequest {
    /// New quantity; 0 removes the line
    #[validate(range(min = 0, max = 100, message = "Quantity must be between 0 and 100"))]
    #[schema(example = 3, minimum = 0, maximum = 100)]
    pub quantity: i32,
}

/// Cart routes
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(add_item).delete(clear_cart))
        .route("/:item_id", put(update_item).delete(remove_item))
}

/// Current cart with role-based prices
#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart contents", body = CartView))
)]
pub async fn view_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<CartView>> {
    let cart = state
        .services
        .cart()
        .view(current_user.id, current_user.role)
        .await?;
    Ok(Json(cart))
}

/// Add units of a variation to the cart
#[utoipa::path(
    post,
    path = "/api/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "New line added", body = CartView),
        (status = 200, description = "Existing line incremented", body = CartView),
        (status = 400, description = "Validation error or product unavailable"),
        (status = 409, description = "Insufficient stock")
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<AddCartItemRequest>,
) -> AppResult<(StatusCode, Json<CartView>)> {
    let (cart, created) = state
        .services
        .cart()
        .add_item(
            current_user.id,
            current_user.role,
            payload.variation_id,
            payload.quantity,
        )
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cart)))
}

/// Set the quantity of a cart line
#[utoipa::path(
    put,
    path = "/api/cart/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Cart line id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart updated", body = CartView),
        (status = 404, description = "Line not found"),
        (status = 409, description = "Insufficient stock")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCartItemRequest>,
) -> AppResult<Json<CartView>> {
    let cart = state
        .services
        .cart()
        .update_item(current_user.id, current_user.role, item_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a cart line
#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Cart line id")),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Line not found")
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .services
        .cart()
        .remove_item(current_user.id, item_id)
        .await?;
    Ok(NoContent)
}

/// Empty the cart
#[utoipa::path(
    delete,
    path = "/api/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Cart cleared"))
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<NoContent> {
    state.services.cart().clear(current_user.id).await?;
    Ok(NoContent)
}
