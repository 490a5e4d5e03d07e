//! Checkout and order handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{QueryParams, ValidatedJson};
use crate::api::middleware::require_admin;
use crate::api::AppState;
use crate::domain::{CurrentUser, Order, OrderDetail, OrderFilter, OrderStatus};
use crate::errors::AppResult;
use crate::services::Checkout;
use crate::types::{Created, Paginated, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 5, max = 500, message = "Shipping address is required"))]
    #[schema(example = "221B Baker Street, London")]
    pub shipping_address: String,
    #[schema(example = "SPRING10")]
    pub discount_code: Option<String>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Admin order listing filters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub distributor_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Customer order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_orders).post(checkout))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
}

/// Admin order listing
pub fn admin_order_routes() -> Router<AppState> {
    Router::new().route("/", get(list_orders))
}

/// Place an order from the current cart
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created, awaiting payment", body = Order),
        (status = 400, description = "Empty cart, invalid discount or validation error"),
        (status = 409, description = "Insufficient stock")
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CheckoutRequest>,
) -> AppResult<Created<Order>> {
    let order = state
        .services
        .orders()
        .checkout(
            current_user.id,
            current_user.role,
            Checkout {
                shipping_address: payload.shipping_address,
                discount_code: payload.discount_code,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Created(order))
}

/// Orders placed by the signed-in user
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses((status = 200, description = "Orders, newest first", body = OrderPage))
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Order>>> {
    let page = state
        .services
        .orders()
        .list_mine(current_user.id, params)
        .await?;
    Ok(Json(page))
}

/// Order with its lines and status history
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = OrderDetail),
        (status = 403, description = "Not your order"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.services.orders().get(&current_user, id).await?;
    Ok(Json(detail))
}

/// Cancel an order that has not been paid
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = Order),
        (status = 403, description = "Not your order"),
        (status = 409, description = "Order can no longer be cancelled")
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.services.orders().cancel(&current_user, id).await?;
    Ok(Json(order))
}

/// All orders (admin)
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(OrderQuery, PaginationParams),
    responses(
        (status = 200, description = "Orders", body = OrderPage),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<OrderQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Order>>> {
    require_admin(&current_user)?;
    let filter = OrderFilter {
        status: query.status,
        distributor_id: query.distributor_id,
        user_id: query.user_id,
    };
    let page = state.services.orders().list(filter, params).await?;
    Ok(Json(page))
}
