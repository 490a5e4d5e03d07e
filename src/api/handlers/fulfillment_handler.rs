//! Fulfillment workflow handlers for admins and distributors.

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
use crate::api::middleware::{require_admin, require_role};
use crate::api::AppState;
use crate::domain::{CurrentUser, Order, OrderStatus, StockLevel, UserRole};
use crate::errors::AppResult;
use crate::services::{FulfillmentReport, Shipment};
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct NoteRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignDistributorRequest {
    pub distributor_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyFulfillmentRequest {
    /// `false` sends the order back to the distributor
    pub approved: bool,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShipRequest {
    #[validate(length(min = 1, max = 100, message = "Tracking number is required"))]
    #[schema(example = "1Z999AA10123456784")]
    pub tracking_number: String,
    #[schema(example = "UPS")]
    pub carrier: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefundRequest {
    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FulfillRequest {
    #[validate(url(message = "Proof must be a URL"))]
    pub proof_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: Option<OrderStatus>,
}

/// Admin workflow routes, nested under the admin order prefix
pub fn admin_fulfillment_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/approve", post(approve_order))
        .route("/:id/assign-distributor", post(assign_distributor))
        .route("/:id/verify-fulfillment", post(verify_fulfillment))
        .route("/:id/ship", post(admin_ship_order))
        .route("/:id/deliver", post(admin_deliver_order))
        .route("/:id/refund", post(refund_order))
}

/// Distributor workspace routes
pub fn distributor_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(distributor_orders))
        .route("/orders/:id/fulfill", post(submit_fulfillment))
        .route("/orders/:id/ship", post(distributor_ship_order))
        .route("/orders/:id/deliver", post(distributor_deliver_order))
        .route("/inventory", get(distributor_inventory))
}

/// Approve a paid order (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/approve",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Order awaiting fulfillment", body = Order),
        (status = 409, description = "Order is not pending approval")
    )
)]
pub async fn approve_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<NoteRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    let order = state
        .services
        .fulfillment()
        .approve(current_user.id, id, payload.note)
        .await?;
    Ok(Json(order))
}

/// Assign the distributor who will fulfill an order (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/assign-distributor",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AssignDistributorRequest,
    responses(
        (status = 200, description = "Distributor assigned", body = Order),
        (status = 400, description = "User is not an active distributor"),
        (status = 409, description = "Order is not awaiting fulfillment")
    )
)]
pub async fn assign_distributor(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignDistributorRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    let order = state
        .services
        .fulfillment()
        .assign_distributor(current_user.id, id, payload.distributor_id)
        .await?;
    Ok(Json(order))
}

/// Accept or reject a submitted fulfillment (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/verify-fulfillment",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = VerifyFulfillmentRequest,
    responses(
        (status = 200, description = "Fulfillment verified or returned", body = Order),
        (status = 409, description = "No fulfillment awaiting review")
    )
)]
pub async fn verify_fulfillment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VerifyFulfillmentRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    let order = state
        .services
        .fulfillment()
        .verify_fulfillment(current_user.id, id, payload.approved, payload.note)
        .await?;
    Ok(Json(order))
}

/// Mark an order shipped (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/ship",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ShipRequest,
    responses(
        (status = 200, description = "Order shipped", body = Order),
        (status = 409, description = "Order is not fulfilled")
    )
)]
pub async fn admin_ship_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ShipRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    ship(&state, &current_user, id, payload).await
}

/// Mark an order delivered (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/deliver",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = Order),
        (status = 409, description = "Order is not shipped")
    )
)]
pub async fn admin_deliver_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    let order = state
        .services
        .fulfillment()
        .deliver(&current_user, id)
        .await?;
    Ok(Json(order))
}

/// Refund a paid order (admin)
#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/refund",
    tag = "Fulfillment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Order refunded", body = Order),
        (status = 409, description = "Order cannot be refunded")
    )
)]
pub async fn refund_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RefundRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&current_user)?;
    let order = state
        .services
        .fulfillment()
        .refund(current_user.id, id, payload.reason)
        .await?;
    Ok(Json(order))
}

/// Orders assigned to the signed-in distributor
#[utoipa::path(
    get,
    path = "/api/distributor/orders",
    tag = "Distributor",
    security(("bearer_auth" = [])),
    params(StatusQuery, PaginationParams),
    responses(
        (status = 200, description = "Assigned orders", body = OrderPage),
        (status = 403, description = "Distributor access required")
    )
)]
pub async fn distributor_orders(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<StatusQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<Order>>> {
    require_role(&current_user, UserRole::Distributor)?;
    let page = state
        .services
        .fulfillment()
        .distributor_orders(current_user.id, query.status, params)
        .await?;
    Ok(Json(page))
}

/// Report an assigned order packed
#[utoipa::path(
    post,
    path = "/api/distributor/orders/{id}/fulfill",
    tag = "Distributor",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = FulfillRequest,
    responses(
        (status = 200, description = "Fulfillment submitted", body = Order),
        (status = 403, description = "Order is assigned to someone else"),
        (status = 409, description = "Insufficient distributor stock or wrong state")
    )
)]
pub async fn submit_fulfillment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<FulfillRequest>,
) -> AppResult<Json<Order>> {
    require_role(&current_user, UserRole::Distributor)?;
    let order = state
        .services
        .fulfillment()
        .submit_fulfillment(
            current_user.id,
            id,
            FulfillmentReport {
                proof_url: payload.proof_url,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(order))
}

/// Mark an assigned order shipped
#[utoipa::path(
    post,
    path = "/api/distributor/orders/{id}/ship",
    tag = "Distributor",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ShipRequest,
    responses(
        (status = 200, description = "Order shipped", body = Order),
        (status = 403, description = "Order is assigned to someone else"),
        (status = 409, description = "Order is not fulfilled")
    )
)]
pub async fn distributor_ship_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ShipRequest>,
) -> AppResult<Json<Order>> {
    require_role(&current_user, UserRole::Distributor)?;
    ship(&state, &current_user, id, payload).await
}

/// Mark an assigned order delivered
#[utoipa::path(
    post,
    path = "/api/distributor/orders/{id}/deliver",
    tag = "Distributor",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = Order),
        (status = 403, description = "Order is assigned to someone else"),
        (status = 409, description = "Order is not shipped")
    )
)]
pub async fn distributor_deliver_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    require_role(&current_user, UserRole::Distributor)?;
    let order = state
        .services
        .fulfillment()
        .deliver(&current_user, id)
        .await?;
    Ok(Json(order))
}

/// Stock held by the signed-in distributor
#[utoipa::path(
    get,
    path = "/api/distributor/inventory",
    tag = "Distributor",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stock levels", body = Vec<StockLevel>),
        (status = 403, description = "Distributor access required")
    )
)]
pub async fn distributor_inventory(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<StockLevel>>> {
    require_role(&current_user, UserRole::Distributor)?;
    let levels = state
        .services
        .fulfillment()
        .distributor_inventory(current_user.id)
        .await?;
    Ok(Json(levels))
}

async fn ship(
    state: &AppState,
    actor: &CurrentUser,
    order_id: Uuid,
    payload: ShipRequest,
) -> AppResult<Json<Order>> {
    let order = state
        .services
        .fulfillment()
        .ship(
            actor,
            order_id,
            Shipment {
                tracking_number: payload.tracking_number,
                carrier: payload.carrier,
            },
        )
        .await?;
    Ok(Json(order))
}
