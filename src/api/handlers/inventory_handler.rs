//! Stock management handlers (admin).
//!
//! Locations are written as `warehouse` or `distributor:<user id>`.

use axum::{
    extract::State,
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
use crate::domain::{CurrentUser, InventoryMovement, Location, StockLevel};
use crate::errors::AppResult;
use crate::services::Transfer;
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub variation_id: Option<Uuid>,
    #[param(value_type = Option<String>, example = "warehouse")]
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementQuery {
    pub variation_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetStockRequest {
    pub variation_id: Uuid,
    #[schema(value_type = String, example = "warehouse")]
    pub location: Location,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[schema(example = "cycle count")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    pub variation_id: Uuid,
    #[schema(value_type = String, example = "warehouse")]
    pub from: Location,
    #[schema(value_type = String, example = "distributor:5b0c1d9e-4f7a-4e1b-9a53-2f1c0e8d7a61")]
    pub to: Location,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

pub fn admin_inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock).put(set_stock))
        .route("/transfer", post(transfer_stock))
        .route("/movements", get(list_movements))
}

/// Stock levels (admin)
#[utoipa::path(
    get,
    path = "/api/admin/inventory",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(StockQuery),
    responses(
        (status = 200, description = "Stock levels", body = Vec<StockLevel>),
        (status = 400, description = "Unknown location"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<StockQuery>,
) -> AppResult<Json<Vec<StockLevel>>> {
    require_admin(&current_user)?;
    let levels = state
        .services
        .inventory()
        .list_levels(query.variation_id, query.location)
        .await?;
    Ok(Json(levels))
}

/// Set the quantity held at a location (admin)
#[utoipa::path(
    put,
    path = "/api/admin/inventory",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Stock level after the change", body = StockLevel),
        (status = 400, description = "Unknown variation or location")
    )
)]
pub async fn set_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<SetStockRequest>,
) -> AppResult<Json<StockLevel>> {
    require_admin(&current_user)?;
    let level = state
        .services
        .inventory()
        .set_quantity(
            current_user.id,
            payload.variation_id,
            payload.location,
            payload.quantity,
            payload.reason,
        )
        .await?;
    Ok(Json(level))
}

/// Move stock between locations (admin)
#[utoipa::path(
    post,
    path = "/api/admin/inventory/transfer",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Source and destination levels", body = Vec<StockLevel>),
        (status = 400, description = "Invalid transfer"),
        (status = 409, description = "Insufficient stock at the source")
    )
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<TransferRequest>,
) -> AppResult<Json<Vec<StockLevel>>> {
    require_admin(&current_user)?;
    let levels = state
        .services
        .inventory()
        .transfer(
            current_user.id,
            Transfer {
                variation_id: payload.variation_id,
                from: payload.from,
                to: payload.to,
                quantity: payload.quantity,
            },
        )
        .await?;
    Ok(Json(levels))
}

/// Movement ledger, newest first (admin)
#[utoipa::path(
    get,
    path = "/api/admin/inventory/movements",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(MovementQuery, PaginationParams),
    responses((status = 200, description = "Movements", body = MovementPage))
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<MovementQuery>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<Json<Paginated<InventoryMovement>>> {
    require_admin(&current_user)?;
    let page = state
        .services
        .inventory()
        .movements(query.variation_id, params)
        .await?;
    Ok(Json(page))
}
