//! Application route configuration.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    admin_catalog_routes, admin_commission_routes, admin_discount_routes,
    admin_fulfillment_routes, admin_inventory_routes, admin_order_routes, admin_task_routes,
    admin_user_routes, admin_wholesale_routes, auth_routes, cart_routes, catalog_routes,
    commission_routes, dashboard_routes, discount_routes, distributor_routes, order_routes,
    payment_routes, task_routes, upload_body_limit, upload_routes, user_routes, wholesale_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Stricter limit on credential endpoints
        .nest(
            "/auth",
            auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_auth_middleware,
            )),
        )
        .merge(catalog_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        )))
        // Signed by the payment provider, no bearer token
        .nest("/webhooks", payment_routes())
        .merge(protected_routes(&state));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(cors_layer(state.config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes that require a bearer token. Role checks happen in the handlers.
fn protected_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .nest("/users", admin_user_routes())
        .merge(admin_catalog_routes())
        .nest("/discounts", admin_discount_routes())
        .nest(
            "/orders",
            admin_order_routes().merge(admin_fulfillment_routes()),
        )
        .nest("/commissions", admin_commission_routes())
        .nest("/inventory", admin_inventory_routes())
        .nest("/tasks", admin_task_routes())
        .nest("/wholesale", admin_wholesale_routes())
        .merge(dashboard_routes());

    Router::new()
        .nest("/users", user_routes())
        .nest("/cart", cart_routes())
        .nest("/discounts", discount_routes())
        .nest("/orders", order_routes())
        .nest("/commissions", commission_routes())
        .nest("/tasks", task_routes())
        .nest("/wholesale", wholesale_routes())
        .nest("/distributor", distributor_routes())
        .nest(
            "/uploads",
            upload_routes().layer(upload_body_limit(state.config.max_upload_bytes)),
        )
        .nest("/admin", admin)
        // Layers run bottom-up: rate limit first, then authentication
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN is not a valid header value; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Root endpoint
async fn root() -> &'static str {
    "Storefront API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    redis: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Database and Redis connectivity; 503 when either is down
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, redis) = tokio::join!(state.database.ping(), state.cache.ping());
    let database = ServiceStatus::from_result(database);
    let redis = ServiceStatus::from_result(redis);

    let healthy = database.is_healthy() && redis.is_healthy();
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        services: ServiceHealth { database, redis },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response))
}
