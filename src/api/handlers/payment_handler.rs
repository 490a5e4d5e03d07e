//! Payment provider webhook.

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Json, routing::post, Router};

use crate::api::AppState;
use crate::config::PAYMENT_SIGNATURE_HEADER;
use crate::errors::AppResult;
use crate::services::WebhookReceipt;

/// Webhook routes. Authenticated by signature, not by bearer token.
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/payments", post(payment_webhook))
}

/// Receive a payment event
///
/// The raw body is verified against the `x-payment-signature` header before
/// it is parsed. Replays of an already recorded event id are acknowledged
/// without side effects.
#[utoipa::path(
    post,
    path = "/api/webhooks/payments",
    tag = "Payments",
    request_body = WebhookEvent,
    params(("x-payment-signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event accepted", body = WebhookReceipt),
        (status = 400, description = "Malformed payload, or a missing or invalid signature")
    )
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookReceipt>> {
    let signature = headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let receipt = state
        .services
        .payments()
        .handle_webhook(signature, &body)
        .await?;
    Ok(Json(receipt))
}
