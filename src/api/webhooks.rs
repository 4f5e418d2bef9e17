// src/api/webhooks.rs

use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::razorpay;
use crate::error::ApiError;
use crate::models::{OrderStatus, PaymentStatus};
use crate::{db, notify, order_flow, AppState};

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookPaymentWrapper>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookPaymentWrapper {
    pub entity: WebhookPaymentEntity,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookPaymentEntity {
    pub id: String,
    /// Gateway order id; matches the transaction id stored on our order.
    pub order_id: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Value,
}

/// Asynchronous gateway callbacks, verified by an HMAC over the raw body. An
/// unknown transaction id is acknowledged with 200 so the gateway stops
/// retrying; nothing is mutated in that case.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    tag = "payments",
    responses(
        (status = 200, description = "Event processed or acknowledged"),
        (status = 400, description = "Missing or invalid signature")
    )
)]
#[post("/payments/webhook")]
pub async fn payment_webhook(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".to_string()))?;

    if !razorpay::verify_webhook_signature(&body, signature, &state.razorpay_webhook_secret) {
        return Err(ApiError::BadRequest(
            "Invalid webhook signature".to_string(),
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    match event.event.as_str() {
        "payment.captured" => {
            let Some(payment) = event.payload.payment else {
                return Ok(acknowledge());
            };
            handle_payment_captured(&state, payment.entity).await?;
        }
        "payment.failed" => {
            let Some(payment) = event.payload.payment else {
                return Ok(acknowledge());
            };
            handle_payment_failed(&state, payment.entity).await?;
        }
        other => {
            log::info!("ignoring webhook event {other}");
        }
    }

    Ok(acknowledge())
}

async fn handle_payment_captured(
    state: &AppState,
    entity: WebhookPaymentEntity,
) -> Result<(), ApiError> {
    let Some(order) = db::find_order_by_transaction_id(&state.pool, &entity.order_id).await? else {
        log::info!("payment.captured for unknown transaction {}", entity.order_id);
        return Ok(());
    };

    let mut payment = order.payment.clone();
    payment.status = PaymentStatus::Completed;
    payment.details = Some(json!({
        "razorpayPaymentId": entity.id,
        "entity": entity.extra,
    }));
    db::set_order_payment(&state.pool, order.id, &payment).await?;

    log::info!("payment completed for order {}", order.id);
    Ok(())
}

async fn handle_payment_failed(
    state: &AppState,
    entity: WebhookPaymentEntity,
) -> Result<(), ApiError> {
    let Some(mut order) = db::find_order_by_transaction_id(&state.pool, &entity.order_id).await?
    else {
        log::info!("payment.failed for unknown transaction {}", entity.order_id);
        return Ok(());
    };

    let mut payment = order.payment.clone();
    payment.status = PaymentStatus::Failed;
    payment.details = Some(json!({
        "razorpayPaymentId": entity.id,
        "entity": entity.extra,
    }));

    let entry = order_flow::history_entry(
        OrderStatus::Cancelled,
        Some("Payment failed".to_string()),
        None,
    );
    db::set_order_payment_and_status(
        &state.pool,
        order.id,
        &payment,
        OrderStatus::Cancelled,
        &entry,
    )
    .await?;

    order.status = OrderStatus::Cancelled;
    notify::order_event(
        state.notify_webhook_url.as_deref(),
        "order.status_changed",
        &order,
    );

    log::info!("payment failed, order {} cancelled", order.id);
    Ok(())
}

fn acknowledge() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
