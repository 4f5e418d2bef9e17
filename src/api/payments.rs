// src/api/payments.rs

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{AuthContext, Role};
use crate::api::razorpay;
use crate::error::ApiError;
use crate::models::PaymentStatus;
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Client-submitted checkout confirmation. Untrusted until the HMAC over
/// "{gateway_order_id}|{gateway_payment_id}" checks out against the key secret.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    tag = "payments",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment marked completed"),
        (status = 400, description = "Signature mismatch, nothing mutated")
    )
)]
#[post("/payments/verify")]
pub async fn verify_payment(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let order = match ctx.role {
        Role::Customer => db::get_user_order(&state.pool, ctx.id, payload.order_id).await?,
        _ => db::get_order(&state.pool, payload.order_id).await?,
    }
    .ok_or_else(|| ApiError::not_found("Order"))?;

    if order.payment.transaction_id.as_deref() != Some(payload.razorpay_order_id.as_str()) {
        return Err(ApiError::BadRequest(
            "Payment does not belong to this order".to_string(),
        ));
    }

    let valid = razorpay::verify_payment_signature(
        &payload.razorpay_order_id,
        &payload.razorpay_payment_id,
        &payload.razorpay_signature,
        &state.razorpay_key_secret,
    );
    if !valid {
        return Err(ApiError::BadRequest("Invalid payment signature".to_string()));
    }

    let mut payment = order.payment.clone();
    payment.status = PaymentStatus::Completed;
    payment.details = Some(json!({
        "razorpayPaymentId": payload.razorpay_payment_id,
    }));
    db::set_order_payment(&state.pool, order.id, &payment).await?;

    log::info!("payment verified for order {}", order.id);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "orderId": order.id, "payment": payment },
    })))
}
