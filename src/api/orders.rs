// src/api/orders.rs

use std::collections::HashMap;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{authorize, AuthContext, Role};
use crate::api::razorpay;
use crate::error::ApiError;
use crate::models::{
    DeliveryInfo, Order, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus,
};
use crate::pricing::{price_cart, CartItem};
use crate::{db, notify, order_flow, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    pub items: Vec<CartItem>,
    pub delivery: DeliveryInfo,
    pub payment: PaymentRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created, gateway order attached for RAZORPAY"),
        (status = 400, description = "Validation failure: unknown product, bad quantity, insufficient stock, invalid customization")
    )
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let restaurant = db::get_restaurant(&state.pool, payload.restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    let mut products = HashMap::new();
    for item in &payload.items {
        if let Some(product) =
            db::get_restaurant_product(&state.pool, restaurant.id, item.product_id).await?
        {
            products.insert(product.id, product);
        }
    }

    let priced = price_cart(&restaurant, &payload.items, &products)?;

    // Gateway order first: a gateway failure must not leave a half-created order.
    let mut gateway_order = None;
    let order_id = Uuid::new_v4();
    let transaction_id = match payload.payment.method {
        PaymentMethod::Razorpay => {
            let created = razorpay::create_order(
                &state.razorpay_base_url,
                &state.razorpay_key_id,
                &state.razorpay_key_secret,
                razorpay::CreateOrderRequest {
                    amount: (priced.pricing.total * 100.0).round() as i64,
                    currency: "INR".to_string(),
                    receipt: order_id.to_string(),
                    notes: None,
                },
            )
            .await
            .map_err(|e| {
                log::error!("razorpay order create failed: {e}");
                ApiError::BadRequest("Payment initialization failed".to_string())
            })?;
            let id = created.id.clone();
            gateway_order = Some(created);
            Some(id)
        }
        PaymentMethod::Cash => Some(format!("COD-{}", Utc::now().timestamp_millis())),
        PaymentMethod::Upi | PaymentMethod::Wallet => None,
    };

    let now = Utc::now();
    let mut order = Order {
        id: order_id,
        restaurant_id: restaurant.id,
        user_id: ctx.id,
        order_number: String::new(),
        items: priced.items,
        status: OrderStatus::Pending,
        status_history: vec![order_flow::history_entry(OrderStatus::Pending, None, None)],
        payment: PaymentInfo {
            method: payload.payment.method,
            status: PaymentStatus::Pending,
            transaction_id,
            amount: priced.pricing.total,
            details: payload.payment.details,
        },
        delivery: payload.delivery,
        pricing: priced.pricing,
        version: 1,
        created_at: now,
        updated_at: now,
    };

    db::create_order(&state.pool, &mut order).await?;
    notify::order_event(state.notify_webhook_url.as_deref(), "order.created", &order);

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": {
            "order": order,
            "razorpayOrder": gateway_order,
        },
    })))
}

#[get("/orders/my-orders")]
pub async fn get_my_orders(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    let orders = db::list_orders_by_user(&state.pool, ctx.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "orders": orders },
    })))
}

#[get("/orders/my-orders/{id}")]
pub async fn get_my_order_by_id(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = db::get_user_order(&state.pool, ctx.id, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "order": order },
    })))
}

#[get("/orders/restaurant/{restaurantId}")]
pub async fn get_restaurant_orders(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;
    let restaurant_id = path.into_inner();
    require_own_restaurant(&ctx, restaurant_id)?;

    let orders = db::list_orders_by_restaurant(&state.pool, restaurant_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "orders": orders },
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    tag = "orders",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated, one history entry appended"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Concurrent update, retry with fresh state")
    )
)]
#[put("/orders/{id}/status")]
pub async fn update_order_status(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;
    let payload = payload.into_inner();

    let status = OrderStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {}", payload.status)))?;

    let order = db::get_order(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    require_own_restaurant(&ctx, order.restaurant_id)?;

    // Any status may follow any other; the audit trail is what matters.
    let entry = order_flow::history_entry(status, payload.note, Some(ctx.id));
    let updated = db::update_order_status(&state.pool, order.id, order.version, status, &entry)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Order was updated concurrently, retry".to_string())
        })?;

    notify::order_event(
        state.notify_webhook_url.as_deref(),
        "order.status_changed",
        &updated,
    );

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "order": updated },
    })))
}

#[get("/orders")]
pub async fn get_all_orders(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let orders = db::list_orders(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "orders": orders },
    })))
}

#[get("/orders/{id}")]
pub async fn get_order_by_id(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let order = db::get_order(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "order": order },
    })))
}

#[delete("/orders/{id}")]
pub async fn delete_order(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let order = db::get_order(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    db::delete_order(&state.pool, order.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Restaurant admins act only on their own restaurant; super admins on any.
fn require_own_restaurant(ctx: &AuthContext, restaurant_id: Uuid) -> Result<(), ApiError> {
    if ctx.role == Role::RestaurantAdmin && ctx.restaurant_id != Some(restaurant_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to act on this restaurant".to_string(),
        ));
    }
    Ok(())
}
