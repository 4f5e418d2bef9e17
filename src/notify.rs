// src/notify.rs
//
// Fire-and-forget order event notifications. Events are POSTed to an optional
// downstream hook (push/email fan-out lives behind it); delivery failure is
// logged and dropped, it never touches the request that produced the event.

use serde_json::json;

use crate::models::{Order, OrderStatus};

pub fn order_event(hook_url: Option<&str>, event: &str, order: &Order) {
    let Some(url) = hook_url else {
        return;
    };

    let url = url.to_string();
    let payload = json!({
        "event": event,
        "orderId": order.id,
        "orderNumber": order.order_number,
        "restaurantId": order.restaurant_id,
        "userId": order.user_id,
        "status": order.status,
        "message": status_message(order.status),
        "itemCount": order.items.len(),
        "total": order.pricing.total,
    });

    tokio::spawn(async move {
        let result = reqwest::Client::new().post(&url).json(&payload).send().await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                log::warn!("notification hook returned {} for {url}", resp.status());
            }
            Err(e) => {
                log::warn!("notification send failed: {e}");
            }
            _ => {}
        }
    });
}

fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order received",
        OrderStatus::Confirmed => "Your order has been confirmed",
        OrderStatus::Preparing => "Restaurant is preparing your order",
        OrderStatus::Ready => "Your order is ready",
        OrderStatus::OutForDelivery => "Your order is out for delivery",
        OrderStatus::Delivered => "Your order has been delivered",
        OrderStatus::Cancelled => "Your order has been cancelled",
        OrderStatus::Refunded => "Your order has been refunded",
    }
}
