use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use restaurant_platform_api::api::razorpay::sign_hex;
use restaurant_platform_api::api::webhooks::{payment_webhook, SIGNATURE_HEADER};
use restaurant_platform_api::db;
use restaurant_platform_api::models::{
    DeliveryAddress, DeliveryInfo, Order, OrderItem, OrderPricing, OrderStatus, PaymentInfo,
    PaymentMethod, PaymentStatus,
};
use restaurant_platform_api::order_flow::history_entry;

mod support;

fn make_order(restaurant_id: Uuid, user_id: Uuid, transaction_id: Option<String>) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        restaurant_id,
        user_id,
        order_number: String::new(),
        items: vec![OrderItem {
            product_id: Uuid::new_v4(),
            name: "Veg Thali".to_string(),
            quantity: 1,
            price: 150.0,
            customizations: Vec::new(),
            subtotal: 150.0,
        }],
        status: OrderStatus::Pending,
        status_history: vec![history_entry(OrderStatus::Pending, None, None)],
        payment: PaymentInfo {
            method: PaymentMethod::Razorpay,
            status: PaymentStatus::Pending,
            transaction_id,
            amount: 187.5,
            details: None,
        },
        delivery: DeliveryInfo {
            address: DeliveryAddress {
                kind: "HOME".to_string(),
                address: "42 Test Lane".to_string(),
                coordinates: None,
            },
            instructions: None,
        },
        pricing: OrderPricing {
            subtotal: 150.0,
            tax: 7.5,
            delivery_fee: 30.0,
            discount: 0.0,
            total: 187.5,
        },
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

#[actix_web::test]
async fn order_numbers_increase_within_the_month() {
    let Some(pool) = support::try_init_db().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let suffix = Uuid::new_v4().simple().to_string();
    let restaurant = support::test_restaurant(&suffix);
    let user = support::test_user(&suffix[..10]);
    db::insert_restaurant(&pool, &restaurant).await.expect("insert restaurant");
    db::insert_user(&pool, &user).await.expect("insert user");

    let mut first = make_order(restaurant.id, user.id, None);
    let mut second = make_order(restaurant.id, user.id, None);
    db::create_order(&pool, &mut first).await.expect("first order");
    db::create_order(&pool, &mut second).await.expect("second order");

    assert!(first.order_number.ends_with("-0001"), "{}", first.order_number);
    assert!(second.order_number.ends_with("-0002"), "{}", second.order_number);
    // Same restaurant, same month: identical prefix, ordered sequence.
    assert_eq!(first.order_number[..10], second.order_number[..10]);
    assert!(first.order_number < second.order_number);
}

#[actix_web::test]
async fn status_update_appends_exactly_one_history_entry() {
    let Some(pool) = support::try_init_db().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let suffix = Uuid::new_v4().simple().to_string();
    let restaurant = support::test_restaurant(&suffix);
    let user = support::test_user(&suffix[..10]);
    db::insert_restaurant(&pool, &restaurant).await.expect("insert restaurant");
    db::insert_user(&pool, &user).await.expect("insert user");

    let mut order = make_order(restaurant.id, user.id, None);
    db::create_order(&pool, &mut order).await.expect("create order");
    assert_eq!(order.status_history.len(), 1);

    let actor = Uuid::new_v4();
    let entry = history_entry(OrderStatus::Confirmed, Some("ok".to_string()), Some(actor));
    let updated = db::update_order_status(&pool, order.id, order.version, OrderStatus::Confirmed, &entry)
        .await
        .expect("update")
        .expect("version matched");

    assert_eq!(updated.status, OrderStatus::Confirmed);
    assert_eq!(updated.status_history.len(), 2);
    let last = updated.status_history.last().unwrap();
    assert_eq!(last.status, OrderStatus::Confirmed);
    assert_eq!(last.updated_by, Some(actor));
    assert_eq!(updated.version, order.version + 1);

    // A writer holding the stale version loses instead of clobbering.
    let stale = db::update_order_status(&pool, order.id, order.version, OrderStatus::Preparing, &entry)
        .await
        .expect("update");
    assert!(stale.is_none());
}

#[actix_web::test]
async fn captured_webhook_completes_payment_and_unknown_transaction_is_noop() {
    let Some(pool) = support::try_init_db().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let suffix = Uuid::new_v4().simple().to_string();
    let restaurant = support::test_restaurant(&suffix);
    let user = support::test_user(&suffix[..10]);
    db::insert_restaurant(&pool, &restaurant).await.expect("insert restaurant");
    db::insert_user(&pool, &user).await.expect("insert user");

    let tx_id = format!("order_rzp_{suffix}");
    let mut order = make_order(restaurant.id, user.id, Some(tx_id.clone()));
    db::create_order(&pool, &mut order).await.expect("create order");

    let state = web::Data::new(support::build_state(pool.clone(), "whsec").await);
    let app = test::init_service(App::new().app_data(state.clone()).service(payment_webhook)).await;

    // Unknown transaction id: acknowledged, nothing changes.
    let unknown = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_unknown",
            "order_id": format!("order_missing_{suffix}"),
        }}}
    })
    .to_string();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, sign_hex(unknown.as_bytes(), "whsec")))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(unknown)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let untouched = db::get_order(&pool, order.id).await.expect("get").expect("order");
    assert_eq!(untouched.payment.status, PaymentStatus::Pending);

    // Known transaction id: payment flips to COMPLETED.
    let captured = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_123",
            "order_id": tx_id,
        }}}
    })
    .to_string();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, sign_hex(captured.as_bytes(), "whsec")))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(captured)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let completed = db::get_order(&pool, order.id).await.expect("get").expect("order");
    assert_eq!(completed.payment.status, PaymentStatus::Completed);
    assert_eq!(completed.status, OrderStatus::Pending);
}

#[actix_web::test]
async fn failed_webhook_cancels_order_with_history_entry() {
    let Some(pool) = support::try_init_db().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let suffix = Uuid::new_v4().simple().to_string();
    let restaurant = support::test_restaurant(&suffix);
    let user = support::test_user(&suffix[..10]);
    db::insert_restaurant(&pool, &restaurant).await.expect("insert restaurant");
    db::insert_user(&pool, &user).await.expect("insert user");

    let tx_id = format!("order_rzp_{suffix}");
    let mut order = make_order(restaurant.id, user.id, Some(tx_id.clone()));
    db::create_order(&pool, &mut order).await.expect("create order");

    let state = web::Data::new(support::build_state(pool.clone(), "whsec").await);
    let app = test::init_service(App::new().app_data(state.clone()).service(payment_webhook)).await;

    let failed = json!({
        "event": "payment.failed",
        "payload": { "payment": { "entity": {
            "id": "pay_456",
            "order_id": tx_id,
        }}}
    })
    .to_string();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, sign_hex(failed.as_bytes(), "whsec")))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(failed)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let cancelled = db::get_order(&pool, order.id).await.expect("get").expect("order");
    assert_eq!(cancelled.payment.status, PaymentStatus::Failed);
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.status_history.len(), 2);
    assert_eq!(
        cancelled.status_history.last().unwrap().status,
        OrderStatus::Cancelled
    );
}
