use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::json;

use restaurant_platform_api::api::razorpay::{
    sign_hex, verify_payment_signature, verify_webhook_signature,
};
use restaurant_platform_api::api::webhooks::{payment_webhook, SIGNATURE_HEADER};

mod support;

#[::std::prelude::v1::test]
fn webhook_signature_round_trips() {
    let body = br#"{"event":"payment.captured"}"#;
    let signature = sign_hex(body, "whsec");

    assert!(verify_webhook_signature(body, &signature, "whsec"));
    assert!(!verify_webhook_signature(body, &signature, "other-secret"));
    assert!(!verify_webhook_signature(b"tampered body", &signature, "whsec"));
}

#[::std::prelude::v1::test]
fn malformed_signatures_are_rejected() {
    let body = b"payload";
    assert!(!verify_webhook_signature(body, "not-hex!", "whsec"));
    assert!(!verify_webhook_signature(body, "", "whsec"));
    assert!(!verify_webhook_signature(body, "deadbeef", "whsec"));
}

#[::std::prelude::v1::test]
fn payment_signature_covers_order_and_payment_ids() {
    let signature = sign_hex(b"order_abc|pay_xyz", "key-secret");

    assert!(verify_payment_signature(
        "order_abc",
        "pay_xyz",
        &signature,
        "key-secret"
    ));
    assert!(!verify_payment_signature(
        "order_abc",
        "pay_other",
        &signature,
        "key-secret"
    ));
    assert!(!verify_payment_signature(
        "order_other",
        "pay_xyz",
        &signature,
        "key-secret"
    ));
}

#[actix_web::test]
async fn webhook_with_invalid_signature_is_rejected_without_db_access() {
    // The pool never connects; rejection must happen before any query.
    let state = web::Data::new(support::build_state(support::lazy_pool(), "whsec").await);
    let app = test::init_service(App::new().app_data(state.clone()).service(payment_webhook)).await;

    let body = json!({ "event": "payment.captured" }).to_string();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, "00ff00ff"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body = test::read_body(resp).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).expect("error envelope");
    assert_eq!(parsed["status"], "error");
    assert_eq!(parsed["message"], "Invalid webhook signature");
}

#[actix_web::test]
async fn webhook_without_signature_header_is_rejected() {
    let state = web::Data::new(support::build_state(support::lazy_pool(), "whsec").await);
    let app = test::init_service(App::new().app_data(state.clone()).service(payment_webhook)).await;

    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{}")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn unrecognized_events_are_acknowledged() {
    let state = web::Data::new(support::build_state(support::lazy_pool(), "whsec").await);
    let app = test::init_service(App::new().app_data(state.clone()).service(payment_webhook)).await;

    let body = json!({ "event": "refund.created" }).to_string();
    let signature = sign_hex(body.as_bytes(), "whsec");
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((SIGNATURE_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
