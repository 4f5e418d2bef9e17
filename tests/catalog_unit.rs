use chrono::{TimeZone, Utc};
use uuid::Uuid;

use restaurant_platform_api::models::{
    Product, ProductAttributes, ProductAvailability, ProductDescription,
};
use restaurant_platform_api::storage::{build_public_url, object_key_from_url};

fn product_with_availability(availability: ProductAvailability) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        restaurant_id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        name: "Masala Dosa".to_string(),
        slug: "masala-dosa".to_string(),
        description: ProductDescription::default(),
        images: Vec::new(),
        price: 120.0,
        discounted_price: None,
        customization: Vec::new(),
        attributes: ProductAttributes::default(),
        availability,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn unavailable_flag_wins_over_everything() {
    let product = product_with_availability(ProductAvailability {
        is_available: false,
        ..Default::default()
    });
    assert!(!product.is_available_at(Utc::now()));
}

#[test]
fn zero_stock_makes_product_unavailable() {
    let product = product_with_availability(ProductAvailability {
        stock_count: Some(0),
        ..Default::default()
    });
    assert!(!product.is_available_at(Utc::now()));
}

#[test]
fn day_of_week_window_is_respected() {
    // 2026-08-03 is a Monday.
    let monday = Utc.with_ymd_and_hms(2026, 8, 3, 12, 0, 0).unwrap();
    let tuesday = Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap();

    let product = product_with_availability(ProductAvailability {
        days: vec!["MONDAY".to_string()],
        ..Default::default()
    });

    assert!(product.is_available_at(monday));
    assert!(!product.is_available_at(tuesday));
}

#[test]
fn time_window_is_inclusive_of_bounds() {
    let product = product_with_availability(ProductAvailability {
        start_time: Some("09:00".to_string()),
        end_time: Some("17:30".to_string()),
        ..Default::default()
    });

    let inside = Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap();
    let edge = Utc.with_ymd_and_hms(2026, 8, 3, 17, 30, 0).unwrap();
    let outside = Utc.with_ymd_and_hms(2026, 8, 3, 17, 31, 0).unwrap();

    assert!(product.is_available_at(inside));
    assert!(product.is_available_at(edge));
    assert!(!product.is_available_at(outside));
}

#[test]
fn empty_day_list_means_every_day() {
    let product = product_with_availability(ProductAvailability::default());
    assert!(product.is_available_at(Utc::now()));
}

#[test]
fn public_url_and_object_key_round_trip() {
    let base = "https://cdn.example.com";
    let bucket = "menu-images";
    let key = "products/abc-wrap.png";

    let url = build_public_url(base, bucket, key);
    assert_eq!(url, "https://cdn.example.com/menu-images/products/abc-wrap.png");
    assert_eq!(object_key_from_url(base, bucket, &url).as_deref(), Some(key));
}

#[test]
fn templated_base_url_is_expanded() {
    let base = "https://storage.local/{bucket}/{key}";
    let url = build_public_url(base, "menu-images", "products/a.png");
    assert_eq!(url, "https://storage.local/menu-images/products/a.png");
}

#[test]
fn bucket_hosted_base_appends_key_only() {
    let base = "https://menu-images.s3.amazonaws.com";
    let url = build_public_url(base, "menu-images", "products/a.png");
    assert_eq!(url, "https://menu-images.s3.amazonaws.com/products/a.png");
    assert_eq!(
        object_key_from_url(base, "menu-images", &url).as_deref(),
        Some("products/a.png")
    );
}
