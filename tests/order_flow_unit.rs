use chrono::{TimeZone, Utc};
use uuid::Uuid;

use restaurant_platform_api::models::{slugify, OrderStatus};
use restaurant_platform_api::order_flow::{format_order_number, history_entry};

#[test]
fn order_number_carries_year_month_restaurant_tail_and_sequence() {
    let restaurant_id = Uuid::parse_str("00000000-0000-0000-0000-00000000abcd").unwrap();
    let at = Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap();

    assert_eq!(format_order_number(restaurant_id, at, 1), "2608-abcd-0001");
    assert_eq!(format_order_number(restaurant_id, at, 42), "2608-abcd-0042");
}

#[test]
fn sequences_are_zero_padded_and_ordered() {
    let restaurant_id = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();

    let numbers: Vec<String> = (1..=12)
        .map(|seq| format_order_number(restaurant_id, at, seq))
        .collect();

    for pair in numbers.windows(2) {
        assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
    }
    assert!(numbers[0].ends_with("-0001"));
    assert!(numbers[11].ends_with("-0012"));
}

#[test]
fn order_number_month_is_two_digits() {
    let restaurant_id = Uuid::new_v4();
    let december = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap();
    let january = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    assert!(format_order_number(restaurant_id, december, 1).starts_with("2512-"));
    assert!(format_order_number(restaurant_id, january, 1).starts_with("2601-"));
}

#[test]
fn history_entry_records_status_actor_and_note() {
    let actor = Uuid::new_v4();
    let before = Utc::now();
    let entry = history_entry(
        OrderStatus::Confirmed,
        Some("accepted by kitchen".to_string()),
        Some(actor),
    );
    let after = Utc::now();

    assert_eq!(entry.status, OrderStatus::Confirmed);
    assert_eq!(entry.note.as_deref(), Some("accepted by kitchen"));
    assert_eq!(entry.updated_by, Some(actor));
    assert!(entry.timestamp >= before && entry.timestamp <= after);
}

#[test]
fn order_status_round_trips_through_strings() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ] {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(OrderStatus::parse("SHIPPED"), None);
}

#[test]
fn slugify_collapses_punctuation_and_lowercases() {
    assert_eq!(slugify("Chicken Tikka (Spicy)!"), "chicken-tikka-spicy");
    assert_eq!(slugify("  Tandoori   House  "), "tandoori-house");
    assert_eq!(slugify("Café Déjà Vu"), "café-déjà-vu");
}
