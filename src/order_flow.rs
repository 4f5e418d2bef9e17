// src/order_flow.rs
//
// Order identity and the status audit trail. Order numbers are human-facing,
// scoped per restaurant per calendar month: YYMM-<last 4 of restaurant id>-<seq>.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::models::{OrderStatus, StatusHistoryEntry};

pub fn format_order_number(restaurant_id: Uuid, at: DateTime<Utc>, sequence: u32) -> String {
    let year = at.year() % 100;
    let month = at.month();
    let id = restaurant_id.simple().to_string();
    let tail = &id[id.len() - 4..];
    format!("{year:02}{month:02}-{tail}-{sequence:04}")
}

/// One history entry per logical status change, creation included.
pub fn history_entry(
    status: OrderStatus,
    note: Option<String>,
    updated_by: Option<Uuid>,
) -> StatusHistoryEntry {
    StatusHistoryEntry {
        status,
        timestamp: Utc::now(),
        note,
        updated_by,
    }
}
