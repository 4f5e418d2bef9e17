pub mod api;
pub mod cache;
pub mod db;
pub mod docs;
pub mod error;
pub mod models;
pub mod notify;
pub mod order_flow;
pub mod pricing;
pub mod storage;

use sqlx::PgPool;

use crate::cache::Cache;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: Cache,
    pub storage: Storage,
    pub jwt_secret: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_webhook_secret: String,
    pub razorpay_base_url: String,
    pub notify_webhook_url: Option<String>,
}
