#![allow(dead_code)]

use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use uuid::Uuid;

use restaurant_platform_api::cache::Cache;
use restaurant_platform_api::models::{
    Branding, ContactInfo, Restaurant, RestaurantSettings, User,
};
use restaurant_platform_api::storage::Storage;
use restaurant_platform_api::AppState;

/// Connects and migrates when TEST_DATABASE_URL is set; otherwise the caller
/// skips its test.
pub async fn try_init_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    Some(pool)
}

/// Pool that never connects; for handler paths that must reject before any
/// database work happens.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool")
}

pub async fn build_state(pool: PgPool, webhook_secret: &str) -> AppState {
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let s3_client = S3Client::from_conf(aws_sdk_s3::config::Builder::from(&aws_config).build());

    AppState {
        pool,
        cache: Cache::disabled(),
        storage: Storage::new(
            s3_client,
            "test-bucket".to_string(),
            "http://localhost".to_string(),
            true,
        ),
        jwt_secret: "test-jwt-secret".to_string(),
        razorpay_key_id: "rzp_test_key".to_string(),
        razorpay_key_secret: "rzp_test_secret".to_string(),
        razorpay_webhook_secret: webhook_secret.to_string(),
        razorpay_base_url: "http://localhost:1".to_string(),
        notify_webhook_url: None,
    }
}

pub fn test_restaurant(suffix: &str) -> Restaurant {
    let now = Utc::now();
    Restaurant {
        id: Uuid::new_v4(),
        slug: format!("test-restaurant-{suffix}"),
        name: format!("Test Restaurant {suffix}"),
        description: None,
        image_url: None,
        logo_url: None,
        cover_image_url: None,
        contact: ContactInfo::default(),
        settings: RestaurantSettings {
            tax_percentage: 5.0,
            delivery_fee: 30.0,
            ..Default::default()
        },
        branding: Branding::default(),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_user(suffix: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        phone_number: format!("+91{suffix}"),
        name: format!("Test User {suffix}"),
        email: None,
        addresses: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
