// src/main.rs
use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use dotenvy::dotenv;
use serde_json::json;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use restaurant_platform_api::{api, cache::Cache, docs, storage::Storage, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET required");
    let razorpay_key_id = env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID required");
    let razorpay_key_secret = env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET required");
    let razorpay_webhook_secret =
        env::var("RAZORPAY_WEBHOOK_SECRET").expect("RAZORPAY_WEBHOOK_SECRET required");
    let razorpay_base_url = env::var("RAZORPAY_API_BASE_URL")
        .unwrap_or_else(|_| api::razorpay::DEFAULT_API_BASE.to_string());

    let s3_bucket = env::var("S3_BUCKET").expect("S3_BUCKET required");
    let s3_endpoint = env::var("S3_ENDPOINT").ok();
    let s3_public_base_url = env::var("S3_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", s3_bucket));
    let mock_s3 = env::var("MOCK_S3").unwrap_or_default() == "true";

    let redis_url = env::var("REDIS_URL").ok();
    let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok();

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

    // Allow custom S3-compatible endpoints (e.g., MinIO)
    if let Some(endpoint) = s3_endpoint {
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint)
            .force_path_style(true);
    }
    let s3_client = S3Client::from_conf(s3_config_builder.build());

    let cache = Cache::connect(redis_url.as_deref()).await;
    let storage = Storage::new(s3_client, s3_bucket, s3_public_base_url, mock_s3);

    let state = web::Data::new(AppState {
        pool,
        cache,
        storage,
        jwt_secret,
        razorpay_key_id,
        razorpay_key_secret,
        razorpay_webhook_secret,
        razorpay_base_url,
        notify_webhook_url,
    });

    log::info!("listening on 0.0.0.0:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .service(
                web::scope("/api/v1")
                    .service(health)
                    // public: auth entry points and the payment webhook
                    .service(api::auth::register)
                    .service(api::auth::login)
                    .service(api::auth::admin_login)
                    .service(api::webhooks::payment_webhook)
                    // public: storefront catalog (literal segments before captures)
                    .service(api::restaurants::list_restaurants)
                    .service(api::restaurants::list_active_restaurants)
                    .service(api::restaurants::get_restaurant_menu)
                    .service(api::restaurants::get_restaurant_by_slug)
                    .service(api::categories::list_categories)
                    .service(api::categories::list_categories_by_restaurant)
                    .service(api::categories::get_category)
                    .service(api::products::list_products)
                    .service(api::products::list_available_products)
                    .service(api::products::list_products_by_restaurant)
                    .service(api::products::list_products_by_category)
                    .service(api::products::get_product)
                    // everything below requires a bearer token
                    .service(
                        web::scope("")
                            .wrap(api::auth::Auth)
                            .service(api::auth::logout)
                            .service(api::auth::me)
                            .service(api::orders::create_order)
                            .service(api::orders::get_my_orders)
                            .service(api::orders::get_my_order_by_id)
                            .service(api::orders::get_restaurant_orders)
                            .service(api::orders::update_order_status)
                            .service(api::orders::get_all_orders)
                            .service(api::orders::get_order_by_id)
                            .service(api::orders::delete_order)
                            .service(api::payments::verify_payment)
                            .service(api::categories::create_category)
                            .service(api::categories::bulk_create_categories)
                            .service(api::categories::bulk_update_categories)
                            .service(api::categories::update_category)
                            .service(api::categories::delete_category)
                            .service(api::products::create_product)
                            .service(api::products::bulk_create_products)
                            .service(api::products::bulk_update_products)
                            .service(api::products::update_product_availability)
                            .service(api::products::update_product_customization)
                            .service(api::products::update_product)
                            .service(api::products::delete_product)
                            .service(api::restaurants::create_restaurant)
                            .service(api::restaurants::update_restaurant_settings)
                            .service(api::restaurants::update_restaurant_branding)
                            .service(api::restaurants::toggle_restaurant_status)
                            .service(api::restaurants::toggle_accepting_orders)
                            .service(api::restaurants::update_restaurant)
                            .service(api::restaurants::delete_restaurant)
                            .service(api::users::list_users)
                            .service(api::users::create_user)
                            .service(api::users::get_user)
                            .service(api::users::update_user)
                            .service(api::users::delete_user)
                            .service(api::admins::create_restaurant_admin)
                            .service(api::admins::change_password)
                            .service(api::admins::update_admin),
                    ),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
