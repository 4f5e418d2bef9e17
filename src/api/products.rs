// src/api/products.rs

use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{authorize, AuthContext, Role};
use crate::api::{json_field, read_multipart, UploadedFile};
use crate::cache::keys;
use crate::error::ApiError;
use crate::models::{
    slugify, CustomizationGroup, Product, ProductAttributes, ProductAvailability,
    ProductDescription, ProductImage,
};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub restaurant_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: ProductDescription,
    pub price: f64,
    #[serde(default)]
    pub discounted_price: Option<f64>,
    #[serde(default)]
    pub customization: Vec<CustomizationGroup>,
    #[serde(default)]
    pub attributes: ProductAttributes,
    #[serde(default)]
    pub availability: ProductAvailability,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<ProductDescription>,
    pub price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub customization: Option<Vec<CustomizationGroup>>,
    pub attributes: Option<ProductAttributes>,
    pub availability: Option<ProductAvailability>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkProductUpdate {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: UpdateProductRequest,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "products",
    responses((status = 200, description = "All products"))
)]
#[get("/products")]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = db::list_products(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "products": products },
    })))
}

/// Products currently orderable for a restaurant: availability flag, day of
/// week, time window and stock all checked against the current instant.
#[get("/products/available")]
pub async fn list_available_products(
    state: web::Data<AppState>,
    query: web::Query<AvailableQuery>,
) -> Result<HttpResponse, ApiError> {
    let products = db::list_available_products(&state.pool, query.restaurant_id).await?;
    let now = Utc::now();
    let available: Vec<Product> = products
        .into_iter()
        .filter(|p| p.is_available_at(now))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "products": available },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuery {
    pub restaurant_id: Uuid,
}

#[get("/products/restaurant/{restaurantId}")]
pub async fn list_products_by_restaurant(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let products = db::list_products_by_restaurant(&state.pool, *path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "products": products },
    })))
}

#[get("/products/category/{categoryId}")]
pub async fn list_products_by_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let products = db::list_products_by_category(&state.pool, *path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "products": products },
    })))
}

#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let product = db::get_product(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "product": product },
    })))
}

#[post("/products")]
pub async fn create_product(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let (fields, files) = read_multipart(payload).await?;
    let data: CreateProductRequest = json_field(&fields, "data")?;

    let images = upload_product_images(&state, &data.name, &files).await?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        restaurant_id: data.restaurant_id,
        category_id: data.category_id,
        slug: slugify(&data.name),
        name: data.name,
        description: data.description,
        images,
        price: data.price,
        discounted_price: data.discounted_price,
        customization: data.customization,
        attributes: data.attributes,
        availability: data.availability,
        created_at: now,
        updated_at: now,
    };
    db::insert_product(&state.pool, &product).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
        .await;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "product": product },
    })))
}

#[post("/products/bulk")]
pub async fn bulk_create_products(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<Vec<CreateProductRequest>>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let mut products = Vec::new();
    for data in payload.into_inner() {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            restaurant_id: data.restaurant_id,
            category_id: data.category_id,
            slug: slugify(&data.name),
            name: data.name,
            description: data.description,
            images: Vec::new(),
            price: data.price,
            discounted_price: data.discounted_price,
            customization: data.customization,
            attributes: data.attributes,
            availability: data.availability,
            created_at: now,
            updated_at: now,
        };
        db::insert_product(&state.pool, &product).await?;
        state
            .cache
            .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
            .await;
        products.push(product);
    }

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "products": products },
    })))
}

#[put("/products/bulk")]
pub async fn bulk_update_products(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<Vec<BulkProductUpdate>>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    // Same non-transactional shape as the bulk category update.
    for update in payload.into_inner() {
        let Some(mut product) = db::get_product(&state.pool, update.id).await? else {
            continue;
        };
        apply_patch(&mut product, update.patch);
        db::update_product(&state.pool, &product).await?;
        state
            .cache
            .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
            .await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Products updated successfully",
    })))
}

#[put("/products/{id}")]
pub async fn update_product(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let mut product = db::get_product(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    let (fields, files) = read_multipart(payload).await?;
    let patch: UpdateProductRequest = json_field(&fields, "data")?;
    apply_patch(&mut product, patch);

    if !files.is_empty() {
        product.images = upload_product_images(&state, &product.name, &files).await?;
    }

    db::update_product(&state.pool, &product).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "product": product },
    })))
}

#[delete("/products/{id}")]
pub async fn delete_product(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let product = db::get_product(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    db::delete_product(&state.pool, product.id).await?;

    // Best-effort: one delete call per stored image, after the row is gone.
    for image in &product.images {
        state.storage.delete_image(&image.url).await;
    }
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
        .await;

    Ok(HttpResponse::NoContent().finish())
}

#[put("/products/{id}/availability")]
pub async fn update_product_availability(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<ProductAvailability>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let mut product = db::get_product(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    product.availability = payload.into_inner();
    db::update_product(&state.pool, &product).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "product": product },
    })))
}

#[put("/products/{id}/customization")]
pub async fn update_product_customization(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<Vec<CustomizationGroup>>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let mut product = db::get_product(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    product.customization = payload.into_inner();
    db::update_product(&state.pool, &product).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(product.restaurant_id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "product": product },
    })))
}

fn apply_patch(product: &mut Product, patch: UpdateProductRequest) {
    if let Some(category_id) = patch.category_id {
        product.category_id = category_id;
    }
    if let Some(name) = patch.name {
        product.slug = slugify(&name);
        product.name = name;
    }
    if let Some(description) = patch.description {
        product.description = description;
    }
    if let Some(price) = patch.price {
        product.price = price;
    }
    if let Some(discounted_price) = patch.discounted_price {
        product.discounted_price = Some(discounted_price);
    }
    if let Some(customization) = patch.customization {
        product.customization = customization;
    }
    if let Some(attributes) = patch.attributes {
        product.attributes = attributes;
    }
    if let Some(availability) = patch.availability {
        product.availability = availability;
    }
}

async fn upload_product_images(
    state: &AppState,
    product_name: &str,
    files: &[UploadedFile],
) -> Result<Vec<ProductImage>, ApiError> {
    let mut images = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let url = state
            .storage
            .upload_image(
                "products",
                &file.filename,
                &file.content_type,
                file.bytes.clone(),
            )
            .await?;
        images.push(ProductImage {
            url,
            alt: Some(format!("{product_name} image {}", index + 1)),
            is_primary: index == 0,
        });
    }
    Ok(images)
}
