// src/api/restaurants.rs

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
use crate::models::{slugify, Branding, ContactInfo, Restaurant, RestaurantSettings};
use crate::{db, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RestaurantPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact: Option<ContactInfo>,
    pub settings: Option<RestaurantSettings>,
    pub branding: Option<Branding>,
}

#[get("/restaurants")]
pub async fn list_restaurants(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let restaurants = db::list_restaurants(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurants": restaurants },
    })))
}

#[get("/restaurants/active")]
pub async fn list_active_restaurants(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let restaurants = db::list_active_restaurants(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurants": restaurants },
    })))
}

#[get("/restaurants/{slug}")]
pub async fn get_restaurant_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let restaurant = db::get_restaurant_by_slug(&state.pool, &path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

/// Full public menu for a storefront: restaurant, sorted categories, available
/// products. Served from cache when warm.
#[get("/restaurants/{id}/menu")]
pub async fn get_restaurant_menu(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let cache_key = keys::restaurant_menu(id);

    if let Some(cached) = state.cache.get_json::<serde_json::Value>(&cache_key).await {
        return Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "data": cached,
        })));
    }

    let restaurant = db::get_restaurant(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    let categories = db::list_categories_by_restaurant(&state.pool, id).await?;
    let products = db::list_available_products(&state.pool, id).await?;

    let menu = json!({
        "restaurant": restaurant,
        "categories": categories,
        "products": products,
    });
    state.cache.set_json(&cache_key, &menu).await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": menu,
    })))
}

#[post("/restaurants")]
pub async fn create_restaurant(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let (fields, files) = read_multipart(payload).await?;
    let data: RestaurantPayload = json_field(&fields, "data")?;
    let name = data
        .name
        .ok_or_else(|| ApiError::BadRequest("Restaurant name is required".to_string()))?;

    let now = Utc::now();
    let mut restaurant = Restaurant {
        id: Uuid::new_v4(),
        slug: slugify(&name),
        name,
        description: data.description,
        image_url: None,
        logo_url: None,
        cover_image_url: None,
        contact: data.contact.unwrap_or_default(),
        settings: data.settings.unwrap_or_default(),
        branding: data.branding.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    apply_image_uploads(&state, &mut restaurant, &files).await?;
    db::insert_restaurant(&state.pool, &restaurant).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

#[put("/restaurants/{id}")]
pub async fn update_restaurant(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let mut restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    let (fields, files) = read_multipart(payload).await?;
    let data: RestaurantPayload = json_field(&fields, "data")?;

    if let Some(name) = data.name {
        restaurant.slug = slugify(&name);
        restaurant.name = name;
    }
    if let Some(description) = data.description {
        restaurant.description = Some(description);
    }
    if let Some(contact) = data.contact {
        restaurant.contact = contact;
    }
    if let Some(settings) = data.settings {
        restaurant.settings = settings;
    }
    if let Some(branding) = data.branding {
        restaurant.branding = branding;
    }

    apply_image_uploads(&state, &mut restaurant, &files).await?;
    db::update_restaurant(&state.pool, &restaurant).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(restaurant.id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

#[delete("/restaurants/{id}")]
pub async fn delete_restaurant(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    db::delete_restaurant(&state.pool, restaurant.id).await?;

    // Best-effort cleanup after the row is gone: one delete call per image.
    for url in [
        restaurant.image_url.as_deref(),
        restaurant.logo_url.as_deref(),
        restaurant.cover_image_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        state.storage.delete_image(url).await;
    }
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(restaurant.id))
        .await;

    Ok(HttpResponse::NoContent().finish())
}

#[put("/restaurants/{id}/settings")]
pub async fn update_restaurant_settings(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<RestaurantSettings>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let mut restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    restaurant.settings = payload.into_inner();
    db::update_restaurant(&state.pool, &restaurant).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(restaurant.id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

#[put("/restaurants/{id}/branding")]
pub async fn update_restaurant_branding(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<Branding>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let mut restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    restaurant.branding = payload.into_inner();
    db::update_restaurant(&state.pool, &restaurant).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

#[put("/restaurants/{id}/toggle-status")]
pub async fn toggle_restaurant_status(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let mut restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    restaurant.settings.is_active = !restaurant.settings.is_active;
    db::update_restaurant(&state.pool, &restaurant).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

#[put("/restaurants/{id}/toggle-orders")]
pub async fn toggle_accepting_orders(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;

    let mut restaurant = db::get_restaurant(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;
    restaurant.settings.accepting_orders = !restaurant.settings.accepting_orders;
    db::update_restaurant(&state.pool, &restaurant).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "restaurant": restaurant },
    })))
}

async fn apply_image_uploads(
    state: &AppState,
    restaurant: &mut Restaurant,
    files: &[UploadedFile],
) -> Result<(), ApiError> {
    for file in files {
        let url = state
            .storage
            .upload_image(
                "restaurants",
                &file.filename,
                &file.content_type,
                file.bytes.clone(),
            )
            .await?;
        match file.field.as_str() {
            "image" => restaurant.image_url = Some(url),
            "logo" => restaurant.logo_url = Some(url),
            "coverImage" => restaurant.cover_image_url = Some(url),
            other => {
                log::warn!("ignoring unexpected upload field {other}");
            }
        }
    }
    Ok(())
}
