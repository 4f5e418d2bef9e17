// src/api/categories.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{authorize, AuthContext, Role};
use crate::cache::keys;
use crate::error::ApiError;
use crate::models::{slugify, Category, CategoryImage, TimeWindow};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub restaurant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<CategoryImage>,
    #[serde(default)]
    pub parent_category_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub availability: Option<TimeWindow>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<CategoryImage>,
    pub parent_category_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub availability: Option<TimeWindow>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCategoryUpdate {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: UpdateCategoryRequest,
}

#[get("/categories")]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let categories = db::list_categories(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "categories": categories },
    })))
}

#[get("/categories/{id}")]
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let category = db::get_category(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;
    let path_to_root = db::category_path(&state.pool, &category).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "category": category,
            "path": path_to_root.iter().map(|c| &c.name).collect::<Vec<_>>(),
        },
    })))
}

#[get("/categories/restaurant/{restaurantId}")]
pub async fn list_categories_by_restaurant(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let categories = db::list_categories_by_restaurant(&state.pool, *path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "categories": categories },
    })))
}

#[post("/categories")]
pub async fn create_category(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;
    let payload = payload.into_inner();

    let sort_order = match payload.sort_order {
        Some(order) => order,
        None => db::max_category_sort_order(&state.pool, payload.restaurant_id).await? + 1,
    };

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        restaurant_id: payload.restaurant_id,
        slug: slugify(&payload.name),
        name: payload.name,
        description: payload.description,
        image: payload.image,
        parent_category_id: payload.parent_category_id,
        sort_order,
        is_active: true,
        availability: payload.availability,
        created_at: now,
        updated_at: now,
    };
    db::insert_category(&state.pool, &category).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(category.restaurant_id))
        .await;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "category": category },
    })))
}

#[put("/categories/bulk")]
pub async fn bulk_update_categories(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<Vec<BulkCategoryUpdate>>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    // Updates are applied one by one, not in a transaction; a failure part way
    // leaves earlier updates in place.
    for update in payload.into_inner() {
        let Some(mut category) = db::get_category(&state.pool, update.id).await? else {
            continue;
        };
        apply_patch(&mut category, update.patch);
        db::update_category(&state.pool, &category).await?;
        state
            .cache
            .clear_pattern(&keys::restaurant_pattern(category.restaurant_id))
            .await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Categories updated successfully",
    })))
}

#[post("/categories/bulk")]
pub async fn bulk_create_categories(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<Vec<CreateCategoryRequest>>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;
    let requests = payload.into_inner();

    let mut next_order = match requests.first() {
        Some(first) => db::max_category_sort_order(&state.pool, first.restaurant_id).await? + 1,
        None => return Err(ApiError::BadRequest("No categories provided".to_string())),
    };

    let mut categories = Vec::with_capacity(requests.len());
    for request in requests {
        let sort_order = request.sort_order.unwrap_or_else(|| {
            let order = next_order;
            next_order += 1;
            order
        });
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            restaurant_id: request.restaurant_id,
            slug: slugify(&request.name),
            name: request.name,
            description: request.description,
            image: request.image,
            parent_category_id: request.parent_category_id,
            sort_order,
            is_active: true,
            availability: request.availability,
            created_at: now,
            updated_at: now,
        };
        db::insert_category(&state.pool, &category).await?;
        state
            .cache
            .clear_pattern(&keys::restaurant_pattern(category.restaurant_id))
            .await;
        categories.push(category);
    }

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "categories": categories },
    })))
}

#[put("/categories/{id}")]
pub async fn update_category(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let mut category = db::get_category(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;
    apply_patch(&mut category, payload.into_inner());
    db::update_category(&state.pool, &category).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(category.restaurant_id))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "category": category },
    })))
}

#[delete("/categories/{id}")]
pub async fn delete_category(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let category = db::get_category(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    if db::category_has_products(&state.pool, category.id).await? {
        return Err(ApiError::BadRequest(
            "Cannot delete category with associated products. Please move or delete the products first."
                .to_string(),
        ));
    }

    db::delete_category(&state.pool, category.id).await?;
    state
        .cache
        .clear_pattern(&keys::restaurant_pattern(category.restaurant_id))
        .await;

    Ok(HttpResponse::NoContent().finish())
}

fn apply_patch(category: &mut Category, patch: UpdateCategoryRequest) {
    if let Some(name) = patch.name {
        category.slug = slugify(&name);
        category.name = name;
    }
    if let Some(description) = patch.description {
        category.description = Some(description);
    }
    if let Some(image) = patch.image {
        category.image = Some(image);
    }
    if let Some(parent) = patch.parent_category_id {
        category.parent_category_id = Some(parent);
    }
    if let Some(sort_order) = patch.sort_order {
        category.sort_order = sort_order;
    }
    if let Some(is_active) = patch.is_active {
        category.is_active = is_active;
    }
    if let Some(availability) = patch.availability {
        category.availability = Some(availability);
    }
}
