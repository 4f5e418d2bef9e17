// src/api/users.rs
//
// Customer account administration. All routes are super-admin only; customers
// manage themselves through /auth.

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{authorize, AuthContext, Role};
use crate::error::ApiError;
use crate::models::{Address, User};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub phone_number: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub addresses: Option<Vec<Address>>,
}

#[get("/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let users = db::list_users(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "users": users },
    })))
}

#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let user = db::get_user(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "user": user },
    })))
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let payload = payload.into_inner();

    if db::get_user_by_phone(&state.pool, &payload.phone_number)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Phone number already registered".to_string(),
        ));
    }
    if let Some(email) = payload.email.as_deref() {
        if db::email_taken(&state.pool, email, None).await? {
            return Err(ApiError::BadRequest("Email already exists".to_string()));
        }
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        phone_number: payload.phone_number,
        name: payload.name,
        email: payload.email,
        addresses: payload.addresses,
        created_at: now,
        updated_at: now,
    };
    db::insert_user(&state.pool, &user).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "user": user },
    })))
}

#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let payload = payload.into_inner();

    let mut user = db::get_user(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if let Some(email) = payload.email.as_deref() {
        if db::email_taken(&state.pool, email, Some(user.id)).await? {
            return Err(ApiError::BadRequest("Email already exists".to_string()));
        }
    }

    if let Some(phone_number) = payload.phone_number {
        user.phone_number = phone_number;
    }
    if let Some(name) = payload.name {
        user.name = name;
    }
    if let Some(email) = payload.email {
        user.email = Some(email);
    }
    if let Some(addresses) = payload.addresses {
        user.addresses = addresses;
    }
    db::update_user(&state.pool, &user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "user": user },
    })))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let user = db::get_user(&state.pool, *path)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    db::delete_user(&state.pool, user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
