// src/api/admins.rs

use actix_web::{post, put, web, HttpResponse};
use bcrypt::verify;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::auth::{authorize, hash_password, AuthContext, Role};
use crate::error::ApiError;
use crate::models::{Admin, AdminRole, AdminStatus};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub restaurant_id: Uuid,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAdminRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub status: Option<AdminStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Provision a restaurant admin bound to an existing restaurant.
#[post("/admins")]
pub async fn create_restaurant_admin(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<CreateAdminRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::SuperAdmin])?;
    let payload = payload.into_inner();

    if db::get_restaurant(&state.pool, payload.restaurant_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Restaurant"));
    }
    if db::get_admin_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Admin already exists with this email".to_string(),
        ));
    }

    let now = Utc::now();
    let admin = Admin {
        id: Uuid::new_v4(),
        email: payload.email,
        password_hash: hash_password(&payload.password)?,
        name: payload.name,
        role: AdminRole::RestaurantAdmin,
        restaurant_id: Some(payload.restaurant_id),
        permissions: payload.permissions,
        status: AdminStatus::Active,
        last_login: None,
        login_attempts: 0,
        lock_until: None,
        password_changed_at: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_admin(&state.pool, &admin).await?;

    log::info!(
        "restaurant admin {} created for restaurant {}",
        admin.id,
        payload.restaurant_id
    );

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "admin": admin },
    })))
}

#[put("/admins/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;

    let admin = db::get_admin(&state.pool, ctx.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin"))?;

    let matches =
        verify(&payload.current_password, &admin.password_hash).map_err(ApiError::internal)?;
    if !matches {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)?;
    db::update_admin_password(&state.pool, admin.id, &new_hash).await?;

    log::info!("password changed for admin {}", admin.id);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Password updated successfully",
    })))
}

#[put("/admins/{id}")]
pub async fn update_admin(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateAdminRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&ctx, &[Role::RestaurantAdmin, Role::SuperAdmin])?;
    let id = path.into_inner();

    // Restaurant admins may only edit themselves.
    if ctx.role != Role::SuperAdmin && ctx.id != id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this admin".to_string(),
        ));
    }

    let mut admin = db::get_admin(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin"))?;

    let payload = payload.into_inner();
    if let Some(name) = payload.name {
        admin.name = name;
    }
    if let Some(email) = payload.email {
        admin.email = email;
    }
    if let Some(permissions) = payload.permissions {
        admin.permissions = permissions;
    }
    if let Some(status) = payload.status {
        admin.status = status;
    }
    db::update_admin(&state.pool, &admin).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "admin": admin },
    })))
}
