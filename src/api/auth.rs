// src/api/auth.rs

use std::rc::Rc;

use actix_web::body::MessageBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{get, post, web, Error, HttpMessage, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Address, AdminStatus, User};
use crate::{db, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    RestaurantAdmin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::RestaurantAdmin => "RESTAURANT_ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(Role::Customer),
            "RESTAURANT_ADMIN" => Some(Role::RestaurantAdmin),
            "SUPER_ADMIN" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// Identity resolved by the auth middleware, available to handlers as ReqData.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub id: Uuid,
    pub role: Role,
    pub restaurant_id: Option<Uuid>,
    pub token: String,
    pub token_exp: i64,
}

/// Route-bound allow-list check, called at the top of role-gated handlers.
pub fn authorize(ctx: &AuthContext, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

fn issue_token(
    secret: &str,
    sub: Uuid,
    role: Role,
    restaurant_id: Option<Uuid>,
    ttl: Duration,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub,
        role: role.as_str().to_string(),
        restaurant_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(ApiError::internal)
}

pub fn issue_customer_token(secret: &str, user_id: Uuid) -> Result<String, ApiError> {
    issue_token(secret, user_id, Role::Customer, None, Duration::days(30))
}

pub fn issue_admin_token(
    secret: &str,
    admin_id: Uuid,
    role: Role,
    restaurant_id: Option<Uuid>,
) -> Result<String, ApiError> {
    issue_token(secret, admin_id, role, restaurant_id, Duration::days(1))
}

// ---------------------------------------------------------------------------
// middleware

/// Bearer-token middleware: verifies the JWT, rejects revoked tokens, checks
/// the account still exists (and, for staff, that the password has not changed
/// since issuance), then attaches an AuthContext for the handlers.
pub struct Auth;

impl<S, B> Transform<S, ServiceRequest> for Auth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| {
                    actix_web::error::ErrorInternalServerError("application state missing")
                })?;

            let token = req
                .headers()
                .get(actix_web::http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
                .ok_or_else(|| unauthorized("Authentication token required"))?;

            if state.cache.is_token_blacklisted(&token).await {
                return Err(unauthorized("Invalid authentication token"));
            }

            let token_data = decode::<Claims>(
                &token,
                &DecodingKey::from_secret(state.jwt_secret.as_ref()),
                &Validation::default(),
            )
            .map_err(|_| unauthorized("Invalid authentication token"))?;

            let claims = token_data.claims;
            let role = Role::parse(&claims.role)
                .ok_or_else(|| unauthorized("Invalid authentication token"))?;

            match role {
                Role::Customer => {
                    let user = db::get_user(&state.pool, claims.sub)
                        .await
                        .map_err(Error::from)?;
                    if user.is_none() {
                        return Err(unauthorized(
                            "The account belonging to this token no longer exists",
                        ));
                    }
                }
                Role::RestaurantAdmin | Role::SuperAdmin => {
                    let admin = db::get_admin(&state.pool, claims.sub)
                        .await
                        .map_err(Error::from)?
                        .ok_or_else(|| {
                            unauthorized("The account belonging to this token no longer exists")
                        })?;
                    if admin.status != AdminStatus::Active {
                        return Err(unauthorized("Account is not active"));
                    }
                    if let Some(changed_at) = admin.password_changed_at {
                        if changed_at.timestamp() > claims.iat {
                            return Err(unauthorized(
                                "Password changed recently, please log in again",
                            ));
                        }
                    }
                }
            }

            req.extensions_mut().insert(AuthContext {
                id: claims.sub,
                role,
                restaurant_id: claims.restaurant_id,
                token,
                token_exp: claims.exp,
            });

            service.call(req).await
        })
    }
}

fn unauthorized(message: &str) -> Error {
    ApiError::Unauthorized(message.to_string()).into()
}

// ---------------------------------------------------------------------------
// handlers

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub phone_number: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Customer account created"),
        (status = 400, description = "Phone number already registered")
    )
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
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

    let token = issue_customer_token(&state.jwt_secret, user.id)?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "token": token,
        "data": { "user": user },
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Unknown phone number")
    )
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = db::get_user_by_phone(&state.pool, &payload.phone_number)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token = issue_customer_token(&state.jwt_secret, user.id)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "token": token,
        "data": { "user": user },
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/admin/login",
    tag = "auth",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Invalid credentials, inactive or locked account")
    )
)]
#[post("/auth/admin/login")]
pub async fn admin_login(
    state: web::Data<AppState>,
    payload: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let admin = db::get_admin_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if admin.status != AdminStatus::Active {
        return Err(ApiError::Unauthorized("Account is not active".to_string()));
    }
    if matches!(admin.lock_until, Some(until) if until > Utc::now()) {
        return Err(ApiError::Unauthorized(
            "Account is temporarily locked".to_string(),
        ));
    }

    let matches = verify(&payload.password, &admin.password_hash).map_err(ApiError::internal)?;
    if !matches {
        db::record_admin_login_failure(&state.pool, admin.id).await?;
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    db::record_admin_login_success(&state.pool, admin.id).await?;

    let role = match admin.role {
        crate::models::AdminRole::SuperAdmin => Role::SuperAdmin,
        crate::models::AdminRole::RestaurantAdmin => Role::RestaurantAdmin,
    };
    let token = issue_admin_token(&state.jwt_secret, admin.id, role, admin.restaurant_id)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "admin": admin, "token": token },
    })))
}

#[post("/auth/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    let ttl = (ctx.token_exp - Utc::now().timestamp()).max(1) as u64;
    state.cache.blacklist_token(&ctx.token, ttl).await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Logged out",
    })))
}

#[get("/auth/me")]
pub async fn me(
    state: web::Data<AppState>,
    ctx: web::ReqData<AuthContext>,
) -> Result<HttpResponse, ApiError> {
    match ctx.role {
        Role::Customer => {
            let user = db::get_user(&state.pool, ctx.id)
                .await?
                .ok_or_else(|| ApiError::not_found("User"))?;
            Ok(HttpResponse::Ok().json(json!({
                "status": "success",
                "data": { "user": user },
            })))
        }
        Role::RestaurantAdmin | Role::SuperAdmin => {
            let admin = db::get_admin(&state.pool, ctx.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Admin"))?;
            Ok(HttpResponse::Ok().json(json!({
                "status": "success",
                "data": { "admin": admin },
            })))
        }
    }
}

/// Bcrypt with the library default cost.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST).map_err(ApiError::internal)
}
