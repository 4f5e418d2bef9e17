// src/db.rs
//
// Runtime queries with manual row mapping. Document-shaped sub-records are
// JSONB columns decoded through serde; writes always carry the full document
// (handlers do read-modify-write, orders additionally get a CAS version check).

use chrono::{Datelike, TimeZone, Utc};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Admin, AdminRole, AdminStatus, Category, Order, OrderStatus, PaymentInfo, Product, Restaurant,
    StatusHistoryEntry, User,
};

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

fn decode_opt<T: DeserializeOwned>(value: Option<serde_json::Value>) -> Result<Option<T>, ApiError> {
    match value {
        Some(v) if !v.is_null() => Ok(Some(serde_json::from_value(v)?)),
        _ => Ok(None),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

// ---------------------------------------------------------------------------
// restaurants

fn restaurant_from_row(row: &PgRow) -> Result<Restaurant, ApiError> {
    Ok(Restaurant {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        logo_url: row.get("logo_url"),
        cover_image_url: row.get("cover_image_url"),
        contact: decode(row.get("contact"))?,
        settings: decode(row.get("settings"))?,
        branding: decode(row.get("branding"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const RESTAURANT_COLS: &str = "id, slug, name, description, image_url, logo_url, cover_image_url, \
     contact, settings, branding, created_at, updated_at";

pub async fn list_restaurants(pool: &PgPool) -> Result<Vec<Restaurant>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {RESTAURANT_COLS} FROM restaurants ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(restaurant_from_row).collect()
}

pub async fn list_active_restaurants(pool: &PgPool) -> Result<Vec<Restaurant>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {RESTAURANT_COLS} FROM restaurants \
         WHERE (settings ->> 'isActive')::boolean = true \
           AND (settings ->> 'acceptingOrders')::boolean = true \
         ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(restaurant_from_row).collect()
}

pub async fn get_restaurant(pool: &PgPool, id: Uuid) -> Result<Option<Restaurant>, ApiError> {
    let row = sqlx::query(&format!(
        "SELECT {RESTAURANT_COLS} FROM restaurants WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(restaurant_from_row).transpose()
}

pub async fn get_restaurant_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Restaurant>, ApiError> {
    let row = sqlx::query(&format!(
        "SELECT {RESTAURANT_COLS} FROM restaurants WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(restaurant_from_row).transpose()
}

pub async fn insert_restaurant(pool: &PgPool, r: &Restaurant) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO restaurants
               (id, slug, name, description, image_url, logo_url, cover_image_url,
                contact, settings, branding, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(r.id)
    .bind(&r.slug)
    .bind(&r.name)
    .bind(&r.description)
    .bind(&r.image_url)
    .bind(&r.logo_url)
    .bind(&r.cover_image_url)
    .bind(encode(&r.contact)?)
    .bind(encode(&r.settings)?)
    .bind(encode(&r.branding)?)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_restaurant(pool: &PgPool, r: &Restaurant) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE restaurants
           SET slug = $2, name = $3, description = $4, image_url = $5, logo_url = $6,
               cover_image_url = $7, contact = $8, settings = $9, branding = $10,
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(r.id)
    .bind(&r.slug)
    .bind(&r.name)
    .bind(&r.description)
    .bind(&r.image_url)
    .bind(&r.logo_url)
    .bind(&r.cover_image_url)
    .bind(encode(&r.contact)?)
    .bind(encode(&r.settings)?)
    .bind(encode(&r.branding)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_restaurant(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM restaurants WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// categories

fn category_from_row(row: &PgRow) -> Result<Category, ApiError> {
    Ok(Category {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        image: decode_opt(row.get("image"))?,
        parent_category_id: row.get("parent_category_id"),
        sort_order: row.get("sort_order"),
        is_active: row.get("is_active"),
        availability: decode_opt(row.get("availability"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const CATEGORY_COLS: &str = "id, restaurant_id, name, slug, description, image, \
     parent_category_id, sort_order, is_active, availability, created_at, updated_at";

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {CATEGORY_COLS} FROM categories ORDER BY restaurant_id, sort_order"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(category_from_row).collect()
}

pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Option<Category>, ApiError> {
    let row = sqlx::query(&format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(category_from_row).transpose()
}

pub async fn list_categories_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<Category>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {CATEGORY_COLS} FROM categories WHERE restaurant_id = $1 ORDER BY sort_order"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(category_from_row).collect()
}

pub async fn max_category_sort_order(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<i32, ApiError> {
    let row = sqlx::query(
        "SELECT COALESCE(MAX(sort_order), 0) AS max_order FROM categories WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(row.get("max_order"))
}

pub async fn insert_category(pool: &PgPool, c: &Category) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO categories
               (id, restaurant_id, name, slug, description, image, parent_category_id,
                sort_order, is_active, availability, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(c.id)
    .bind(c.restaurant_id)
    .bind(&c.name)
    .bind(&c.slug)
    .bind(&c.description)
    .bind(c.image.as_ref().map(encode).transpose()?)
    .bind(c.parent_category_id)
    .bind(c.sort_order)
    .bind(c.is_active)
    .bind(c.availability.as_ref().map(encode).transpose()?)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_category(pool: &PgPool, c: &Category) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE categories
           SET name = $2, slug = $3, description = $4, image = $5, parent_category_id = $6,
               sort_order = $7, is_active = $8, availability = $9, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(c.id)
    .bind(&c.name)
    .bind(&c.slug)
    .bind(&c.description)
    .bind(c.image.as_ref().map(encode).transpose()?)
    .bind(c.parent_category_id)
    .bind(c.sort_order)
    .bind(c.is_active)
    .bind(c.availability.as_ref().map(encode).transpose()?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn category_has_products(pool: &PgPool, category_id: Uuid) -> Result<bool, ApiError> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1) AS found")
        .bind(category_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("found"))
}

/// Parent chain for a category, root first. Cycles are cut by the visited set.
pub async fn category_path(pool: &PgPool, category: &Category) -> Result<Vec<Category>, ApiError> {
    let mut path = vec![category.clone()];
    let mut seen = vec![category.id];
    let mut parent = category.parent_category_id;

    while let Some(parent_id) = parent {
        if seen.contains(&parent_id) {
            break;
        }
        match get_category(pool, parent_id).await? {
            Some(p) => {
                parent = p.parent_category_id;
                seen.push(p.id);
                path.insert(0, p);
            }
            None => break,
        }
    }
    Ok(path)
}

// ---------------------------------------------------------------------------
// products

fn product_from_row(row: &PgRow) -> Result<Product, ApiError> {
    Ok(Product {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        category_id: row.get("category_id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: decode_opt(row.get("description"))?.unwrap_or_default(),
        images: decode(row.get("images"))?,
        price: row.get("price"),
        discounted_price: row.get("discounted_price"),
        customization: decode(row.get("customization"))?,
        attributes: decode_opt(row.get("attributes"))?.unwrap_or_default(),
        availability: decode(row.get("availability"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const PRODUCT_COLS: &str = "id, restaurant_id, category_id, name, slug, description, images, \
     price, discounted_price, customization, attributes, availability, created_at, updated_at";

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {PRODUCT_COLS} FROM products ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(product_from_row).collect()
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, ApiError> {
    let row = sqlx::query(&format!("SELECT {PRODUCT_COLS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(product_from_row).transpose()
}

pub async fn list_products_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE restaurant_id = $1 ORDER BY category_id"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(product_from_row).collect()
}

pub async fn list_products_by_category(
    pool: &PgPool,
    category_id: Uuid,
) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE category_id = $1 ORDER BY created_at DESC"
    ))
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(product_from_row).collect()
}

pub async fn list_available_products(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {PRODUCT_COLS} FROM products \
         WHERE restaurant_id = $1 AND (availability ->> 'isAvailable')::boolean = true"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(product_from_row).collect()
}

/// Product scoped to its restaurant, for cart validation. Availability is
/// checked by the pricing engine, not here.
pub async fn get_restaurant_product(
    pool: &PgPool,
    restaurant_id: Uuid,
    product_id: Uuid,
) -> Result<Option<Product>, ApiError> {
    let row = sqlx::query(&format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE id = $1 AND restaurant_id = $2"
    ))
    .bind(product_id)
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(product_from_row).transpose()
}

pub async fn insert_product(pool: &PgPool, p: &Product) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO products
               (id, restaurant_id, category_id, name, slug, description, images, price,
                discounted_price, customization, attributes, availability, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
    )
    .bind(p.id)
    .bind(p.restaurant_id)
    .bind(p.category_id)
    .bind(&p.name)
    .bind(&p.slug)
    .bind(encode(&p.description)?)
    .bind(encode(&p.images)?)
    .bind(p.price)
    .bind(p.discounted_price)
    .bind(encode(&p.customization)?)
    .bind(encode(&p.attributes)?)
    .bind(encode(&p.availability)?)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_product(pool: &PgPool, p: &Product) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE products
           SET category_id = $2, name = $3, slug = $4, description = $5, images = $6,
               price = $7, discounted_price = $8, customization = $9, attributes = $10,
               availability = $11, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(p.id)
    .bind(p.category_id)
    .bind(&p.name)
    .bind(&p.slug)
    .bind(encode(&p.description)?)
    .bind(encode(&p.images)?)
    .bind(p.price)
    .bind(p.discounted_price)
    .bind(encode(&p.customization)?)
    .bind(encode(&p.attributes)?)
    .bind(encode(&p.availability)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// users

fn user_from_row(row: &PgRow) -> Result<User, ApiError> {
    Ok(User {
        id: row.get("id"),
        phone_number: row.get("phone_number"),
        name: row.get("name"),
        email: row.get("email"),
        addresses: decode(row.get("addresses"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const USER_COLS: &str = "id, phone_number, name, email, addresses, created_at, updated_at";

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, ApiError> {
    let rows = sqlx::query(&format!("SELECT {USER_COLS} FROM users ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let row = sqlx::query(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, ApiError> {
    let row = sqlx::query(&format!("SELECT {USER_COLS} FROM users WHERE phone_number = $1"))
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn email_taken(
    pool: &PgPool,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, ApiError> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id != $2)) AS found",
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(pool)
    .await?;
    Ok(row.get("found"))
}

pub async fn insert_user(pool: &PgPool, u: &User) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO users (id, phone_number, name, email, addresses, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(u.id)
    .bind(&u.phone_number)
    .bind(&u.name)
    .bind(&u.email)
    .bind(encode(&u.addresses)?)
    .bind(u.created_at)
    .bind(u.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_user(pool: &PgPool, u: &User) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE users
           SET phone_number = $2, name = $3, email = $4, addresses = $5, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(u.id)
    .bind(&u.phone_number)
    .bind(&u.name)
    .bind(&u.email)
    .bind(encode(&u.addresses)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// admins

fn admin_from_row(row: &PgRow) -> Result<Admin, ApiError> {
    let role: String = row.get("role");
    let status: String = row.get("status");
    Ok(Admin {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        role: AdminRole::parse(&role)
            .ok_or_else(|| ApiError::Internal(format!("unknown admin role: {role}").into()))?,
        restaurant_id: row.get("restaurant_id"),
        permissions: decode(row.get("permissions"))?,
        status: AdminStatus::parse(&status)
            .ok_or_else(|| ApiError::Internal(format!("unknown admin status: {status}").into()))?,
        last_login: row.get("last_login"),
        login_attempts: row.get("login_attempts"),
        lock_until: row.get("lock_until"),
        password_changed_at: row.get("password_changed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const ADMIN_COLS: &str = "id, email, password_hash, name, role, restaurant_id, permissions, \
     status, last_login, login_attempts, lock_until, password_changed_at, created_at, updated_at";

pub async fn get_admin(pool: &PgPool, id: Uuid) -> Result<Option<Admin>, ApiError> {
    let row = sqlx::query(&format!("SELECT {ADMIN_COLS} FROM admins WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(admin_from_row).transpose()
}

pub async fn get_admin_by_email(pool: &PgPool, email: &str) -> Result<Option<Admin>, ApiError> {
    let row = sqlx::query(&format!("SELECT {ADMIN_COLS} FROM admins WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(admin_from_row).transpose()
}

pub async fn insert_admin(pool: &PgPool, a: &Admin) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO admins
               (id, email, password_hash, name, role, restaurant_id, permissions, status,
                login_attempts, password_changed_at, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(a.id)
    .bind(&a.email)
    .bind(&a.password_hash)
    .bind(&a.name)
    .bind(a.role.as_str())
    .bind(a.restaurant_id)
    .bind(encode(&a.permissions)?)
    .bind(a.status.as_str())
    .bind(a.login_attempts)
    .bind(a.password_changed_at)
    .bind(a.created_at)
    .bind(a.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_admin(pool: &PgPool, a: &Admin) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE admins
           SET email = $2, name = $3, permissions = $4, status = $5, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(a.id)
    .bind(&a.email)
    .bind(&a.name)
    .bind(encode(&a.permissions)?)
    .bind(a.status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_admin_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE admins
           SET password_hash = $2, password_changed_at = NOW(), updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_admin_login_success(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE admins
           SET login_attempts = 0, lock_until = NULL, last_login = NOW(), updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Bump the failure counter; the fifth consecutive failure locks for an hour.
pub async fn record_admin_login_failure(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE admins
           SET login_attempts = login_attempts + 1,
               lock_until = CASE WHEN login_attempts + 1 >= 5
                                 THEN NOW() + INTERVAL '1 hour'
                                 ELSE lock_until END,
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// orders

fn order_from_row(row: &PgRow) -> Result<Order, ApiError> {
    let status: String = row.get("status");
    Ok(Order {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        user_id: row.get("user_id"),
        order_number: row.get("order_number"),
        items: decode(row.get("items"))?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| ApiError::Internal(format!("unknown order status: {status}").into()))?,
        status_history: decode(row.get("status_history"))?,
        payment: decode(row.get("payment"))?,
        delivery: decode(row.get("delivery"))?,
        pricing: decode(row.get("pricing"))?,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const ORDER_COLS: &str = "id, restaurant_id, user_id, order_number, items, status, \
     status_history, payment, delivery, pricing, version, created_at, updated_at";

/// Insert an order, allocating its number from the per-restaurant monthly
/// sequence inside the same transaction as the insert.
pub async fn create_order(pool: &PgPool, order: &mut Order) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let now = order.created_at;
    let month_start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ApiError::Internal("invalid month start".into()))?;
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let month_end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ApiError::Internal("invalid month end".into()))?;

    let row = sqlx::query(
        r#"SELECT COUNT(*) AS count FROM orders
           WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3"#,
    )
    .bind(order.restaurant_id)
    .bind(month_start)
    .bind(month_end)
    .fetch_one(&mut *tx)
    .await?;
    let count: i64 = row.get("count");

    order.order_number =
        crate::order_flow::format_order_number(order.restaurant_id, now, count as u32 + 1);

    sqlx::query(
        r#"INSERT INTO orders
               (id, restaurant_id, user_id, order_number, items, status, status_history,
                payment, delivery, pricing, version, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
    )
    .bind(order.id)
    .bind(order.restaurant_id)
    .bind(order.user_id)
    .bind(&order.order_number)
    .bind(encode(&order.items)?)
    .bind(order.status.as_str())
    .bind(encode(&order.status_history)?)
    .bind(encode(&order.payment)?)
    .bind(encode(&order.delivery)?)
    .bind(encode(&order.pricing)?)
    .bind(order.version)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn list_orders(pool: &PgPool) -> Result<Vec<Order>, ApiError> {
    let rows = sqlx::query(&format!("SELECT {ORDER_COLS} FROM orders ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await?;
    rows.iter().map(order_from_row).collect()
}

pub async fn get_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query(&format!("SELECT {ORDER_COLS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(order_from_row).transpose()
}

pub async fn get_user_order(
    pool: &PgPool,
    user_id: Uuid,
    order_id: Uuid,
) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE id = $1 AND user_id = $2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(order_from_row).transpose()
}

pub async fn list_orders_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(order_from_row).collect()
}

pub async fn list_orders_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<Order>, ApiError> {
    let rows = sqlx::query(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(order_from_row).collect()
}

pub async fn find_order_by_transaction_id(
    pool: &PgPool,
    transaction_id: &str,
) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query(&format!(
        "SELECT {ORDER_COLS} FROM orders WHERE payment ->> 'transactionId' = $1"
    ))
    .bind(transaction_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(order_from_row).transpose()
}

/// Compare-and-swap status update. Returns the updated order, or None when the
/// version no longer matches (a concurrent writer won).
pub async fn update_order_status(
    pool: &PgPool,
    order_id: Uuid,
    expected_version: i64,
    status: OrderStatus,
    entry: &StatusHistoryEntry,
) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query(&format!(
        "UPDATE orders
         SET status = $3,
             status_history = status_history || $4::jsonb,
             version = version + 1,
             updated_at = NOW()
         WHERE id = $1 AND version = $2
         RETURNING {ORDER_COLS}"
    ))
    .bind(order_id)
    .bind(expected_version)
    .bind(status.as_str())
    .bind(encode(entry)?)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(order_from_row).transpose()
}

/// Webhook reconciliation writes. Single-statement updates: the history append
/// and version bump ride in the same UPDATE, so concurrent admin CAS updates
/// see a changed version instead of a lost write.
pub async fn set_order_payment(
    pool: &PgPool,
    order_id: Uuid,
    payment: &PaymentInfo,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE orders
           SET payment = $2, version = version + 1, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(order_id)
    .bind(encode(payment)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_order_payment_and_status(
    pool: &PgPool,
    order_id: Uuid,
    payment: &PaymentInfo,
    status: OrderStatus,
    entry: &StatusHistoryEntry,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"UPDATE orders
           SET payment = $2,
               status = $3,
               status_history = status_history || $4::jsonb,
               version = version + 1,
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(order_id)
    .bind(encode(payment)?)
    .bind(status.as_str())
    .bind(encode(entry)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_order(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
