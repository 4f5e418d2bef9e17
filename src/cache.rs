// src/cache.rs
//
// Redis-backed cache and token revocation list. Every operation is
// best-effort: failures are logged and swallowed so a degraded cache never
// fails a request. When REDIS_URL is not set the cache is simply disabled.

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

const DEFAULT_EXPIRY_SECS: u64 = 3600;

#[derive(Clone)]
pub struct Cache {
    conn: Option<ConnectionManager>,
}

impl Cache {
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url else {
            log::warn!("REDIS_URL not set, cache disabled");
            return Self { conn: None };
        };

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(3)
            .set_connection_timeout(Duration::from_millis(500));

        let conn = match redis::Client::open(url) {
            Ok(client) => match client.get_connection_manager_with_config(config).await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    log::error!("redis connect error: {e}");
                    None
                }
            },
            Err(e) => {
                log::error!("redis client error: {e}");
                None
            }
        };

        Self { conn }
    }

    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                log::error!("redis get error for {key}: {e}");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("cache serialize error for {key}: {e}");
                return;
            }
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, DEFAULT_EXPIRY_SECS).await {
            log::error!("redis set error for {key}: {e}");
        }
    }

    pub async fn clear_pattern(&self, pattern: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                log::error!("redis keys error for {pattern}: {e}");
                return;
            }
        };
        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<_, ()>(keys).await {
            log::error!("redis clear pattern error for {pattern}: {e}");
        }
    }

    /// Revoke a token until its natural expiry.
    pub async fn blacklist_token(&self, token: &str, ttl_secs: u64) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let key = keys::blacklist(token);
        if let Err(e) = conn.set_ex::<_, _, ()>(key, "1", ttl_secs.max(1)).await {
            log::error!("redis blacklist error: {e}");
        }
    }

    /// Fail-open: an unreachable cache does not lock everyone out.
    pub async fn is_token_blacklisted(&self, token: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        match conn.exists::<_, bool>(keys::blacklist(token)).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("redis blacklist lookup error: {e}");
                false
            }
        }
    }
}

pub mod keys {
    use uuid::Uuid;

    pub fn restaurant_menu(id: Uuid) -> String {
        format!("restaurant:{id}:menu")
    }

    pub fn restaurant_pattern(id: Uuid) -> String {
        format!("restaurant:{id}*")
    }

    pub fn blacklist(token: &str) -> String {
        format!("blacklist:{token}")
    }
}
