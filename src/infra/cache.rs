//! Redis cache implementation.
//!
//! Holds short-lived snapshots (authenticated users, product detail)
//! and the fixed-window rate limit counters.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::config::{
    Config, CACHE_PREFIX_PRODUCT, CACHE_PREFIX_RATE_LIMIT, CACHE_PREFIX_USER,
    DEFAULT_CACHE_TTL_SECONDS, USER_CACHE_TTL_SECONDS,
};
use crate::domain::{CurrentUser, ProductDetail};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Eviction of cached snapshots after the data behind them changed.
///
/// Best effort: a failed eviction is logged and the entry expires on its TTL.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drop the cached identity of a user whose role, status or deletion changed.
    async fn forget_user(&self, user_id: Uuid);

    /// Drop the cached detail of a product after a catalog or stock change.
    async fn forget_product(&self, product_id: Uuid);
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
    default_ttl: u64,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            connection,
            default_ttl: DEFAULT_CACHE_TTL_SECONDS,
        })
    }

    /// Round-trip a PING, used by the health endpoint.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;

        match value {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with custom TTL (in seconds).
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;

        conn.set_ex::<_, _, ()>(key, json, ttl_seconds)
            .await
            .map_err(cache_error)?;

        Ok(())
    }

    /// Delete a value from cache.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Authenticated user snapshots
    // =========================================================================

    pub async fn get_user(&self, user_id: &Uuid) -> AppResult<Option<CurrentUser>> {
        self.get(&user_key(user_id)).await
    }

    pub async fn set_user(&self, user: &CurrentUser) -> AppResult<()> {
        self.set_with_ttl(&user_key(&user.id), user, USER_CACHE_TTL_SECONDS)
            .await
    }

    pub async fn invalidate_user(&self, user_id: &Uuid) -> AppResult<()> {
        self.delete(&user_key(user_id)).await
    }

    // =========================================================================
    // Product detail
    // =========================================================================

    pub async fn get_product(&self, product_id: &Uuid) -> AppResult<Option<ProductDetail>> {
        self.get(&product_key(product_id)).await
    }

    pub async fn set_product(&self, detail: &ProductDetail) -> AppResult<()> {
        self.set(&product_key(&detail.product.id), detail).await
    }

    pub async fn invalidate_product(&self, product_id: &Uuid) -> AppResult<()> {
        self.delete(&product_key(product_id)).await
    }

    // =========================================================================
    // Rate Limiting Operations
    // =========================================================================

    /// Count a request in the current fixed window.
    /// Returns (current_count, is_allowed).
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = rate_limit_key(identifier);
        let mut conn = self.connection.clone();

        let count: u64 = conn.incr(&key, 1u64).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        Ok((count, count <= max_requests))
    }
}

#[async_trait]
impl CacheInvalidator for Cache {
    async fn forget_user(&self, user_id: Uuid) {
        if let Err(e) = self.invalidate_user(&user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to invalidate cached user");
        }
    }

    async fn forget_product(&self, product_id: Uuid) {
        if let Err(e) = self.invalidate_product(&product_id).await {
            tracing::warn!(product_id = %product_id, error = %e, "Failed to invalidate cached product");
        }
    }
}

fn user_key(user_id: &Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_USER, user_id)
}

fn product_key(product_id: &Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_PRODUCT, product_id)
}

fn rate_limit_key(identifier: &str) -> String {
    format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier)
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            user_key(&id),
            "user:00000000-0000-0000-0000-000000000000"
        );
        assert!(product_key(&id).starts_with("product:"));
        assert_eq!(rate_limit_key("auth:10.0.0.1"), "rate_limit:auth:10.0.0.1");
    }
}
