//! Registry of revoked session tokens
//!
//! Logout records the token's `jti` here and the authentication middleware
//! consults it on every protected request.

use async_trait::async_trait;
use chrono::Utc;
use common::{cache::RedisPool, error::CacheResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Set of revoked token ids
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Mark a token id as revoked. Revoking twice is a no-op.
    ///
    /// `expires_at` is the token's own expiry (Unix seconds); backends may
    /// use it to forget entries once the token could no longer be used.
    async fn revoke(&self, token_id: &str, expires_at: i64) -> CacheResult<()>;

    /// Whether a token id has been revoked
    async fn is_revoked(&self, token_id: &str) -> CacheResult<bool>;
}

/// Process-local registry
///
/// Entries are never purged and live only as long as the process: after a
/// restart every previously revoked token is accepted again until it expires
/// on its own.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRevocationRegistry {
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryRevocationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationRegistry for InMemoryRevocationRegistry {
    async fn revoke(&self, token_id: &str, _expires_at: i64) -> CacheResult<()> {
        let inserted = self.revoked.write().await.insert(token_id.to_string());
        if inserted {
            info!("Revoked token {}", token_id);
        }
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> CacheResult<bool> {
        Ok(self.revoked.read().await.contains(token_id))
    }
}

/// Registry shared through Redis
///
/// Entries expire together with the token they revoke and survive restarts
/// of the API process.
#[derive(Clone)]
pub struct RedisRevocationRegistry {
    redis_pool: RedisPool,
}

impl RedisRevocationRegistry {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(token_id: &str) -> String {
        format!("revoked_token:{}", token_id)
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    async fn revoke(&self, token_id: &str, expires_at: i64) -> CacheResult<()> {
        // Keep at least one second so an about-to-expire token is still refused
        let ttl = expires_at.saturating_sub(Utc::now().timestamp()).max(1) as u64;
        self.redis_pool
            .set(&Self::key(token_id), "1", Some(ttl))
            .await?;
        info!("Revoked token {} for {} seconds", token_id, ttl);
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> CacheResult<bool> {
        Ok(self.redis_pool.get(&Self::key(token_id)).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let registry = InMemoryRevocationRegistry::new();
        assert!(!registry.is_revoked("jti-1").await.unwrap());

        registry.revoke("jti-1", 0).await.unwrap();
        registry.revoke("jti-1", 0).await.unwrap();

        assert!(registry.is_revoked("jti-1").await.unwrap());
        assert!(!registry.is_revoked("jti-2").await.unwrap());
        assert_eq!(registry.revoked.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = InMemoryRevocationRegistry::new();
        let handle = registry.clone();

        handle.revoke("shared", 0).await.unwrap();
        assert!(registry.is_revoked("shared").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_revocations_are_not_lost() {
        let registry = InMemoryRevocationRegistry::new();

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let token_id = format!("jti-{}", i);
                    registry.revoke(&token_id, 0).await.unwrap();
                    assert!(registry.is_revoked(&token_id).await.unwrap());
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.revoked.read().await.len(), 64);
    }

    #[test]
    fn test_redis_key_layout() {
        assert_eq!(
            RedisRevocationRegistry::key("abc"),
            "revoked_token:abc".to_string()
        );
    }
}
