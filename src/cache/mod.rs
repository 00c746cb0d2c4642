//! Cache layer
//!
//! In-process cache for hot read paths (category lists, FAQ lists, the
//! active contact card, about-page statistics). Values are stored as JSON
//! with a per-entry TTL; writers invalidate by key prefix.
//!
//! # Usage
//!
//! ```rust,ignore
//! use portfolio_platform::cache::{create_cache, CacheLayer};
//! use portfolio_platform::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Generic over the stored value, so it is used through the concrete
/// `Cache` type rather than as a trait object.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Cache shared by the services
pub type Cache = MemoryCache;

/// Cache keys and invalidation patterns
pub mod keys {
    pub const BLOG_CATEGORIES: &str = "blog:categories";
    pub const BLOG_PREFIX: &str = "blog:*";
    pub const PORTFOLIO_CATEGORIES: &str = "portfolio:categories";
    pub const PORTFOLIO_STATS: &str = "portfolio:stats";
    pub const PORTFOLIO_PREFIX: &str = "portfolio:*";
    pub const CONTACT_INFO: &str = "contact:info";
    pub const FAQ_PREFIX: &str = "contact:faq:*";

    /// FAQ list key, one per category filter
    pub fn faqs(category: Option<&str>) -> String {
        format!("contact:faq:{}", category.unwrap_or("all"))
    }

    pub fn featured_faqs(limit: i64) -> String {
        format!("contact:faq:featured:{}", limit)
    }
}

/// Create the cache described by the configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let cache = create_cache(&CacheConfig::default());

        cache
            .set(keys::CONTACT_INFO, &"card".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get(keys::CONTACT_INFO).await.unwrap();
        assert_eq!(result, Some("card".to_string()));
    }

    #[tokio::test]
    async fn test_prefix_invalidation() {
        let cache = create_cache(&CacheConfig::default());
        let ttl = Duration::from_secs(60);

        cache.set(&keys::faqs(None), &1, ttl).await.unwrap();
        cache.set(&keys::faqs(Some("pricing")), &2, ttl).await.unwrap();
        cache.set(keys::CONTACT_INFO, &3, ttl).await.unwrap();

        cache.delete_pattern(keys::FAQ_PREFIX).await.unwrap();

        assert_eq!(cache.get::<i32>(&keys::faqs(None)).await.unwrap(), None);
        assert_eq!(cache.get::<i32>(&keys::faqs(Some("pricing"))).await.unwrap(), None);
        assert_eq!(cache.get::<i32>(keys::CONTACT_INFO).await.unwrap(), Some(3));
    }
}
