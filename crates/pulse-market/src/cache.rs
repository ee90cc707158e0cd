//! Short-lived cache for symbol search results
//!
//! Quotes are never cached: every refresh must observe the current price.

use crate::quote::SearchHit;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Thread-safe cache keyed by normalized search query
pub struct SearchCache {
    cache: Arc<RwLock<TimedCache<String, Vec<SearchHit>>>>,
}

impl SearchCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    fn key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Get cached hits for a query
    pub async fn get(&self, query: &str) -> Option<Vec<SearchHit>> {
        let mut cache = self.cache.write().await;
        cache.cache_get(&Self::key(query)).cloned()
    }

    /// Store hits for a query
    pub async fn insert(&self, query: &str, hits: Vec<SearchHit>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(Self::key(query), hits);
    }

    /// Return cached hits, or run the fetcher and cache its result
    ///
    /// Errors from the fetcher are returned as-is and nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, query: &str, fetcher: F) -> Result<Vec<SearchHit>, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<SearchHit>, E>>,
    {
        if let Some(hits) = self.get(query).await {
            tracing::debug!("Search cache hit for {:?}", query);
            return Ok(hits);
        }

        tracing::debug!("Search cache miss for {:?}", query);
        let hits = fetcher().await?;
        self.insert(query, hits.clone()).await;
        Ok(hits)
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for SearchCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(symbol: &str) -> SearchHit {
        SearchHit {
            symbol: symbol.to_string(),
            name: None,
            exchange: None,
            quote_type: Some("EQUITY".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_normalizes_query() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("Apple ", vec![hit("AAPL")]).await;

        assert_eq!(cache.get("apple").await, Some(vec![hit("AAPL")]));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_cache() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let mut calls = 0;

        let first = cache
            .get_or_fetch("apple", || {
                calls += 1;
                async { Ok::<_, String>(vec![hit("AAPL")]) }
            })
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = cache
            .get_or_fetch("apple", || {
                calls += 1;
                async { Ok::<_, String>(Vec::new()) }
            })
            .await
            .unwrap();
        assert_eq!(second, vec![hit("AAPL")]);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_not_cached() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_fetch("apple", || async { Err::<Vec<SearchHit>, _>("offline") })
            .await;

        assert_eq!(result, Err("offline"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("a", vec![hit("A")]).await;
        cache.insert("b", vec![hit("B")]).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
