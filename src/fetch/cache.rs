// Response cache for fetched rows
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;

use crate::data::Row;
use super::{FetchError, RowFetcher, RowRequest};

/// Cache entry with expiration
struct CacheEntry {
    rows: Vec<Row>,
    expires_at: Option<Instant>,
}

/// Wraps a fetcher and remembers successful responses
pub struct CachedFetcher<F> {
    inner: F,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Option<Duration>,
}

impl<F> CachedFetcher<F> {
    /// Create a new cache around a fetcher
    pub fn new(inner: F) -> Self {
        CachedFetcher {
            inner,
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: None,
        }
    }

    /// Set the time-to-live for cache entries
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Clear expired entries from the cache
    pub fn clear_expired(&self) -> Result<(), FetchError> {
        let mut cache = self.cache.write().map_err(|_| {
            FetchError::Internal("Failed to acquire write lock".to_string())
        })?;

        let now = Instant::now();
        cache.retain(|_, entry| entry.expires_at.map_or(true, |expires| expires > now));

        Ok(())
    }

    /// Clear all entries from the cache
    pub fn clear_all(&self) -> Result<(), FetchError> {
        let mut cache = self.cache.write().map_err(|_| {
            FetchError::Internal("Failed to acquire write lock".to_string())
        })?;

        cache.clear();
        Ok(())
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.cache
            .read()
            .map(|cache| {
                cache
                    .values()
                    .filter(|entry| entry.expires_at.map_or(true, |expires| expires > now))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Result<Option<Vec<Row>>, FetchError> {
        self.clear_expired()?;

        let cache = self.cache.read().map_err(|_| {
            FetchError::Internal("Failed to acquire read lock".to_string())
        })?;

        Ok(cache.get(key).map(|entry| entry.rows.clone()))
    }

    fn remember(&self, key: String, rows: &[Row]) -> Result<(), FetchError> {
        let mut cache = self.cache.write().map_err(|_| {
            FetchError::Internal("Failed to acquire write lock".to_string())
        })?;

        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        cache.insert(key, CacheEntry {
            rows: rows.to_vec(),
            expires_at,
        });

        Ok(())
    }
}

/// Requests only share a cache entry when they would accept the same envelopes
fn cache_key(request: &RowRequest) -> String {
    let parameters = request
        .parameters
        .as_ref()
        .map(|params| params.to_string())
        .unwrap_or_default();

    format!("{:?} {:?} {} {}", request.method, request.shape, request.url, parameters)
}

#[async_trait]
impl<F: RowFetcher> RowFetcher for CachedFetcher<F> {
    async fn fetch_rows(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError> {
        let key = cache_key(request);

        if let Some(rows) = self.lookup(&key)? {
            debug!("Cache hit for {}", request.url);
            return Ok(rows);
        }

        let rows = self.inner.fetch_rows(request).await?;
        self.remember(key, &rows)?;

        Ok(rows)
    }
}
