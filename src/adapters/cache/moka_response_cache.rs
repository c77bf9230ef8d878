//! In-process response cache backed by moka.
//!
//! Entries expire 24h after insertion at the latest, and earlier when they
//! go unread for the idle window (60 minutes by default). Each read renews
//! the idle window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::trace;

use crate::domain::models::CacheConfig;
use crate::domain::ports::ResponseCache;

/// Moka-backed [`ResponseCache`].
#[derive(Clone)]
pub struct MokaResponseCache {
    entries: Cache<String, Arc<str>>,
}

impl MokaResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_lifetimes(
            config.max_capacity,
            Duration::from_secs(config.ttl_secs),
            Duration::from_secs(config.idle_secs),
        )
    }

    /// Create with explicit absolute and sliding lifetimes.
    pub fn with_lifetimes(max_capacity: u64, ttl: Duration, idle: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .time_to_idle(idle)
            .build();
        Self { entries }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

#[async_trait]
impl ResponseCache for MokaResponseCache {
    async fn get(&self, key: &str) -> Option<String> {
        let hit = self.entries.get(key).await;
        trace!(cache_key = key, hit = hit.is_some(), "response cache lookup");
        hit.map(|payload| payload.to_string())
    }

    async fn put(&self, key: &str, payload: String) {
        self.entries.insert(key.to_string(), Arc::from(payload)).await;
    }
}
