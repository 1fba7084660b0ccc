//! Opt-in cache of storage clients keyed by site

use crate::{Result, StorageClientHandle};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CachedClient {
    handle: StorageClientHandle,
    built_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedClient>>>;

/// TTL-bounded client cache.
///
/// Each site has its own async lock, so concurrent requests for a site wait
/// for a single build instead of each building a client.
pub struct ClientCache {
    ttl: Duration,
    slots: DashMap<String, Slot>,
}

impl ClientCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    /// Lifetime of a cached client
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live cached client for `site`, or run `build` and cache its result.
    ///
    /// Failed builds are not cached and leave no slot behind.
    pub async fn get_or_build<F, Fut>(&self, site: &str, build: F) -> Result<StorageClientHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StorageClientHandle>>,
    {
        // Clone the slot out so the map shard is not locked across the await
        let slot: Slot = self.slots.entry(site.to_string()).or_default().clone();
        let mut cached = slot.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.built_at.elapsed() < self.ttl {
                return Ok(entry.handle.clone());
            }
            debug!(site, "Cached storage client expired");
        }

        let handle = match build().await {
            Ok(handle) => handle,
            Err(err) => {
                *cached = None;
                self.slots.remove_if(site, |_, current| Arc::ptr_eq(current, &slot));
                return Err(err);
            }
        };
        *cached = Some(CachedClient {
            handle: handle.clone(),
            built_at: Instant::now(),
        });
        Ok(handle)
    }

    /// Drop the cached client of `site`
    pub fn invalidate(&self, site: &str) {
        if self.slots.remove(site).is_some() {
            debug!(site, "Invalidated cached storage client");
        }
    }

    /// Number of sites with a cache slot
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("ttl", &self.ttl)
            .field("sites", &self.slots.len())
            .finish()
    }
}
