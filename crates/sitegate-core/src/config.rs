//! Storage service configuration

use sitegate_storage::DEFAULT_REGION;
use std::time::Duration;

/// Configuration of a [`crate::StorageService`]
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Region requests to the storage backends are signed for
    pub region: String,
    /// Deadline applied to every operation
    pub operation_timeout: Duration,
    /// Lifetime of cached storage clients; `None` builds a client per operation
    pub client_cache_ttl: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            operation_timeout: Duration::from_secs(300),
            client_cache_ttl: None,
        }
    }
}

impl ServiceConfig {
    /// Set the signing region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the per-operation deadline
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Enable the client cache with the given TTL
    pub fn with_client_cache(mut self, ttl: Duration) -> Self {
        self.client_cache_ttl = Some(ttl);
        self
    }
}
