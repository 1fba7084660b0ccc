//! Application state

use crate::config::GatewayConfig;
use crate::middleware::{create_rate_limiter, KeyedRateLimiter};
use sitegate_core::{ClientFactory, StorageService};
use sitegate_discovery::DiscoveryClient;
use sitegate_storage::{MemoryConnector, S3Connector, StorageConnector};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Site-addressed storage operations
    pub service: StorageService,
    /// In-memory backends, when the gateway runs without real storage
    pub memory: Option<MemoryConnector>,
    /// Per-client request limiter
    pub rate_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let directory = DiscoveryClient::new(config.discovery_config())?;
        let decryptor = config.decryptor()?;

        if config.discovery_secret.is_empty() {
            warn!("No discovery secret configured, site credentials will not decrypt");
        }

        let memory = config.memory_store.then(MemoryConnector::new);
        let connector: Arc<dyn StorageConnector> = match &memory {
            Some(memory) => {
                warn!("Using in-memory storage - data will NOT persist!");
                Arc::new(memory.clone())
            }
            None => Arc::new(S3Connector::new(config.region.as_str())),
        };

        info!(
            discovery_url = %config.discovery_url,
            cipher = %decryptor.cipher(),
            region = %config.region,
            client_cache_ttl_secs = ?config.client_cache_ttl_secs,
            "Storage service configured"
        );

        let service = StorageService::new(
            ClientFactory::new(Arc::new(directory), decryptor, connector),
            config.service_config(),
        );

        Ok(Self {
            rate_limiter: create_rate_limiter(config.rate),
            config,
            service,
            memory,
        })
    }

    /// Create state around an existing service
    pub fn with_service(config: GatewayConfig, service: StorageService) -> Self {
        Self {
            rate_limiter: create_rate_limiter(config.rate),
            config,
            service,
            memory: None,
        }
    }
}
