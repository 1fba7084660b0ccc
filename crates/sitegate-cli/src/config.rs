//! Gateway configuration

use serde::{Deserialize, Serialize};
use sitegate_core::ServiceConfig;
use sitegate_crypto::{CredentialDecryptor, CryptoError, SharedPassword};
use sitegate_discovery::DiscoveryConfig;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables overriding configuration keys
pub const ENV_PREFIX: &str = "SITEGATE";

/// Gateway server configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Path prefix all storage routes are mounted under
    pub base: String,
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Verbosity: 0 info, 1 debug, 2 and above trace
    pub verbose: u8,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Rate limit (requests per second per client address)
    pub rate: u32,
    /// Discovery service base URL
    pub discovery_url: String,
    /// Password the discovery records are encrypted with
    pub discovery_secret: String,
    /// Cipher the discovery records are encrypted with
    pub discovery_cipher: String,
    /// Region storage requests are signed for
    pub region: String,
    /// Discovery request timeout (seconds)
    pub discovery_timeout_secs: u64,
    /// Deadline of each storage operation (seconds)
    pub operation_timeout_secs: u64,
    /// Lifetime of cached storage clients (seconds); unset disables the cache
    pub client_cache_ttl_secs: Option<u64>,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Serve every site from in-memory storage (for development)
    pub memory_store: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base: String::new(),
            host: "0.0.0.0".to_string(),
            port: 8340,
            verbose: 0,
            log_json: false,
            rate: 100,
            discovery_url: "http://localhost:8320".to_string(),
            discovery_secret: String::new(),
            discovery_cipher: "aes".to_string(),
            region: sitegate_storage::DEFAULT_REGION.to_string(),
            discovery_timeout_secs: 30,
            operation_timeout_secs: 300,
            client_cache_ttl_secs: None,
            max_body_size: 1024 * 1024 * 1024, // 1 GB
            memory_store: false,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from an optional JSON file, overridden by
    /// `SITEGATE_*` environment variables. Missing keys keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(true),
            );
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Check values the server cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.rate > 0, "rate must be at least 1 request per second");
        anyhow::ensure!(self.operation_timeout_secs > 0, "operation_timeout_secs must be positive");
        anyhow::ensure!(
            self.base.is_empty() || self.base.starts_with('/'),
            "base must start with '/'"
        );
        url::Url::parse(&self.discovery_url)
            .map_err(|e| anyhow::anyhow!("invalid discovery_url {}: {}", self.discovery_url, e))?;
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Route prefix without a trailing slash; empty when routes are at the root
    pub fn route_prefix(&self) -> &str {
        self.base.trim_end_matches('/')
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig::with_url(self.discovery_url.as_str())
            .with_timeout(Duration::from_secs(self.discovery_timeout_secs))
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut service = ServiceConfig::default()
            .with_region(self.region.as_str())
            .with_operation_timeout(Duration::from_secs(self.operation_timeout_secs));
        if let Some(ttl) = self.client_cache_ttl_secs {
            service = service.with_client_cache(Duration::from_secs(ttl));
        }
        service
    }

    /// Build the decryptor for discovery records
    pub fn decryptor(&self) -> Result<CredentialDecryptor, CryptoError> {
        CredentialDecryptor::from_cipher_name(
            SharedPassword::new(self.discovery_secret.as_str()),
            &self.discovery_cipher,
        )
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base", &self.base)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("verbose", &self.verbose)
            .field("rate", &self.rate)
            .field("discovery_url", &self.discovery_url)
            .field("discovery_secret", &"[REDACTED]")
            .field("discovery_cipher", &self.discovery_cipher)
            .field("region", &self.region)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("client_cache_ttl_secs", &self.client_cache_ttl_secs)
            .field("memory_store", &self.memory_store)
            .finish_non_exhaustive()
    }
}
