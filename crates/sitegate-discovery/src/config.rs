//! Discovery client configuration

use std::time::Duration;

/// Configuration for the discovery service connection
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Base URL of the discovery service (e.g., "http://localhost:8320")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8320".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DiscoveryConfig {
    /// Create with a custom base URL
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the site listing endpoint
    pub fn sites_url(&self) -> String {
        format!("{}/sites", self.base_url.trim_end_matches('/'))
    }
}
