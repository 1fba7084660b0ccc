//! Error types for the sitegate-discovery crate

use thiserror::Error;

/// Result type alias using `DiscoveryError`
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur while resolving a site
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The requested site is not in the discovery records
    #[error("no matching site found: {0}")]
    SiteNotFound(String),

    /// The discovery service could not be reached
    #[error("unable to contact discovery service: {0}")]
    Transport(String),

    /// The request timed out
    #[error("discovery request timed out: {0}")]
    Timeout(String),

    /// The discovery service answered with a non-success status
    #[error("discovery service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body is not a valid record list
    #[error("unable to decode discovery response: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DiscoveryError {
    /// Whether the site is unknown, as opposed to discovery being unavailable
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SiteNotFound(_))
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DiscoveryError::Timeout(err.to_string())
        } else if err.is_decode() {
            DiscoveryError::Decode(err.to_string())
        } else {
            DiscoveryError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Decode(err.to_string())
    }
}
