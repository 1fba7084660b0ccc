//! Authenticated description of how to reach one site's storage backend

use crate::{Result, StorageError};
use sitegate_crypto::ResolvedCredential;
use url::Url;

/// Endpoint, decrypted credentials and TLS flag of one backend.
///
/// Built once per resolution and consumed by a [`crate::StorageConnector`].
#[derive(Clone, Debug)]
pub struct StorageConnection {
    endpoint: String,
    credential: ResolvedCredential,
    use_ssl: bool,
}

impl StorageConnection {
    pub fn new(endpoint: impl Into<String>, credential: ResolvedCredential, use_ssl: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
            use_ssl,
        }
    }

    /// Endpoint as published, usually `host[:port]`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential(&self) -> &ResolvedCredential {
        &self.credential
    }

    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    /// Full base URL of the backend.
    ///
    /// A bare `host[:port]` gets `https://` or `http://` from the TLS flag.
    /// An endpoint that already carries a scheme must agree with the flag, and
    /// the endpoint may not carry a path.
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(StorageError::InvalidEndpoint("endpoint is empty".to_string()));
        }

        let scheme = if self.use_ssl { "https" } else { "http" };
        let raw = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("{}://{}", scheme, endpoint)
        };

        let url = Url::parse(&raw)
            .map_err(|e| StorageError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        if url.scheme() != scheme {
            return Err(StorageError::InvalidEndpoint(format!(
                "{}: scheme {} does not match use_ssl={}",
                endpoint,
                url.scheme(),
                self.use_ssl
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(StorageError::InvalidEndpoint(format!("{}: missing host", endpoint)));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(StorageError::InvalidEndpoint(format!(
                "{}: endpoint must not contain a path",
                endpoint
            )));
        }

        Ok(url)
    }
}
