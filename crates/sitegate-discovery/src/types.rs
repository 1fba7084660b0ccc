//! Records published by the discovery service

use serde::{Deserialize, Serialize};
use sitegate_crypto::{CredentialDecryptor, CryptoError, EncryptedSecret, ResolvedCredential};

/// A discoverable site, as shown to callers listing sites
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    /// Site name
    pub name: String,
    /// Advertised site URL
    #[serde(default)]
    pub url: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// Connection record of one site.
///
/// The access key and secret stay encrypted inside the record and can only
/// leave it through [`DiscoveryRecord::decrypt_credentials`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// Site name
    pub name: String,
    /// Advertised site URL
    #[serde(default)]
    pub url: String,
    /// Storage backend address (host[:port], or a full URL)
    #[serde(default)]
    pub endpoint: String,
    // Missing credentials fail this record's decryption, not the whole listing
    #[serde(default)]
    access_key: EncryptedSecret,
    #[serde(default)]
    access_secret: EncryptedSecret,
    /// Whether the storage backend is reached over TLS
    #[serde(default)]
    pub use_ssl: bool,
}

impl DiscoveryRecord {
    /// Create a record
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: EncryptedSecret,
        access_secret: EncryptedSecret,
        use_ssl: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            endpoint: endpoint.into(),
            access_key,
            access_secret,
            use_ssl,
        }
    }

    /// Set the advertised site URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Decrypt the embedded access key and secret
    pub fn decrypt_credentials(
        &self,
        decryptor: &CredentialDecryptor,
    ) -> std::result::Result<ResolvedCredential, CryptoError> {
        decryptor.decrypt_pair(&self.access_key, &self.access_secret)
    }
}
