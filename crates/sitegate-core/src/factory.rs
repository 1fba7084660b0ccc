//! Turns a site name into an authenticated storage client

use crate::{Result, SiteError};
use sitegate_crypto::CredentialDecryptor;
use sitegate_discovery::SiteDirectory;
use sitegate_storage::{ObjectStorage, StorageConnection, StorageConnector, StorageError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// An open storage client bound to one site
#[derive(Clone)]
pub struct StorageClientHandle {
    site: String,
    storage: Arc<dyn ObjectStorage>,
}

impl StorageClientHandle {
    pub fn new(site: impl Into<String>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            site: site.into(),
            storage,
        }
    }

    /// Site this client was built for
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Backend endpoint the client talks to
    pub fn endpoint(&self) -> &str {
        self.storage.endpoint()
    }

    /// The storage operations of the site's backend
    pub fn storage(&self) -> &dyn ObjectStorage {
        self.storage.as_ref()
    }
}

impl fmt::Debug for StorageClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClientHandle")
            .field("site", &self.site)
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

/// Resolves sites, decrypts their credentials and connects to their backends
pub struct ClientFactory {
    directory: Arc<dyn SiteDirectory>,
    decryptor: CredentialDecryptor,
    connector: Arc<dyn StorageConnector>,
}

impl ClientFactory {
    pub fn new(
        directory: Arc<dyn SiteDirectory>,
        decryptor: CredentialDecryptor,
        connector: Arc<dyn StorageConnector>,
    ) -> Self {
        Self {
            directory,
            decryptor,
            connector,
        }
    }

    /// The directory sites are resolved against
    pub fn directory(&self) -> &dyn SiteDirectory {
        self.directory.as_ref()
    }

    /// Build a client for `site`.
    ///
    /// Each step only runs if the previous one succeeded: an unresolved site
    /// never reaches decryption, and undecryptable credentials never reach
    /// the storage backend.
    #[instrument(skip(self))]
    pub async fn build_client(&self, site: &str) -> Result<StorageClientHandle> {
        let record = self.directory.resolve_site(site).await?;

        let credential = record.decrypt_credentials(&self.decryptor).map_err(|err| {
            warn!(site, cipher = %self.decryptor.cipher(), "Unable to decrypt site credentials");
            SiteError::Decryption(err)
        })?;

        let connection = StorageConnection::new(record.endpoint.as_str(), credential, record.use_ssl);
        let storage = self
            .connector
            .connect(&connection)
            .await
            .map_err(|err| match err {
                StorageError::InvalidEndpoint(message) => {
                    warn!(site, endpoint = %record.endpoint, "Unable to initialize storage client");
                    SiteError::ClientInit {
                        site: site.to_string(),
                        message,
                    }
                }
                other => SiteError::Storage(other),
            })?;

        debug!(site, endpoint = storage.endpoint(), "Built storage client");
        Ok(StorageClientHandle::new(site, storage))
    }
}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("cipher", &self.decryptor.cipher())
            .finish_non_exhaustive()
    }
}
