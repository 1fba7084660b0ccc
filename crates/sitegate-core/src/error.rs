//! Error types for the sitegate-core crate

use sitegate_crypto::CryptoError;
use sitegate_discovery::DiscoveryError;
use sitegate_storage::{ObjectDescriptor, StorageError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `SiteError`
pub type Result<T> = std::result::Result<T, SiteError>;

/// Errors of site-addressed storage operations
#[derive(Error, Debug)]
pub enum SiteError {
    /// The site could not be resolved through discovery
    #[error("site resolution failed: {0}")]
    Resolution(#[from] DiscoveryError),

    /// The site's credentials could not be decrypted
    #[error("credential decryption failed: {0}")]
    Decryption(#[from] CryptoError),

    /// A storage client could not be constructed for the site
    #[error("unable to initialize storage client for site {site}: {message}")]
    ClientInit { site: String, message: String },

    /// The storage backend failed the operation
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Object listing failed after some entries were already received
    #[error("listing interrupted after {} objects: {source}", .objects.len())]
    PartialListing {
        objects: Vec<ObjectDescriptor>,
        #[source]
        source: StorageError,
    },

    /// The operation did not finish within its deadline
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,
}

impl SiteError {
    /// Check if the site, bucket, object or version does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Resolution(err) => err.is_not_found(),
            Self::Storage(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// The storage backend's error, if the failure came from it
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(err) | Self::PartialListing { source: err, .. } => Some(err),
            _ => None,
        }
    }
}
