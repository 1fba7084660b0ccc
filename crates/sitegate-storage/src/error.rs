//! Error types for the sitegate-storage crate

use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while talking to a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend rejected the request with a structured error
    #[error("storage error ({code}): {message}")]
    Service {
        code: String,
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },

    /// The backend could not be reached
    #[error("storage transport error: {0}")]
    Transport(String),

    /// The request timed out
    #[error("storage request timed out: {0}")]
    Timeout(String),

    /// The connection endpoint is not usable
    #[error("invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    /// The backend answered with something that could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// IO error while streaming object data
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a service error with an S3 error code
    pub fn service(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
            status: Some(status),
            request_id: None,
        }
    }

    /// The backend's error code, if it reported one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The HTTP status the backend answered with, if known
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code(),
            Some("NoSuchBucket" | "NoSuchKey" | "NoSuchVersion" | "NotFound")
        ) || self.status() == Some(404)
    }

    /// Check if this is an access denied error
    pub fn is_access_denied(&self) -> bool {
        matches!(self.code(), Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"))
    }

    /// Whether the failure happened below the storage API, so a cached
    /// client for this backend should not be trusted any more
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}
