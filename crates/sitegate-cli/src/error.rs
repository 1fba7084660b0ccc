//! API error type and its JSON rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sitegate_core::SiteError;
use sitegate_discovery::DiscoveryError;
use sitegate_storage::StorageError;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("Content-Length header is required")]
    LengthRequired,

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Please reduce your request rate")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Site(err) => site_status(err),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::LengthRequired => StatusCode::LENGTH_REQUIRED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code reported in the response body
    pub fn error_code(&self) -> String {
        match self {
            Self::Site(err) => site_code(err),
            Self::BadRequest(_) => "BadRequest".to_string(),
            Self::LengthRequired => "MissingContentLength".to_string(),
            Self::PayloadTooLarge { .. } => "EntityTooLarge".to_string(),
            Self::RateLimited => "SlowDown".to_string(),
            Self::Internal(_) => "InternalError".to_string(),
        }
    }
}

fn site_status(err: &SiteError) -> StatusCode {
    match err {
        SiteError::Resolution(DiscoveryError::SiteNotFound(_)) => StatusCode::NOT_FOUND,
        SiteError::Resolution(DiscoveryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        SiteError::Resolution(DiscoveryError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        SiteError::Resolution(_) => StatusCode::BAD_GATEWAY,
        SiteError::Decryption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SiteError::ClientInit { .. } => StatusCode::BAD_GATEWAY,
        SiteError::Storage(err) => storage_status(err),
        SiteError::PartialListing { .. } => StatusCode::PARTIAL_CONTENT,
        SiteError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SiteError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::Service { code, .. } => {
            if err.is_not_found() {
                StatusCode::NOT_FOUND
            } else if err.is_access_denied() {
                StatusCode::FORBIDDEN
            } else if matches!(
                code.as_str(),
                "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" | "BucketNotEmpty"
            ) {
                StatusCode::CONFLICT
            } else {
                StatusCode::BAD_REQUEST
            }
        }
        StorageError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        StorageError::Transport(_)
        | StorageError::InvalidEndpoint(_)
        | StorageError::InvalidResponse(_)
        | StorageError::Io(_) => StatusCode::BAD_GATEWAY,
    }
}

fn site_code(err: &SiteError) -> String {
    let code = match err {
        SiteError::Resolution(DiscoveryError::SiteNotFound(_)) => "SiteNotFound",
        SiteError::Resolution(_) => "DiscoveryUnavailable",
        SiteError::Decryption(_) => "DecryptionFailed",
        SiteError::ClientInit { .. } => "ClientInitFailed",
        SiteError::Storage(StorageError::Service { code, .. }) => return code.clone(),
        SiteError::Storage(StorageError::Timeout(_)) | SiteError::Timeout(_) => "RequestTimeout",
        SiteError::Storage(_) => "StorageUnavailable",
        SiteError::PartialListing { .. } => "PartialListing",
        SiteError::Cancelled => "Cancelled",
    };
    code.to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            error!(code = %code, error = %self, "Request failed");
        } else {
            warn!(code = %code, error = %self, "Request rejected");
        }

        let body = match self {
            // The entries received before the failure are still returned
            ApiError::Site(SiteError::PartialListing { objects, source }) => json!({
                "status": "partial",
                "error": source.to_string(),
                "code": code,
                "data": objects,
            }),
            other => json!({
                "status": "fail",
                "error": other.to_string(),
                "code": code,
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegate_crypto::CryptoError;
    use std::time::Duration;

    fn status(err: SiteError) -> StatusCode {
        ApiError::from(err).status_code()
    }

    #[test]
    fn test_resolution_statuses() {
        assert_eq!(
            status(DiscoveryError::SiteNotFound("cornell".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(DiscoveryError::Transport("refused".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(DiscoveryError::Decode("eof".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_storage_statuses() {
        assert_eq!(
            status(StorageError::service("NoSuchBucket", "missing", 404).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StorageError::service("AccessDenied", "nope", 403).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(StorageError::service("BucketNotEmpty", "full", 409).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StorageError::service("InvalidBucketName", "bad", 400).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StorageError::Transport("reset".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_other_statuses() {
        assert_eq!(
            status(CryptoError::Decryption("tag mismatch".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(SiteError::Timeout(Duration::from_secs(1))), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status(SiteError::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::LengthRequired.status_code(), StatusCode::LENGTH_REQUIRED);
    }

    #[test]
    fn test_service_error_code_passes_through() {
        let err = ApiError::from(SiteError::from(StorageError::service("NoSuchKey", "gone", 404)));
        assert_eq!(err.error_code(), "NoSuchKey");
    }
}
