//! # Sitegate Storage
//!
//! Object storage backends for the sitegate gateway.
//!
//! This crate provides:
//! - **ObjectStorage trait**: the bucket/object operations a site backend offers
//! - **StorageConnector trait**: turns a decrypted [`StorageConnection`] into a
//!   live client
//! - **S3Storage**: any S3-compatible backend, via `aws-sdk-s3`
//! - **MemoryStorage**: an in-memory backend for tests and development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        StorageService (core)            │
//! ├─────────────────────────────────────────┤
//! │   StorageConnector → ObjectStorage      │
//! ├────────────────────┬────────────────────┤
//! │     S3Storage      │   MemoryStorage    │
//! ├────────────────────┴────────────────────┤
//! │  S3-compatible wire API │ process memory│
//! └─────────────────────────────────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod s3;
pub mod types;

pub use connection::StorageConnection;
pub use error::{Result, StorageError};
pub use memory::{MemoryConnector, MemoryStorage};
pub use s3::{S3Connector, S3Storage};
pub use types::{BucketDescriptor, ObjectDescriptor, ObjectDownload, ObjectStream};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Default region used to sign requests when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bucket and object operations against one storage backend
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Base URL of the backend this client talks to
    fn endpoint(&self) -> &str;

    /// List all buckets visible to the client's credentials
    async fn list_buckets(&self) -> Result<Vec<BucketDescriptor>>;

    /// Check whether a bucket exists and is accessible
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Recursively list every object in a bucket.
    ///
    /// The stream ends after the first error.
    fn list_objects(&self, bucket: &str) -> BoxStream<'static, Result<ObjectDescriptor>>;

    /// Upload an object of known size from a byte stream
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        body: ObjectStream,
        size: u64,
    ) -> Result<ObjectDescriptor>;

    /// Open an object for download
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectDownload>;

    /// Delete an object, or one version of it when `version_id` is given
    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()>;
}

/// Builds storage clients from decrypted connection records
#[async_trait]
pub trait StorageConnector: Send + Sync {
    /// Construct a client bound to the connection's endpoint and credentials
    async fn connect(&self, connection: &StorageConnection) -> Result<Arc<dyn ObjectStorage>>;
}
