//! Bucket and object descriptors

use crate::{Result, StorageError};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single-pass stream of object bytes
pub type ObjectStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDescriptor {
    /// Bucket name
    pub name: String,
    /// Creation date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
}

/// An object in a bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag, without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Version ID (if versioning enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectDescriptor {
    /// Create a descriptor with only a key and size
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            etag: None,
            version_id: None,
            content_type: None,
        }
    }
}

/// An object opened for download
pub struct ObjectDownload {
    /// Metadata reported with the object
    pub descriptor: ObjectDescriptor,
    /// Object content
    pub body: ObjectStream,
}

impl ObjectDownload {
    /// Read the whole object into memory
    pub async fn collect(self) -> Result<Bytes> {
        let capacity = usize::try_from(self.descriptor.size).unwrap_or(0);
        let buffer = self
            .body
            .try_fold(BytesMut::with_capacity(capacity), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await
            .map_err(StorageError::Io)?;
        Ok(buffer.freeze())
    }
}

impl fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Strip the quotes S3 puts around ETags
pub(crate) fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}
