//! In-memory storage backend for testing and development

use crate::{
    BucketDescriptor, ObjectDescriptor, ObjectDownload, ObjectStorage, ObjectStream, Result,
    StorageConnection, StorageConnector, StorageError,
};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Content type recorded when an upload does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

#[derive(Clone, Debug)]
struct StoredVersion {
    version_id: String,
    data: Bytes,
    etag: String,
    content_type: String,
    last_modified: DateTime<Utc>,
}

impl StoredVersion {
    fn descriptor(&self, key: &str) -> ObjectDescriptor {
        ObjectDescriptor {
            key: key.to_string(),
            size: self.data.len() as u64,
            last_modified: Some(self.last_modified),
            etag: Some(self.etag.clone()),
            version_id: Some(self.version_id.clone()),
            content_type: Some(self.content_type.clone()),
        }
    }
}

#[derive(Debug)]
struct MemoryBucket {
    created: DateTime<Utc>,
    /// Versions per key, oldest first
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

/// An in-memory object store with versioned objects
#[derive(Debug)]
pub struct MemoryStorage {
    endpoint: String,
    buckets: RwLock<BTreeMap<String, MemoryBucket>>,
    next_version: AtomicU64,
}

impl MemoryStorage {
    /// Create an empty store answering for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            buckets: RwLock::new(BTreeMap::new()),
            next_version: AtomicU64::new(1),
        }
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }

    /// Number of stored versions of a key
    pub fn version_count(&self, bucket: &str, key: &str) -> usize {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map_or(0, Vec::len)
    }

    fn no_such_bucket(bucket: &str) -> StorageError {
        StorageError::service(
            "NoSuchBucket",
            format!("The specified bucket does not exist: {}", bucket),
            404,
        )
    }

    fn no_such_key(key: &str) -> StorageError {
        StorageError::service(
            "NoSuchKey",
            format!("The specified key does not exist: {}", key),
            404,
        )
    }

    fn version_id(&self) -> String {
        format!("{:016x}", self.next_version.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_buckets(&self) -> Result<Vec<BucketDescriptor>> {
        Ok(self
            .buckets
            .read()
            .iter()
            .map(|(name, bucket)| BucketDescriptor {
                name: name.clone(),
                creation_date: Some(bucket.created),
            })
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.read().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        if buckets.contains_key(bucket) {
            return Err(StorageError::service(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it",
                409,
            ));
        }
        buckets.insert(
            bucket.to_string(),
            MemoryBucket {
                created: Utc::now(),
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let existing = buckets.get(bucket).ok_or_else(|| Self::no_such_bucket(bucket))?;
        if !existing.objects.is_empty() {
            return Err(StorageError::service(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
                409,
            ));
        }
        buckets.remove(bucket);
        Ok(())
    }

    fn list_objects(&self, bucket: &str) -> BoxStream<'static, Result<ObjectDescriptor>> {
        let snapshot: Vec<Result<ObjectDescriptor>> = match self.buckets.read().get(bucket) {
            Some(existing) => existing
                .objects
                .iter()
                .filter_map(|(key, versions)| versions.last().map(|v| Ok(v.descriptor(key))))
                .collect(),
            None => vec![Err(Self::no_such_bucket(bucket))],
        };
        stream::iter(snapshot).boxed()
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        body: ObjectStream,
        size: u64,
    ) -> Result<ObjectDescriptor> {
        if !self.buckets.read().contains_key(bucket) {
            return Err(Self::no_such_bucket(bucket));
        }

        let data = body
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await?
            .freeze();

        if data.len() as u64 != size {
            return Err(StorageError::service(
                "IncompleteBody",
                format!("declared {} bytes but received {}", size, data.len()),
                400,
            ));
        }

        let version = StoredVersion {
            version_id: self.version_id(),
            etag: hex::encode(Md5::digest(&data)),
            data,
            content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            last_modified: Utc::now(),
        };
        let descriptor = version.descriptor(key);

        // The bucket may have been deleted while the body was streaming
        let mut buckets = self.buckets.write();
        let existing = buckets.get_mut(bucket).ok_or_else(|| Self::no_such_bucket(bucket))?;
        existing.objects.entry(key.to_string()).or_default().push(version);

        Ok(descriptor)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectDownload> {
        let buckets = self.buckets.read();
        let existing = buckets.get(bucket).ok_or_else(|| Self::no_such_bucket(bucket))?;
        let version = existing
            .objects
            .get(key)
            .and_then(|versions| versions.last())
            .ok_or_else(|| Self::no_such_key(key))?;

        Ok(ObjectDownload {
            descriptor: version.descriptor(key),
            body: stream::once(futures::future::ready(Ok(version.data.clone()))).boxed(),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()> {
        let mut buckets = self.buckets.write();
        let existing = buckets.get_mut(bucket).ok_or_else(|| Self::no_such_bucket(bucket))?;

        let Some(versions) = existing.objects.get_mut(key) else {
            // Deleting an absent key succeeds
            return Ok(());
        };

        match version_id {
            Some(id) => {
                let position = versions
                    .iter()
                    .position(|v| v.version_id == id)
                    .ok_or_else(|| {
                        StorageError::service(
                            "NoSuchVersion",
                            format!("The specified version does not exist: {}", id),
                            404,
                        )
                    })?;
                versions.remove(position);
            }
            None => {
                versions.pop();
            }
        }

        if versions.is_empty() {
            existing.objects.remove(key);
        }
        Ok(())
    }
}

/// Connector handing out shared [`MemoryStorage`] instances, one per endpoint
#[derive(Clone, Default)]
pub struct MemoryConnector {
    stores: Arc<DashMap<String, Arc<MemoryStorage>>>,
    required_credential: Option<(String, String)>,
    connects: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject connections whose credentials differ from these
    pub fn with_required_credential(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.required_credential = Some((access_key.into(), secret_key.into()));
        self
    }

    /// Get (or create) the store behind an endpoint, as written in discovery records
    pub fn storage(&self, endpoint: &str) -> Arc<MemoryStorage> {
        self.stores
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(MemoryStorage::new(endpoint)))
            .clone()
    }

    /// Number of clients built so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnector")
            .field("stores", &self.stores.len())
            .field("connects", &self.connect_count())
            .finish()
    }
}

#[async_trait]
impl StorageConnector for MemoryConnector {
    async fn connect(&self, connection: &StorageConnection) -> Result<Arc<dyn ObjectStorage>> {
        connection.endpoint_url()?;

        if let Some((access_key, secret_key)) = &self.required_credential {
            let credential = connection.credential();
            if credential.access_key() != access_key || credential.secret_key() != secret_key {
                return Err(StorageError::service(
                    "InvalidAccessKeyId",
                    "The access key ID you provided does not exist in our records",
                    403,
                ));
            }
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        let storage: Arc<dyn ObjectStorage> = self.storage(connection.endpoint());
        Ok(storage)
    }
}
