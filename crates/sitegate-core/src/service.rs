//! Bucket and object operations addressed by site name

use crate::{
    BucketContents, BucketCreation, ClientCache, ClientFactory, Result, ServiceConfig, SiteContents,
    SiteError, StorageClientHandle,
};
use bytes::Bytes;
use futures::StreamExt;
use sitegate_discovery::SiteSummary;
use sitegate_storage::{BucketDescriptor, ObjectDescriptor, ObjectDownload, ObjectStream, StorageError};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Storage operations facade.
///
/// Every operation resolves its site, builds (or reuses) a client and issues
/// one remote call, all under the configured operation deadline. Nothing is
/// retried.
#[derive(Clone, Debug)]
pub struct StorageService {
    factory: Arc<ClientFactory>,
    cache: Option<Arc<ClientCache>>,
    config: ServiceConfig,
}

impl StorageService {
    pub fn new(factory: ClientFactory, config: ServiceConfig) -> Self {
        let cache = config
            .client_cache_ttl
            .map(|ttl| Arc::new(ClientCache::new(ttl)));
        Self {
            factory: Arc::new(factory),
            cache,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The client cache, when enabled
    pub fn cache(&self) -> Option<&ClientCache> {
        self.cache.as_deref()
    }

    /// Race `operation` against `token`, failing with [`SiteError::Cancelled`]
    /// once the token is cancelled. The losing future is dropped, which
    /// aborts its in-flight remote call.
    pub async fn cancellable<T, F>(token: &CancellationToken, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SiteError::Cancelled),
            result = operation => result,
        }
    }

    async fn with_deadline<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.operation_timeout;
        tokio::time::timeout(timeout, operation)
            .await
            .map_err(|_| SiteError::Timeout(timeout))?
    }

    async fn client(&self, site: &str) -> Result<StorageClientHandle> {
        match &self.cache {
            Some(cache) => {
                cache
                    .get_or_build(site, || self.factory.build_client(site))
                    .await
            }
            None => self.factory.build_client(site).await,
        }
    }

    /// Drop a cached client whose backend stopped answering
    fn storage_failure(&self, site: &str, err: StorageError) -> StorageError {
        if err.is_connectivity() {
            if let Some(cache) = &self.cache {
                cache.invalidate(site);
            }
        }
        err
    }

    /// List the sites advertised by discovery
    #[instrument(skip(self))]
    pub async fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        self.with_deadline(async { Ok(self.factory.directory().list_sites().await?) })
            .await
    }

    /// List the buckets of a site
    #[instrument(skip(self))]
    pub async fn list_buckets(&self, site: &str) -> Result<Vec<BucketDescriptor>> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            let buckets = client
                .storage()
                .list_buckets()
                .await
                .map_err(|err| self.storage_failure(site, err))?;
            debug!(site, count = buckets.len(), "Listed buckets");
            Ok(buckets)
        })
        .await
    }

    /// Recursively list the objects of a bucket.
    ///
    /// An error after some objects were received is reported as
    /// [`SiteError::PartialListing`] carrying those objects.
    #[instrument(skip(self))]
    pub async fn list_objects(&self, site: &str, bucket: &str) -> Result<Vec<ObjectDescriptor>> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            let mut listing = client.storage().list_objects(bucket);
            let mut objects = Vec::new();

            while let Some(item) = listing.next().await {
                match item {
                    Ok(object) => objects.push(object),
                    Err(err) => {
                        let source = self.storage_failure(site, err);
                        if objects.is_empty() {
                            return Err(SiteError::Storage(source));
                        }
                        warn!(site, bucket, received = objects.len(), error = %source, "Object listing interrupted");
                        return Err(SiteError::PartialListing { objects, source });
                    }
                }
            }

            debug!(site, bucket, count = objects.len(), "Listed objects");
            Ok(objects)
        })
        .await
    }

    /// Create a bucket.
    ///
    /// Succeeds as [`BucketCreation::AlreadyOwned`] when creation fails but
    /// the bucket is visible to the site's credentials.
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, site: &str, bucket: &str) -> Result<BucketCreation> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            let storage = client.storage();

            match storage.create_bucket(bucket).await {
                Ok(()) => {
                    info!(site, bucket, "Created bucket");
                    Ok(BucketCreation::Created)
                }
                Err(err) => match storage.bucket_exists(bucket).await {
                    Ok(true) => {
                        info!(site, bucket, "Bucket already owned");
                        Ok(BucketCreation::AlreadyOwned)
                    }
                    _ => Err(SiteError::Storage(self.storage_failure(site, err))),
                },
            }
        })
        .await
    }

    /// Delete an empty bucket
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, site: &str, bucket: &str) -> Result<()> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            client
                .storage()
                .delete_bucket(bucket)
                .await
                .map_err(|err| self.storage_failure(site, err))?;
            info!(site, bucket, "Deleted bucket");
            Ok(())
        })
        .await
    }

    /// Upload an object of known size without buffering it
    #[instrument(skip(self, body))]
    pub async fn upload_object(
        &self,
        site: &str,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        body: ObjectStream,
        size: u64,
    ) -> Result<ObjectDescriptor> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            let stored = client
                .storage()
                .put_object(bucket, key, content_type, body, size)
                .await
                .map_err(|err| self.storage_failure(site, err))?;
            info!(site, bucket, key, size, "Uploaded object");
            Ok(stored)
        })
        .await
    }

    /// Open an object for streaming download.
    ///
    /// The deadline covers opening the object, not draining the body.
    #[instrument(skip(self))]
    pub async fn get_object_stream(&self, site: &str, bucket: &str, key: &str) -> Result<ObjectDownload> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            Ok(client
                .storage()
                .get_object(bucket, key)
                .await
                .map_err(|err| self.storage_failure(site, err))?)
        })
        .await
    }

    /// Download a whole object into memory
    #[instrument(skip(self))]
    pub async fn get_object(&self, site: &str, bucket: &str, key: &str) -> Result<Bytes> {
        self.with_deadline(async {
            let client = self.client(site).await?;
            let download = client
                .storage()
                .get_object(bucket, key)
                .await
                .map_err(|err| self.storage_failure(site, err))?;
            Ok(download
                .collect()
                .await
                .map_err(|err| self.storage_failure(site, err))?)
        })
        .await
    }

    /// Delete an object, or only one of its versions
    #[instrument(skip(self))]
    pub async fn delete_object(
        &self,
        site: &str,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> Result<()> {
        // An empty version id addresses the latest version
        let version_id = version_id.filter(|v| !v.is_empty());
        self.with_deadline(async {
            let client = self.client(site).await?;
            client
                .storage()
                .delete_object(bucket, key, version_id)
                .await
                .map_err(|err| self.storage_failure(site, err))?;
            info!(site, bucket, key, version_id, "Deleted object");
            Ok(())
        })
        .await
    }

    /// The buckets of a site, as one descriptor
    pub async fn site_contents(&self, site: &str) -> Result<SiteContents> {
        Ok(SiteContents {
            site: site.to_string(),
            buckets: self.list_buckets(site).await?,
        })
    }

    /// The objects of a bucket, as one descriptor
    pub async fn bucket_contents(&self, site: &str, bucket: &str) -> Result<BucketContents> {
        Ok(BucketContents {
            site: site.to_string(),
            bucket: bucket.to_string(),
            objects: self.list_objects(site, bucket).await?,
        })
    }
}
