//! S3-compatible storage backend built on `aws-sdk-s3`

use crate::{
    types::trim_etag, BucketDescriptor, ObjectDescriptor, ObjectDownload, ObjectStorage,
    ObjectStream, Result, StorageConnection, StorageConnector, StorageError, DEFAULT_REGION,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{
        http::HttpResponse, retry::RetryConfig, BehaviorVersion, Credentials, Region,
        RequestChecksumCalculation,
    },
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::RequestId,
    primitives::{ByteStream, DateTime as SmithyDateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use http_body::Frame;
use http_body_util::StreamBody;
use std::sync::Arc;
use sync_wrapper::SyncStream;
use tracing::{debug, instrument};

/// Provider name attached to credentials obtained from discovery
const CREDENTIALS_PROVIDER: &str = "sitegate-discovery";

/// Client for one S3-compatible backend
#[derive(Clone, Debug)]
pub struct S3Storage {
    client: Client,
    endpoint: String,
    region: String,
}

impl S3Storage {
    /// Build a client for the connection's endpoint, credentials and TLS setting.
    ///
    /// Uses path-style addressing and static credentials. The SDK's own
    /// retries are disabled so every failure reaches the caller unchanged.
    pub fn connect(connection: &StorageConnection, region: &str) -> Result<Self> {
        let endpoint = connection.endpoint_url()?;
        let endpoint = endpoint.as_str().trim_end_matches('/').to_string();

        let credentials = Credentials::new(
            connection.credential().access_key(),
            connection.credential().secret_key(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(&endpoint)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        debug!(endpoint = %endpoint, region = %region, "Initialized S3 client");

        Ok(Self {
            client: Client::from_conf(config),
            endpoint,
            region: region.to_string(),
        })
    }

    /// Get the region requests are signed for
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_buckets(&self) -> Result<Vec<BucketDescriptor>> {
        let output = self.client.list_buckets().send().await.map_err(map_sdk_error)?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketDescriptor {
                name: bucket.name().unwrap_or_default().to_string(),
                creation_date: bucket.creation_date().and_then(to_chrono),
            })
            .collect())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service)) if service.err().is_not_found() => Ok(false),
            Err(err) => Err(map_sdk_error(err)),
        }
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    fn list_objects(&self, bucket: &str) -> BoxStream<'static, Result<ObjectDescriptor>> {
        // No delimiter: the listing is recursive over every key in the bucket
        let pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        stream::unfold(Some(pages), |state| async move {
            let mut pages = state?;
            match pages.next().await? {
                Ok(page) => {
                    let objects: Vec<Result<ObjectDescriptor>> = page
                        .contents()
                        .iter()
                        .map(|object| {
                            Ok(ObjectDescriptor {
                                key: object.key().unwrap_or_default().to_string(),
                                size: object.size().map_or(0, |s| s.max(0) as u64),
                                last_modified: object.last_modified().and_then(to_chrono),
                                etag: object.e_tag().map(trim_etag),
                                version_id: None,
                                content_type: None,
                            })
                        })
                        .collect();
                    Some((stream::iter(objects), Some(pages)))
                }
                Err(err) => Some((stream::iter(vec![Err(map_sdk_error(err))]), None)),
            }
        })
        .flatten()
        .boxed()
    }

    #[instrument(skip(self, body), fields(endpoint = %self.endpoint))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        body: ObjectStream,
        size: u64,
    ) -> Result<ObjectDescriptor> {
        let content_length = i64::try_from(size)
            .map_err(|_| StorageError::InvalidResponse(format!("object size {} too large", size)))?;

        let frames = StreamBody::new(SyncStream::new(body.map_ok(Frame::data)));

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(content_length)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from_body_1_x(frames))
            .send()
            .await
            .map_err(map_sdk_error)?;

        debug!(bucket = %bucket, key = %key, size, "Uploaded object");

        Ok(ObjectDescriptor {
            key: key.to_string(),
            size,
            last_modified: Some(Utc::now()),
            etag: output.e_tag().map(trim_etag),
            version_id: output.version_id().map(str::to_string),
            content_type: content_type.map(str::to_string),
        })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectDownload> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let descriptor = ObjectDescriptor {
            key: key.to_string(),
            size: output.content_length().map_or(0, |s| s.max(0) as u64),
            last_modified: output.last_modified().and_then(to_chrono),
            etag: output.e_tag().map(trim_etag),
            version_id: output.version_id().map(str::to_string),
            content_type: output.content_type().map(str::to_string),
        };

        let body = stream::unfold(output.body, |mut body| async move {
            body.next()
                .await
                .map(|chunk| (chunk.map_err(std::io::Error::other), body))
        })
        .boxed();

        Ok(ObjectDownload { descriptor, body })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.map(str::to_string))
            .bypass_governance_retention(true)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }
}

/// Connector producing [`S3Storage`] clients
#[derive(Clone, Debug)]
pub struct S3Connector {
    region: String,
}

impl S3Connector {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl Default for S3Connector {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

#[async_trait]
impl StorageConnector for S3Connector {
    async fn connect(&self, connection: &StorageConnection) -> Result<Arc<dyn ObjectStorage>> {
        let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::connect(connection, &self.region)?);
        Ok(storage)
    }
}

/// Convert an SDK failure, keeping the backend's code, message and request id
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let request_id = err.request_id().map(str::to_string);
    match err {
        SdkError::ServiceError(service) => {
            let status = service.raw().status().as_u16();
            let cause = service.err();
            let code = cause.code().map(str::to_string).unwrap_or_else(|| match status {
                404 => "NotFound".to_string(),
                403 => "AccessDenied".to_string(),
                _ => format!("HTTP{}", status),
            });
            StorageError::Service {
                code,
                message: cause.message().unwrap_or("no message").to_string(),
                status: Some(status),
                request_id,
            }
        }
        SdkError::TimeoutError(_) => {
            StorageError::Timeout(DisplayErrorContext(&err).to_string())
        }
        other => StorageError::Transport(DisplayErrorContext(&other).to_string()),
    }
}

fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
}
