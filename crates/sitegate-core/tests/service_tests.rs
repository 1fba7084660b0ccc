//! Storage service tests over a mock discovery service and in-memory backends
//!
//! Tests cover:
//! - Resolution, decryption and storage failures surfacing separately
//! - Idempotent bucket creation
//! - Upload/download and versioned delete
//! - Partial listings, deadlines, cancellation and the client cache

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use sitegate_core::{
    BucketCreation, CancellationToken, ClientFactory, ServiceConfig, SiteError, StorageService,
};
use sitegate_crypto::{CredentialCipher, CredentialDecryptor, ResolvedCredential, SharedPassword};
use sitegate_discovery::{DiscoveryClient, DiscoveryRecord};
use sitegate_storage::{
    BucketDescriptor, MemoryConnector, MemoryStorage, ObjectDescriptor, ObjectDownload,
    ObjectStorage, ObjectStream, StorageConnection, StorageConnector, StorageError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PASSWORD: &str = "discovery-shared-secret";

fn decryptor(password: &str) -> CredentialDecryptor {
    CredentialDecryptor::new(SharedPassword::new(password), CredentialCipher::Aes256Gcm)
}

fn record(name: &str, endpoint: &str, use_ssl: bool) -> DiscoveryRecord {
    let (key, secret) = decryptor(PASSWORD)
        .encrypt_pair(&ResolvedCredential::new("AKIACORNELL", "cornell-secret"))
        .unwrap();
    DiscoveryRecord::new(name, endpoint, key, secret, use_ssl)
}

async fn discovery(records: Vec<DiscoveryRecord>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .mount(&server)
        .await;
    server
}

fn service_with(
    server: &MockServer,
    password: &str,
    connector: Arc<dyn StorageConnector>,
    config: ServiceConfig,
) -> StorageService {
    let directory = DiscoveryClient::from_url(&server.uri()).unwrap();
    StorageService::new(
        ClientFactory::new(Arc::new(directory), decryptor(password), connector),
        config,
    )
}

fn service(server: &MockServer, connector: &MemoryConnector) -> StorageService {
    service_with(
        server,
        PASSWORD,
        Arc::new(connector.clone()),
        ServiceConfig::default(),
    )
}

fn body_of(data: Bytes) -> ObjectStream {
    let chunks: Vec<std::io::Result<Bytes>> = data
        .chunks(64 * 1024)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks).boxed()
}

#[tokio::test]
async fn test_create_bucket_on_resolved_site() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new().with_required_credential("AKIACORNELL", "cornell-secret");
    let service = service(&server, &connector);

    let created = service.create_bucket("cornell", "archive").await.unwrap();
    assert_eq!(created, BucketCreation::Created);
    assert!(connector.storage("s3.example.org").bucket_exists("archive").await.unwrap());
}

#[tokio::test]
async fn test_create_bucket_twice_succeeds_twice() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);

    assert_eq!(
        service.create_bucket("cornell", "archive").await.unwrap(),
        BucketCreation::Created
    );
    assert_eq!(
        service.create_bucket("cornell", "archive").await.unwrap(),
        BucketCreation::AlreadyOwned
    );
}

#[tokio::test]
async fn test_unknown_site_surfaces_resolution_error() {
    let server = discovery(vec![]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);

    let err = service.list_buckets("cornell").await.unwrap_err();
    assert!(matches!(err, SiteError::Resolution(_)));
    assert!(err.is_not_found());
    assert_eq!(connector.connect_count(), 0);
}

#[tokio::test]
async fn test_wrong_password_performs_no_storage_call() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service_with(
        &server,
        "not-the-password",
        Arc::new(connector.clone()),
        ServiceConfig::default(),
    );

    let err = service.create_bucket("cornell", "archive").await.unwrap_err();
    assert!(matches!(err, SiteError::Decryption(_)));
    assert_eq!(connector.connect_count(), 0);
    assert_eq!(connector.storage("s3.example.org").bucket_count(), 0);
}

#[tokio::test]
async fn test_site_without_credentials_fails_decryption() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "other", "endpoint": "s3.other.org"},
            record("cornell", "s3.example.org", true),
        ])))
        .mount(&server)
        .await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);

    let err = service.list_buckets("other").await.unwrap_err();
    assert!(matches!(err, SiteError::Decryption(_)));
    assert_eq!(connector.connect_count(), 0);

    service.list_buckets("cornell").await.unwrap();
}

#[tokio::test]
async fn test_upload_then_download_returns_same_bytes() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);
    service.create_bucket("cornell", "archive").await.unwrap();

    let data: Bytes = (0..1_048_576u32).map(|i| (i % 251) as u8).collect::<Vec<_>>().into();
    let stored = service
        .upload_object(
            "cornell",
            "archive",
            "report.zip",
            Some("application/zip"),
            body_of(data.clone()),
            1_048_576,
        )
        .await
        .unwrap();
    assert_eq!(stored.size, 1_048_576);
    assert_eq!(stored.content_type.as_deref(), Some("application/zip"));

    let downloaded = service.get_object("cornell", "archive", "report.zip").await.unwrap();
    assert_eq!(downloaded, data);

    let download = service
        .get_object_stream("cornell", "archive", "report.zip")
        .await
        .unwrap();
    assert_eq!(download.descriptor.size, 1_048_576);
    assert_eq!(download.collect().await.unwrap(), data);
}

#[tokio::test]
async fn test_list_buckets_on_empty_backend() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);

    assert!(service.list_buckets("cornell").await.unwrap().is_empty());
    let contents = service.site_contents("cornell").await.unwrap();
    assert_eq!(contents.site, "cornell");
    assert!(contents.buckets.is_empty());
}

#[tokio::test]
async fn test_bucket_contents_lists_recursively() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);
    service.create_bucket("cornell", "archive").await.unwrap();

    for key in ["2024/q1/report.pdf", "readme.txt"] {
        service
            .upload_object("cornell", "archive", key, None, body_of(Bytes::from_static(b"data")), 4)
            .await
            .unwrap();
    }

    let contents = service.bucket_contents("cornell", "archive").await.unwrap();
    let keys: Vec<_> = contents.objects.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["2024/q1/report.pdf", "readme.txt"]);
    assert_eq!(contents.total_size(), 8);
}

#[tokio::test]
async fn test_delete_object_version_keeps_other_versions() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);
    service.create_bucket("cornell", "archive").await.unwrap();

    let first = service
        .upload_object("cornell", "archive", "notes", None, body_of(Bytes::from_static(b"v1")), 2)
        .await
        .unwrap();
    service
        .upload_object("cornell", "archive", "notes", None, body_of(Bytes::from_static(b"v2")), 2)
        .await
        .unwrap();

    service
        .delete_object("cornell", "archive", "notes", first.version_id.as_deref())
        .await
        .unwrap();

    let store = connector.storage("s3.example.org");
    assert_eq!(store.version_count("archive", "notes"), 1);
    let latest = service.get_object("cornell", "archive", "notes").await.unwrap();
    assert_eq!(latest, Bytes::from_static(b"v2"));
}

#[tokio::test]
async fn test_delete_object_with_empty_version_removes_latest() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);
    service.create_bucket("cornell", "archive").await.unwrap();
    service
        .upload_object("cornell", "archive", "notes", None, body_of(Bytes::from_static(b"v1")), 2)
        .await
        .unwrap();

    service
        .delete_object("cornell", "archive", "notes", Some(""))
        .await
        .unwrap();

    let store = connector.storage("s3.example.org");
    assert_eq!(store.version_count("archive", "notes"), 0);
    let err = service.get_object("cornell", "archive", "notes").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_non_empty_bucket_passes_backend_error() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);
    service.create_bucket("cornell", "archive").await.unwrap();
    service
        .upload_object("cornell", "archive", "k", None, body_of(Bytes::from_static(b"x")), 1)
        .await
        .unwrap();

    let err = service.delete_bucket("cornell", "archive").await.unwrap_err();
    assert_eq!(err.storage_error().and_then(|e| e.code()), Some("BucketNotEmpty"));
}

#[tokio::test]
async fn test_list_sites_passes_descriptions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "cornell", "url": "https://cornell.example.org", "description": "archive"}
        ])))
        .mount(&server)
        .await;
    let service = service(&server, &MemoryConnector::new());

    let sites = service.list_sites().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].description, "archive");
}

/// Backend whose listing breaks after a fixed number of entries and whose
/// bucket listing stalls
struct FaultyStorage {
    inner: MemoryStorage,
    listed_before_failure: usize,
    stall: Duration,
}

#[async_trait]
impl ObjectStorage for FaultyStorage {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn list_buckets(&self) -> sitegate_storage::Result<Vec<BucketDescriptor>> {
        tokio::time::sleep(self.stall).await;
        self.inner.list_buckets().await
    }

    async fn bucket_exists(&self, bucket: &str) -> sitegate_storage::Result<bool> {
        self.inner.bucket_exists(bucket).await
    }

    async fn create_bucket(&self, bucket: &str) -> sitegate_storage::Result<()> {
        self.inner.create_bucket(bucket).await
    }

    async fn delete_bucket(&self, bucket: &str) -> sitegate_storage::Result<()> {
        self.inner.delete_bucket(bucket).await
    }

    fn list_objects(&self, _bucket: &str) -> BoxStream<'static, sitegate_storage::Result<ObjectDescriptor>> {
        let mut items: Vec<sitegate_storage::Result<ObjectDescriptor>> = (0..self.listed_before_failure)
            .map(|i| Ok(ObjectDescriptor::new(format!("object-{}", i), 1)))
            .collect();
        items.push(Err(StorageError::Transport("connection reset by peer".into())));
        stream::iter(items).boxed()
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        body: ObjectStream,
        size: u64,
    ) -> sitegate_storage::Result<ObjectDescriptor> {
        self.inner.put_object(bucket, key, content_type, body, size).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> sitegate_storage::Result<ObjectDownload> {
        self.inner.get_object(bucket, key).await
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> sitegate_storage::Result<()> {
        self.inner.delete_object(bucket, key, version_id).await
    }
}

struct FaultyConnector {
    storage: Arc<FaultyStorage>,
    connects: AtomicUsize,
}

impl FaultyConnector {
    fn new(listed_before_failure: usize, stall: Duration) -> Arc<Self> {
        Arc::new(Self {
            storage: Arc::new(FaultyStorage {
                inner: MemoryStorage::new("https://s3.example.org"),
                listed_before_failure,
                stall,
            }),
            connects: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StorageConnector for FaultyConnector {
    async fn connect(&self, _connection: &StorageConnection) -> sitegate_storage::Result<Arc<dyn ObjectStorage>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let storage: Arc<dyn ObjectStorage> = self.storage.clone();
        Ok(storage)
    }
}

#[tokio::test]
async fn test_listing_error_after_entries_is_partial() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = FaultyConnector::new(3, Duration::ZERO);
    let service = service_with(&server, PASSWORD, connector, ServiceConfig::default());

    match service.list_objects("cornell", "archive").await {
        Err(SiteError::PartialListing { objects, source }) => {
            assert_eq!(objects.len(), 3);
            assert!(source.is_connectivity());
        }
        other => panic!("expected partial listing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_error_before_entries_is_plain_storage_error() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = FaultyConnector::new(0, Duration::ZERO);
    let service = service_with(&server, PASSWORD, connector, ServiceConfig::default());

    let err = service.list_objects("cornell", "archive").await.unwrap_err();
    assert!(matches!(err, SiteError::Storage(StorageError::Transport(_))));
}

#[tokio::test]
async fn test_operation_deadline() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = FaultyConnector::new(0, Duration::from_secs(5));
    let config = ServiceConfig::default().with_operation_timeout(Duration::from_millis(100));
    let service = service_with(&server, PASSWORD, connector, config);

    let err = service.list_buckets("cornell").await.unwrap_err();
    assert!(matches!(err, SiteError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn test_cancelled_operation() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = FaultyConnector::new(0, Duration::from_secs(5));
    let service = service_with(&server, PASSWORD, connector, ServiceConfig::default());

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = StorageService::cancellable(&token, service.list_buckets("cornell"))
        .await
        .unwrap_err();
    assert!(matches!(err, SiteError::Cancelled));
}

#[tokio::test]
async fn test_client_cache_reuses_client_until_connectivity_failure() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = FaultyConnector::new(1, Duration::ZERO);
    let config = ServiceConfig::default().with_client_cache(Duration::from_secs(60));
    let service = service_with(&server, PASSWORD, connector.clone(), config);

    service.list_buckets("cornell").await.unwrap();
    service.list_buckets("cornell").await.unwrap();
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

    // Transport failure evicts the cached client
    let _ = service.list_objects("cornell", "archive").await;
    assert!(service.cache().unwrap().is_empty());

    service.list_buckets("cornell").await.unwrap();
    assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_without_cache_every_operation_connects() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let service = service(&server, &connector);

    service.list_buckets("cornell").await.unwrap();
    service.list_buckets("cornell").await.unwrap();
    assert_eq!(connector.connect_count(), 2);
    assert!(service.cache().is_none());
}

#[tokio::test]
async fn test_client_cache_keeps_no_slot_for_unknown_sites() {
    let server = discovery(vec![record("cornell", "s3.example.org", true)]).await;
    let connector = MemoryConnector::new();
    let config = ServiceConfig::default().with_client_cache(Duration::from_secs(60));
    let service = service_with(&server, PASSWORD, Arc::new(connector.clone()), config);

    for i in 0..20 {
        let err = service.list_buckets(&format!("nope-{i}")).await.unwrap_err();
        assert!(err.is_not_found());
    }
    assert_eq!(service.cache().unwrap().len(), 0);

    service.list_buckets("cornell").await.unwrap();
    assert_eq!(service.cache().unwrap().len(), 1);
}
