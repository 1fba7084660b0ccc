//! Discovery service HTTP client

use crate::{DiscoveryConfig, DiscoveryError, DiscoveryRecord, Result, SiteSummary};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

/// Source of site records
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// List every advertised site
    async fn list_sites(&self) -> Result<Vec<SiteSummary>>;

    /// Find the record whose name equals `name` exactly
    async fn resolve_site(&self, name: &str) -> Result<DiscoveryRecord>;
}

/// Return the first record named exactly `name`
pub(crate) fn find_record(records: Vec<DiscoveryRecord>, name: &str) -> Result<DiscoveryRecord> {
    records
        .into_iter()
        .find(|record| record.name == name)
        .ok_or_else(|| DiscoveryError::SiteNotFound(name.to_string()))
}

/// HTTP client for the discovery service
#[derive(Clone)]
pub struct DiscoveryClient {
    client: Client,
    config: DiscoveryConfig,
}

impl DiscoveryClient {
    /// Create a new discovery client
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            DiscoveryError::Configuration(format!("invalid discovery URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from URL string
    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(DiscoveryConfig::with_url(url))
    }

    /// Get the configuration
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Fetch and decode the `/sites` listing
    async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let url = self.config.sites_url();
        debug!(url = %url, "Querying discovery service");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let records: Vec<T> = serde_json::from_slice(&body)?;
        debug!(count = records.len(), "Received discovery records");
        Ok(records)
    }

    /// Fetch all connection records
    #[instrument(skip(self))]
    pub async fn records(&self) -> Result<Vec<DiscoveryRecord>> {
        self.fetch().await
    }
}

#[async_trait]
impl SiteDirectory for DiscoveryClient {
    #[instrument(skip(self))]
    async fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        self.fetch().await
    }

    #[instrument(skip(self))]
    async fn resolve_site(&self, name: &str) -> Result<DiscoveryRecord> {
        let record = find_record(self.records().await?, name)?;
        info!(site = %record.name, url = %record.url, "Found site in discovery records");
        Ok(record)
    }
}

/// A fixed set of records, for tests and local development
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    records: Vec<DiscoveryRecord>,
}

impl StaticDirectory {
    pub fn new(records: Vec<DiscoveryRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl SiteDirectory for StaticDirectory {
    async fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        Ok(self
            .records
            .iter()
            .map(|record| SiteSummary {
                name: record.name.clone(),
                url: record.url.clone(),
                description: String::new(),
            })
            .collect())
    }

    async fn resolve_site(&self, name: &str) -> Result<DiscoveryRecord> {
        find_record(self.records.clone(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegate_crypto::EncryptedSecret;

    fn record(name: &str, endpoint: &str) -> DiscoveryRecord {
        DiscoveryRecord::new(
            name,
            endpoint,
            EncryptedSecret::new("00"),
            EncryptedSecret::new("00"),
            false,
        )
    }

    #[test]
    fn test_find_record_is_exact_and_case_sensitive() {
        let records = vec![record("cornell", "a"), record("Cornell", "b"), record("cornell-2", "c")];
        assert_eq!(find_record(records.clone(), "Cornell").unwrap().endpoint, "b");
        assert!(find_record(records.clone(), "CORNELL").unwrap_err().is_not_found());
        assert!(find_record(records, "corn").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_record_returns_first_match() {
        let records = vec![record("cornell", "first"), record("cornell", "second")];
        assert_eq!(find_record(records, "cornell").unwrap().endpoint, "first");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = DiscoveryClient::from_url("not a url");
        assert!(matches!(result, Err(DiscoveryError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_static_directory() {
        let directory = StaticDirectory::new(vec![record("cornell", "s3.example.org")]);
        assert_eq!(directory.list_sites().await.unwrap().len(), 1);
        assert!(directory.resolve_site("ucla").await.unwrap_err().is_not_found());
    }
}
