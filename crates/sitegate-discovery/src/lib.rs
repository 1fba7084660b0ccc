//! # Sitegate Discovery
//!
//! Client for the external discovery service that publishes the known sites
//! and their encrypted storage connection records.
//!
//! The service exposes a single endpoint:
//!
//! ```text
//! GET {discovery_url}/sites
//! [
//!   {"name": "cornell", "url": "https://cornell.example.org",
//!    "endpoint": "s3.example.org", "access_key": "<hex>",
//!    "access_secret": "<hex>", "use_ssl": true}
//! ]
//! ```
//!
//! Every call re-fetches the full list; nothing is cached.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{DiscoveryClient, SiteDirectory, StaticDirectory};
pub use config::DiscoveryConfig;
pub use error::{DiscoveryError, Result};
pub use types::{DiscoveryRecord, SiteSummary};
