//! # Sitegate Core
//!
//! Site resolution and storage access for the sitegate gateway.
//!
//! This crate provides:
//! - **ClientFactory**: resolves a site through discovery, decrypts its
//!   credentials and opens a storage client
//! - **ClientCache**: opt-in, TTL-bounded, single-flight cache of clients
//! - **StorageService**: the bucket and object operations addressed by site
//!
//! ## Request flow
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            StorageService               │
//! ├─────────────────────────────────────────┤
//! │   ClientCache (opt-in) → ClientFactory  │
//! ├──────────────┬──────────────┬───────────┤
//! │ SiteDirectory│  Decryptor   │ Connector │
//! └──────────────┴──────────────┴───────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod service;
pub mod types;

pub use cache::ClientCache;
pub use config::ServiceConfig;
pub use error::{Result, SiteError};
pub use factory::{ClientFactory, StorageClientHandle};
pub use service::StorageService;
pub use types::{BucketContents, BucketCreation, SiteContents};

pub use tokio_util::sync::CancellationToken;
