//! # Sitegate Gateway
//!
//! HTTP gateway giving callers site-addressed access to object storage.
//!
//! This crate provides:
//! - **Storage API**: sites, buckets and objects under `/storage`
//! - **Rate Limiting**: per-client request throttling
//! - **Configuration**: JSON file, environment and command line
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Sitegate Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Rate Limiter │ CORS │ Body Limit      │
//! ├─────────────────────────────────────────────────────┤
//! │                Storage Handlers                     │
//! ├─────────────────────────────────────────────────────┤
//! │                  sitegate-core                      │
//! │      (site resolution, client factory, facade)      │
//! ├─────────────────────────────────────────────────────┤
//! │  discovery service  │  S3-compatible backends       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
