//! HTTP client infrastructure for the creature catalog API.
//!
//! This crate provides:
//! - HTTP client construction with a per-request timeout
//! - Typed errors for catalog operations
//! - The domain types decoded from catalog responses
//!
//! ## Usage
//!
//! ```ignore
//! use dex_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let bulbasaur = client.fetch_by_id(1).await?;
//! ```

mod client;
mod config;
mod error;
pub mod types;

pub use client::{CatalogClient, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::CatalogClientError;
