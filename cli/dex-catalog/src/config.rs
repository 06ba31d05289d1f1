//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub catalog_url: String,
    /// Upper bound for a single request, connect through body.
    pub request_timeout: Duration,
    /// Custom user agent to send with every request.
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}
