use std::path::PathBuf;

use anyhow::{Context, bail};
use dex_rust_sdk::providers::catalog::{
    CatalogClient,
    Client,
    DEX_CATALOG_MOCK_DATA_VAR,
    MockClient,
};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if the `_DEX_USE_CATALOG_MOCK` environment variable
///   is set to the path of a mock data file
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    if let Ok(path_str) = std::env::var(DEX_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        Ok(MockClient::from_file(&path)
            .with_context(|| format!("could not load mock data from {}", path.display()))?
            .into())
    } else {
        let client_config = config.catalog_client_config();
        debug!(
            catalog_url = %client_config.catalog_url,
            timeout = ?client_config.request_timeout,
            "using catalog client"
        );
        Ok(CatalogClient::new(client_config)?.into())
    }
}
