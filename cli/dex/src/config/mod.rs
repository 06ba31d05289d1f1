use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use dex_rust_sdk::models::batch::BatchPolicy;
use dex_rust_sdk::models::gallery::GALLERY_SIZE;
use dex_rust_sdk::models::search::{
    SEARCH_DEBOUNCE,
    SEARCH_INDEX_LIMIT,
    SEARCH_RESULT_LIMIT,
    SearchOptions,
};
use dex_rust_sdk::providers::catalog::{
    CatalogClientConfig,
    DEFAULT_CATALOG_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of dex managed directories
const DEX_DIR_NAME: &str = "dex";
const DEX_CONFIG_DIR_VAR: &str = "DEX_CONFIG_DIR";
pub const DEX_CONFIG_FILE: &str = "dex.toml";

/// Describes the configuration of the dex CLI
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog API
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,
    /// Timeout for a single catalog request
    pub request_timeout_ms: u64,
    /// How many index entries a search matches against
    pub search_index_limit: u32,
    /// How many matches a search fetches in full
    pub search_result_limit: usize,
    /// How many records the gallery shows
    pub gallery_size: u32,
    /// Quiet period before an interactively typed query is searched
    pub debounce_ms: u64,
    /// Whether a search fails if some of its records fail to load
    pub batch_policy: BatchPolicy,
    /// Directory dex loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/dex`)
    pub config_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            search_index_limit: SEARCH_INDEX_LIMIT,
            search_result_limit: SEARCH_RESULT_LIMIT,
            gallery_size: GALLERY_SIZE,
            debounce_ms: SEARCH_DEBOUNCE.as_millis() as u64,
            batch_policy: BatchPolicy::default(),
            config_dir: None,
        }
    }
}

impl Config {
    /// Creates a [Config] from the config files and the environment
    pub fn parse() -> Result<Config> {
        let config_dir = match env::var(DEX_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${DEX_CONFIG_DIR_VAR}` set: {v}");
                Some(PathBuf::from(v))
            },
            Err(_) => {
                let config_dir = BaseDirectories::with_prefix(DEX_DIR_NAME).get_config_home();
                debug!("`${DEX_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let dex_envs = env::vars()
            .filter_map(|(k, v)| k.strip_prefix("DEX_").map(|k| (k.to_owned(), v)))
            .filter(|(k, _)| k != "CONFIG_DIR")
            .collect();

        Self::read(
            &PathBuf::from("/etc").join(DEX_CONFIG_FILE),
            config_dir.as_deref(),
            dex_envs,
        )
    }

    /// Layer defaults, the system file, the user file and `DEX_` variables
    /// (with their prefix removed), in increasing precedence.
    fn read(
        system_file: &Path,
        config_dir: Option<&Path>,
        dex_envs: HashMap<String, String>,
    ) -> Result<Config> {
        let mut builder = HierarchicalConfig::builder().add_source(
            config::File::from(system_file)
                .format(config::FileFormat::Toml)
                .required(false),
        );

        if let Some(config_dir) = config_dir {
            builder = builder
                .add_source(
                    config::File::from(config_dir.join(DEX_CONFIG_FILE))
                        .format(config::FileFormat::Toml)
                        .required(false),
                )
                // The config dir is added to the config for completeness;
                // the config file cannot change the config dir.
                .set_override("config_dir", config_dir.to_string_lossy().as_ref())?;
        }

        let final_config = builder
            .add_source(
                Environment::default()
                    .source(Some(dex_envs))
                    .try_parsing(true),
            )
            .build()?;

        final_config
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn catalog_client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: self.catalog_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            user_agent: Some(format!("dex/{}", env!("CARGO_PKG_VERSION"))),
            ..Default::default()
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            index_limit: self.search_index_limit,
            result_limit: self.search_result_limit,
            policy: self.batch_policy,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_any_source() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = Config::read(
            &tempdir.path().join("missing.toml"),
            None,
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search_options(), SearchOptions::default());
        assert_eq!(config.debounce(), SEARCH_DEBOUNCE);
        assert_eq!(
            config.catalog_client_config().request_timeout,
            DEFAULT_REQUEST_TIMEOUT
        );
    }

    #[test]
    fn user_file_overrides_system_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let system_file = tempdir.path().join("system.toml");
        std::fs::write(&system_file, indoc! {"
            gallery_size = 50
            debounce_ms = 100
        "})
        .unwrap();
        let config_dir = tempdir.path().join("user");
        std::fs::create_dir(&config_dir).unwrap();
        std::fs::write(config_dir.join(DEX_CONFIG_FILE), indoc! {"
            gallery_size = 151
            batch_policy = \"strict\"
        "})
        .unwrap();

        let config = Config::read(&system_file, Some(&config_dir), HashMap::new()).unwrap();
        assert_eq!(config.gallery_size, 151);
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.batch_policy, BatchPolicy::Strict);
        assert_eq!(config.config_dir, Some(config_dir));
    }

    #[test]
    fn environment_overrides_files() {
        let tempdir = tempfile::tempdir().unwrap();
        std::fs::write(tempdir.path().join(DEX_CONFIG_FILE), indoc! {"
            search_result_limit = 5
        "})
        .unwrap();

        let envs = HashMap::from([
            ("SEARCH_RESULT_LIMIT".to_string(), "10".to_string()),
            ("CATALOG_URL".to_string(), "http://localhost:8080/api".to_string()),
        ]);
        let config = Config::read(
            &tempdir.path().join("missing.toml"),
            Some(tempdir.path()),
            envs,
        )
        .unwrap();
        assert_eq!(config.search_result_limit, 10);
        assert_eq!(config.catalog_url, "http://localhost:8080/api");
    }

    #[test]
    fn invalid_value_is_an_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let envs = HashMap::from([("BATCH_POLICY".to_string(), "sometimes".to_string())]);
        let result = Config::read(&tempdir.path().join("missing.toml"), None, envs);
        assert!(result.is_err());
    }

    #[test]
    fn parse_reads_config_dir_from_env() {
        let tempdir = tempfile::tempdir().unwrap();
        std::fs::write(tempdir.path().join(DEX_CONFIG_FILE), indoc! {"
            gallery_size = 12
        "})
        .unwrap();

        temp_env::with_vars(
            [
                (
                    DEX_CONFIG_DIR_VAR,
                    Some(tempdir.path().to_string_lossy().as_ref()),
                ),
                ("DEX_DEBOUNCE_MS", Some("25")),
            ],
            || {
                let config = Config::parse().unwrap();
                assert_eq!(config.gallery_size, 12);
                assert_eq!(config.debounce_ms, 25);
                assert_eq!(config.config_dir.as_deref(), Some(tempdir.path()));
            },
        );
    }
}
