use std::collections::BTreeSet;
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub use dex_catalog::types::*;
pub use dex_catalog::{
    CatalogClient,
    CatalogClientConfig,
    CatalogClientError,
    ClientTrait,
    DEFAULT_CATALOG_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEX_CATALOG_MOCK_DATA_VAR: &str = "_DEX_USE_CATALOG_MOCK";

// Arc allows you to inspect the request log from outside the client
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by the _DEX_USE_CATALOG_MOCK var
    #[error("failed to read mock data file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

impl From<CatalogClient> for Client {
    fn from(client: CatalogClient) -> Self {
        Client::Catalog(client)
    }
}

impl From<MockClient> for Client {
    fn from(client: MockClient) -> Self {
        Client::Mock(client)
    }
}

impl ClientTrait for Client {
    async fn fetch_index(&self, limit: u32, offset: u32) -> Result<IndexPage, CatalogClientError> {
        match self {
            Client::Catalog(client) => client.fetch_index(limit, offset).await,
            Client::Mock(client) => client.fetch_index(limit, offset).await,
        }
    }

    async fn fetch_by_id(&self, id: u32) -> Result<Creature, CatalogClientError> {
        match self {
            Client::Catalog(client) => client.fetch_by_id(id).await,
            Client::Mock(client) => client.fetch_by_id(id).await,
        }
    }

    async fn fetch_by_name(
        &self,
        name: impl AsRef<str> + Send + Sync,
    ) -> Result<Creature, CatalogClientError> {
        match self {
            Client::Catalog(client) => client.fetch_by_name(name).await,
            Client::Mock(client) => client.fetch_by_name(name).await,
        }
    }

    async fn fetch_category_labels(&self) -> Result<Vec<CategoryLabel>, CatalogClientError> {
        match self {
            Client::Catalog(client) => client.fetch_category_labels().await,
            Client::Mock(client) => client.fetch_category_labels().await,
        }
    }
}

/// The canned contents of a [MockClient].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockCatalog {
    #[serde(default)]
    pub index: Vec<CatalogEntry>,
    #[serde(default)]
    pub creatures: Vec<Creature>,
    #[serde(default)]
    pub categories: Vec<CategoryLabel>,
    /// Full record fetches for these ids fail with a transport error
    #[serde(default)]
    pub failing_ids: BTreeSet<u32>,
    /// Full record fetches for these names fail with a transport error
    #[serde(default)]
    pub failing_names: BTreeSet<String>,
    /// Artificial latency applied to every call
    #[serde(default)]
    pub latency_ms: u64,
}

/// A request received by a [MockClient].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Index { limit: u32, offset: u32 },
    ById(u32),
    ByName(String),
    CategoryLabels,
}

/// A catalog client that answers from a [MockCatalog]
/// and records every request it receives.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    catalog: MockField<MockCatalog>,
    requests: MockField<Vec<MockRequest>>,
}

impl MockClient {
    pub fn new(catalog: MockCatalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            requests: Default::default(),
        }
    }

    /// Create a mock client from a JSON serialized [MockCatalog].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let catalog: MockCatalog =
            serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        Ok(Self::new(catalog))
    }

    /// Make full record fetches for `id` fail.
    pub fn fail_id(&mut self, id: u32) {
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failing_ids
            .insert(id);
    }

    /// Make full record fetches for `name` fail.
    pub fn fail_name(&mut self, name: impl AsRef<str>) {
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failing_names
            .insert(normalize_name(name.as_ref()));
    }

    /// All requests received so far, in the order they were issued.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the full record requests received so far.
    pub fn record_requests(&self) -> Vec<MockRequest> {
        self.requests()
            .into_iter()
            .filter(|r| matches!(r, MockRequest::ById(_) | MockRequest::ByName(_)))
            .collect()
    }

    async fn receive(&self, request: MockRequest) -> MockCatalog {
        debug!(?request, "mock catalog request");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let catalog = self
            .catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if catalog.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(catalog.latency_ms)).await;
        }
        catalog
    }

    fn unavailable(path: String) -> CatalogClientError {
        CatalogClientError::UnexpectedStatus {
            url: format!("mock://{path}"),
            status: 503,
        }
    }
}

impl ClientTrait for MockClient {
    async fn fetch_index(&self, limit: u32, offset: u32) -> Result<IndexPage, CatalogClientError> {
        let catalog = self.receive(MockRequest::Index { limit, offset }).await;
        Ok(IndexPage {
            total: catalog.index.len() as u64,
            entries: catalog
                .index
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect(),
        })
    }

    async fn fetch_by_id(&self, id: u32) -> Result<Creature, CatalogClientError> {
        let catalog = self.receive(MockRequest::ById(id)).await;
        if catalog.failing_ids.contains(&id) {
            return Err(Self::unavailable(format!("pokemon/{id}")));
        }
        catalog
            .creatures
            .into_iter()
            .find(|creature| creature.id == id)
            .ok_or_else(|| CatalogClientError::NotFound(CreatureRef::Id(id).to_string()))
    }

    async fn fetch_by_name(
        &self,
        name: impl AsRef<str> + Send + Sync,
    ) -> Result<Creature, CatalogClientError> {
        let name = normalize_name(name.as_ref());
        let catalog = self.receive(MockRequest::ByName(name.clone())).await;
        if catalog.failing_names.contains(&name) {
            return Err(Self::unavailable(format!("pokemon/{name}")));
        }
        catalog
            .creatures
            .into_iter()
            .find(|creature| creature.name == name)
            .ok_or(CatalogClientError::NotFound(name))
    }

    async fn fetch_category_labels(&self) -> Result<Vec<CategoryLabel>, CatalogClientError> {
        let catalog = self.receive(MockRequest::CategoryLabels).await;
        Ok(catalog.categories)
    }
}
