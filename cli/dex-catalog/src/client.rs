//! HTTP client for the creature catalog.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::types::*;

/// A client for the catalog service.
///
/// Handles:
/// - HTTP client configuration with a per-request timeout
/// - Extra headers and user agent
/// - Mapping of statuses and transport failures into [CatalogClientError]
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
    base_url: Url,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .field("request_timeout", &self.config.request_timeout)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = Url::parse(&config.catalog_url).map_err(|e| {
            CatalogClientError::InvalidConfig(format!(
                "catalog url '{}' is not valid: {e}",
                config.catalog_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::InvalidConfig(format!(
                "catalog url '{}' cannot have a path",
                config.catalog_url
            )));
        }

        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// The catalog URL extended by `segments`, each percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Perform a single GET and decode the JSON body.
    ///
    /// A 404 is reported as [CatalogClientError::NotFound] carrying `subject`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        subject: &str,
    ) -> Result<T, CatalogClientError> {
        let request = request.build().map_err(|e| CatalogClientError::Transport {
            url: subject.to_string(),
            source: e,
        })?;
        let url = request.url().to_string();
        debug!(%url, "sending catalog request");

        let response =
            self.client
                .execute(request)
                .await
                .map_err(|e| CatalogClientError::Transport {
                    url: url.clone(),
                    source: e,
                })?;

        match response.status() {
            status if status.is_success() => {},
            StatusCode::NOT_FOUND => {
                debug!(%url, "catalog returned 404");
                return Err(CatalogClientError::NotFound(subject.to_string()));
            },
            status => {
                debug!(%url, %status, "catalog returned unexpected status");
                return Err(CatalogClientError::UnexpectedStatus {
                    url,
                    status: status.as_u16(),
                });
            },
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogClientError::InvalidResponse { url, source: e })
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The complete catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog via [`CatalogClient`]
/// - **Mock** (SDK tests): canned records without HTTP
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch one page of the index.
    async fn fetch_index(&self, limit: u32, offset: u32) -> Result<IndexPage, CatalogClientError>;

    /// Fetch a full record by its numeric id.
    async fn fetch_by_id(&self, id: u32) -> Result<Creature, CatalogClientError>;

    /// Fetch a full record by name, case-insensitively.
    async fn fetch_by_name(
        &self,
        name: impl AsRef<str> + Send + Sync,
    ) -> Result<Creature, CatalogClientError>;

    /// Fetch the whole category vocabulary.
    async fn fetch_category_labels(&self) -> Result<Vec<CategoryLabel>, CatalogClientError>;

    /// Fetch a full record by either id or name.
    async fn fetch(&self, creature: &CreatureRef) -> Result<Creature, CatalogClientError> {
        match creature {
            CreatureRef::Id(id) => self.fetch_by_id(*id).await,
            CreatureRef::Name(name) => self.fetch_by_name(name).await,
        }
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self))]
    async fn fetch_index(&self, limit: u32, offset: u32) -> Result<IndexPage, CatalogClientError> {
        let request = self
            .client
            .get(self.endpoint(&["pokemon"]))
            .query(&[("limit", limit), ("offset", offset)]);

        let list: api::ResourceList = self.get_json(request, "index").await?;
        let page = IndexPage::from(list);
        debug!(
            n_entries = page.entries.len(),
            total = page.total,
            "received index page"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_by_id(&self, id: u32) -> Result<Creature, CatalogClientError> {
        let request = self
            .client
            .get(self.endpoint(&["pokemon", id.to_string().as_str()]));
        let raw: api::Pokemon = self.get_json(request, &CreatureRef::Id(id).to_string()).await?;
        Ok(raw.into())
    }

    #[instrument(skip_all, fields(name = name.as_ref()))]
    async fn fetch_by_name(
        &self,
        name: impl AsRef<str> + Send + Sync,
    ) -> Result<Creature, CatalogClientError> {
        let segment = CreatureRef::Name(name.as_ref().to_string()).path_segment();
        // dot segments would be dropped from the path
        if segment.is_empty() || segment.chars().all(|c| c == '.') {
            return Err(CatalogClientError::NotFound(segment));
        }
        let request = self.client.get(self.endpoint(&["pokemon", segment.as_str()]));
        let raw: api::Pokemon = self.get_json(request, &segment).await?;
        Ok(raw.into())
    }

    #[instrument(skip(self))]
    async fn fetch_category_labels(&self) -> Result<Vec<CategoryLabel>, CatalogClientError> {
        let request = self.client.get(self.endpoint(&["type"]));
        let list: api::ResourceList = self.get_json(request, "category list").await?;
        Ok(list.results.into_iter().map(CategoryLabel::from).collect())
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client with the configured headers and timeout.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| {
                    CatalogClientError::InvalidConfig(format!("header name '{key}': {e}"))
                },
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| {
                    CatalogClientError::InvalidConfig(format!("header value for '{key}': {e}"))
                },
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        timeout_ms = config.request_timeout.as_millis() as u64,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder.user_agent(concat!("dex/", env!("CARGO_PKG_VERSION")))
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: url.to_string(),
            ..Default::default()
        }
    }

    fn pokemon_json(id: u32, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "height": 7,
            "weight": 69,
            "base_experience": 64,
            "types": [{ "slot": 1, "type": { "name": "grass", "url": "" } }],
            "stats": [],
            "abilities": [],
            "moves": [],
            "sprites": { "front_default": null, "back_default": null, "front_shiny": null, "back_shiny": null }
        })
    }

    #[tokio::test]
    async fn fetch_index_sends_limit_and_offset() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/pokemon")
                .query_param("limit", "3")
                .query_param("offset", "10");
            then.status(200).json_body(json!({
                "count": 1302,
                "next": null,
                "previous": null,
                "results": [
                    { "name": "caterpie", "url": "https://pokeapi.co/api/v2/pokemon/10/" },
                    { "name": "metapod", "url": "https://pokeapi.co/api/v2/pokemon/11/" },
                    { "name": "butterfree", "url": "https://pokeapi.co/api/v2/pokemon/12/" }
                ]
            }));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let page = client.fetch_index(3, 10).await.unwrap();
        mock.assert();

        assert_eq!(page.total, 1302);
        assert_eq!(
            page.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["caterpie", "metapod", "butterfree"]
        );
        assert_eq!(page.entries[0].id(), Some(10));
    }

    #[tokio::test]
    async fn fetch_by_id_decodes_record() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pokemon/1");
            then.status(200).json_body(pokemon_json(1, "bulbasaur"));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let creature = client.fetch_by_id(1).await.unwrap();
        mock.assert();
        assert_eq!(creature.id, 1);
        assert_eq!(creature.name, "bulbasaur");
        assert_eq!(creature.category_names().collect::<Vec<_>>(), vec!["grass"]);
    }

    #[tokio::test]
    async fn fetch_by_name_is_case_insensitive() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pokemon/bulbasaur");
            then.status(200).json_body(pokemon_json(1, "bulbasaur"));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let creature = client.fetch_by_name("BulbaSaur").await.unwrap();
        mock.assert();
        assert_eq!(creature.id, 1);
    }

    #[tokio::test]
    async fn fetch_category_labels_in_order() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/type");
            then.status(200).json_body(json!({
                "count": 3,
                "results": [
                    { "name": "normal", "url": "" },
                    { "name": "fighting", "url": "" },
                    { "name": "flying", "url": "" }
                ]
            }));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let labels = client.fetch_category_labels().await.unwrap();
        mock.assert();
        assert_eq!(
            labels.into_iter().map(|l| l.name).collect::<Vec<_>>(),
            vec!["normal", "fighting", "flying"]
        );
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("dex-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("dex-test", "test-value")
                .header("accept", "application/json");
            then.status(200).json_body(json!({ "count": 0, "results": [] }));
        });

        let config = CatalogClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.fetch_category_labels().await;
        mock.assert();
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!({ "count": 0, "results": [] }));
        });

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.fetch_index(1, 0).await;
        mock.assert();
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let mut extra_headers = BTreeMap::new();
        extra_headers.insert("not a header".to_string(), "value".to_string());
        let config = CatalogClientConfig {
            extra_headers,
            ..Default::default()
        };
        let result = CatalogClient::new(config);
        assert!(
            matches!(result, Err(CatalogClientError::InvalidConfig(_))),
            "expected InvalidConfig, found: {result:?}"
        );
    }

    #[test]
    fn invalid_url_is_config_error() {
        let result = CatalogClient::new(client_config("not a url"));
        assert!(matches!(result, Err(CatalogClientError::InvalidConfig(_))));
        let result = CatalogClient::new(client_config("mailto:dex@example.com"));
        assert!(matches!(result, Err(CatalogClientError::InvalidConfig(_))));
    }

    /// A name is always a single path segment below `pokemon/`
    #[tokio::test]
    async fn names_cannot_escape_the_record_path() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/type");
            then.status(200).json_body(pokemon_json(1, "bulbasaur"));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        for name in ["../type", "..", "."] {
            match client.fetch_by_name(name).await {
                Err(CatalogClientError::NotFound(_)) => {},
                other => panic!("expected NotFound for '{name}', found: {other:?}"),
            }
        }
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let client = CatalogClient::new(client_config("http://localhost:8080/api/v2/")).unwrap();
        assert_eq!(
            client.endpoint(&["pokemon", "mr. mime"]).as_str(),
            "http://localhost:8080/api/v2/pokemon/mr.%20mime"
        );
        assert_eq!(
            client.endpoint(&["pokemon", "../type"]).as_str(),
            "http://localhost:8080/api/v2/pokemon/..%2Ftype"
        );
    }

    // region: Error response handling

    /// 404 errors are mapped to [CatalogClientError::NotFound],
    /// so consumers dont need to inspect raw responses
    #[tokio::test]
    async fn missing_record_is_not_found() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(404).body("Not Found");
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.fetch_by_id(100_000).await;
        mock.assert();
        match result {
            Err(CatalogClientError::NotFound(subject)) => assert_eq!(subject, "#100000"),
            other => panic!("expected NotFound, found: {other:?}"),
        }

        let result = client.fetch_by_name("MissingNo").await;
        match result {
            Err(CatalogClientError::NotFound(subject)) => assert_eq!(subject, "missingno"),
            other => panic!("expected NotFound, found: {other:?}"),
        }
    }

    /// Other statuses are transport errors
    #[tokio::test]
    async fn server_error_is_unexpected_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(503);
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.fetch_category_labels().await;
        mock.assert();
        let err = result.unwrap_err();
        assert!(
            matches!(err, CatalogClientError::UnexpectedStatus { status: 503, .. }),
            "expected UnexpectedStatus, found: {err:?}"
        );
        assert!(err.is_transport());
        assert!(!err.is_not_found());
    }

    /// Bodies that don't match the expected shape are [CatalogClientError::InvalidResponse]
    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "unknown": "ceramic" }));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.fetch_by_id(1).await;
        mock.assert();
        let err = result.unwrap_err();
        assert!(
            matches!(err, CatalogClientError::InvalidResponse { .. }),
            "expected InvalidResponse, found: {err:?}"
        );
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start_async().await;
        let _mock = server.mock(|_, then| {
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(pokemon_json(1, "bulbasaur"));
        });

        let config = CatalogClientConfig {
            request_timeout: Duration::from_millis(100),
            ..client_config(&server.base_url())
        };
        let client = CatalogClient::new(config).unwrap();
        let err = client.fetch_by_id(1).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, found: {err:?}");
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Nothing listens on port 1.
        let client = CatalogClient::new(client_config("http://127.0.0.1:1")).unwrap();
        let err = client.fetch_index(1, 0).await.unwrap_err();
        assert!(
            matches!(err, CatalogClientError::Transport { .. }),
            "expected Transport, found: {err:?}"
        );
    }

    // endregion

    #[tokio::test]
    async fn fetch_dispatches_on_creature_ref() {
        let server = MockServer::start_async().await;
        let by_id = server.mock(|when, then| {
            when.method(GET).path("/pokemon/4");
            then.status(200).json_body(pokemon_json(4, "charmander"));
        });
        let by_name = server.mock(|when, then| {
            when.method(GET).path("/pokemon/charmander");
            then.status(200).json_body(pokemon_json(4, "charmander"));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        client.fetch(&CreatureRef::Id(4)).await.unwrap();
        client
            .fetch(&CreatureRef::Name("Charmander".to_string()))
            .await
            .unwrap();
        by_id.assert();
        by_name.assert();
    }
}
