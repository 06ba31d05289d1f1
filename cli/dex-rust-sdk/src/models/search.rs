//! Name search over the catalog index.
//!
//! A search fetches the lightweight index once per query,
//! matches names locally and then fans out full record fetches
//! for the first [SEARCH_RESULT_LIMIT] matches.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, instrument};

use super::batch::{BatchFailure, BatchPolicy, PartialBatchFailure, fetch_all};
use super::view::{SearchEvent, SearchView};
use crate::providers::catalog::{CatalogClientError, CatalogEntry, ClientTrait, Creature, CreatureRef};
use crate::utils::debounce::{Debounced, Debouncer};

/// How many index entries a search matches against.
pub const SEARCH_INDEX_LIMIT: u32 = 1000;
/// How many matches are fetched in full.
pub const SEARCH_RESULT_LIMIT: usize = 20;
/// Quiet window before a typed query is searched.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub index_limit: u32,
    pub result_limit: usize,
    pub policy: BatchPolicy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            index_limit: SEARCH_INDEX_LIMIT,
            result_limit: SEARCH_RESULT_LIMIT,
            policy: BatchPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// The query as it was matched, trimmed
    pub query: String,
    /// Full records of the matches, in index order
    pub creatures: Vec<Creature>,
    /// Number of index entries that matched, before the result cap
    pub matched: usize,
    #[serde(skip)]
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to fetch the catalog index")]
    Index(#[source] CatalogClientError),
    #[error(transparent)]
    PartialBatchFailure(#[from] PartialBatchFailure),
}

/// Whether `query` would not search anything.
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

/// Entries whose name contains `query`, ignoring case, in index order.
///
/// Returns at most `limit` entries together with the total number of matches.
pub fn matching_entries<'a>(
    entries: &'a [CatalogEntry],
    query: &str,
    limit: usize,
) -> (Vec<&'a CatalogEntry>, usize) {
    let needle = query.trim().to_lowercase();
    let mut matched = 0;
    let mut selected = Vec::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
    {
        matched += 1;
        if selected.len() < limit {
            selected.push(entry);
        }
    }
    (selected, matched)
}

/// Run a single search for `query`.
///
/// A blank query resolves to empty results without contacting the catalog.
#[instrument(skip_all, fields(query = query.as_ref()))]
pub async fn search(
    client: &impl ClientTrait,
    query: impl AsRef<str>,
    options: &SearchOptions,
) -> Result<SearchResults, SearchError> {
    let query = query.as_ref().trim();
    if query.is_empty() {
        debug!("blank query, skipping search");
        return Ok(SearchResults::default());
    }

    let index = client
        .fetch_index(options.index_limit, 0)
        .await
        .map_err(SearchError::Index)?;

    let (entries, matched) = matching_entries(&index.entries, query, options.result_limit);
    debug!(matched, fetching = entries.len(), "matched index entries");

    let targets = entries
        .into_iter()
        .map(|entry| CreatureRef::Name(entry.name.clone()))
        .collect();
    let outcome = fetch_all(client, targets).await.with_policy(options.policy)?;

    Ok(SearchResults {
        query: query.to_string(),
        creatures: outcome.records,
        matched,
        failures: outcome.failures,
    })
}

type InFlight<'a> = Pin<Box<dyn Future<Output = Result<SearchResults, SearchError>> + 'a>>;

/// Search as-you-type.
///
/// Queries received on `queries` are debounced by `debounce`.
/// Each settled query supersedes the previous one:
/// a search still in flight is dropped, cancelling its outstanding requests,
/// and results are only applied to the view if they belong to the latest query.
/// Snapshots start from `view`, which carries e.g. the display sort,
/// and `on_update` is called with every new snapshot.
///
/// Returns the final view once `queries` is closed and the last search finished.
pub async fn live_search(
    client: &impl ClientTrait,
    queries: UnboundedReceiver<String>,
    options: &SearchOptions,
    debounce: Duration,
    mut view: SearchView,
    mut on_update: impl FnMut(&SearchView),
) -> SearchView {
    let mut debouncer = Debouncer::new(queries, debounce);
    let mut in_flight: Option<(u64, InFlight<'_>)> = None;
    let mut input_closed = false;

    loop {
        tokio::select! {
            released = debouncer.next(), if !input_closed => {
                let Some(Debounced { generation, value: query }) = released else {
                    input_closed = true;
                    continue;
                };
                if let Some((superseded, _)) = in_flight.take() {
                    debug!(superseded, generation, "cancelling superseded search");
                }
                view = view.reduce(SearchEvent::QueryChanged {
                    generation,
                    query: query.clone(),
                });
                on_update(&view);
                if !is_blank(&query) {
                    in_flight = Some((generation, Box::pin(search(client, query, options))));
                }
            },
            (generation, result) = async {
                match in_flight.as_mut() {
                    Some((generation, pending)) => (*generation, pending.as_mut().await),
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                let event = match result {
                    Ok(results) => SearchEvent::ResultsLoaded { generation, results },
                    Err(err) => SearchEvent::SearchFailed {
                        generation,
                        message: err.to_string(),
                    },
                };
                view = view.reduce(event);
                on_update(&view);
            },
            else => break,
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    use super::*;
    use crate::models::filter::{ProjectionCache, SortDirection, SortKey, SortSpec};
    use crate::models::view::LoadState;
    use crate::providers::catalog::{CatalogClient, CatalogClientConfig, MockClient, MockRequest};
    use crate::test_helpers::{creature, mock_catalog};

    fn starters() -> MockClient {
        MockClient::new(mock_catalog(vec![
            creature(1, "bulbasaur", &["grass", "poison"]),
            creature(4, "charmander", &["fire"]),
            creature(5, "charmeleon", &["fire"]),
            creature(7, "squirtle", &["water"]),
            creature(25, "pikachu", &["electric"]),
        ]))
    }

    fn names(creatures: &[Creature]) -> Vec<&str> {
        creatures.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn search_fetches_only_matches_in_index_order() {
        let client = starters();
        let results = search(&client, "char", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(names(&results.creatures), vec!["charmander", "charmeleon"]);
        assert_eq!(results.matched, 2);
        assert_eq!(client.requests(), vec![
            MockRequest::Index {
                limit: SEARCH_INDEX_LIMIT,
                offset: 0
            },
            MockRequest::ByName("charmander".to_string()),
            MockRequest::ByName("charmeleon".to_string()),
        ]);
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let client = starters();
        let results = search(&client, "  PIKA ", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results.query, "PIKA");
        assert_eq!(names(&results.creatures), vec!["pikachu"]);
    }

    #[tokio::test]
    async fn blank_query_makes_no_requests() {
        let client = starters();
        for query in ["", "   ", "\t"] {
            let results = search(&client, query, &SearchOptions::default())
                .await
                .unwrap();
            assert_eq!(results, SearchResults::default());
        }
        assert_eq!(client.requests(), vec![]);
    }

    #[tokio::test]
    async fn no_match_fetches_no_records() {
        let client = starters();
        let results = search(&client, "mew", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.creatures.is_empty());
        assert_eq!(client.record_requests(), vec![]);
    }

    #[tokio::test]
    async fn results_are_capped() {
        let creatures = (1..=25)
            .map(|id| creature(id, &format!("unown-{id}"), &["psychic"]))
            .collect();
        let client = MockClient::new(mock_catalog(creatures));

        let results = search(&client, "unown", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results.creatures.len(), SEARCH_RESULT_LIMIT);
        assert_eq!(results.matched, 25);
        assert_eq!(client.record_requests().len(), SEARCH_RESULT_LIMIT);
        assert_eq!(results.creatures.last().unwrap().name, "unown-20");
    }

    #[tokio::test]
    async fn tolerant_search_drops_failed_records() {
        let mut client = starters();
        client.fail_name("charmeleon");

        let results = search(&client, "char", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(names(&results.creatures), vec!["charmander"]);
        assert_eq!(results.failures.len(), 1);
        assert_eq!(
            results.failures[0].target,
            CreatureRef::Name("charmeleon".to_string())
        );
    }

    #[tokio::test]
    async fn strict_search_fails_on_any_failed_record() {
        let mut client = starters();
        client.fail_name("charmeleon");
        let options = SearchOptions {
            policy: BatchPolicy::Strict,
            ..Default::default()
        };

        let err = search(&client, "char", &options).await.unwrap_err();
        let SearchError::PartialBatchFailure(failure) = err else {
            panic!("expected a partial batch failure, got {err:?}");
        };
        assert_eq!(failure.attempted, 2);
        assert_eq!(failure.failures.len(), 1);
    }

    #[tokio::test]
    async fn index_failure_fails_the_search() {
        let client = CatalogClient::new(CatalogClientConfig {
            catalog_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = search(&client, "a", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Index(ref source) if source.is_transport()));
    }

    #[tokio::test(start_paused = true)]
    async fn live_search_only_searches_settled_queries() {
        let client = starters();
        let (tx, rx) = mpsc::unbounded_channel();

        let typing = async move {
            for query in ["c", "ch", "cha", "char"] {
                tx.send(query.to_string()).unwrap();
                sleep(Duration::from_millis(50)).await;
            }
        };

        let options = SearchOptions::default();
        let mut snapshots = Vec::new();
        let (view, ()) = tokio::join!(
            live_search(
                &client,
                rx,
                &options,
                SEARCH_DEBOUNCE,
                SearchView::default(),
                |view| snapshots.push(view.clone()),
            ),
            typing,
        );

        assert_eq!(view.query, "char");
        assert_eq!(view.generation, 1);
        assert_eq!(view.state, LoadState::Loaded);
        assert_eq!(names(&view.results), vec!["charmander", "charmeleon"]);
        // one index fetch for the single settled query
        assert_eq!(
            client
                .requests()
                .iter()
                .filter(|r| matches!(r, MockRequest::Index { .. }))
                .count(),
            1
        );
        assert_eq!(
            snapshots.iter().map(|s| s.state.clone()).collect::<Vec<_>>(),
            vec![LoadState::Loading, LoadState::Loaded]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn live_search_cancels_superseded_search() {
        let mut catalog = mock_catalog(vec![
            creature(4, "charmander", &["fire"]),
            creature(25, "pikachu", &["electric"]),
        ]);
        // slower than the quiet window
        catalog.latency_ms = 1000;
        let client = MockClient::new(catalog);
        let (tx, rx) = mpsc::unbounded_channel();

        let typing = async move {
            tx.send("char".to_string()).unwrap();
            // "char" settles at 300ms and its index fetch is in flight
            sleep(Duration::from_millis(500)).await;
            tx.send("pika".to_string()).unwrap();
        };

        let options = SearchOptions::default();
        let (view, ()) = tokio::join!(
            live_search(
                &client,
                rx,
                &options,
                SEARCH_DEBOUNCE,
                SearchView::default(),
                |_| {},
            ),
            typing,
        );

        assert_eq!(view.generation, 2);
        assert_eq!(view.query, "pika");
        assert_eq!(names(&view.results), vec!["pikachu"]);
        // the first search never got past its index fetch
        assert_eq!(client.record_requests(), vec![MockRequest::ByName(
            "pikachu".to_string()
        )]);
    }

    #[tokio::test(start_paused = true)]
    async fn live_search_keeps_the_display_sort() {
        let mut light = creature(4, "charmander", &["fire"]);
        light.weight = 85;
        let mut heavy = creature(5, "charmeleon", &["fire"]);
        heavy.weight = 190;
        let client = MockClient::new(mock_catalog(vec![light, heavy]));
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("char".to_string()).unwrap();
        drop(tx);

        let by_weight = SortSpec::new(SortKey::Weight, SortDirection::Desc);
        let initial = SearchView::default().reduce(SearchEvent::SortChanged(by_weight));
        let options = SearchOptions::default();
        let mut cache = ProjectionCache::default();
        let mut shown = Vec::new();
        let view = live_search(&client, rx, &options, SEARCH_DEBOUNCE, initial, |view| {
            if view.state == LoadState::Loaded {
                shown = view
                    .visible(&mut cache)
                    .iter()
                    .map(|c| c.name.clone())
                    .collect();
            }
        })
        .await;

        assert_eq!(view.sort, by_weight);
        assert_eq!(shown, vec!["charmeleon", "charmander"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_query_clears_results() {
        let client = starters();
        let (tx, rx) = mpsc::unbounded_channel();

        let typing = async move {
            tx.send("squirt".to_string()).unwrap();
            sleep(Duration::from_secs(1)).await;
            tx.send("".to_string()).unwrap();
        };

        let options = SearchOptions::default();
        let (view, ()) = tokio::join!(
            live_search(
                &client,
                rx,
                &options,
                SEARCH_DEBOUNCE,
                SearchView::default(),
                |_| {},
            ),
            typing,
        );

        assert_eq!(view.generation, 2);
        assert_eq!(view.state, LoadState::Idle);
        assert!(view.results.is_empty());
        assert_eq!(client.record_requests(), vec![MockRequest::ByName(
            "squirtle".to_string()
        )]);
    }
}
