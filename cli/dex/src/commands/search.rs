use std::time::Duration;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use dex_rust_sdk::models::filter::{ProjectionCache, SortSpec};
use dex_rust_sdk::models::search::{is_blank, live_search, search as run_search};
use dex_rust_sdk::models::view::{LoadState, SearchEvent, SearchView};
use dex_rust_sdk::providers::catalog::{Client, Creature};
use indoc::formatdoc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use super::{SortArgs, sort_args};
use crate::config::Config;
use crate::utils::dialog::{Dialog, Spinner};
use crate::utils::display::DisplayCreatures;
use crate::utils::errors::HOME_HINT;
use crate::utils::message;

/// Search the catalog for creatures by name
#[derive(Bpaf, Clone)]
pub struct Search {
    /// Print the results as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Read queries from stdin, one per line, searching each once typing settles
    #[bpaf(long, short)]
    pub interactive: bool,

    #[bpaf(external(sort_args))]
    pub sort: SortArgs,

    /// Name, or part of a name, to search for
    #[bpaf(positional("query"))]
    pub query: Option<String>,
}

impl Search {
    #[instrument(name = "search", skip_all, fields(interactive = self.interactive))]
    pub async fn handle(self, config: Config, client: Client) -> Result<()> {
        let sort = self.sort.spec().unwrap_or_default();

        if self.interactive {
            return self.handle_interactive(&config, &client, sort).await;
        }

        let Some(query) = self.query.as_deref() else {
            bail!("Please provide a name to search for, or use '--interactive'.");
        };

        if is_blank(query) {
            message::plain(formatdoc! {"
                Enter a name to search for.

                {HOME_HINT}
            "});
            return Ok(());
        }

        let options = config.search_options();
        let results = Dialog {
            message: &format!("Searching for '{}'...", query.trim()),
            help_message: None,
            typed: Spinner::new(|| Handle::current().block_on(run_search(&client, query, &options))),
        }
        .spin_with_delay(Duration::from_secs(1))?;

        let view = SearchView::default()
            .reduce(SearchEvent::QueryChanged {
                generation: 1,
                query: query.to_string(),
            })
            .reduce(SearchEvent::ResultsLoaded {
                generation: 1,
                results,
            })
            .reduce(SearchEvent::SortChanged(sort));

        render(&view, &view.visible(&mut ProjectionCache::default()), self.json)
    }

    /// Search every line typed on stdin, printing results as they arrive.
    async fn handle_interactive(&self, config: &Config, client: &Client, sort: SortSpec) -> Result<()> {
        let (sender, queries) = mpsc::unbounded_channel();

        if let Some(query) = &self.query {
            let _ = sender.send(query.clone());
        }

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if sender.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        let json = self.json;
        let initial = SearchView::default().reduce(SearchEvent::SortChanged(sort));
        let options = config.search_options();
        let mut projection = ProjectionCache::default();
        let mut rendered = Ok(());
        let view = live_search(client, queries, &options, config.debounce(), initial, |view| {
            if rendered.is_ok() {
                rendered = render_update(view, &mut projection, json);
            }
        })
        .await;
        reader.await?;
        rendered?;

        debug!(query = %view.query, revision = view.revision, "interactive search finished");
        Ok(())
    }
}

/// Print a snapshot of a live search.
fn render_update(view: &SearchView, projection: &mut ProjectionCache, json: bool) -> Result<()> {
    match &view.state {
        LoadState::Idle => Ok(()),
        LoadState::Loading => {
            message::info(format!("Searching for '{}'...", view.query.trim()));
            Ok(())
        },
        LoadState::Loaded => render(view, &view.visible(projection), json),
        LoadState::Failed(reason) => {
            message::error(format!("Search for '{}' failed: {reason}", view.query.trim()));
            Ok(())
        },
    }
}

fn render(view: &SearchView, creatures: &[&Creature], json: bool) -> Result<()> {
    for failure in &view.failures {
        message::warning(format!("Could not load '{}': {}", failure.target, failure.reason));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(creatures)?);
        return Ok(());
    }

    if creatures.is_empty() {
        if view.failures.is_empty() {
            message::plain(formatdoc! {"
                No creatures found matching '{query}'.

                {HOME_HINT}
            ", query = view.query.trim()});
        }
        return Ok(());
    }

    println!("{}", DisplayCreatures(creatures.to_vec()));

    if view.truncated() {
        message::info(format!(
            "Showing the first {} of {} creatures matching '{}', refine the query to see the rest.",
            view.results.len() + view.failures.len(),
            view.matched,
            view.query.trim(),
        ));
    }
    Ok(())
}
