use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use bpaf::Bpaf;
use dex_rust_sdk::models::filter::ProjectionCache;
use dex_rust_sdk::models::gallery::load_gallery;
use dex_rust_sdk::models::view::{GalleryEvent, GalleryView};
use dex_rust_sdk::providers::catalog::Client;
use indoc::formatdoc;
use itertools::Itertools;
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use super::{SortArgs, sort_args};
use crate::config::Config;
use crate::utils::dialog::{Dialog, Spinner};
use crate::utils::display::DisplayCreatures;
use crate::utils::message;

/// Browse the first creatures of the catalog
#[derive(Bpaf, Clone)]
pub struct Gallery {
    /// Print the visible creatures as JSON
    #[bpaf(long)]
    pub json: bool,

    /// List the available types instead of the creatures
    #[bpaf(long)]
    pub list_types: bool,

    /// Only show creatures of this type, may be repeated to show any of several types
    #[bpaf(long("type"), short('t'), argument("type"))]
    pub types: Vec<String>,

    #[bpaf(external(sort_args))]
    pub sort: SortArgs,
}

impl Gallery {
    #[instrument(name = "gallery", skip_all)]
    pub async fn handle(self, config: Config, client: Client) -> Result<()> {
        let size = config.gallery_size;
        let view = GalleryView::default().reduce(GalleryEvent::LoadStarted);

        let gallery = Dialog {
            message: "Loading the gallery...",
            help_message: Some("This may take a moment on the first run"),
            typed: Spinner::new(|| Handle::current().block_on(load_gallery(&client, size))),
        }
        .spin_with_delay(Duration::from_secs(1))?;

        let (view, unknown) = self.apply(view.reduce(GalleryEvent::Loaded(gallery)));

        for failure in &view.failures {
            message::warning(format!("Could not load '{}': {}", failure.target, failure.reason));
        }
        if !unknown.is_empty() {
            message::warning(formatdoc! {"
                Unknown types: {unknown}
                Available types: {available}",
                unknown = unknown.iter().join(", "),
                available = view.categories.iter().map(|label| &label.name).join(", "),
            });
        }

        if self.list_types {
            println!("{}", type_counts(&view));
            return Ok(());
        }

        let mut projection = ProjectionCache::default();
        let creatures = view.visible(&mut projection);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&creatures)?);
            return Ok(());
        }

        let (visible, total) = view.counts(&mut projection);
        if visible > 0 {
            println!("{}", DisplayCreatures(creatures));
        }
        message::info(format!("Showing {visible} of {total} creatures"));
        Ok(())
    }

    /// Select the requested types and sort.
    ///
    /// Returns the updated view and the requested types the catalog does not know.
    fn apply(&self, mut view: GalleryView) -> (GalleryView, Vec<String>) {
        let requested: BTreeSet<String> = self
            .types
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        let mut unknown = Vec::new();
        for name in requested {
            if !view.categories.iter().any(|label| label.name == name) {
                unknown.push(name);
                continue;
            }
            view = view.reduce(GalleryEvent::ToggleCategory(name));
        }
        debug!(selected = ?view.selected, ?unknown, "applied type filter");

        (view.reduce(GalleryEvent::SortChanged(self.sort.spec())), unknown)
    }
}

/// One line per category with the number of loaded creatures that have it.
fn type_counts(view: &GalleryView) -> String {
    let width = view
        .categories
        .iter()
        .map(|label| label.name.chars().count())
        .max()
        .unwrap_or_default();

    view.categories
        .iter()
        .map(|label| {
            let count = view
                .creatures
                .iter()
                .filter(|creature| creature.category_names().any(|name| name == label.name))
                .count();
            format!("{name:<width$}  {count:>3}", name = label.name)
        })
        .join("\n")
}
