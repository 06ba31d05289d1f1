use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::batch::{BatchFailure, fetch_all};
use crate::providers::catalog::{
    CatalogClientError,
    CatalogEntry,
    CategoryLabel,
    ClientTrait,
    Creature,
    CreatureRef,
};

/// Number of index entries the gallery shows.
pub const GALLERY_SIZE: u32 = 200;

/// The loaded gallery.
///
/// The gallery batch is always tolerant:
/// records that fail to load are left out and reported in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gallery {
    /// Full records in index order
    pub creatures: Vec<Creature>,
    /// The category vocabulary offered as filters
    pub categories: Vec<CategoryLabel>,
    #[serde(skip)]
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("failed to fetch the catalog index")]
    Index(#[source] CatalogClientError),
    #[error("failed to fetch the list of categories")]
    Categories(#[source] CatalogClientError),
}

/// How to fetch the full record listed by `entry`.
///
/// Prefers the numeric id embedded in the entry's detail URL
/// and falls back to the name.
fn record_ref(entry: &CatalogEntry) -> CreatureRef {
    match entry.id() {
        Some(id) => CreatureRef::Id(id),
        None => {
            debug!(name = %entry.name, url = %entry.detail_url, "no id in detail url, using name");
            CreatureRef::Name(entry.name.clone())
        },
    }
}

/// Load the first `size` index entries in full along with the category vocabulary.
///
/// The index and the vocabulary are fetched concurrently.
#[instrument(skip(client))]
pub async fn load_gallery(client: &impl ClientTrait, size: u32) -> Result<Gallery, GalleryError> {
    let (index, categories) =
        futures::join!(client.fetch_index(size, 0), client.fetch_category_labels());
    let index = index.map_err(GalleryError::Index)?;
    let categories = categories.map_err(GalleryError::Categories)?;

    let targets = index
        .entries
        .iter()
        .take(size as usize)
        .map(record_ref)
        .collect();
    let outcome = fetch_all(client, targets).await;

    Ok(Gallery {
        creatures: outcome.records,
        categories,
        failures: outcome.failures,
    })
}
