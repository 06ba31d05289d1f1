//! Presentation state of the search, gallery and detail screens.
//!
//! Every view is an immutable snapshot.
//! Changes are expressed as events and applied with `reduce`,
//! which consumes the old snapshot and returns the next one.
//! Snapshots own their list of records and a revision number
//! that changes whenever that list is replaced.
//! The display order is derived through a [ProjectionCache] owned by the screen,
//! which only recomputes it when the revision, the selection or the sort changed.

use tracing::{debug, trace};

use super::batch::BatchFailure;
use super::detail::Step;
use super::filter::{CategorySelection, ProjectionCache, ProjectionKey, SortSpec};
use super::gallery::Gallery;
use super::search::{SearchResults, is_blank};
use crate::providers::catalog::{CategoryLabel, Creature, CreatureRef, ImageVariant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// State of the search screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub query: String,
    /// Generation of the query currently shown
    pub generation: u64,
    pub state: LoadState,
    pub results: Vec<Creature>,
    pub failures: Vec<BatchFailure>,
    /// Number of index entries the query matched, before the result cap
    pub matched: usize,
    pub sort: SortSpec,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A debounced query was released
    QueryChanged { generation: u64, query: String },
    ResultsLoaded {
        generation: u64,
        results: SearchResults,
    },
    SearchFailed { generation: u64, message: String },
    SortChanged(SortSpec),
}

impl SearchView {
    #[must_use]
    pub fn reduce(mut self, event: SearchEvent) -> Self {
        match event {
            SearchEvent::QueryChanged { generation, query } => {
                if generation <= self.generation {
                    trace!(generation, current = self.generation, "ignoring stale query");
                    return self;
                }
                self.generation = generation;
                if is_blank(&query) {
                    self.state = LoadState::Idle;
                    self.matched = 0;
                    self.replace_results(Vec::new(), Vec::new());
                } else {
                    self.state = LoadState::Loading;
                }
                self.query = query;
            },
            SearchEvent::ResultsLoaded {
                generation,
                results,
            } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "discarding stale results");
                    return self;
                }
                self.state = LoadState::Loaded;
                self.matched = results.matched;
                self.replace_results(results.creatures, results.failures);
            },
            SearchEvent::SearchFailed {
                generation,
                message,
            } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "discarding stale failure");
                    return self;
                }
                self.state = LoadState::Failed(message);
                self.matched = 0;
                self.replace_results(Vec::new(), Vec::new());
            },
            SearchEvent::SortChanged(sort) => self.sort = sort,
        }
        self
    }

    /// Whether the query matched more entries than were loaded.
    pub fn truncated(&self) -> bool {
        self.matched > self.results.len() + self.failures.len()
    }

    fn replace_results(&mut self, results: Vec<Creature>, failures: Vec<BatchFailure>) {
        self.results = results;
        self.failures = failures;
        self.revision += 1;
    }

    pub fn projection_key(&self) -> ProjectionKey {
        ProjectionKey {
            revision: self.revision,
            selected: CategorySelection::new(),
            sort: Some(self.sort),
        }
    }

    /// The results in display order.
    pub fn visible(&self, cache: &mut ProjectionCache) -> Vec<&Creature> {
        cache
            .project(self.projection_key(), &self.results)
            .iter()
            .map(|&i| &self.results[i])
            .collect()
    }
}

/// State of the gallery screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryView {
    pub state: LoadState,
    pub creatures: Vec<Creature>,
    pub categories: Vec<CategoryLabel>,
    pub selected: CategorySelection,
    /// `None` keeps index order
    pub sort: Option<SortSpec>,
    pub failures: Vec<BatchFailure>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    LoadStarted,
    Loaded(Gallery),
    LoadFailed(String),
    /// Select a category if it is not selected, deselect it otherwise
    ToggleCategory(String),
    ClearCategories,
    SortChanged(Option<SortSpec>),
}

impl GalleryView {
    #[must_use]
    pub fn reduce(mut self, event: GalleryEvent) -> Self {
        match event {
            GalleryEvent::LoadStarted => self.state = LoadState::Loading,
            GalleryEvent::Loaded(gallery) => {
                self.state = LoadState::Loaded;
                self.creatures = gallery.creatures;
                self.categories = gallery.categories;
                self.failures = gallery.failures;
                self.revision += 1;
            },
            GalleryEvent::LoadFailed(message) => self.state = LoadState::Failed(message),
            GalleryEvent::ToggleCategory(name) => {
                if !self.selected.remove(&name) {
                    self.selected.insert(name);
                }
            },
            GalleryEvent::ClearCategories => self.selected.clear(),
            GalleryEvent::SortChanged(sort) => self.sort = sort,
        }
        self
    }

    pub fn projection_key(&self) -> ProjectionKey {
        ProjectionKey {
            revision: self.revision,
            selected: self.selected.clone(),
            sort: self.sort,
        }
    }

    /// The records passing the category filter, in display order.
    pub fn visible(&self, cache: &mut ProjectionCache) -> Vec<&Creature> {
        cache
            .project(self.projection_key(), &self.creatures)
            .iter()
            .map(|&i| &self.creatures[i])
            .collect()
    }

    /// "Showing X of Y" counts: visible records and all loaded records.
    pub fn counts(&self, cache: &mut ProjectionCache) -> (usize, usize) {
        let visible = cache.project(self.projection_key(), &self.creatures).len();
        (visible, self.creatures.len())
    }
}

/// State of the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub target: CreatureRef,
    pub state: DetailState,
    pub image: ImageVariant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Box<Creature>),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEvent {
    Loaded(Creature),
    NotFound,
    Failed(String),
    SelectImage(ImageVariant),
    /// Move to the neighboring record, keeping the selected image
    Navigate(Step),
}

impl DetailView {
    pub fn new(target: CreatureRef) -> Self {
        Self {
            target,
            state: DetailState::Loading,
            image: ImageVariant::default(),
        }
    }

    pub fn creature(&self) -> Option<&Creature> {
        match &self.state {
            DetailState::Loaded(creature) => Some(creature.as_ref()),
            _ => None,
        }
    }

    /// The id a `step` would navigate to, if the step is possible.
    ///
    /// Navigation needs a loaded record.
    pub fn step_target(&self, step: Step) -> Option<u32> {
        step.from_id(self.creature()?.id)
    }

    /// URL of the selected image, empty if the record has none.
    pub fn image_url(&self) -> &str {
        self.creature()
            .map(|creature| creature.sprite(self.image))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn reduce(mut self, event: DetailEvent) -> Self {
        match event {
            DetailEvent::Loaded(creature) => self.state = DetailState::Loaded(Box::new(creature)),
            DetailEvent::NotFound => self.state = DetailState::NotFound,
            DetailEvent::Failed(message) => self.state = DetailState::Failed(message),
            DetailEvent::SelectImage(image) => self.image = image,
            DetailEvent::Navigate(step) => match self.step_target(step) {
                Some(id) => {
                    self.target = CreatureRef::Id(id);
                    self.state = DetailState::Loading;
                },
                None => trace!(?step, "navigation not possible"),
            },
        }
        self
    }
}
