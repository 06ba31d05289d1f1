//! Pure, in-memory filtering and sorting of loaded creatures.
//!
//! Nothing in here performs I/O or keeps hidden state:
//! the same inputs always produce the same ordered output.
//! [ProjectionCache] builds on that to only recompute a projection
//! when one of its inputs actually changed.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::providers::catalog::Creature;

/// The set of selected category names.
///
/// Insertion order is irrelevant, only membership matters.
pub type CategorySelection = BTreeSet<String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Name,
    Height,
    Weight,
    BaseExperience,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Name,
        SortKey::Height,
        SortKey::Weight,
        SortKey::BaseExperience,
    ];

    fn compare(self, a: &Creature, b: &Creature) -> Ordering {
        match self {
            SortKey::Name => collate(&a.name, &b.name),
            SortKey::Height => a.height.cmp(&b.height),
            SortKey::Weight => a.weight.cmp(&b.weight),
            SortKey::BaseExperience => a.base_experience.cmp(&b.base_experience),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortKey::Name => "name",
            SortKey::Height => "height",
            SortKey::Weight => "weight",
            SortKey::BaseExperience => "base-experience",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "height" => Ok(SortKey::Height),
            "weight" => Ok(SortKey::Weight),
            "base-experience" | "base_experience" => Ok(SortKey::BaseExperience),
            other => Err(format!(
                "unknown sort key '{other}', expected one of: name, height, weight, base-experience"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A sort key together with its direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Compare two creatures according to this spec.
    pub fn compare(&self, a: &Creature, b: &Creature) -> Ordering {
        self.direction.apply(self.key.compare(a, b))
    }
}

/// Compare strings the way a user expects to see them ordered.
///
/// Strings are compared in canonical decomposition (NFD),
/// so precomposed and combining accents are treated alike.
/// Base letters compare case- and accent-insensitively first,
/// then unaccented sorts before accented and finally lowercase before uppercase.
/// Only canonically equivalent strings compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = base_letters(a)
        .flat_map(char::to_lowercase)
        .cmp(base_letters(b).flat_map(char::to_lowercase));

    primary
        .then_with(|| accents(a).cmp(&accents(b)))
        .then_with(|| {
            base_letters(a)
                .map(char::is_uppercase)
                .cmp(base_letters(b).map(char::is_uppercase))
        })
        .then_with(|| a.nfd().cmp(b.nfd()))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().filter(|&c| !is_combining_mark(c))
}

/// The combining marks attached to each base letter.
fn accents(s: &str) -> Vec<Vec<char>> {
    let mut accents: Vec<Vec<char>> = Vec::new();
    for c in s.nfd() {
        match accents.last_mut() {
            Some(marks) if is_combining_mark(c) => marks.push(c),
            // a leading mark has no base, it starts its own group
            _ => accents.push(if is_combining_mark(c) { vec![c] } else { vec![] }),
        }
    }
    accents
}

/// Whether `creature` passes the category filter.
///
/// An empty selection lets everything pass,
/// otherwise the creature needs at least one selected category.
pub fn matches_categories(creature: &Creature, selected: &CategorySelection) -> bool {
    selected.is_empty() || creature.category_names().any(|name| selected.contains(name))
}

/// Keep only the creatures that pass the category filter, preserving order.
pub fn filter_by_categories(creatures: &[Creature], selected: &CategorySelection) -> Vec<Creature> {
    creatures
        .iter()
        .filter(|creature| matches_categories(creature, selected))
        .cloned()
        .collect()
}

/// Stable sort by `spec`.
pub fn sort_creatures(creatures: &mut [Creature], spec: SortSpec) {
    creatures.sort_by(|a, b| spec.compare(a, b));
}

/// Return a sorted copy of `creatures`.
pub fn sorted(creatures: &[Creature], spec: SortSpec) -> Vec<Creature> {
    let mut creatures = creatures.to_vec();
    sort_creatures(&mut creatures, spec);
    creatures
}

/// Positions into `creatures` of the filtered and sorted projection.
///
/// Without a sort spec the original order is kept.
pub fn project(
    creatures: &[Creature],
    selected: &CategorySelection,
    sort: Option<SortSpec>,
) -> Vec<usize> {
    let mut indices = (0..creatures.len())
        .filter(|&i| matches_categories(&creatures[i], selected))
        .collect::<Vec<_>>();
    if let Some(spec) = sort {
        indices.sort_by(|&a, &b| spec.compare(&creatures[a], &creatures[b]));
    }
    indices
}

/// Everything a projection depends on.
///
/// The list itself is represented by a revision number
/// that the owner bumps whenever it replaces the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionKey {
    pub revision: u64,
    pub selected: CategorySelection,
    pub sort: Option<SortSpec>,
}

/// Memoized [project] results.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    key: Option<ProjectionKey>,
    indices: Vec<usize>,
    computations: usize,
}

impl ProjectionCache {
    /// Return the projection for `key`, recomputing only if the key changed.
    pub fn project(&mut self, key: ProjectionKey, creatures: &[Creature]) -> &[usize] {
        if self.key.as_ref() != Some(&key) {
            trace!(revision = key.revision, sort = ?key.sort, "recomputing projection");
            self.indices = project(creatures, &key.selected, key.sort);
            self.key = Some(key);
            self.computations += 1;
        }
        &self.indices
    }

    /// How many times the projection was actually computed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
