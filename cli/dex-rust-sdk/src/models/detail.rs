use std::fmt::Display;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::providers::catalog::{CatalogClientError, ClientTrait, Creature, CreatureRef, Move};

/// Number of moves shown before the rest is summarized.
pub const MOVES_SHOWN: usize = 20;

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("'{0}' does not exist in the catalog")]
    NotFound(CreatureRef),
    #[error("failed to load '{target}'")]
    Catalog {
        target: CreatureRef,
        #[source]
        source: CatalogClientError,
    },
}

impl DetailError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DetailError::NotFound(_))
    }
}

/// Direction of a step from one record to its neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Previous,
    Next,
}

impl Step {
    /// The id one step away from `id`.
    ///
    /// There is nothing before id 1.
    /// Stepping forward is not range-checked, the catalog answers
    /// [DetailError::NotFound] past its last record.
    pub fn from_id(self, id: u32) -> Option<u32> {
        match self {
            Step::Previous if id <= 1 => None,
            Step::Previous => Some(id - 1),
            Step::Next => id.checked_add(1),
        }
    }
}

/// Fetch the single record `target` refers to.
#[instrument(skip_all, fields(%target))]
pub async fn resolve(client: &impl ClientTrait, target: &CreatureRef) -> Result<Creature, DetailError> {
    match client.fetch(target).await {
        Ok(creature) => {
            debug!(id = creature.id, name = %creature.name, "resolved record");
            Ok(creature)
        },
        Err(err) if err.is_not_found() => Err(DetailError::NotFound(target.clone())),
        Err(source) => Err(DetailError::Catalog {
            target: target.clone(),
            source,
        }),
    }
}

/// Resolve the record one `step` away from `current`.
///
/// Returns `None` without contacting the catalog if there is no such step.
pub async fn resolve_step(
    client: &impl ClientTrait,
    current: &Creature,
    step: Step,
) -> Option<Result<Creature, DetailError>> {
    let id = step.from_id(current.id)?;
    Some(resolve(client, &CreatureRef::Id(id)).await)
}

/// The moves of a record as shown on its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSummary<'a> {
    pub shown: &'a [Move],
    pub remaining: usize,
}

impl<'a> MoveSummary<'a> {
    pub fn of(creature: &'a Creature) -> Self {
        let shown = &creature.moves[..creature.moves.len().min(MOVES_SHOWN)];
        MoveSummary {
            shown,
            remaining: creature.moves.len() - shown.len(),
        }
    }
}

impl Display for MoveSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.shown.iter().map(|m| m.name.as_str());
        if let Some(first) = names.next() {
            write!(f, "{first}")?;
            for name in names {
                write!(f, ", {name}")?;
            }
        }
        if self.remaining > 0 {
            write!(f, " +{} more", self.remaining)?;
        }
        Ok(())
    }
}
