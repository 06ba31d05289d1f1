//! Fan-out / fan-in of full record fetches.

use std::fmt::Display;
use std::str::FromStr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::providers::catalog::{ClientTrait, Creature, CreatureRef};

/// What a batch does when some of its fetches fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Drop failed items and keep the rest.
    #[default]
    Tolerant,
    /// Fail the whole batch if any item failed.
    Strict,
}

impl Display for BatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPolicy::Tolerant => write!(f, "tolerant"),
            BatchPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tolerant" => Ok(BatchPolicy::Tolerant),
            "strict" => Ok(BatchPolicy::Strict),
            other => Err(format!(
                "unknown batch policy '{other}', expected 'tolerant' or 'strict'"
            )),
        }
    }
}

/// A single fetch of a batch that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub target: CreatureRef,
    /// Whether the catalog reported the record as missing
    pub not_found: bool,
    pub reason: String,
}

impl Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

/// Some fan-out fetches failed under [BatchPolicy::Strict].
#[derive(Debug, Clone, Error)]
#[error("{} of {attempted} records could not be loaded", failures.len())]
pub struct PartialBatchFailure {
    pub attempted: usize,
    pub failures: Vec<BatchFailure>,
}

/// Records of a batch in request order, along with the fetches that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub records: Vec<Creature>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Apply `policy` to the outcome.
    pub fn with_policy(self, policy: BatchPolicy) -> Result<Self, PartialBatchFailure> {
        match policy {
            BatchPolicy::Strict if !self.failures.is_empty() => Err(PartialBatchFailure {
                attempted: self.records.len() + self.failures.len(),
                failures: self.failures,
            }),
            _ => Ok(self),
        }
    }
}

/// Fetch all `targets` concurrently.
///
/// Results are collected by position, not by arrival order.
/// Failed fetches are logged and reported in [BatchOutcome::failures].
pub async fn fetch_all(client: &impl ClientTrait, targets: Vec<CreatureRef>) -> BatchOutcome {
    debug!(n_targets = targets.len(), "fetching records");
    let results = join_all(targets.iter().map(|target| client.fetch(target))).await;

    let mut outcome = BatchOutcome::default();
    for (target, result) in targets.into_iter().zip(results) {
        match result {
            Ok(creature) => outcome.records.push(creature),
            Err(err) => {
                warn!(%target, error = %err, "failed to fetch record");
                outcome.failures.push(BatchFailure {
                    target,
                    not_found: err.is_not_found(),
                    reason: err.to_string(),
                });
            },
        }
    }

    debug!(
        n_records = outcome.records.len(),
        n_failures = outcome.failures.len(),
        "fetched records"
    );
    outcome
}
