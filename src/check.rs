//! The capture → compare → confirm → save cycle behind `smartwatch check`.

use chrono::Utc;
use tracing::debug;

use crate::config::StoreConfig;
use crate::diff::{self, Differences};
use crate::error::Result;
use crate::model::Snapshot;
use crate::store::Store;

/// Result of comparing a fresh capture against the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing stored yet, no comparison made.
    FirstRun,
    /// Compared, nothing changed.
    Unchanged,
    Changed(Differences),
}

pub fn evaluate(previous: Option<&Snapshot>, current: &Snapshot) -> Outcome {
    let Some(previous) = previous else {
        return Outcome::FirstRun;
    };

    let differences = diff::compare_snapshots(previous, current);
    debug!(
        offline = differences.devices_offline.len(),
        new = differences.devices_new.len(),
        attributes = differences.changed_attribute_count(),
        "compared with {}",
        previous.timestamp
    );

    if differences.is_empty() {
        Outcome::Unchanged
    } else {
        Outcome::Changed(differences)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Save silently unless something changed, then ask.
    Ask,
    Always,
    Never,
}

impl SavePolicy {
    pub fn from_flags(yes: bool, no_save: bool) -> Self {
        if no_save {
            SavePolicy::Never
        } else if yes {
            SavePolicy::Always
        } else {
            SavePolicy::Ask
        }
    }
}

/// Whether the new snapshot should replace the stored one. `ask` is only
/// called when the policy is `Ask` and the outcome has changes.
pub fn should_save(
    outcome: &Outcome,
    policy: SavePolicy,
    ask: impl FnOnce() -> Result<bool>,
) -> Result<bool> {
    match (policy, outcome) {
        (SavePolicy::Never, _) => Ok(false),
        (SavePolicy::Always, _) => Ok(true),
        (SavePolicy::Ask, Outcome::FirstRun | Outcome::Unchanged) => Ok(true),
        (SavePolicy::Ask, Outcome::Changed(_)) => ask(),
    }
}

/// Stores `snapshot` as the latest and, if enabled, appends it to the
/// pruned history log. Every read happens before the first write, so a
/// history that cannot be loaded leaves the store untouched.
pub fn persist(store: &Store, config: &StoreConfig, snapshot: &Snapshot) -> Result<()> {
    let history = if config.history {
        let mut history = store.load_history()?;
        history.push(snapshot.clone());
        history.prune(config.max_entries, config.max_age, Utc::now());
        Some(history)
    } else {
        None
    };

    store.save_latest(snapshot)?;
    if let Some(history) = &history {
        store.save_history(history)?;
    }

    Ok(())
}
