//! Snapshot history log.
//!
//! An append-only, capture-ordered list of snapshots, persisted as a JSON
//! object mapping each timestamp to its devices:
//!
//! ```json
//! {"2024-03-01 10:00:00.000000": {"M1 :: S1": {"5": {"name": "...", "raw": "0"}}}}
//! ```
//!
//! Entries are addressed by offset back from the newest (0 = latest), so
//! file order is preserved on load rather than re-sorted.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use crate::model::{DeviceIdentity, DeviceSmart, Snapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `snapshot` as the newest entry. A snapshot with the same
    /// timestamp as the current newest replaces it.
    pub fn push(&mut self, snapshot: Snapshot) {
        if let Some(last) = self.entries.last_mut() {
            if last.timestamp == snapshot.timestamp {
                *last = snapshot;
                return;
            }
        }
        self.entries.push(snapshot);
    }

    /// Entry `offset` steps back from the newest.
    pub fn nth_back(&self, offset: usize) -> Option<&Snapshot> {
        self.entries.iter().rev().nth(offset)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    /// Newest first, paired with their offset.
    pub fn iter_back(&self) -> impl Iterator<Item = (usize, &Snapshot)> {
        self.entries.iter().rev().enumerate()
    }

    /// Drops entries older than `max_age` relative to `now`, then the oldest
    /// entries beyond `max_entries`. Returns how many were removed.
    ///
    /// Entries whose timestamp cannot be parsed are never dropped by age.
    pub fn prune(
        &mut self,
        max_entries: Option<usize>,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = self.entries.len();

        if let Some(max_age) = max_age {
            let cutoff = chrono::Duration::from_std(max_age)
                .ok()
                .and_then(|age| now.checked_sub_signed(age));
            if let Some(cutoff) = cutoff {
                self.entries.retain(|snapshot| match parse_timestamp(&snapshot.timestamp) {
                    Some(taken) => taken >= cutoff,
                    None => {
                        warn!(timestamp = %snapshot.timestamp, "unparseable history timestamp, keeping entry");
                        true
                    }
                });
            }
        }

        if let Some(max_entries) = max_entries {
            let excess = self.entries.len().saturating_sub(max_entries);
            self.entries.drain(..excess);
        }

        let removed = before - self.entries.len();
        if removed > 0 {
            info!(removed, kept = self.entries.len(), "pruned snapshot history");
        }
        removed
    }
}

// fraction optional, as in timestamps written without microseconds
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses timestamps written by [`Snapshot::now_timestamp`], with RFC 3339 as a fallback.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for snapshot in &self.entries {
            map.serialize_entry(&snapshot.timestamp, &snapshot.devices)?;
        }
        map.end()
    }
}

struct HistoryVisitor;

impl<'de> Visitor<'de> for HistoryVisitor {
    type Value = History;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of timestamps to device readings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<History, A::Error> {
        let mut history = History::new();
        while let Some((timestamp, devices)) =
            access.next_entry::<String, BTreeMap<DeviceIdentity, DeviceSmart>>()?
        {
            history.push(Snapshot { timestamp, devices });
        }
        Ok(history)
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HistoryVisitor)
    }
}
