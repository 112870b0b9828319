//! JSON snapshot storage.
//!
//! Two files live in the store directory:
//! - snapshot.json: the latest saved snapshot, overwritten wholesale
//! - history.json: every saved snapshot in capture order (see [`history`])
//!
//! A missing file is "nothing stored yet"; an unreadable or malformed one is
//! a load error and is never mistaken for an empty store.

pub mod history;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Snapshot;

pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const HISTORY_FILE: &str = "history.json";

/// Store rooted at one directory. Open once per command.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// The latest saved snapshot, or `None` if nothing was saved yet.
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        read_json(&self.snapshot_path())
    }

    pub fn save_latest(&self, snapshot: &Snapshot) -> Result<()> {
        write_json(&self.snapshot_path(), snapshot)
    }

    pub fn load_history(&self) -> Result<history::History> {
        Ok(read_json(&self.history_path())?.unwrap_or_default())
    }

    pub fn save_history(&self, history: &history::History) -> Result<()> {
        write_json(&self.history_path(), history)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no stored file");
            return Ok(None);
        }
        Err(e) => return Err(Error::load(path, e)),
    };

    let value = serde_json::from_str(&text).map_err(|e| Error::load(path, e))?;
    debug!(path = %path.display(), "loaded");
    Ok(Some(value))
}

/// Writes through a sibling temp file and renames it over `path`, so a
/// failed write never leaves a truncated store behind.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::save(path, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| Error::save(path, e))?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, json).map_err(|e| Error::save(path, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::save(path, e)
    })?;

    debug!(path = %path.display(), "saved");
    Ok(())
}
