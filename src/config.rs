//! TOML configuration.
//!
//! Loaded from `--config <path>` or the platform config dir. A missing
//! default file means defaults; every other problem is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::platform;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub filter: Filter,
    pub smartctl: SmartctlConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartctlConfig {
    pub binary: String,
    /// Suffixes of `smartctl --scan` lines to keep. Empty keeps every device.
    pub device_types: Vec<String>,
}

impl Default for SmartctlConfig {
    fn default() -> Self {
        SmartctlConfig {
            binary: platform::default_smartctl_binary().to_string(),
            device_types: vec!["ATA device".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Defaults to the platform data dir.
    pub dir: Option<PathBuf>,
    /// Also append every saved snapshot to the history log.
    pub history: bool,
    pub max_entries: Option<usize>,
    #[serde(deserialize_with = "humantime_opt")]
    pub max_age: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            dir: None,
            history: true,
            max_entries: None,
            max_age: None,
        }
    }
}

impl StoreConfig {
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => platform::data_dir().ok_or(Error::NoDataDir),
        }
    }
}

fn humantime_opt<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error> {
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    humantime::parse_duration(&text)
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid duration \"{text}\": {e}")))
}

impl Config {
    /// Loads `explicit` if given, else the default config file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match platform::config_file() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&text).map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}
