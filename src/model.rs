//! Snapshot data model.
//!
//! A [`Snapshot`] maps each device, keyed by `"<model> :: <serial>"`, to the
//! raw S.M.A.R.T. readings captured for it at one point in time. Raw values
//! stay opaque strings so attributes with packed sub-fields
//! (e.g. `"34 (Min/Max 20/45)"`) compare exactly as reported.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between model and serial in a [`DeviceIdentity`].
pub const IDENTITY_SEPARATOR: &str = " :: ";

/// Stable key for a physical device across snapshots.
///
/// Only model and serial are used; device paths move between boots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(model: &str, serial: &str) -> Self {
        DeviceIdentity(format!("{}{IDENTITY_SEPARATOR}{}", model.trim(), serial.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceIdentity {
    fn from(s: &str) -> Self {
        DeviceIdentity(s.to_string())
    }
}

impl From<String> for DeviceIdentity {
    fn from(s: String) -> Self {
        DeviceIdentity(s)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// S.M.A.R.T. attribute id, kept as the text smartctl printed.
///
/// Orders numerically when both ids are numbers, so "5" sorts before "196".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(String);

impl AttributeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (u8, u32) {
        match self.0.parse::<u32>() {
            Ok(n) => (0, n),
            Err(_) => (1, 0),
        }
    }
}

impl Ord for AttributeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for AttributeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for AttributeId {
    fn from(s: &str) -> Self {
        AttributeId(s.to_string())
    }
}

impl From<String> for AttributeId {
    fn from(s: String) -> Self {
        AttributeId(s)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One attribute reading. The id is the key it is stored under in [`DeviceSmart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReadingRepr")]
pub struct AttributeReading {
    /// Display-only, e.g. `Reallocated_Sector_Ct`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub raw: String,
}

impl AttributeReading {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let name = name.into();
        AttributeReading {
            name: if name.is_empty() { None } else { Some(name) },
            raw: raw.into(),
        }
    }

    pub fn raw_only(raw: impl Into<String>) -> Self {
        AttributeReading {
            name: None,
            raw: raw.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Stored readings come either as `{"name": .., "raw": ..}` or as a bare raw string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReadingRepr {
    Raw(String),
    Full {
        #[serde(default)]
        name: Option<String>,
        raw: String,
    },
}

impl From<ReadingRepr> for AttributeReading {
    fn from(repr: ReadingRepr) -> Self {
        match repr {
            ReadingRepr::Raw(raw) => AttributeReading::raw_only(raw),
            ReadingRepr::Full { name, raw } => AttributeReading { name, raw },
        }
    }
}

/// All readings of one device at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSmart(BTreeMap<AttributeId, AttributeReading>);

impl DeviceSmart {
    pub fn new() -> Self {
        DeviceSmart(BTreeMap::new())
    }

    pub fn insert(&mut self, id: AttributeId, reading: AttributeReading) {
        self.0.insert(id, reading);
    }

    pub fn get(&self, id: &AttributeId) -> Option<&AttributeReading> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeId, &AttributeReading)> {
        self.0.iter()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&AttributeId) -> bool) {
        self.0.retain(|id, _| keep(id));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AttributeId, AttributeReading)> for DeviceSmart {
    fn from_iter<I: IntoIterator<Item = (AttributeId, AttributeReading)>>(iter: I) -> Self {
        DeviceSmart(iter.into_iter().collect())
    }
}

/// Point-in-time capture of every monitored device.
///
/// A file without a `devices` field fails to deserialize; the loader reports
/// that as a load failure so the diff engine only ever sees whole snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub devices: BTreeMap<DeviceIdentity, DeviceSmart>,
}

impl Snapshot {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Snapshot {
            timestamp: timestamp.into(),
            devices: BTreeMap::new(),
        }
    }

    /// Current UTC time in the `YYYY-MM-DD HH:MM:SS.ffffff` form used for timestamps.
    pub fn now_timestamp() -> String {
        chrono::Utc::now()
            .format(crate::TIMESTAMP_FORMAT)
            .to_string()
    }

    pub fn with_device(mut self, identity: DeviceIdentity, smart: DeviceSmart) -> Self {
        self.devices.insert(identity, smart);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_joins_model_and_serial() {
        let id = DeviceIdentity::new(" WDC WD40EFRX-68N32N0 ", "WD-WCC7K1234567\n");
        assert_eq!(id.as_str(), "WDC WD40EFRX-68N32N0 :: WD-WCC7K1234567");
    }

    #[test]
    fn attribute_ids_sort_numerically() {
        let mut ids: Vec<AttributeId> = ["197", "5", "196", "9", "x"]
            .into_iter()
            .map(AttributeId::from)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(sorted, vec!["5", "9", "196", "197", "x"]);
    }

    #[test]
    fn readings_load_from_object_and_string_forms() {
        let json = r#"{
            "timestamp": "2024-03-01 10:00:00.000000",
            "devices": {
                "M1 :: S1": {
                    "5": {"name": "Reallocated_Sector_Ct", "raw": "0"},
                    "197": "12"
                }
            }
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let smart = &snapshot.devices[&DeviceIdentity::from("M1 :: S1")];

        let five = smart.get(&AttributeId::from("5")).unwrap();
        assert_eq!(five.display_name(), "Reallocated_Sector_Ct");
        assert_eq!(five.raw, "0");

        let pending = smart.get(&AttributeId::from("197")).unwrap();
        assert_eq!(pending.name, None);
        assert_eq!(pending.raw, "12");
    }

    #[test]
    fn snapshot_without_devices_is_rejected() {
        let result: Result<Snapshot, _> = serde_json::from_str(r#"{"timestamp": "t"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serialized_shape_matches_stored_files() {
        let mut smart = DeviceSmart::new();
        smart.insert("5".into(), AttributeReading::new("Reallocated_Sector_Ct", "0"));
        let snapshot = Snapshot::new("t").with_device("M1 :: S1".into(), smart);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["timestamp"], "t");
        assert_eq!(value["devices"]["M1 :: S1"]["5"]["raw"], "0");
        assert_eq!(value["devices"]["M1 :: S1"]["5"]["name"], "Reallocated_Sector_Ct");
    }

    #[test]
    fn empty_name_is_dropped() {
        let reading = AttributeReading::new("", "7");
        assert_eq!(reading.name, None);
        assert_eq!(reading.display_name(), "");
    }
}
