//! Snapshot comparison engine.
//!
//! Compares an older snapshot against a newer one and reports:
//! - Devices gone offline and devices newly seen (matched by model + serial)
//! - Per-attribute raw value changes on devices present in both
//!
//! Pure and infallible: no I/O, no shared state.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{AttributeId, DeviceIdentity, DeviceSmart, Snapshot};

/// Split of the device identities of two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSetDiff {
    /// In older, not in newer.
    pub offline: BTreeSet<DeviceIdentity>,
    /// In newer, not in older.
    pub new: BTreeSet<DeviceIdentity>,
    /// In both; only these get attribute comparison.
    pub common: BTreeSet<DeviceIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub old_raw: String,
    pub new_raw: String,
}

pub type AttributeChanges = BTreeMap<AttributeId, AttributeChange>;

/// Everything that changed between two snapshots.
///
/// Empty collections mean "no change in that dimension" and are left out of
/// the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Differences {
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub devices_offline: BTreeSet<DeviceIdentity>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub devices_new: BTreeSet<DeviceIdentity>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_changes: BTreeMap<DeviceIdentity, AttributeChanges>,
}

impl Differences {
    /// True when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.devices_offline.is_empty()
            && self.devices_new.is_empty()
            && self.attribute_changes.is_empty()
    }

    pub fn has_device_changes(&self) -> bool {
        !self.devices_offline.is_empty() || !self.devices_new.is_empty()
    }

    /// Number of changed attributes across all devices.
    pub fn changed_attribute_count(&self) -> usize {
        self.attribute_changes.values().map(BTreeMap::len).sum()
    }
}

pub fn compare_device_sets(older: &Snapshot, newer: &Snapshot) -> DeviceSetDiff {
    let older_ids: BTreeSet<&DeviceIdentity> = older.devices.keys().collect();
    let newer_ids: BTreeSet<&DeviceIdentity> = newer.devices.keys().collect();

    DeviceSetDiff {
        offline: older_ids.difference(&newer_ids).map(|id| (*id).clone()).collect(),
        new: newer_ids.difference(&older_ids).map(|id| (*id).clone()).collect(),
        common: older_ids.intersection(&newer_ids).map(|id| (*id).clone()).collect(),
    }
}

/// Compares raw values of the attributes listed in `older`.
///
/// The older reading decides which ids are checked: ids only in `newer` are
/// ignored, and ids missing from `newer` are skipped without a record.
pub fn compare_attributes(older: &DeviceSmart, newer: &DeviceSmart) -> AttributeChanges {
    older
        .iter()
        .filter_map(|(id, old)| {
            let new = newer.get(id)?;
            (old.raw != new.raw).then(|| {
                (
                    id.clone(),
                    AttributeChange {
                        name: old.display_name().to_string(),
                        old_raw: old.raw.clone(),
                        new_raw: new.raw.clone(),
                    },
                )
            })
        })
        .collect()
}

pub fn compare_snapshots(older: &Snapshot, newer: &Snapshot) -> Differences {
    let devices = compare_device_sets(older, newer);

    let mut attribute_changes = BTreeMap::new();
    for identity in devices.common {
        // common ids are keys of both maps
        let (Some(old_smart), Some(new_smart)) =
            (older.devices.get(&identity), newer.devices.get(&identity))
        else {
            continue;
        };

        let changes = compare_attributes(old_smart, new_smart);
        if !changes.is_empty() {
            attribute_changes.insert(identity, changes);
        }
    }

    Differences {
        devices_offline: devices.offline,
        devices_new: devices.new,
        attribute_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeReading;

    fn smart(readings: &[(&str, &str)]) -> DeviceSmart {
        readings
            .iter()
            .map(|(id, raw)| (AttributeId::from(*id), AttributeReading::new(format!("attr_{id}"), *raw)))
            .collect()
    }

    fn snapshot(devices: &[(&str, &[(&str, &str)])]) -> Snapshot {
        devices.iter().fold(Snapshot::new("t"), |snap, (identity, readings)| {
            snap.with_device((*identity).into(), smart(readings))
        })
    }

    fn ids(set: &BTreeSet<DeviceIdentity>) -> Vec<&str> {
        set.iter().map(DeviceIdentity::as_str).collect()
    }

    #[test]
    fn changed_raw_value_reported() {
        let older = snapshot(&[("M1::S1", &[("5", "0")])]);
        let newer = snapshot(&[("M1::S1", &[("5", "3")])]);

        let diff = compare_snapshots(&older, &newer);
        assert!(!diff.has_device_changes());

        let change = &diff.attribute_changes[&DeviceIdentity::from("M1::S1")][&AttributeId::from("5")];
        assert_eq!(change.old_raw, "0");
        assert_eq!(change.new_raw, "3");
        assert_eq!(change.name, "attr_5");
    }

    #[test]
    fn swapped_devices_reported_offline_and_new() {
        let older = snapshot(&[("M1::S1", &[("5", "0")])]);
        let newer = snapshot(&[("M2::S2", &[("5", "0")])]);

        let diff = compare_snapshots(&older, &newer);
        assert_eq!(ids(&diff.devices_offline), vec!["M1::S1"]);
        assert_eq!(ids(&diff.devices_new), vec!["M2::S2"]);
        assert!(diff.attribute_changes.is_empty());
    }

    #[test]
    fn identical_snapshots_have_no_differences() {
        let older = snapshot(&[("M1::S1", &[("5", "10"), ("196", "0")])]);
        let newer = older.clone();

        assert!(compare_snapshots(&older, &newer).is_empty());
    }

    #[test]
    fn snapshot_compared_with_itself_is_empty() {
        let snap = snapshot(&[
            ("M1::S1", &[("5", "10"), ("9", "4410")]),
            ("M2::S2", &[("194", "34 (Min/Max 20/45)")]),
        ]);
        assert!(compare_snapshots(&snap, &snap).is_empty());
    }

    #[test]
    fn attribute_missing_in_newer_is_skipped() {
        let older = smart(&[("5", "0"), ("197", "8")]);
        let newer = smart(&[("5", "0")]);

        assert!(compare_attributes(&older, &newer).is_empty());
    }

    #[test]
    fn attribute_only_in_newer_is_ignored() {
        let older = smart(&[("5", "0")]);
        let newer = smart(&[("5", "0"), ("198", "1")]);

        assert!(compare_attributes(&older, &newer).is_empty());
    }

    #[test]
    fn comparison_is_exact_string_inequality() {
        let older = smart(&[("5", "0")]);
        let newer = smart(&[("5", "0 ")]);

        assert_eq!(compare_attributes(&older, &newer).len(), 1);
    }

    #[test]
    fn swapping_sides_swaps_values_but_not_ids() {
        let a = smart(&[("5", "0"), ("9", "100"), ("197", "2")]);
        let b = smart(&[("5", "1"), ("9", "100"), ("197", "0")]);

        let forward = compare_attributes(&a, &b);
        let backward = compare_attributes(&b, &a);

        assert_eq!(
            forward.keys().collect::<Vec<_>>(),
            backward.keys().collect::<Vec<_>>()
        );
        for (id, change) in &forward {
            assert_eq!(change.old_raw, backward[id].new_raw);
            assert_eq!(change.new_raw, backward[id].old_raw);
        }
    }

    #[test]
    fn device_set_partition_covers_union() {
        let older = snapshot(&[("A::1", &[]), ("B::2", &[]), ("C::3", &[])]);
        let newer = snapshot(&[("B::2", &[]), ("C::3", &[]), ("D::4", &[])]);

        let sets = compare_device_sets(&older, &newer);
        assert!(sets.offline.is_disjoint(&sets.new));
        assert!(sets.offline.is_disjoint(&sets.common));
        assert!(sets.new.is_disjoint(&sets.common));

        let union: BTreeSet<_> = sets
            .offline
            .iter()
            .chain(&sets.new)
            .chain(&sets.common)
            .cloned()
            .collect();
        let expected: BTreeSet<_> = older.devices.keys().chain(newer.devices.keys()).cloned().collect();
        assert_eq!(union, expected);
        assert_eq!(ids(&sets.common), vec!["B::2", "C::3"]);
    }

    #[test]
    fn unchanged_devices_not_listed() {
        let older = snapshot(&[("M1::S1", &[("5", "0")]), ("M2::S2", &[("5", "0")])]);
        let newer = snapshot(&[("M1::S1", &[("5", "0")]), ("M2::S2", &[("5", "8")])]);

        let diff = compare_snapshots(&older, &newer);
        assert_eq!(diff.attribute_changes.len(), 1);
        assert!(diff.attribute_changes.contains_key(&DeviceIdentity::from("M2::S2")));
        assert_eq!(diff.changed_attribute_count(), 1);
    }

    #[test]
    fn empty_snapshots_are_valid() {
        let empty = Snapshot::new("t");
        let sets = compare_device_sets(&empty, &empty);
        assert!(sets.offline.is_empty() && sets.new.is_empty() && sets.common.is_empty());
        assert!(compare_snapshots(&empty, &empty).is_empty());
    }

    #[test]
    fn empty_fields_left_out_of_json() {
        let older = snapshot(&[("M1::S1", &[("5", "0")])]);
        let newer = snapshot(&[("M1::S1", &[("5", "3")])]);

        let value = serde_json::to_value(compare_snapshots(&older, &newer)).unwrap();
        assert!(value.get("devices_offline").is_none());
        assert!(value.get("devices_new").is_none());
        assert_eq!(value["attribute_changes"]["M1::S1"]["5"]["new_raw"], "3");

        let empty = serde_json::to_value(Differences::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }
}
