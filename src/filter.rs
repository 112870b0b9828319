//! Capture-time selection of devices and attributes.
//!
//! Each dimension is either `All` or an exact set. In config files `All` is
//! written as the bare string `"*"`; a list is always taken literally, so a
//! device reporting itself as `*` can still be listed by name.

use std::collections::BTreeSet;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::model::{AttributeId, DeviceIdentity, Snapshot};

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Exactly(BTreeSet<T>),
}

impl<T: Ord> Selection<T> {
    pub fn exactly<I: IntoIterator<Item = T>>(items: I) -> Self {
        Selection::Exactly(items.into_iter().collect())
    }

    pub fn includes(&self, item: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Exactly(items) => items.contains(item),
        }
    }
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str(WILDCARD),
            Selection::Exactly(items) => items.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Ord"))]
enum SelectionRepr<T> {
    Keyword(String),
    List(BTreeSet<T>),
}

impl<'de, T: Deserialize<'de> + Ord> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SelectionRepr::<T>::deserialize(deserializer)? {
            SelectionRepr::Keyword(s) if s == WILDCARD => Ok(Selection::All),
            SelectionRepr::Keyword(s) => Err(de::Error::custom(format!(
                "expected \"{WILDCARD}\" or a list, found \"{s}\""
            ))),
            SelectionRepr::List(items) => Ok(Selection::Exactly(items)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(default)]
    pub devices: Selection<DeviceIdentity>,
    #[serde(default)]
    pub attr_ids: Selection<AttributeId>,
}

impl Filter {
    /// Keeps every device and every attribute.
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn includes_device(&self, identity: &DeviceIdentity) -> bool {
        self.devices.includes(identity)
    }

    pub fn includes_attribute(&self, id: &AttributeId) -> bool {
        self.attr_ids.includes(id)
    }

    /// Drops unselected devices and, from the rest, unselected attributes.
    pub fn apply(&self, mut snapshot: Snapshot) -> Snapshot {
        snapshot.devices.retain(|identity, _| self.includes_device(identity));
        for smart in snapshot.devices.values_mut() {
            smart.retain(|id| self.includes_attribute(id));
        }
        snapshot
    }
}
