//! Snapshot capture.
//!
//! A [`DeviceSource`] enumerates devices and reads each one's attribute
//! table; [`run`] turns that into a filtered [`Snapshot`].

pub mod smartctl;

use tracing::debug;

use crate::error::Result;
use crate::filter::Filter;
use crate::model::{AttributeId, AttributeReading, DeviceIdentity, DeviceSmart, Snapshot};

/// Identity and attribute rows read from one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub model: String,
    pub serial: String,
    pub attributes: Vec<(AttributeId, AttributeReading)>,
}

impl DeviceReport {
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(&self.model, &self.serial)
    }
}

pub trait DeviceSource {
    fn name(&self) -> &'static str;

    /// Device handles to read, in scan order.
    fn enumerate(&self) -> Result<Vec<String>>;

    fn read_device(&self, device: &str) -> Result<DeviceReport>;
}

/// Captures a snapshot stamped with the current UTC time.
pub fn run(source: &dyn DeviceSource, filter: &Filter) -> Result<Snapshot> {
    run_at(source, filter, Snapshot::now_timestamp())
}

/// Reads every enumerated device, then narrows the result with `filter`.
pub fn run_at(source: &dyn DeviceSource, filter: &Filter, timestamp: String) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(timestamp);

    let devices = source.enumerate()?;
    debug!(source = source.name(), count = devices.len(), "enumerated devices");

    for device in devices {
        let report = source.read_device(&device)?;
        let identity = report.identity();
        let smart: DeviceSmart = report.attributes.into_iter().collect();

        debug!(%device, %identity, attributes = smart.len(), "read device");
        snapshot.devices.insert(identity, smart);
    }

    Ok(filter.apply(snapshot))
}
