//! smartctl-backed device source.
//!
//! Enumerates devices with `smartctl --scan`, keeping lines whose trailing
//! description ends with one of the configured device types (e.g.
//! `/dev/sda -d sat # /dev/sda [SAT], ATA device`), then reads each device
//! with `smartctl -i -A`.
//!
//! The attribute table is fixed-width. Columns are sliced at the offsets of
//! the header labels:
//!
//! ```text
//! ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
//!   5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
//! ```
//!
//! smartctl's exit status is a bitmask. Only bits 0 and 1 (bad command
//! line, device open failed) mean the read itself failed; the other bits
//! describe disk health and still come with a usable table.

use std::process::{Command, Output};

use tracing::debug;

use super::{DeviceReport, DeviceSource};
use crate::config::SmartctlConfig;
use crate::error::{Error, Result};
use crate::model::{AttributeId, AttributeReading};
use crate::platform;

const READ_FAILURE_BITS: i32 = 0b11;

pub struct SmartctlSource {
    binary: String,
    device_types: Vec<String>,
}

impl SmartctlSource {
    pub fn new(config: &SmartctlConfig) -> Self {
        SmartctlSource {
            binary: config.binary.clone(),
            device_types: config.device_types.clone(),
        }
    }

    pub fn available(&self) -> bool {
        platform::tool_available(&self.binary)
    }

    fn run(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.binary))?;

        if read_failed(&output) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(format!(
                "{} {} exited with {}: {}",
                self.binary,
                args.join(" "),
                output.status,
                last_line(&detail)
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DeviceSource for SmartctlSource {
    fn name(&self) -> &'static str {
        "smartctl"
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        let stdout = self.run(&["--scan"]).map_err(Error::DeviceEnumerationFailed)?;
        Ok(parse_scan(&stdout, &self.device_types))
    }

    fn read_device(&self, device: &str) -> Result<DeviceReport> {
        let mut args = vec!["-i", "-A"];
        args.extend(device.split_whitespace());

        let stdout = self
            .run(&args)
            .map_err(|e| Error::DeviceEnumerationFailed(format!("{device}: {e}")))?;
        parse_device_report(device, &stdout)
    }
}

fn read_failed(output: &Output) -> bool {
    match output.status.code() {
        Some(code) => code & READ_FAILURE_BITS != 0,
        None => true,
    }
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
}

/// Device arguments (everything before `#`) of each scan line whose
/// description ends with one of `device_types`. An empty list keeps all lines.
pub fn parse_scan(output: &str, device_types: &[String]) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| {
            device_types.is_empty() || device_types.iter().any(|t| line.ends_with(t.as_str()))
        })
        .filter_map(|line| {
            let args = line.split('#').next().unwrap_or("").trim();
            (!args.is_empty()).then(|| args.to_string())
        })
        .collect()
}

pub fn parse_device_report(device: &str, output: &str) -> Result<DeviceReport> {
    let (model, serial) = parse_identity(device, output)?;
    let attributes = parse_attribute_table(device, output)?;

    debug!(device, model = %model, serial = %serial, rows = attributes.len(), "parsed smartctl output");

    Ok(DeviceReport {
        model,
        serial,
        attributes,
    })
}

fn parse_identity(device: &str, output: &str) -> Result<(String, String)> {
    let mut model = None;
    let mut serial = None;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            // ATA reports "Device Model", NVMe and SCSI "Model Number"/"Product"
            "Device Model" | "Model Number" | "Product" if model.is_none() => {
                model = Some(value.trim().to_string());
            }
            "Serial Number" | "Serial number" if serial.is_none() => {
                serial = Some(value.trim().to_string());
            }
            _ => {}
        }
    }

    match (model, serial) {
        (Some(model), Some(serial)) => Ok((model, serial)),
        (None, _) => Err(parse_error(device, "no model in identity section")),
        (_, None) => Err(parse_error(device, "no serial number in identity section")),
    }
}

struct Columns {
    name: usize,
    flag: usize,
    raw: usize,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        Some(Columns {
            name: header.find("ATTRIBUTE_NAME")?,
            flag: header.find("FLAG")?,
            raw: header.find("RAW_VALUE")?,
        })
    }
}

/// Rows of the vendor attribute table. Devices without one (NVMe) yield none.
pub fn parse_attribute_table(
    device: &str,
    output: &str,
) -> Result<Vec<(AttributeId, AttributeReading)>> {
    let mut lines = output.lines().skip_while(|l| !l.starts_with("ID#"));

    let Some(header) = lines.next() else {
        debug!(device, "no attribute table in smartctl output");
        return Ok(Vec::new());
    };

    let columns = Columns::from_header(header)
        .ok_or_else(|| parse_error(device, format!("unexpected table header: {}", header.trim())))?;

    let mut rows = Vec::new();
    for line in lines.map(str::trim_end).take_while(|l| !l.trim().is_empty()) {
        rows.push(parse_row(device, line, &columns)?);
    }

    Ok(rows)
}

fn parse_row(device: &str, line: &str, columns: &Columns) -> Result<(AttributeId, AttributeReading)> {
    let slice = |range: std::ops::Range<usize>| {
        line.get(range)
            .map(str::trim)
            .ok_or_else(|| parse_error(device, format!("row shorter than header: {line}")))
    };

    let id = slice(0..columns.name)?;
    if id.parse::<u16>().is_err() {
        return Err(parse_error(device, format!("attribute id is not a number: {line}")));
    }

    let name = slice(columns.name..columns.flag)?;
    let raw = line
        .get(columns.raw..)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| parse_error(device, format!("missing raw value: {line}")))?;

    Ok((AttributeId::from(id), AttributeReading::new(name, raw)))
}

fn parse_error(device: &str, reason: impl Into<String>) -> Error {
    Error::AttributeParseFailed {
        device: device.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE";

    fn row(id: u16, name: &str, flag: u16, value: u16, raw: &str) -> String {
        format!(
            "{id:>3} {name:<24}0x{flag:04x}   {value:03}   {value:03}   {:03}    {:<10}{:<9}{:<12}{raw}",
            10, "Pre-fail", "Always", "    -"
        )
    }

    fn smartctl_output(rows: &[String]) -> String {
        let mut out = String::from(
            "smartctl 7.3 2022-02-28 r5338 [x86_64-linux-6.1.0] (local build)\n\
             \n\
             === START OF INFORMATION SECTION ===\n\
             Model Family:     Western Digital Red\n\
             Device Model:     WDC WD40EFRX-68N32N0\n\
             Serial Number:    WD-WCC7K1234567\n\
             User Capacity:    4,000,787,030,016 bytes [4.00 TB]\n\
             \n\
             === START OF READ SMART DATA SECTION ===\n\
             SMART Attributes Data Structure revision number: 16\n\
             Vendor Specific SMART Attributes with Thresholds:\n",
        );
        out.push_str(HEADER);
        out.push('\n');
        for r in rows {
            out.push_str(r);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    #[test]
    fn scan_keeps_matching_device_types() {
        let output = "/dev/sda -d sat # /dev/sda [SAT], ATA device\r\n\
                      /dev/sdb -d scsi # /dev/sdb, SCSI device\r\n\
                      /dev/nvme0 -d nvme # /dev/nvme0, NVMe device\r\n";
        let devices = parse_scan(output, &["ATA device".to_string()]);
        assert_eq!(devices, vec!["/dev/sda -d sat"]);
    }

    #[test]
    fn scan_without_types_keeps_everything() {
        let output = "/dev/sda -d sat # /dev/sda [SAT], ATA device\n\
                      /dev/nvme0 -d nvme # /dev/nvme0, NVMe device\n\
                      \n";
        let devices = parse_scan(output, &[]);
        assert_eq!(devices, vec!["/dev/sda -d sat", "/dev/nvme0 -d nvme"]);
    }

    #[test]
    fn parses_identity_and_table() {
        let output = smartctl_output(&[
            row(5, "Reallocated_Sector_Ct", 0x33, 200, "0"),
            row(194, "Temperature_Celsius", 0x22, 116, "34 (Min/Max 20/45)"),
            row(197, "Current_Pending_Sector", 0x32, 200, "2"),
        ]);

        let report = parse_device_report("/dev/sda", &output).unwrap();
        assert_eq!(report.identity().as_str(), "WDC WD40EFRX-68N32N0 :: WD-WCC7K1234567");
        assert_eq!(report.attributes.len(), 3);

        let (id, reading) = &report.attributes[1];
        assert_eq!(id.as_str(), "194");
        assert_eq!(reading.display_name(), "Temperature_Celsius");
        assert_eq!(reading.raw, "34 (Min/Max 20/45)");
    }

    #[test]
    fn device_without_table_has_no_attributes() {
        let output = "Model Number:   Samsung SSD 980 PRO 1TB\n\
                       Serial Number:  S5GXNF0R123456\n\
                       \n\
                       SMART overall-health self-assessment test result: PASSED\n";
        let report = parse_device_report("/dev/nvme0", output).unwrap();
        assert_eq!(report.model, "Samsung SSD 980 PRO 1TB");
        assert!(report.attributes.is_empty());
    }

    #[test]
    fn missing_serial_is_a_parse_failure() {
        let err = parse_device_report("/dev/sda", "Device Model: X\n").unwrap_err();
        assert!(matches!(err, Error::AttributeParseFailed { .. }));
    }

    #[test]
    fn truncated_row_is_a_parse_failure() {
        let output = smartctl_output(&["  5 Reallocated_Sector_Ct   0x0033".to_string()]);
        let err = parse_attribute_table("/dev/sda", &output).unwrap_err();
        match err {
            Error::AttributeParseFailed { device, reason } => {
                assert_eq!(device, "/dev/sda");
                assert!(reason.contains("missing raw value"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_id_is_a_parse_failure() {
        let mut bad = row(5, "Reallocated_Sector_Ct", 0x33, 200, "0");
        bad.replace_range(0..3, "  x");
        let output = smartctl_output(&[bad]);
        assert!(parse_attribute_table("/dev/sda", &output).is_err());
    }

    #[test]
    fn malformed_header_is_a_parse_failure() {
        let output = "ID# SOMETHING ELSE\n  5 foo\n";
        assert!(parse_attribute_table("/dev/sda", output).is_err());
    }
}
