//! Plain terminal rendering.
//!
//! Devices are listed in lexicographic order of identity and attributes in
//! numeric id order, so two runs over the same data print the same report.

use std::fmt::Write;

use super::Comparison;
use crate::store::history::History;

const RULE_WIDTH: usize = 60;
const NAME_WIDTH: usize = 26;
const VALUE_WIDTH: usize = 20;

pub fn render(comparison: &Comparison) -> String {
    let diff = comparison.differences;
    let mut output = String::new();

    if diff.is_empty() {
        output.push_str("No S.M.A.R.T. changes detected.\n");
    } else {
        output.push_str("S.M.A.R.T. changes found\n");
    }
    output.push('\n');
    let _ = writeln!(output, "Last snapshot: {}", comparison.from);
    let _ = writeln!(output, " New snapshot: {}", comparison.to);

    if diff.has_device_changes() {
        output.push_str("\nDevices\n");
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');

        for identity in &diff.devices_offline {
            let _ = writeln!(output, "  [offline] {identity}");
        }
        for identity in &diff.devices_new {
            let _ = writeln!(output, "  [new]     {identity}");
        }
    }

    if !diff.attribute_changes.is_empty() {
        output.push_str("\nS.M.A.R.T.\n");
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');

        for (identity, changes) in &diff.attribute_changes {
            let _ = writeln!(output, "{identity}");
            let _ = writeln!(
                output,
                "  {:<5} {:<NAME_WIDTH$} {:<VALUE_WIDTH$} {}",
                "ID", "Name", "Last value", "New value"
            );
            for (id, change) in changes {
                let _ = writeln!(
                    output,
                    "  {:<5} {:<NAME_WIDTH$} {:<VALUE_WIDTH$} {}",
                    id.as_str(),
                    truncate(&change.name, NAME_WIDTH),
                    change.old_raw,
                    change.new_raw
                );
            }
        }
    }

    output
}

pub fn render_first_run(store_dir: &str) -> String {
    format!("No previous snapshot in {store_dir}, saving the first one.\n")
}

pub fn render_history(history: &History) -> String {
    if history.is_empty() {
        return String::from("No snapshots stored. Run 'smartwatch check' to create one.\n");
    }

    let mut output = String::new();
    let _ = writeln!(output, "{:<8} {:<28} {:>8}", "Offset", "Timestamp", "Devices");
    output.push_str(&"-".repeat(46));
    output.push('\n');

    for (offset, snapshot) in history.iter_back() {
        let _ = writeln!(
            output,
            "{:<8} {:<28} {:>8}",
            offset,
            snapshot.timestamp,
            snapshot.devices.len()
        );
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
