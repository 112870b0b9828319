//! JSON output for comparisons and snapshots.

use serde::Serialize;

use super::Comparison;
use crate::diff::Differences;
use crate::model::Snapshot;

#[derive(Serialize)]
struct Report<'a> {
    from: &'a str,
    to: &'a str,
    changed: bool,
    #[serde(flatten)]
    differences: &'a Differences,
}

pub fn render(comparison: &Comparison) -> String {
    let report = Report {
        from: comparison.from,
        to: comparison.to,
        changed: !comparison.differences.is_empty(),
        differences: comparison.differences,
    };
    to_pretty(&report)
}

#[derive(Serialize)]
struct FirstRun<'a> {
    to: &'a str,
    changed: bool,
    first_run: bool,
}

/// Nothing to compare against yet: no `from`, no differences.
pub fn render_first_run(to: &str) -> String {
    to_pretty(&FirstRun {
        to,
        changed: false,
        first_run: true,
    })
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    to_pretty(snapshot)
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    // string-keyed maps and plain structs cannot fail to serialize
    serde_json::to_string_pretty(value).unwrap_or_else(|_| String::from("{}"))
}
