//! Rendering of comparison results for the terminal.
//!
//! Text output groups changes into a devices section and a S.M.A.R.T.
//! section; `--json` emits the same data for scripting.

pub mod json;
pub mod text;

use crate::diff::Differences;

/// A comparison between two named snapshots.
pub struct Comparison<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub differences: &'a Differences,
}

pub fn render(comparison: &Comparison, json_output: bool) -> String {
    if json_output {
        json::render(comparison)
    } else {
        text::render(comparison)
    }
}

/// Output for a check with no stored snapshot to compare against.
pub fn render_first_run(store_dir: &str, to: &str, json_output: bool) -> String {
    if json_output {
        json::render_first_run(to)
    } else {
        text::render_first_run(store_dir)
    }
}
