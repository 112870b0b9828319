pub mod capture;
pub mod check;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod model;
pub mod platform;
pub mod prompt;
pub mod report;
pub mod store;

pub use error::{Error, Result};

/// Format of snapshot timestamps (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
