/// TidySleuth Core: scanning, duplicate analysis, categorisation and file actions.
///
/// This crate contains all business logic with zero CLI dependencies.
///
/// # Modules
///
/// - [`model`]: Arena-allocated file tree and supporting types.
/// - [`scanner`]: Background filesystem scanning with progress reporting.
/// - [`hashing`]: Streaming MD5 / SHA-256 content digests.
/// - [`analysis`]: Duplicate groups, keeper ranking, name variants, categories.
/// - [`actions`]: Move / copy / quarantine / delete plans, journals and undo.
/// - [`report`]: JSON, CSV and Markdown reports.
/// - [`config`]: TOML configuration.
pub mod actions;
pub mod analysis;
pub mod config;
pub mod error;
pub mod hashing;
pub mod model;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use error::{Error, Result};
