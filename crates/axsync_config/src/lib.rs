//! Parsing and validation of `axsync.toml` configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`SyncConfig`] describing the reference slave, the transactor and the
//! default trace settings. Every section is optional.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME, MAX_REGISTER_COUNT};
pub use types::*;
