//! Parsing and validation of `kitt.toml` configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`KittConfig`]: the design constants the reference model is built with,
//! the hierarchical names of the signals to read from a hardware trace, and
//! the stimulus script used for golden runs.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    clock_frequency, load_config, load_config_file, load_config_from_str, validate_config,
    CONFIG_FILE,
};
pub use types::*;
