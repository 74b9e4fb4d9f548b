//! Storage infrastructure: the configuration file.
//!
//! The `config` sub-module reads the TOML file named on the command line
//! and falls back to defaults when it does not exist, so the demo binary
//! runs without any setup.

pub mod config;
