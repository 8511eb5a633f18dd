//! Configuration core module.
//!
//! This module provides the typed configuration sections and the loader that
//! parses and validates a TOML configuration file at startup.

pub mod config;
pub mod types;

pub use config::Config;
pub use types::{ClassifierSection, HoneypotSection, LlmSection, SshSection};
