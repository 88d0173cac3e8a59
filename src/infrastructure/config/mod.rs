//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment: defaults, project YAML files,
//! then `OMNIROUTE_*` environment overrides.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
