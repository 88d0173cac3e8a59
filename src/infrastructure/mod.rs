//! Infrastructure layer
//!
//! Adapters for configuration, logging, the generation service and the
//! task memory store.

pub mod config;
pub mod generation;
pub mod logging;
pub mod memory;
