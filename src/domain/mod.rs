//! Domain layer for Omniroute
//!
//! Core types and port traits, free of I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::GenerationError;
