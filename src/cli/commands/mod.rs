//! CLI command implementations
pub mod delegate;
pub mod diagnose;
pub mod generate;
pub mod handlers;
