//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout output
//! - Optional rolling JSON log files
//! - Secret redaction helpers for client logs
pub mod config;
pub mod logger;
pub mod redact;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
pub use redact::{redact_secret, scrub_secrets};
