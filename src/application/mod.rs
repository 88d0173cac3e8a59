//! Application layer: process-wide wiring of the core.
pub mod orchestrator;

pub use orchestrator::Orchestrator;
