//! Port trait definitions (Hexagonal Architecture)
//!
//! Interfaces the services depend on and adapters implement:
//! - Handler: a routable task capability
//! - GenerationClient: the external code/text generation service
//! - TaskMemory: best-effort sink for completed delegations
pub mod generation_client;
pub mod handler;
pub mod null_memory;
pub mod task_memory;

pub use generation_client::{GenerationClient, GenerationRequest};
pub use handler::Handler;
pub use null_memory::NullTaskMemory;
pub use task_memory::TaskMemory;
