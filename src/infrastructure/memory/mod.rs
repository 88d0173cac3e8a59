//! Task memory sinks
pub mod http;

pub use http::HttpTaskMemory;

use std::sync::Arc;

use crate::domain::models::MemoryConfig;
use crate::domain::ports::{NullTaskMemory, TaskMemory};

/// Memory sink for the given configuration; the null sink when no store URL is set.
pub fn task_memory_from_config(config: &MemoryConfig) -> anyhow::Result<Arc<dyn TaskMemory>> {
    match config.url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => Ok(Arc::new(HttpTaskMemory::new(url, config)?)),
        None => Ok(Arc::new(NullTaskMemory::new())),
    }
}
