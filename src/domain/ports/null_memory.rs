//! Null task memory implementation.
//!
//! Used when no memory store is configured.

use async_trait::async_trait;

use super::TaskMemory;
use crate::domain::models::TaskRecord;

/// A no-op task memory that stores nothing.
#[derive(Debug, Clone, Default)]
pub struct NullTaskMemory;

impl NullTaskMemory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskMemory for NullTaskMemory {
    async fn record(&self, _record: TaskRecord) -> anyhow::Result<()> {
        Ok(())
    }
}
