//! Port implemented by every task handler, built-in or generated.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::models::TaskContext;

/// A capability the dispatcher can route tasks to.
///
/// `Ok(value)` is returned to the caller untouched, so handlers report
/// expected failures as data (`{"error": ...}`). An `Err` is a handler
/// fault and triggers one recovery cycle.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Human-readable name, used in logs
    fn name(&self) -> &str;

    /// Perform the task
    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value>;
}
