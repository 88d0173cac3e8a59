use async_trait::async_trait;

use crate::domain::models::TaskRecord;

/// Sink for completed delegations.
///
/// Recording is best-effort; the dispatcher logs failures and moves on.
#[async_trait]
pub trait TaskMemory: Send + Sync {
    async fn record(&self, record: TaskRecord) -> anyhow::Result<()>;
}
