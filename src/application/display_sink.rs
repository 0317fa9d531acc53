// Display boundary - Where refresh snapshots are delivered
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;

#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Render or publish one refresh cycle's snapshot
    async fn present(&self, snapshot: Snapshot) -> anyhow::Result<()>;
}
