// Publishes each refresh snapshot for the HTTP layer
use crate::application::display_sink::DisplaySink;
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;
use tokio::sync::watch;

pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new() -> (Self, watch::Receiver<Option<Snapshot>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DisplaySink for SnapshotPublisher {
    async fn present(&self, snapshot: Snapshot) -> anyhow::Result<()> {
        // No receivers left is fine, the HTTP server may be shutting down
        self.tx.send_replace(Some(snapshot));
        Ok(())
    }
}
