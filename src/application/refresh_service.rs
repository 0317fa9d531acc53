// Refresh service - Periodic eviction and snapshots for the display layer
use crate::application::clock::Clock;
use crate::application::display_sink::DisplaySink;
use crate::application::sensor_state::SensorState;
use crate::domain::snapshot::Snapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

pub struct RefreshService {
    state: Arc<SensorState>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    sinks: Vec<Arc<dyn DisplaySink>>,
}

impl RefreshService {
    pub fn new(state: Arc<SensorState>, clock: Arc<dyn Clock>, interval: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (MIN_REFRESH_INTERVAL..=MAX_REFRESH_INTERVAL).contains(&interval),
            "refresh interval must be between {:?} and {:?}, got {:?}",
            MIN_REFRESH_INTERVAL,
            MAX_REFRESH_INTERVAL,
            interval
        );

        Ok(Self {
            state,
            clock,
            interval,
            sinks: Vec::new(),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn DisplaySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// One refresh: drop old days and snapshot today
    pub fn cycle(&self) -> Snapshot {
        let now = self.clock.now();
        let today = now.date_naive();
        let (snapshot, evicted) = self.state.refresh(today, now);
        if evicted > 0 {
            tracing::info!("Day rolled over to {}, evicted {} old day(s)", today, evicted);
        }
        snapshot
    }

    async fn present(&self, snapshot: Snapshot) {
        for sink in &self.sinks {
            if let Err(e) = sink.present(snapshot.clone()).await {
                tracing::warn!("Display sink failed: {:#}", e);
            }
        }
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Refreshing every {:?}", self.interval);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let snapshot = self.cycle();
            self.present(snapshot).await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Refresh loop stopped");
    }
}
