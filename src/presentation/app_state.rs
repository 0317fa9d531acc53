// Application state for HTTP handlers
use crate::application::clock::Clock;
use crate::application::sensor_state::SensorState;
use crate::domain::reading::Topics;
use crate::domain::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<Option<Snapshot>>,
    pub sensors: Arc<SensorState>,
    pub clock: Arc<dyn Clock>,
    pub broker: String,
    pub topics: Topics,
}
