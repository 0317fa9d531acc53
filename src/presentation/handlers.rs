// HTTP request handlers
use crate::domain::reading::{Channel, Reading, Topics};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_HISTORY: usize = 10;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub live: bool,
    pub last_update: Option<DateTime<Local>>,
    pub broker: String,
    pub topics: Topics,
}

#[derive(Debug, Serialize)]
pub struct ReadingsBody {
    pub channel: Channel,
    pub latest: Option<Reading>,
    pub history: Vec<Reading>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest refresh snapshot, 503 until the first refresh cycle has run
pub async fn latest_snapshot(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshots.borrow().clone();
    match snapshot {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no snapshot yet").into_response(),
    }
}

/// LIVE / STALE indicator, evaluated at request time
pub async fn sensor_status(State(state): State<Arc<AppState>>) -> Json<StatusBody> {
    let now = state.clock.now();

    Json(StatusBody {
        live: !state.sensors.is_stale(now),
        last_update: state.sensors.last_update(),
        broker: state.broker.clone(),
        topics: state.topics.clone(),
    })
}

/// Today's latest reading and recent history for one channel
pub async fn channel_readings(
    Path(channel): Path<Channel>,
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<ReadingsBody> {
    let today = state.clock.now().date_naive();
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY);

    Json(ReadingsBody {
        channel,
        latest: state.sensors.latest(today, channel),
        history: state.sensors.window(today, channel, limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::testing::ManualClock;
    use crate::application::display_sink::DisplaySink;
    use crate::application::sensor_state::SensorState;
    use crate::domain::snapshot::Snapshot;
    use crate::presentation::snapshot_publisher::SnapshotPublisher;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn app_state() -> (SnapshotPublisher, Arc<AppState>, Arc<ManualClock>) {
        let (publisher, snapshots) = SnapshotPublisher::new();
        let clock = Arc::new(ManualClock::new(t0()));
        let state = Arc::new(AppState {
            snapshots,
            sensors: Arc::new(SensorState::new(None, TimeDelta::seconds(60))),
            clock: clock.clone(),
            broker: "localhost:1883".to_string(),
            topics: Topics::new("t", "h"),
        });
        (publisher, state, clock)
    }

    fn live_snapshot() -> Snapshot {
        Snapshot {
            date: t0().date_naive(),
            today_temperature: vec![Reading::new(t0(), 22.0)],
            today_humidity: vec![],
            is_stale: false,
            last_update: Some(t0()),
            stale_channels: vec![Channel::Humidity],
        }
    }

    #[tokio::test]
    async fn test_snapshot_unavailable_before_first_cycle() {
        let (_publisher, state, _) = app_state();
        let response = latest_snapshot(State(state)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_snapshot_served_after_publish() {
        let (publisher, state, _) = app_state();
        publisher.present(live_snapshot()).await.unwrap();

        let response = latest_snapshot(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_follows_freshness() {
        let (_publisher, state, clock) = app_state();

        let Json(status) = sensor_status(State(state.clone())).await;
        assert!(!status.live);
        assert!(status.last_update.is_none());
        assert_eq!(status.broker, "localhost:1883");

        let body = serde_json::to_value(&status).unwrap();
        assert_eq!(body["topics"]["temperature"], "t");
        assert_eq!(body["topics"]["humidity"], "h");
        assert!(body.get("temperature_topic").is_none());

        state.sensors.record(Channel::Humidity, Reading::at(t0(), 58.0), t0());
        let Json(status) = sensor_status(State(state.clone())).await;
        assert!(status.live);
        assert_eq!(status.last_update, Some(t0()));

        clock.advance(TimeDelta::seconds(61));
        let Json(status) = sensor_status(State(state)).await;
        assert!(!status.live);
    }

    #[tokio::test]
    async fn test_channel_readings_window() {
        let (_publisher, state, _) = app_state();
        for i in 0..15 {
            let at = t0() + TimeDelta::seconds(i);
            state.sensors.record(Channel::Temperature, Reading::at(at, i as f64), at);
        }

        let Json(body) = channel_readings(
            Path(Channel::Temperature),
            Query(HistoryQuery { limit: None }),
            State(state.clone()),
        )
        .await;
        assert_eq!(body.latest.map(|r| r.value), Some(14.0));
        assert_eq!(body.history.len(), 10);
        assert_eq!(body.history[0].value, 5.0);

        let Json(body) = channel_readings(
            Path(Channel::Humidity),
            Query(HistoryQuery { limit: Some(3) }),
            State(state),
        )
        .await;
        assert!(body.latest.is_none());
        assert!(body.history.is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "ok");
    }
}
