// Main entry point - Dependency injection and task startup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::clock::{Clock, SystemClock};
use crate::application::ingest_service::IngestService;
use crate::application::refresh_service::RefreshService;
use crate::application::sensor_state::SensorState;
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::mqtt_subscriber::MqttSubscriber;
use crate::presentation::app_state::AppState;
use crate::presentation::console_display::ConsoleDisplay;
use crate::presentation::handlers::{channel_readings, health_check, latest_snapshot, sensor_status};
use crate::presentation::snapshot_publisher::SnapshotPublisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_monitor_config()?;
    let topics = config.mqtt.topics();
    let broker = format!("{}:{}", config.mqtt.host, config.mqtt.port);

    // Shared sensor context (application layer)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(SensorState::new(
        config.retention.max_readings_per_channel,
        config.freshness.timeout(),
    ));

    let ingest = IngestService::new(state.clone(), topics.clone(), clock.clone());
    let subscriber = MqttSubscriber::new(&config.mqtt, ingest);

    // Display sinks (presentation layer)
    let (publisher, snapshots) = SnapshotPublisher::new();
    let refresh = RefreshService::new(state.clone(), clock.clone(), config.refresh.interval())?
        .with_sink(Arc::new(ConsoleDisplay))
        .with_sink(Arc::new(publisher));

    let app_state = Arc::new(AppState {
        snapshots,
        sensors: state.clone(),
        clock: clock.clone(),
        broker,
        topics,
    });
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/snapshot", get(latest_snapshot))
        .route("/status", get(sensor_status))
        .route("/readings/:channel", get(channel_readings))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let subscriber_task = tokio::spawn(subscriber.run(shutdown_rx.clone()));
    let refresh_task = tokio::spawn({
        let shutdown = shutdown_rx.clone();
        async move { refresh.run(shutdown).await }
    });

    let listener = tokio::net::TcpListener::bind(config.http.listen).await?;
    tracing::info!("Starting sensor-monitor HTTP server on {}", config.http.listen);
    let mut http_shutdown = shutdown_rx.clone();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = http_shutdown.changed().await;
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown_tx.send_replace(true);

    subscriber_task.await??;
    refresh_task.await?;
    server_task.await??;

    Ok(())
}
