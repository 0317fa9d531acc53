// Console display - Logs the latest metrics each refresh
use crate::application::display_sink::DisplaySink;
use crate::domain::reading::{Channel, Reading};
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;

const HISTORY_LEN: usize = 10;

pub struct ConsoleDisplay;

/// Latest value to two decimals, or a dash when there is none
pub fn format_metric(reading: Option<&Reading>) -> String {
    match reading {
        Some(r) => format!("{:.2}", r.value),
        None => "—".to_string(),
    }
}

pub fn format_history(readings: &[Reading]) -> String {
    if readings.is_empty() {
        return "—".to_string();
    }
    readings
        .iter()
        .map(|r| format!("({}, {:.2})", r.timestamp.format("%H:%M:%S"), r.value))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn status_line(snapshot: &Snapshot) -> String {
    if snapshot.is_stale {
        "No recent sensor data (ND)".to_string()
    } else {
        "Receiving sensor data".to_string()
    }
}

#[async_trait]
impl DisplaySink for ConsoleDisplay {
    async fn present(&self, snapshot: Snapshot) -> anyhow::Result<()> {
        let metrics = Channel::ALL
            .iter()
            .map(|c| format!("{} ({}): {}", c.label(), c.unit(), format_metric(snapshot.latest(*c))))
            .collect::<Vec<_>>()
            .join(" | ");

        if snapshot.is_stale {
            tracing::warn!("{} | {}", status_line(&snapshot), metrics);
        } else {
            tracing::info!("{} | {}", status_line(&snapshot), metrics);
        }

        if !snapshot.is_stale {
            for channel in &snapshot.stale_channels {
                tracing::warn!("No recent {} readings", channel);
            }
        }

        for channel in Channel::ALL {
            tracing::debug!(
                "Last {} readings: {}",
                channel,
                format_history(snapshot.recent(channel, HISTORY_LEN))
            );
        }

        Ok(())
    }
}
