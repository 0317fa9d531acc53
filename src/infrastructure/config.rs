use crate::domain::reading::Topics;
use chrono::TimeDelta;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub mqtt: MqttSettings,
    pub freshness: FreshnessSettings,
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    pub http: HttpSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub temperature_topic: String,
    pub humidity_topic: String,
    pub backoff: BackoffSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackoffSettings {
    pub initial_ms: u64,
    pub max_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FreshnessSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RetentionSettings {
    pub max_readings_per_channel: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub listen: SocketAddr,
}

impl MqttSettings {
    pub fn topics(&self) -> Topics {
        Topics::new(self.temperature_topic.clone(), self.humidity_topic.clone())
    }
}

impl BackoffSettings {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs(self.max_secs)
    }
}

impl FreshnessSettings {
    pub fn timeout(&self) -> TimeDelta {
        TimeDelta::seconds(self.timeout_secs as i64)
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("mqtt.host", "test.mosquitto.org")?
        .set_default("mqtt.port", 1883)?
        .set_default("mqtt.client_id", "sensor-monitor")?
        .set_default("mqtt.keep_alive_secs", 60)?
        .set_default("mqtt.temperature_topic", "damiao707/casa/sensor/temperatura")?
        .set_default("mqtt.humidity_topic", "damiao707/casa/sensor/umidade")?
        .set_default("mqtt.backoff.initial_ms", 1000)?
        .set_default("mqtt.backoff.max_secs", 60)?
        .set_default("freshness.timeout_secs", 60)?
        .set_default("refresh.interval_secs", 2)?
        .set_default("http.listen", "0.0.0.0:8080")
}

/// Load `config/monitor.toml` (optional) with `MONITOR__SECTION__KEY` overrides
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = with_defaults()?
        .add_source(File::with_name("config/monitor").required(false))
        .add_source(Environment::with_prefix("MONITOR").separator("__"))
        .build()?;

    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML document layered over the built-in defaults
#[cfg(test)]
pub fn parse_monitor_config(toml: &str) -> anyhow::Result<MonitorConfig> {
    use config::FileFormat;

    let settings = with_defaults()?
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl MonitorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=10).contains(&self.refresh.interval_secs),
            "refresh.interval_secs must be between 1 and 10, got {}",
            self.refresh.interval_secs
        );
        anyhow::ensure!(self.freshness.timeout_secs > 0, "freshness.timeout_secs must be positive");
        anyhow::ensure!(
            !self.mqtt.temperature_topic.is_empty() && !self.mqtt.humidity_topic.is_empty(),
            "mqtt topics must not be empty"
        );
        anyhow::ensure!(
            self.mqtt.temperature_topic != self.mqtt.humidity_topic,
            "mqtt.temperature_topic and mqtt.humidity_topic must differ"
        );
        anyhow::ensure!(
            self.retention.max_readings_per_channel != Some(0),
            "retention.max_readings_per_channel must be positive when set"
        );
        anyhow::ensure!(
            self.mqtt.backoff.initial() <= self.mqtt.backoff.max(),
            "mqtt.backoff.initial_ms must not exceed mqtt.backoff.max_secs"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = parse_monitor_config("").unwrap();

        assert_eq!(config.mqtt.host, "test.mosquitto.org");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.keep_alive_secs, 60);
        assert_eq!(config.freshness.timeout(), TimeDelta::seconds(60));
        assert_eq!(config.refresh.interval(), Duration::from_secs(2));
        assert_eq!(config.retention.max_readings_per_channel, None);
        assert_eq!(config.http.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(
            config.mqtt.topics(),
            Topics::new("damiao707/casa/sensor/temperatura", "damiao707/casa/sensor/umidade")
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = parse_monitor_config(
            r#"
            [mqtt]
            host = "broker.local"
            temperature_topic = "lab/t"
            humidity_topic = "lab/h"

            [refresh]
            interval_secs = 5

            [retention]
            max_readings_per_channel = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.topics(), Topics::new("lab/t", "lab/h"));
        assert_eq!(config.refresh.interval_secs, 5);
        assert_eq!(config.retention.max_readings_per_channel, Some(1000));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(parse_monitor_config("[refresh]\ninterval_secs = 0").is_err());
        assert!(parse_monitor_config("[refresh]\ninterval_secs = 11").is_err());
        assert!(parse_monitor_config("[freshness]\ntimeout_secs = 0").is_err());
        assert!(parse_monitor_config("[mqtt]\nhumidity_topic = \"damiao707/casa/sensor/temperatura\"").is_err());
        assert!(parse_monitor_config("[retention]\nmax_readings_per_channel = 0").is_err());
        assert!(parse_monitor_config("[mqtt.backoff]\ninitial_ms = 120000\nmax_secs = 1").is_err());
    }
}
