// Ingest service - Turns inbound broker messages into readings
use crate::application::clock::Clock;
use crate::application::sensor_state::SensorState;
use crate::domain::reading::{Channel, Reading, Topics};
use std::num::ParseFloatError;
use std::str::Utf8Error;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("payload on {topic} is not valid UTF-8")]
    NotUtf8 {
        topic: String,
        #[source]
        source: Utf8Error,
    },
    #[error("payload {payload:?} on {topic} is not a decimal number")]
    NotNumeric {
        topic: String,
        payload: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("payload on {topic} is not a finite number: {value}")]
    NonFinite { topic: String, value: f64 },
}

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    Accepted(Channel, Reading),
    /// Topic is not one of ours
    Unmatched,
}

#[derive(Clone)]
pub struct IngestService {
    state: Arc<SensorState>,
    topics: Topics,
    clock: Arc<dyn Clock>,
}

impl IngestService {
    pub fn new(state: Arc<SensorState>, topics: Topics, clock: Arc<dyn Clock>) -> Self {
        Self {
            state,
            topics,
            clock,
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> Result<Ingested, IngestError> {
        let Some(channel) = self.topics.resolve(topic) else {
            return Ok(Ingested::Unmatched);
        };

        let value = parse_payload(topic, payload)?;
        let now = self.clock.now();
        let reading = Reading::at(now, value);
        self.state.record(channel, reading, now);
        Ok(Ingested::Accepted(channel, reading))
    }
}

/// Parse a UTF-8 decimal literal, tolerating surrounding whitespace
fn parse_payload(topic: &str, payload: &[u8]) -> Result<f64, IngestError> {
    let text = std::str::from_utf8(payload).map_err(|source| IngestError::NotUtf8 {
        topic: topic.to_string(),
        source,
    })?;

    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|source| IngestError::NotNumeric {
            topic: topic.to_string(),
            payload: text.to_string(),
            source,
        })?;

    if !value.is_finite() {
        return Err(IngestError::NonFinite {
            topic: topic.to_string(),
            value,
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::testing::ManualClock;
    use chrono::{DateTime, Local, TimeDelta, TimeZone};

    const TEMP: &str = "home/sensor/temperature";
    const HUMIDITY: &str = "home/sensor/humidity";

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap()
    }

    fn setup() -> (IngestService, Arc<SensorState>, Arc<ManualClock>) {
        let state = Arc::new(SensorState::new(None, TimeDelta::seconds(60)));
        let clock = Arc::new(ManualClock::new(t0()));
        let service = IngestService::new(state.clone(), Topics::new(TEMP, HUMIDITY), clock.clone());
        (service, state, clock)
    }

    #[test]
    fn test_scenario_two_channels() {
        let (service, state, clock) = setup();
        service.handle_message(TEMP, b"21.5").unwrap();
        clock.advance(TimeDelta::seconds(5));
        service.handle_message(TEMP, b"22.0").unwrap();
        service.handle_message(HUMIDITY, b"60.0").unwrap();

        let today = t0().date_naive();
        assert_eq!(state.latest(today, Channel::Temperature).map(|r| r.value), Some(22.0));
        let window: Vec<f64> = state
            .window(today, Channel::Temperature, 10)
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(window, vec![21.5, 22.0]);
        assert!(!state.is_stale(clock.now()));
    }

    #[test]
    fn test_accepted_reading_is_stamped_now() {
        let (service, _, _) = setup();
        let outcome = service.handle_message(HUMIDITY, b" 48.25\n").unwrap();
        assert_eq!(
            outcome,
            Ingested::Accepted(Channel::Humidity, Reading::new(t0(), 48.25))
        );
    }

    #[test]
    fn test_malformed_payloads_do_not_mutate() {
        let (service, state, clock) = setup();
        let bad: [&[u8]; 5] = [b"hot", b"", b"21,5", b"NaN", &[0xff, 0xfe]];
        for payload in bad {
            assert!(service.handle_message(TEMP, payload).is_err(), "{:?}", payload);
        }

        assert!(state.latest(t0().date_naive(), Channel::Temperature).is_none());
        assert!(state.last_update().is_none());
        assert!(state.is_stale(clock.now()));

        // Processing continues after failures
        service.handle_message(TEMP, b"20").unwrap();
        assert_eq!(state.latest(t0().date_naive(), Channel::Temperature).map(|r| r.value), Some(20.0));
    }

    #[test]
    fn test_error_kinds() {
        let (service, _, _) = setup();
        assert!(matches!(
            service.handle_message(TEMP, &[0xc3, 0x28]),
            Err(IngestError::NotUtf8 { .. })
        ));
        assert!(matches!(
            service.handle_message(TEMP, b"abc"),
            Err(IngestError::NotNumeric { .. })
        ));
        assert!(matches!(
            service.handle_message(TEMP, b"inf"),
            Err(IngestError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_unknown_topic_is_ignored() {
        let (service, state, _) = setup();
        let outcome = service.handle_message("home/sensor/pressure", b"1013.2").unwrap();

        assert_eq!(outcome, Ingested::Unmatched);
        assert!(state.last_update().is_none());
        assert!(state.latest(t0().date_naive(), Channel::Temperature).is_none());
        assert!(state.latest(t0().date_naive(), Channel::Humidity).is_none());
    }

    #[test]
    fn test_stale_then_live_again() {
        let (service, state, clock) = setup();
        service.handle_message(TEMP, b"21.0").unwrap();

        clock.advance(TimeDelta::seconds(61));
        assert!(state.is_stale(clock.now()));

        service.handle_message(HUMIDITY, b"55").unwrap();
        assert!(!state.is_stale(clock.now()));
    }
}
