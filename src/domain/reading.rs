// Sensor reading domain models
use chrono::{DateTime, Local, NaiveDate, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measured quantity a reading belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Temperature,
    Humidity,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Temperature, Channel::Humidity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature",
            Channel::Humidity => "Humidity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Humidity => "%",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Channel::Temperature => 0,
            Channel::Humidity => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two topic names a subscriber listens on, one per channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topics {
    pub temperature: String,
    pub humidity: String,
}

impl Topics {
    pub fn new(temperature: impl Into<String>, humidity: impl Into<String>) -> Self {
        Self {
            temperature: temperature.into(),
            humidity: humidity.into(),
        }
    }

    /// Map an inbound topic to its channel. Only exact matches count.
    pub fn resolve(&self, topic: &str) -> Option<Channel> {
        if topic == self.temperature {
            Some(Channel::Temperature)
        } else if topic == self.humidity {
            Some(Channel::Humidity)
        } else {
            None
        }
    }

    pub fn topic(&self, channel: Channel) -> &str {
        match channel {
            Channel::Temperature => &self.temperature,
            Channel::Humidity => &self.humidity,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &str)> {
        Channel::ALL.into_iter().map(move |c| (c, self.topic(c)))
    }
}

/// A single observed value. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Local>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Build a reading stamped at `now` with sub-second precision dropped
    pub fn at(now: DateTime<Local>, value: f64) -> Self {
        Self::new(now.trunc_subsecs(0), value)
    }

    /// Calendar day (local time) the reading falls on
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
