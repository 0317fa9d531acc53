// Read-only view of today's data handed to the display layer
use super::reading::{Channel, Reading};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub today_temperature: Vec<Reading>,
    pub today_humidity: Vec<Reading>,
    pub is_stale: bool,
    pub last_update: Option<DateTime<Local>>,
    /// Channels that have gone silent on their own, even if the other one is live
    pub stale_channels: Vec<Channel>,
}

impl Snapshot {
    pub fn readings(&self, channel: Channel) -> &[Reading] {
        match channel {
            Channel::Temperature => &self.today_temperature,
            Channel::Humidity => &self.today_humidity,
        }
    }

    pub fn latest(&self, channel: Channel) -> Option<&Reading> {
        self.readings(channel).last()
    }

    /// Last `n` readings of a channel, oldest first
    pub fn recent(&self, channel: Channel, n: usize) -> &[Reading] {
        let readings = self.readings(channel);
        &readings[readings.len().saturating_sub(n)..]
    }
}
