// Data freshness tracking
use super::reading::Channel;
use chrono::{DateTime, Local, TimeDelta};

/// Wall-clock time of the most recent accepted reading.
///
/// `last_update` is shared by both channels: any reading refreshes it. The
/// per-channel times are kept alongside for sensor-level failure detection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FreshnessState {
    last_update: Option<DateTime<Local>>,
    per_channel: [Option<DateTime<Local>>; 2],
}

fn advance(slot: &mut Option<DateTime<Local>>, at: DateTime<Local>) {
    match slot {
        Some(prev) if *prev >= at => {}
        _ => *slot = Some(at),
    }
}

fn stale(last: Option<DateTime<Local>>, now: DateTime<Local>, timeout: TimeDelta) -> bool {
    match last {
        None => true,
        Some(last) => now - last > timeout,
    }
}

impl FreshnessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted reading. Clocks only move forward.
    pub fn touch(&mut self, channel: Channel, at: DateTime<Local>) {
        advance(&mut self.last_update, at);
        advance(&mut self.per_channel[channel.index()], at);
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn channel_last_update(&self, channel: Channel) -> Option<DateTime<Local>> {
        self.per_channel[channel.index()]
    }

    /// True when nothing was ever received or the last reading is older
    /// than `timeout` at `now`.
    pub fn is_stale(&self, now: DateTime<Local>, timeout: TimeDelta) -> bool {
        stale(self.last_update, now, timeout)
    }

    pub fn is_channel_stale(&self, channel: Channel, now: DateTime<Local>, timeout: TimeDelta) -> bool {
        stale(self.channel_last_update(channel), now, timeout)
    }
}
