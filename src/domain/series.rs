// Day-scoped time series store
use super::reading::{Channel, Reading};
use chrono::NaiveDate;
use std::collections::{BTreeMap, VecDeque};

/// Readings for a single calendar day, one sequence per channel.
/// Insertion order is arrival order; nothing is reordered or deduplicated.
#[derive(Debug, Clone, Default)]
pub struct DaySeries {
    temperature: VecDeque<Reading>,
    humidity: VecDeque<Reading>,
    capacity: Option<usize>,
}

impl DaySeries {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            temperature: VecDeque::new(),
            humidity: VecDeque::new(),
            capacity,
        }
    }

    fn sequence(&self, channel: Channel) -> &VecDeque<Reading> {
        match channel {
            Channel::Temperature => &self.temperature,
            Channel::Humidity => &self.humidity,
        }
    }

    fn sequence_mut(&mut self, channel: Channel) -> &mut VecDeque<Reading> {
        match channel {
            Channel::Temperature => &mut self.temperature,
            Channel::Humidity => &mut self.humidity,
        }
    }

    /// Append a reading. With a capacity set, the oldest reading is dropped
    /// once the sequence is full.
    pub fn push(&mut self, channel: Channel, reading: Reading) {
        let capacity = self.capacity;
        let sequence = self.sequence_mut(channel);
        if let Some(cap) = capacity {
            while sequence.len() >= cap.max(1) {
                sequence.pop_front();
            }
        }
        sequence.push_back(reading);
    }

    pub fn latest(&self, channel: Channel) -> Option<Reading> {
        self.sequence(channel).back().copied()
    }

    /// Last `n` readings in arrival order
    pub fn window(&self, channel: Channel, n: usize) -> Vec<Reading> {
        let sequence = self.sequence(channel);
        let skip = sequence.len().saturating_sub(n);
        sequence.iter().skip(skip).copied().collect()
    }

    pub fn readings(&self, channel: Channel) -> Vec<Reading> {
        self.sequence(channel).iter().copied().collect()
    }
}

/// Mapping from calendar date to that day's series
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    days: BTreeMap<NaiveDate, DaySeries>,
    capacity: Option<usize>,
}

impl SeriesStore {
    /// Store whose per-day sequences keep at most `capacity` readings each
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            days: BTreeMap::new(),
            capacity,
        }
    }

    pub fn append(&mut self, date: NaiveDate, channel: Channel, reading: Reading) {
        let capacity = self.capacity;
        self.days
            .entry(date)
            .or_insert_with(|| DaySeries::new(capacity))
            .push(channel, reading);
    }

    /// Drop every day except `today`. Returns how many days were removed.
    pub fn evict_except(&mut self, today: NaiveDate) -> usize {
        let before = self.days.len();
        self.days.retain(|date, _| *date == today);
        before - self.days.len()
    }

    pub fn latest(&self, date: NaiveDate, channel: Channel) -> Option<Reading> {
        self.days.get(&date).and_then(|day| day.latest(channel))
    }

    pub fn window(&self, date: NaiveDate, channel: Channel, n: usize) -> Vec<Reading> {
        self.days
            .get(&date)
            .map(|day| day.window(channel, n))
            .unwrap_or_default()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DaySeries> {
        self.days.get(&date)
    }
}
