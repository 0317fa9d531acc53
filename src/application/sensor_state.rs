// Shared sensor context - store and freshness behind a single lock
use crate::domain::freshness::FreshnessState;
use crate::domain::reading::{Channel, Reading};
use crate::domain::series::SeriesStore;
use crate::domain::snapshot::Snapshot;
use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use std::sync::{Mutex, MutexGuard};

struct Inner {
    store: SeriesStore,
    freshness: FreshnessState,
}

/// Process-wide sensor state. Written by the subscriber, read by the
/// refresh loop; every access goes through the same mutex.
pub struct SensorState {
    inner: Mutex<Inner>,
    stale_after: TimeDelta,
}

impl SensorState {
    pub fn new(capacity: Option<usize>, stale_after: TimeDelta) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: SeriesStore::with_capacity(capacity),
                freshness: FreshnessState::new(),
            }),
            stale_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                if cfg!(debug_assertions) {
                    panic!("sensor state lock poisoned");
                }
                tracing::error!("Sensor state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Append a reading under its own calendar day and mark data as fresh.
    /// Freshness uses the full-precision `received_at`, not the reading's
    /// whole-second timestamp.
    pub fn record(&self, channel: Channel, reading: Reading, received_at: DateTime<Local>) {
        let mut inner = self.lock();
        inner.store.append(reading.date(), channel, reading);
        inner.freshness.touch(channel, received_at);
    }

    /// Evict every day but `today` and take a snapshot, in one critical section.
    /// Also returns how many old days were evicted.
    pub fn refresh(&self, today: NaiveDate, now: DateTime<Local>) -> (Snapshot, usize) {
        let mut inner = self.lock();
        let evicted = inner.store.evict_except(today);

        let (today_temperature, today_humidity) = match inner.store.day(today) {
            Some(day) => (
                day.readings(Channel::Temperature),
                day.readings(Channel::Humidity),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let stale_channels = Channel::ALL
            .into_iter()
            .filter(|c| inner.freshness.is_channel_stale(*c, now, self.stale_after))
            .collect();

        let snapshot = Snapshot {
            date: today,
            today_temperature,
            today_humidity,
            is_stale: inner.freshness.is_stale(now, self.stale_after),
            last_update: inner.freshness.last_update(),
            stale_channels,
        };
        (snapshot, evicted)
    }

    pub fn latest(&self, date: NaiveDate, channel: Channel) -> Option<Reading> {
        self.lock().store.latest(date, channel)
    }

    pub fn window(&self, date: NaiveDate, channel: Channel, n: usize) -> Vec<Reading> {
        self.lock().store.window(date, channel, n)
    }

    pub fn is_stale(&self, now: DateTime<Local>) -> bool {
        self.lock().freshness.is_stale(now, self.stale_after)
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.lock().freshness.last_update()
    }
}
