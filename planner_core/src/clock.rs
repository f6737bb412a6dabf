//! Live clocks - per-panel timer subscriptions
//!
//! Each panel holds a `ClockSubscription` registered with the shared
//! `Ticker`. Dropping the subscription unregisters it, so a removed panel
//! cannot leave a timer behind.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::time_engine::{read_clock_at, ClockReading};

/// Default refresh interval of a panel clock
pub const DEFAULT_CLOCK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    active: BTreeSet<u64>,
}

/// Owner of all clock subscriptions on the UI thread
#[derive(Debug, Clone, Default)]
pub struct Ticker {
    registry: Rc<RefCell<Registry>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a clock for `tz` refreshing every `interval`
    pub fn subscribe(&self, tz: Tz, interval: Duration, now: DateTime<Utc>) -> ClockSubscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.active.insert(id);
            id
        };
        debug!(id, zone = tz.name(), "clock subscribed");
        ClockSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
            tz,
            interval,
            last_tick: now,
            reading: read_clock_at(tz, now),
        }
    }

    /// Number of live subscriptions
    pub fn active_count(&self) -> usize {
        self.registry.borrow().active.len()
    }
}

/// One panel's clock; unsubscribes on drop
#[derive(Debug)]
pub struct ClockSubscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
    tz: Tz,
    interval: Duration,
    last_tick: DateTime<Utc>,
    reading: ClockReading,
}

impl ClockSubscription {
    pub fn reading(&self) -> &ClockReading {
        &self.reading
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Refresh the reading if a full interval has passed. Returns true when
    /// the reading changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let elapsed = (now - self.last_tick).to_std().unwrap_or_default();
        if elapsed < self.interval {
            return false;
        }
        self.last_tick = now;
        self.reading = read_clock_at(self.tz, now);
        true
    }
}

impl Drop for ClockSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().active.remove(&self.id);
            debug!(id = self.id, "clock unsubscribed");
        }
    }
}
