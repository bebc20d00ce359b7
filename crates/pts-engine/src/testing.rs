//! Test doubles shared by the unit tests.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::{Duration, Instant};

use crate::hal::Clock;

/// A clock that only moves when told to, or when something waits on it.
pub struct ManualClock {
    now: Instant,
    pub blocked: Duration,
}

impl ManualClock {
    pub fn at(micros: u64) -> Self {
        Self {
            now: Instant::from_micros(micros),
            blocked: Duration::from_ticks(0),
        }
    }

    pub fn advance_micros(&mut self, micros: u64) {
        self.now += Duration::from_micros(micros);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn block_for(&mut self, duration: Duration) {
        self.blocked += duration;
        self.now += duration;
    }

    async fn sleep_until(&mut self, at: Instant) {
        self.now = self.now.max(at);
    }
}
