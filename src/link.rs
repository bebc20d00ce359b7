//! Connects the engine, running on core 1, to the rest of the firmware.
//!
//! Host bytes flow through two pipes, filled and drained by the serial tasks
//! on core 0.  The engine's status is published through [`ENGINE_STATUS`]
//! for the status display.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{Duration, Instant, Timer};
use pts_engine::{Clock, EngineStatus, HostLink, Watchdog};

use crate::constants::{ENGINE_FEED_INTERVAL, HOST_RX_BUF_SIZE, HOST_TX_BUF_SIZE};
use crate::infra::watchdog::{TaskId, WatchdogType};
use crate::util::time::block_for;

//
// Statics
//

/// Bytes received from the host, waiting for the engine.
pub static HOST_RX: Pipe<CriticalSectionRawMutex, HOST_RX_BUF_SIZE> = Pipe::new();

/// Frames from the engine, waiting to be sent to the host.
pub static HOST_TX: Pipe<CriticalSectionRawMutex, HOST_TX_BUF_SIZE> = Pipe::new();

/// The engine's state, fault code and counters.  Written by the engine,
/// read by anyone.
pub static ENGINE_STATUS: EngineStatus = EngineStatus::new();

/// The engine's end of the host pipes.
pub struct PipeLink;

impl HostLink for PipeLink {
    fn try_read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match HOST_RX.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    async fn write(&mut self, bytes: &[u8]) {
        // Waits for the transmit task to make room, so a frame is never
        // split by another.
        HOST_TX.write_all(bytes).await;
    }
}

/// Time, from embassy-time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn block_for(&mut self, duration: Duration) {
        block_for(duration);
    }

    async fn sleep_until(&mut self, at: Instant) {
        Timer::at(at).await;
    }
}

/// Feeds the task watchdog on the engine's behalf, at most once per
/// [`ENGINE_FEED_INTERVAL`].
pub struct EngineWatchdog {
    watchdog: &'static WatchdogType,
    last_feed: Option<Instant>,
}

impl EngineWatchdog {
    pub fn new(watchdog: &'static WatchdogType) -> Self {
        Self {
            watchdog,
            last_feed: None,
        }
    }
}

impl Watchdog for EngineWatchdog {
    async fn feed(&mut self) {
        let now = Instant::now();
        let due = match self.last_feed {
            Some(last) => now.duration_since(last) >= ENGINE_FEED_INTERVAL,
            None => true,
        };
        if due {
            self.watchdog.feed(&TaskId::Engine).await;
            self.last_feed = Some(now);
        }
    }
}
