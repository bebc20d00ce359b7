//! Engine configuration.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::Duration;

use crate::ack::ACK_DEFAULT_WIDTH;
use crate::debounce::DEBOUNCE_COUNT;
use crate::throttle::{DevicePeriods, Profile, TimingProfiles};

/// Tape reader at 250 characters per second.
pub const SLOW_READER_PERIOD: Duration = Duration::from_micros(4_000);

/// Tape punch at 110 characters per second.
pub const SLOW_PUNCH_PERIOD: Duration = Duration::from_micros(9_091);

/// Teleprinter at 10 characters per second.
pub const SLOW_TELEPRINTER_PERIOD: Duration = Duration::from_micros(100_000);

/// Every device in the fast profile.
pub const FAST_PERIOD: Duration = Duration::from_micros(20);

/// How often a read that is waiting on the host re-checks the request line.
pub const REPLY_RECHECK: Duration = Duration::from_millis(100);

/// Gap between checks for a host reply.
pub const HOST_POLL_INTERVAL: Duration = Duration::from_micros(10);

/// Checks for the request line clearing after an acknowledgement, before
/// giving up.
pub const CLEAR_POLL_LIMIT: u32 = 10_000;

/// Gap between those checks.
pub const CLEAR_POLL_INTERVAL: Duration = Duration::from_micros(1);

/// How long the computer is held in reset when it is power cycled.
pub const RESET_SETTLE: Duration = Duration::from_millis(1_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Clamped up to [`crate::ACK_MIN_WIDTH`].
    pub ack_width: Duration,
    pub reply_recheck: Duration,
    pub host_poll_interval: Duration,
    pub clear_poll_limit: u32,
    pub clear_poll_interval: Duration,
    pub reset_settle: Duration,
    /// Level to drive II_AUTO.  High makes the computer autostart.
    pub autostart: bool,
    pub debounce_count: u8,
    pub profiles: TimingProfiles,
    pub initial_profile: Profile,
    /// Overrides the LOG pin when set.
    pub diagnostics: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ack_width: ACK_DEFAULT_WIDTH,
            reply_recheck: REPLY_RECHECK,
            host_poll_interval: HOST_POLL_INTERVAL,
            clear_poll_limit: CLEAR_POLL_LIMIT,
            clear_poll_interval: CLEAR_POLL_INTERVAL,
            reset_settle: RESET_SETTLE,
            autostart: false,
            debounce_count: DEBOUNCE_COUNT,
            profiles: TimingProfiles {
                fast: DevicePeriods::uniform(FAST_PERIOD),
                slow: DevicePeriods {
                    reader: SLOW_READER_PERIOD,
                    punch: SLOW_PUNCH_PERIOD,
                    teleprinter: SLOW_TELEPRINTER_PERIOD,
                },
            },
            initial_profile: Profile::Slow,
            diagnostics: None,
        }
    }
}
