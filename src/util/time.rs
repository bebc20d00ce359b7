//! Busy-wait timing used by the engine for its short, timing critical
//! delays, such as the acknowledgement pulse.
//!
//! These reimplement embassy-time's `Delay::block_for`, to make it clear what
//! they are doing under the covers.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::{Duration, Instant};

/// Function to block until a specific instant.
///
/// We always inline it to reduce function call/return overhead, as this is
/// typically used in timing critical functions
#[inline(always)]
pub fn block_until(expires: Instant) {
    while Instant::now() < expires {}
}

/// Function to block for a specific Duration.
///
/// We always inline it to reduce function call/return overhead, as this is
/// typically used in timing critical functions
#[inline(always)]
pub fn block_for(duration: Duration) {
    block_until(Instant::now() + duration);
}
