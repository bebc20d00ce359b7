//! The seams between the protocol engine and the hardware it runs on.
//!
//! The engine is generic over these traits so the same code drives the
//! Pico's GPIOs and USB serial in the firmware, and simulated lines and
//! links in tests.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::{Duration, Instant};

use crate::signals::Signals;

/// The paper tape station side of the interface - the lines shared with the
/// legacy computer.
pub trait PtsBus {
    /// Take a single raw, undebounced reading of every monitored input line.
    fn sample_raw(&mut self) -> Signals;

    /// Drive a byte onto the 8 reader data lines.
    fn drive_reader_data(&mut self, data: u8);

    /// Set the acknowledgement output.
    fn set_ack(&mut self, high: bool);

    /// Set the computer's reset (NOPOWER) input.  High holds the computer in
    /// reset, low lets it run.
    fn set_reset(&mut self, high: bool);

    /// Set the II_AUTO line.  High makes the computer autostart when it
    /// leaves reset, low makes it obey its initial orders.
    fn set_autostart(&mut self, high: bool);

    /// Whether the logging/diagnostics sense input is asserted.
    fn logging_enabled(&mut self) -> bool;
}

/// The byte-oriented serial link to the host application.
#[allow(async_fn_in_trait)]
pub trait HostLink {
    /// Return the next byte from the host, if one is waiting.  Never blocks.
    fn try_read(&mut self) -> Option<u8>;

    /// Send bytes to the host.
    async fn write(&mut self, bytes: &[u8]);
}

/// Time source and delays.
///
/// We have two choices for a delay:
/// * `block_for()` - spins the current core for the duration indicated.  Used
///   where the timing is critical, such as the acknowledgement pulse.
/// * `sleep_until()` - yields to the executor.  Because the executor may
///   schedule something else, the pause can be longer than asked for.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;

    fn block_for(&mut self, duration: Duration);

    async fn sleep_until(&mut self, at: Instant);
}

/// Something the engine must feed while it works, so a stuck engine gets
/// noticed.
#[allow(async_fn_in_trait)]
pub trait Watchdog {
    async fn feed(&mut self);
}

// No watchdog at all.
impl Watchdog for () {
    async fn feed(&mut self) {}
}

/// Everything the engine needs from the outside world, passed by `&mut` into
/// each engine operation.
pub struct Ports<B, L, C, W> {
    pub bus: B,
    pub link: L,
    pub clock: C,
    pub watchdog: W,
}

impl<B, L, C, W> Ports<B, L, C, W>
where
    B: PtsBus,
    L: HostLink,
    C: Clock,
    W: Watchdog,
{
    pub fn new(bus: B, link: L, clock: C, watchdog: W) -> Self {
        Self {
            bus,
            link,
            clock,
            watchdog,
        }
    }

    /// Yield to the executor for at least `duration`.
    pub(crate) async fn pause(&mut self, duration: Duration) {
        let until = self.clock.now() + duration;
        self.clock.sleep_until(until).await;
    }
}
