//! The acknowledgement pulse.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::Duration;

use crate::hal::{Clock, PtsBus};

/// The shortest pulse the computer reliably detects.
pub const ACK_MIN_WIDTH: Duration = Duration::from_micros(1);

/// Default pulse width.
pub const ACK_DEFAULT_WIDTH: Duration = Duration::from_micros(2);

/// Drives the ACK line high for a fixed width, then low again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckGenerator {
    width: Duration,
}

impl Default for AckGenerator {
    fn default() -> Self {
        Self {
            width: ACK_DEFAULT_WIDTH,
        }
    }
}

impl AckGenerator {
    /// Widths below [`ACK_MIN_WIDTH`] are raised to it.
    pub fn new(width: Duration) -> Self {
        Self {
            width: width.max(ACK_MIN_WIDTH),
        }
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    /// Pulse ACK.  This spins rather than yielding, as the executor could
    /// otherwise stretch the pulse by an arbitrary amount.
    pub fn pulse<B: PtsBus, C: Clock>(&self, bus: &mut B, clock: &mut C) {
        bus.set_ack(true);
        clock.block_for(self.width);
        bus.set_ack(false);
    }

    /// Force ACK low.
    pub fn cancel<B: PtsBus>(&self, bus: &mut B) {
        bus.set_ack(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signals;
    use crate::testing::ManualClock;
    use std::vec::Vec;

    #[derive(Default)]
    struct AckLine {
        edges: Vec<bool>,
    }

    impl PtsBus for AckLine {
        fn sample_raw(&mut self) -> Signals {
            Signals::empty()
        }
        fn drive_reader_data(&mut self, _data: u8) {}
        fn set_ack(&mut self, high: bool) {
            self.edges.push(high);
        }
        fn set_reset(&mut self, _high: bool) {}
        fn set_autostart(&mut self, _high: bool) {}
        fn logging_enabled(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn pulse_rises_holds_and_falls() {
        let mut bus = AckLine::default();
        let mut clock = ManualClock::at(0);
        AckGenerator::default().pulse(&mut bus, &mut clock);
        assert_eq!(bus.edges, [true, false]);
        assert_eq!(clock.blocked, ACK_DEFAULT_WIDTH);
    }

    #[test]
    fn width_is_never_below_floor() {
        assert_eq!(
            AckGenerator::new(Duration::from_ticks(0)).width(),
            ACK_MIN_WIDTH
        );
        assert_eq!(
            AckGenerator::new(Duration::from_micros(5)).width(),
            Duration::from_micros(5)
        );
    }

    #[test]
    fn cancel_drives_low() {
        let mut bus = AckLine::default();
        AckGenerator::default().cancel(&mut bus);
        assert_eq!(bus.edges, [false]);
    }
}
