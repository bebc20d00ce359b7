//! Signal debouncing.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use static_assertions::const_assert;

use crate::hal::PtsBus;
use crate::signals::Signals;

/// How many consecutive identical raw readings make a stable value.
pub const DEBOUNCE_COUNT: u8 = 2;
const_assert!(DEBOUNCE_COUNT >= 2);

/// Samples the monitored input lines until they settle.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    count: u8,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self {
            count: DEBOUNCE_COUNT,
        }
    }
}

impl Debouncer {
    /// Create a debouncer that needs `count` identical readings in a row.
    /// Anything below [`DEBOUNCE_COUNT`] is raised to it.
    pub fn new(count: u8) -> Self {
        Self {
            count: count.max(DEBOUNCE_COUNT),
        }
    }

    /// Return the first value read `count` times in a row.
    ///
    /// There is no upper bound on the number of reads.  Real lines settle
    /// within a few reads, so callers treat this as non-blocking.
    pub fn sample<B: PtsBus>(&self, bus: &mut B) -> Signals {
        let mut last = bus.sample_raw();
        let mut seen = 1;
        loop {
            let next = bus.sample_raw();
            if next == last {
                seen += 1;
                if seen >= self.count {
                    return next;
                }
            } else {
                last = next;
                seen = 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    // Replays a fixed sequence of raw readings, then repeats the last one.
    struct Trace {
        reads: VecDeque<Signals>,
        last: Signals,
        taken: usize,
    }

    impl Trace {
        fn new(reads: &[Signals]) -> Self {
            Self {
                reads: reads.iter().copied().collect(),
                last: Signals::empty(),
                taken: 0,
            }
        }
    }

    impl PtsBus for Trace {
        fn sample_raw(&mut self) -> Signals {
            self.taken += 1;
            if let Some(s) = self.reads.pop_front() {
                self.last = s;
            }
            self.last
        }
        fn drive_reader_data(&mut self, _data: u8) {}
        fn set_ack(&mut self, _high: bool) {}
        fn set_reset(&mut self, _high: bool) {}
        fn set_autostart(&mut self, _high: bool) {}
        fn logging_enabled(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn stable_value_needs_two_reads() {
        let mut bus = Trace::new(&[Signals::RDR_REQ, Signals::RDR_REQ]);
        assert_eq!(Debouncer::default().sample(&mut bus), Signals::RDR_REQ);
        assert_eq!(bus.taken, 2);
    }

    #[test]
    fn glitch_is_ignored() {
        let idle = Signals::empty();
        let mut bus = Trace::new(&[idle, Signals::PUN_REQ, idle, idle]);
        assert_eq!(Debouncer::default().sample(&mut bus), idle);
        assert_eq!(bus.taken, 4);
    }

    #[test]
    fn count_below_minimum_is_raised() {
        let mut bus = Trace::new(&[Signals::TTY_SEL, Signals::RDR_REQ, Signals::RDR_REQ]);
        assert_eq!(Debouncer::new(0).sample(&mut bus), Signals::RDR_REQ);
        assert_eq!(bus.taken, 3);
    }

    #[test]
    fn larger_count_waits_longer() {
        let s = Signals::PUN_REQ.with_punch_data(9);
        let mut bus = Trace::new(&[s, s, Signals::empty(), s, s, s]);
        assert_eq!(Debouncer::new(3).sample(&mut bus), s);
        assert_eq!(bus.taken, 6);
    }

    fn any_signals() -> impl Strategy<Value = Signals> {
        (0u16..0x0800).prop_map(Signals::from_bits_retain)
    }

    proptest! {
        #[test]
        fn never_returns_before_two_identical_reads(
            reads in proptest::collection::vec(any_signals(), 1..16)
        ) {
            let mut bus = Trace::new(&reads);
            let value = Debouncer::default().sample(&mut bus);
            // Reconstruct what was read and check the last two agree.
            let mut seen: Vec<Signals> = reads.iter().copied().take(bus.taken).collect();
            while seen.len() < bus.taken {
                seen.push(*reads.last().unwrap());
            }
            prop_assert!(bus.taken >= 2);
            prop_assert_eq!(seen[bus.taken - 1], value);
            prop_assert_eq!(seen[bus.taken - 2], value);
        }

        #[test]
        fn single_sample_glitch_returns_pre_glitch_value(
            before in any_signals(),
            glitch in any_signals(),
        ) {
            let mut bus = Trace::new(&[before, glitch, before, before]);
            prop_assert_eq!(Debouncer::default().sample(&mut bus), before);
        }
    }
}
