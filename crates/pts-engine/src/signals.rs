//! The monitored input lines of the paper tape station interface.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// A snapshot of every input line the engine monitors, taken at one
    /// sampling instant.
    ///
    /// The low byte carries the punch data lines, PUN_1 (lsb) to PUN_128
    /// (msb), which the legacy controller drives alongside a punch request.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Signals: u16 {
        /// Punch data lines
        const PUN_DATA = 0x00ff;

        /// Reader request - raised by the computer to ask for a character
        const RDR_REQ = 1 << 8;

        /// Punch request - raised by the computer with a character on the
        /// punch data lines
        const PUN_REQ = 1 << 9;

        /// Teleprinter select - routes the transfer to the teleprinter
        /// rather than the tape reader or punch
        const TTY_SEL = 1 << 10;
    }
}

impl Signals {
    /// Both request lines.
    pub const REQUESTS: Self = Self::RDR_REQ.union(Self::PUN_REQ);

    /// Build a snapshot from the control lines and a punch data byte.
    pub fn with_punch_data(self, data: u8) -> Self {
        self.difference(Self::PUN_DATA)
            .union(Self::from_bits_retain(u16::from(data)))
    }

    /// The byte currently on the punch data lines.
    #[allow(clippy::cast_possible_truncation)]
    pub fn punch_data(self) -> u8 {
        (self.bits() & Self::PUN_DATA.bits()) as u8
    }

    pub fn reader_requested(self) -> bool {
        self.contains(Self::RDR_REQ)
    }

    pub fn punch_requested(self) -> bool {
        self.contains(Self::PUN_REQ)
    }

    pub fn teleprinter_selected(self) -> bool {
        self.contains(Self::TTY_SEL)
    }

    /// True if neither request line is asserted.
    pub fn requests_clear(self) -> bool {
        !self.intersects(Self::REQUESTS)
    }
}

// Same layout as the signal dump the station has always printed when
// reporting a failure.
impl fmt::Display for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.punch_data();
        write!(
            f,
            "RDRREQ {} PUNREQ {} TTYSEL {} PUN DATA {:3} {:08b}",
            u8::from(self.reader_requested()),
            u8::from(self.punch_requested()),
            u8::from(self.teleprinter_selected()),
            data,
            data
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signals {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "RDRREQ {} PUNREQ {} TTYSEL {} PUN DATA {=u8}",
            u8::from(self.reader_requested()),
            u8::from(self.punch_requested()),
            u8::from(self.teleprinter_selected()),
            self.punch_data()
        );
    }
}
