//! Request classification.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use crate::signals::Signals;

/// The logical peripherals of the paper tape station.  Each has its own
/// transfer rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Device {
    Reader = 0,
    Punch,
    Teleprinter,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Reader, Device::Punch, Device::Teleprinter];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// What the computer is asking for, derived from one debounced snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    None,
    ReadTape,
    ReadTeleprinter,
    PunchTape,
    WriteTeleprinter,
    /// Reader and punch requested at once.  The computer never does this
    /// unless it or the wiring is faulty.
    Malformed,
}

impl RequestKind {
    /// Classify a snapshot.  The teleprinter select line only picks the path
    /// once exactly one request line is asserted.
    pub fn classify(signals: Signals) -> Self {
        match (
            signals.reader_requested(),
            signals.punch_requested(),
            signals.teleprinter_selected(),
        ) {
            (false, false, _) => Self::None,
            (true, true, _) => Self::Malformed,
            (true, false, false) => Self::ReadTape,
            (true, false, true) => Self::ReadTeleprinter,
            (false, true, false) => Self::PunchTape,
            (false, true, true) => Self::WriteTeleprinter,
        }
    }

    /// The device this request transfers through.
    pub fn device(self) -> Option<Device> {
        match self {
            Self::ReadTape => Some(Device::Reader),
            Self::PunchTape => Some(Device::Punch),
            Self::ReadTeleprinter | Self::WriteTeleprinter => Some(Device::Teleprinter),
            Self::None | Self::Malformed => None,
        }
    }

    /// True for requests where the computer is reading from the station.
    pub fn is_read(self) -> bool {
        matches!(self, Self::ReadTape | Self::ReadTeleprinter)
    }
}
