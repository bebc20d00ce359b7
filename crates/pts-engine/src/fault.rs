//! Faults, controller state, and the status shared with the other core.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use core::fmt;
use portable_atomic::{AtomicU8, AtomicU32, Ordering};

/// A detected protocol violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// A host byte that means nothing outside a read.
    UnknownCommand = 1,
    /// The computer dropped its reader request before the host answered, or
    /// never dropped it after the acknowledgement.
    ReadProtocolViolation,
    /// The computer dropped its punch request before the acknowledgement, or
    /// never dropped it after.
    PunchProtocolViolation,
    /// Reader and punch requested together.
    SimultaneousRequest,
}

impl FaultCode {
    /// The number of pulses the status LED shows for this fault when halted.
    pub const fn pulse_count(self) -> u8 {
        match self {
            Self::UnknownCommand => 2,
            Self::ReadProtocolViolation => 3,
            Self::PunchProtocolViolation => 4,
            Self::SimultaneousRequest => 5,
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::UnknownCommand),
            2 => Some(Self::ReadProtocolViolation),
            3 => Some(Self::PunchProtocolViolation),
            4 => Some(Self::SimultaneousRequest),
            _ => None,
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::ReadProtocolViolation => write!(f, "read protocol violation"),
            Self::PunchProtocolViolation => write!(f, "punch protocol violation"),
            Self::SimultaneousRequest => write!(f, "simultaneous request"),
        }
    }
}

/// Why the engine stopped servicing requests.  Returned as the error from
/// every engine operation and handled only by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stop {
    Fault(FaultCode),
    /// The host asked for the computer to be restarted.
    Restart,
}

impl From<FaultCode> for Stop {
    fn from(code: FaultCode) -> Self {
        Self::Fault(code)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ControllerState {
    Starting = 0,
    Running,
    Faulted,
    /// Terminal.  Needs the board power cycling.
    Halted,
}

impl ControllerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Faulted,
            3 => Self::Halted,
            _ => Self::Starting,
        }
    }
}

/// Engine state published for the status task.
///
/// The engine is the only writer, so there are no read-modify-write races
/// even though the fields are updated individually.
pub struct EngineStatus {
    state: AtomicU8,
    fault: AtomicU8,
    transfers: AtomicU32,
    restarts: AtomicU32,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineStatus {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ControllerState::Starting as u8),
            fault: AtomicU8::new(0),
            transfers: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The most recent fault, if there has been one.
    pub fn fault(&self) -> Option<FaultCode> {
        FaultCode::from_u8(self.fault.load(Ordering::Acquire))
    }

    /// Transfers completed since boot.
    pub fn transfers(&self) -> u32 {
        self.transfers.load(Ordering::Relaxed)
    }

    /// Times the computer has been restarted since boot.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }

    pub(crate) fn set_state(&self, state: ControllerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn set_fault(&self, code: FaultCode) {
        self.fault.store(code as u8, Ordering::Release);
    }

    pub(crate) fn count_transfer(&self) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_state_and_fault() {
        let status = EngineStatus::new();
        assert_eq!(status.state(), ControllerState::Starting);
        assert_eq!(status.fault(), None);

        status.set_state(ControllerState::Halted);
        status.set_fault(FaultCode::SimultaneousRequest);
        assert_eq!(status.state(), ControllerState::Halted);
        assert_eq!(status.fault(), Some(FaultCode::SimultaneousRequest));
    }

    #[test]
    fn counters() {
        let status = EngineStatus::new();
        status.count_transfer();
        status.count_transfer();
        status.count_restart();
        assert_eq!(status.transfers(), 2);
        assert_eq!(status.restarts(), 1);
    }

    #[test]
    fn pulse_counts_are_distinct() {
        let codes = [
            FaultCode::UnknownCommand,
            FaultCode::ReadProtocolViolation,
            FaultCode::PunchProtocolViolation,
            FaultCode::SimultaneousRequest,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_eq!(FaultCode::from_u8(*a as u8), Some(*a));
            for b in &codes[i + 1..] {
                assert_ne!(a.pulse_count(), b.pulse_count());
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            std::format!("{}", FaultCode::PunchProtocolViolation),
            "punch protocol violation"
        );
    }
}
