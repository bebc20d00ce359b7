//! pts-engine
//!
//! The protocol engine behind PicoPTS: it stands in for the paper tape
//! station of an Elliott 900 series computer, passing each character the
//! computer reads or punches across a byte-oriented serial link to a host
//! application.
//!
//! The engine is hardware independent.  Board support provides the lines
//! ([`PtsBus`]), the serial link ([`HostLink`]), time ([`Clock`]), and
//! optionally a [`Watchdog`], then hands them to a [`Controller`] and calls
//! [`Controller::run`].

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#![cfg_attr(not(test), no_std)]

// Must come first, so the log macros are visible to the other modules.
mod fmt;

pub mod ack;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod fault;
pub mod frame;
pub mod gpio;
pub mod hal;
pub mod request;
pub mod signals;
pub mod throttle;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use ack::{ACK_MIN_WIDTH, AckGenerator};
pub use config::EngineConfig;
pub use controller::Controller;
pub use debounce::Debouncer;
pub use fault::{ControllerState, EngineStatus, FaultCode, Stop};
pub use frame::{Deframer, Frame, FrameError, Inbound};
pub use gpio::{GpioBus, InputLines, OutputLines};
pub use hal::{Clock, HostLink, Ports, PtsBus, Watchdog};
pub use request::{Device, RequestKind};
pub use signals::Signals;
pub use throttle::{DevicePeriods, Profile, Reservation, Throttle, TimingProfiles};
pub use transfer::{Transfer, TransferEngine};
