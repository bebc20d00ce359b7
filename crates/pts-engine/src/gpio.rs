//! A [`PtsBus`] built from individual `embedded-hal` pins.
//!
//! The pin map itself lives with the board code - this only knows which
//! signal each pin carries.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::hal::PtsBus;
use crate::signals::Signals;

/// Input pins, read by the engine.
pub struct InputLines<I> {
    pub rdr_req: I,
    pub pun_req: I,
    pub tty_sel: I,
    pub log: I,
    /// PUN_1 (lsb) to PUN_128 (msb)
    pub punch_data: [I; 8],
}

/// Output pins, driven by the engine.
pub struct OutputLines<O> {
    pub no_power: O,
    pub ack: O,
    pub ii_auto: O,
    /// RDR_1 (lsb) to RDR_128 (msb)
    pub reader_data: [O; 8],
}

/// The paper tape station lines, one pin per signal.
pub struct GpioBus<I, O> {
    inputs: InputLines<I>,
    outputs: OutputLines<O>,
}

impl<I, O> GpioBus<I, O>
where
    I: InputPin + ErrorType<Error = Infallible>,
    O: OutputPin + ErrorType<Error = Infallible>,
{
    /// Create the bus with every output low, apart from NOPOWER, which is
    /// driven high so the computer stays in reset until the engine starts
    /// it.
    pub fn new(inputs: InputLines<I>, outputs: OutputLines<O>) -> Self {
        let mut bus = Self { inputs, outputs };
        bus.drive_reader_data(0);
        bus.set_ack(false);
        bus.set_autostart(false);
        bus.set_reset(true);
        bus
    }

    fn level(pin: &mut I) -> bool {
        let Ok(high) = pin.is_high();
        high
    }

    fn drive(pin: &mut O, high: bool) {
        let Ok(()) = if high { pin.set_high() } else { pin.set_low() };
    }
}

impl<I, O> PtsBus for GpioBus<I, O>
where
    I: InputPin + ErrorType<Error = Infallible>,
    O: OutputPin + ErrorType<Error = Infallible>,
{
    fn sample_raw(&mut self) -> Signals {
        let mut signals = Signals::empty();
        if Self::level(&mut self.inputs.rdr_req) {
            signals |= Signals::RDR_REQ;
        }
        if Self::level(&mut self.inputs.pun_req) {
            signals |= Signals::PUN_REQ;
        }
        if Self::level(&mut self.inputs.tty_sel) {
            signals |= Signals::TTY_SEL;
        }
        let mut data = 0u8;
        for (bit, pin) in self.inputs.punch_data.iter_mut().enumerate() {
            if Self::level(pin) {
                data |= 1 << bit;
            }
        }
        signals.with_punch_data(data)
    }

    fn drive_reader_data(&mut self, data: u8) {
        for (bit, pin) in self.outputs.reader_data.iter_mut().enumerate() {
            Self::drive(pin, data & (1 << bit) != 0);
        }
    }

    fn set_ack(&mut self, high: bool) {
        Self::drive(&mut self.outputs.ack, high);
    }

    fn set_reset(&mut self, high: bool) {
        Self::drive(&mut self.outputs.no_power, high);
    }

    fn set_autostart(&mut self, high: bool) {
        Self::drive(&mut self.outputs.ii_auto, high);
    }

    fn logging_enabled(&mut self) -> bool {
        Self::level(&mut self.inputs.log)
    }
}
