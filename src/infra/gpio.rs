//! This file handles GPIO pin allocation.
//!
//! The pin map itself is in [`crate::constants`]; this hands pins out once
//! each and builds the objects that need them.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use heapless::Vec;
use pts_engine::{GpioBus, InputLines, OutputLines};

use crate::constants::{
    ACK_PIN, II_AUTO_PIN, LOG_PIN, NO_POWER_PIN, NUM_GPIO_PINS, PUN_REQ_PIN, PUNCH_DATA_PINS,
    RDR_REQ_PIN, READER_DATA_PINS, STATUS_DISPLAY_PIN, TTY_SEL_PIN,
};

/// The engine's view of the paper tape station connector on this board.
pub type PicoBus = GpioBus<Input<'static>, Output<'static>>;

/// Object which provides methods to create objects that require GPIO pins.
pub struct Gpio {
    pins: [Option<AnyPin>; NUM_GPIO_PINS],
}

impl Gpio {
    /// Takes ownership of every GPIO pin.  `pins[n]` must be GPIO n.
    pub fn new(pins: [AnyPin; NUM_GPIO_PINS]) -> Self {
        Self {
            pins: pins.map(Some),
        }
    }

    /// Get the pin used for the status display.
    pub fn take_status_display_pin(&mut self) -> Option<AnyPin> {
        self.take_pin_as_any(STATUS_DISPLAY_PIN)
    }

    /// Build the paper tape station bus.  The computer starts out held in
    /// reset, with every other output low.
    pub fn create_bus(&mut self) -> Option<PicoBus> {
        let inputs = InputLines {
            rdr_req: self.take_input(RDR_REQ_PIN, Pull::Down)?,
            pun_req: self.take_input(PUN_REQ_PIN, Pull::Down)?,
            tty_sel: self.take_input(TTY_SEL_PIN, Pull::Down)?,
            log: self.take_input(LOG_PIN, Pull::Up)?,
            punch_data: self.take_inputs(PUNCH_DATA_PINS)?,
        };
        let outputs = OutputLines {
            no_power: self.take_output(NO_POWER_PIN, Level::High)?,
            ack: self.take_output(ACK_PIN, Level::Low)?,
            ii_auto: self.take_output(II_AUTO_PIN, Level::Low)?,
            reader_data: self.take_outputs(READER_DATA_PINS)?,
        };
        debug!("Paper tape station pins allocated");
        Some(GpioBus::new(inputs, outputs))
    }

    pub fn take_input(&mut self, index: u8, pull: Pull) -> Option<Input<'static>> {
        self.take_pin_as_any(index).map(|pin| Input::new(pin, pull))
    }

    pub fn take_output(&mut self, index: u8, level: Level) -> Option<Output<'static>> {
        self.take_pin_as_any(index)
            .map(|pin| Output::new(pin, level))
    }

    fn take_inputs(&mut self, indexes: [u8; 8]) -> Option<[Input<'static>; 8]> {
        let mut lines: Vec<Input<'static>, 8> = Vec::new();
        for index in indexes {
            lines.push(self.take_input(index, Pull::Down)?).ok()?;
        }
        lines.into_array().ok()
    }

    fn take_outputs(&mut self, indexes: [u8; 8]) -> Option<[Output<'static>; 8]> {
        let mut lines: Vec<Output<'static>, 8> = Vec::new();
        for index in indexes {
            lines.push(self.take_output(index, Level::Low)?).ok()?;
        }
        lines.into_array().ok()
    }

    /// Helper to take a pin by index
    fn take_pin_as_any(&mut self, index: u8) -> Option<AnyPin> {
        let pin = self
            .pins
            .get_mut(index as usize)
            .and_then(Option::take);
        if pin.is_none() {
            warn!("Pin {} doesn't exist or is already taken", index);
        }
        pin
    }
}
