//! picopts
//!
//! Firmware for a Raspberry Pi Pico that stands in for the paper tape
//! station of an Elliott 900 series computer.  Characters the computer reads
//! or punches are passed over USB serial to a host application, which
//! supplies tape images and collects punched output.
//!
//! The protocol itself is implemented by the hardware independent
//! `pts-engine` crate.  This crate wires it up to the Pico: pins, USB,
//! watchdog, status LED and the second core.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#![no_std]
#![no_main]

// Provide some feature guidance when compiling the library.
#[cfg(not(any(feature = "pico", feature = "pico2")))]
compile_error!("Either 'pico' or 'pico2' feature must be enabled");
#[cfg(all(feature = "pico", feature = "pico2"))]
compile_error!("Features 'pico' and 'pico2' cannot be enabled simultaneously");

// Declare all of this library's modules.
mod constants;
pub mod entry;
mod infra;
mod link;
mod task;
mod usb;
mod util;

// Extra binary information that picotool can read.
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"PicoPTS by piers.rocks"),
    embassy_rp::binary_info::rp_program_description!(c"An Elliott 900 series paper tape station, bridging the computer's reader and punch to a host over USB serial."),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

// A note about Statics
//
// Statics let tasks on both cores share objects without lifetime issues.
//
// - StaticCell is used for things created at runtime and handed out once:
//   the USB device and CDC-ACM state in usb, the watchdog runner in
//   infra::watchdog, the executor for core 1 in task, the USB serial number
//   in entry.
//
// - ConstStaticCell is used for buffers that can be initialized at compile
//   time, then taken once: the USB descriptor buffers and core 1's stack.
//
// - Statics shared between the cores need no Mutex of our own:
//   HOST_RX/HOST_TX in link are embassy_sync Pipes using
//   CriticalSectionRawMutex, as it works across cores, and ENGINE_STATUS is
//   a set of atomics written only by the engine.
