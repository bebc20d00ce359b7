//! Device identity, used as the USB serial number.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use core::fmt::Write;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::peripherals::FLASH;

use crate::constants::MAX_SERIAL_STRING_LEN;

// Big enough for any Pico's flash.  Only the unique ID is read.
const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Reads the flash chip's unique ID and formats it as a hex string into
/// `serial`.
///
/// If reading the ID fails the serial number will be all zeroes.
pub fn get_serial(flash: &mut FLASH, serial: &mut heapless::String<MAX_SERIAL_STRING_LEN>) {
    serial.clear();

    let mut byte_buf = [0u8; 8];
    let mut flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(flash);
    let _ = flash.blocking_unique_id(&mut byte_buf);

    for b in byte_buf.iter().take(MAX_SERIAL_STRING_LEN / 2) {
        // Exactly fills the string, so can't fail.
        let _ = write!(serial, "{:02x}", b);
    }
}
