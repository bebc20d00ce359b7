//! Constants for the PicoPTS firmware: timers, USB descriptor values, buffer
//! sizes and the pin map.
//!
//! The protocol engine's own timings live in the pts-engine crate.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::Duration;
use static_assertions::const_assert;

//
// Watchdog timers
//

/// The hardware watchdog resets the system if it isn't fed at least this
/// frequently.
pub const WATCHDOG_HW_TIMEOUT: Duration = Duration::from_secs(1);

/// How often the watchdog runner checks that every policed task has been
/// fed.
pub const WATCHDOG_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// How often the engine task must feed the watchdog to prevent a reset.
pub const ENGINE_WATCHDOG_TIMER: Duration = Duration::from_secs(1);

/// How often the status display must feed the watchdog to prevent a reset.
pub const STATUS_DISPLAY_WATCHDOG_TIMER: Duration = Duration::from_secs(1);

/// The engine offers to feed the watchdog on every pass of its loop, which
/// can be every few microseconds.  Feeds closer together than this are
/// skipped.
pub const ENGINE_FEED_INTERVAL: Duration = Duration::from_millis(100);
const_assert!(ENGINE_FEED_INTERVAL.as_ticks() < ENGINE_WATCHDOG_TIMER.as_ticks());

//
// Task main runner and related timers.
//

// Timer for the StatusDisplay spend on and off when blinking.
pub const STATUS_DISPLAY_BLINK_TIMER: Duration = Duration::from_millis(100);

// How long each short pulse, and the gap after it, lasts when the status
// display is flashing a fault code.
pub const STATUS_DISPLAY_PULSE_TIMER: Duration = Duration::from_millis(200);

// The pause between groups of fault code pulses.
pub const STATUS_DISPLAY_GROUP_GAP_TIMER: Duration = Duration::from_millis(1500);

// Timer for the StatusDisplay to pause between doing work.  Must be less
// than the minimum time the status LED can be on off, and when the engine
// changes state, it will take up to this time for the new state to be shown.
pub const STATUS_DISPLAY_TIMER: Duration = Duration::from_millis(50);
const_assert!(STATUS_DISPLAY_TIMER.as_ticks() < STATUS_DISPLAY_BLINK_TIMER.as_ticks());

// How often we aim to log from our primary loops to prove they are still
// alive.
pub const LOOP_LOG_INTERVAL: Duration = Duration::from_secs(5);

//
// USB device configuration constants.
//

/// USB Descriptor information - what current in mA this device draws.  The
/// station itself only drives logic lines, so 100mA is plenty.
pub const USB_POWER_MA: u16 = 100;

/// USB Descriptor information - maximum endpoint 0 (control endpoint)
/// packet size.
pub const MAX_PACKET_SIZE_0: u8 = 64;

/// USB Descriptor information - maximum CDC-ACM data endpoint packet size.
pub const MAX_EP_PACKET_SIZE: u16 = 64;
pub const MAX_EP_PACKET_SIZE_USIZE: usize = MAX_EP_PACKET_SIZE as usize;

/// USB Descriptor information - Vendor ID and Product ID
pub const VENDOR_ID: u16 = 0x1209;
pub const PRODUCT_ID: u16 = 0xf900;

/// USB Descriptor information - manufacturer string
pub const MANUFACTURER: &str = "piers.rocks";

/// USB Descriptor info - product string
pub const PRODUCT: &str = "PicoPTS paper tape station";

/// USB Descriptor info - serial number string length
pub const MAX_SERIAL_STRING_LEN: usize = 16;

/// USB Descriptor info - device class, subclass, and protocol.  These are
/// the miscellaneous/IAD values required for a composite CDC-ACM device.
pub const USB_CLASS: u8 = 0xef;
pub const USB_SUB_CLASS: u8 = 0x02;
pub const USB_PROTOCOL: u8 = 0x01;

/// How long the transmit task waits for the host to take a packet before
/// dropping it.  Stops the engine stalling when nothing is listening.
pub const USB_TX_TIMEOUT: Duration = Duration::from_millis(100);

//
// Serial link buffers
//

/// Bytes from the host waiting for the engine.  Comfortably more than one
/// USB packet, so the receive task rarely has to wait.
pub const HOST_RX_BUF_SIZE: usize = MAX_EP_PACKET_SIZE_USIZE * 4;
const_assert!(MAX_EP_PACKET_SIZE_USIZE < HOST_RX_BUF_SIZE);

/// Bytes from the engine waiting to go to the host.  Must hold at least one
/// whole frame, as the engine writes frames in one go.
pub const HOST_TX_BUF_SIZE: usize = 256;
const_assert!(pts_engine::frame::FRAME_MAX <= HOST_TX_BUF_SIZE);

//
// Dual core
//

/// Size of the stack for core 1, which runs the engine.
pub const CORE1_STACK_SIZE: usize = 16384;

//
// Pin constants
//
// The paper tape station connector.  Inputs are driven by the computer,
// outputs by us.
//

/// Reader data RDR_1 (lsb) to RDR_128 (msb) - outputs
pub const READER_DATA_PINS: [u8; 8] = [2, 3, 4, 5, 6, 7, 8, 9];

/// Punch data PUN_1 (lsb) to PUN_128 (msb) - inputs
pub const PUNCH_DATA_PINS: [u8; 8] = [10, 11, 12, 13, 14, 15, 16, 17];

/// NOPOWER - holds the computer in reset while high
pub const NO_POWER_PIN: u8 = 18;

/// ACK - acknowledges a transfer
pub const ACK_PIN: u8 = 19;

/// II_AUTO - initial instructions autostart
pub const II_AUTO_PIN: u8 = 20;

/// TTYSEL - the computer is addressing the teleprinter
pub const TTY_SEL_PIN: u8 = 21;

/// PUNREQ - punch request
pub const PUN_REQ_PIN: u8 = 22;

/// Status LED
pub const STATUS_DISPLAY_PIN: u8 = 25;

/// RDRREQ - reader request
pub const RDR_REQ_PIN: u8 = 26;

/// LOG - diagnostics enable strap, pulled up so diagnostics are on unless
/// the pin is grounded.
pub const LOG_PIN: u8 = 27;

/// The number of GPIO pins on the Pico.
pub const NUM_GPIO_PINS: usize = 30;
const_assert!((STATUS_DISPLAY_PIN as usize) < NUM_GPIO_PINS);
const_assert!((LOG_PIN as usize) < NUM_GPIO_PINS);
