//! The firmware's entry point and panic handling.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::AnyPin;
use embassy_time::Timer;
use heapless::String;
use static_cell::StaticCell;

use crate::constants::{LOOP_LOG_INTERVAL, MAX_SERIAL_STRING_LEN};
use crate::infra::display::{StatusDisplay, status_task};
use crate::infra::gpio::Gpio;
use crate::infra::watchdog::{create_watchdog, reboot_normal, watchdog_task};
use crate::task::{core1_spawn, spawn_or_reboot};
use crate::usb::{UsbStack, serial_rx_task, serial_tx_task, usb_task};
use crate::util::built::log_fw_info;
use crate::util::dev_info::get_serial;

// The USB serial number has to outlive main().
static SERIAL: StaticCell<String<MAX_SERIAL_STRING_LEN>> = StaticCell::new();

/// Brings up the device, spawns every task, and then idles.
pub async fn common_main(spawner: Spawner, bin_name: &str) -> ! {
    let mut p = embassy_rp::init(Default::default());

    let core: u32 = embassy_rp::pac::SIO.cpuid().read();
    info!("Core{}: Main started", core);

    // Get the serial number, and log who we are.
    let serial = SERIAL.init(String::new());
    get_serial(&mut p.FLASH, serial);
    let serial: &'static String<MAX_SERIAL_STRING_LEN> = serial;
    log_fw_info(bin_name, serial.as_str());

    // Start the watchdog first, so nothing can hang before it is running.
    let watchdog = create_watchdog(p.WATCHDOG);
    spawn_or_reboot(spawner.spawn(watchdog_task(watchdog)), "Watchdog");

    // Hand out the pins.  Building the bus holds the computer in reset
    // until the engine is ready to start it.
    let mut gpio = Gpio::new([
        AnyPin::from(p.PIN_0),
        AnyPin::from(p.PIN_1),
        AnyPin::from(p.PIN_2),
        AnyPin::from(p.PIN_3),
        AnyPin::from(p.PIN_4),
        AnyPin::from(p.PIN_5),
        AnyPin::from(p.PIN_6),
        AnyPin::from(p.PIN_7),
        AnyPin::from(p.PIN_8),
        AnyPin::from(p.PIN_9),
        AnyPin::from(p.PIN_10),
        AnyPin::from(p.PIN_11),
        AnyPin::from(p.PIN_12),
        AnyPin::from(p.PIN_13),
        AnyPin::from(p.PIN_14),
        AnyPin::from(p.PIN_15),
        AnyPin::from(p.PIN_16),
        AnyPin::from(p.PIN_17),
        AnyPin::from(p.PIN_18),
        AnyPin::from(p.PIN_19),
        AnyPin::from(p.PIN_20),
        AnyPin::from(p.PIN_21),
        AnyPin::from(p.PIN_22),
        AnyPin::from(p.PIN_23),
        AnyPin::from(p.PIN_24),
        AnyPin::from(p.PIN_25),
        AnyPin::from(p.PIN_26),
        AnyPin::from(p.PIN_27),
        AnyPin::from(p.PIN_28),
        AnyPin::from(p.PIN_29),
    ]);
    let Some(bus) = gpio.create_bus() else {
        defmt::panic!("Failed to allocate paper tape station pins");
    };
    let Some(led_pin) = gpio.take_status_display_pin() else {
        defmt::panic!("Failed to allocate status display pin");
    };

    // Status display
    let display = StatusDisplay::new(led_pin);
    spawn_or_reboot(spawner.spawn(status_task(display, watchdog)), "Status");

    // USB and the serial link to the host.
    let (usb, port) = UsbStack::create_static(p.USB, serial.as_str());
    spawn_or_reboot(spawner.spawn(usb_task(usb)), "USB");
    spawn_or_reboot(spawner.spawn(serial_rx_task(port.receiver)), "Serial RX");
    spawn_or_reboot(spawner.spawn(serial_tx_task(port.sender)), "Serial TX");

    // And finally the engine, on core 1.
    core1_spawn(p.CORE1, bus, watchdog);

    // Everything else happens in tasks.
    loop {
        Timer::after(LOOP_LOG_INTERVAL).await;
        trace!("Core{}: Main loop", core);
    }
}

/// Handles a core panic by logging it and rebooting.
pub fn panic_handler(info: &core::panic::PanicInfo) -> ! {
    error!("Panic: {}", defmt::Display2Format(info));
    reboot_normal()
}

/// Handles a defmt panic, which has already been logged, by rebooting.
pub fn defmt_panic_handler() -> ! {
    reboot_normal()
}
