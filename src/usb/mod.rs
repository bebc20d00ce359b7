//! Handles creation of the embassy USB stack, and the serial tasks which
//! move bytes between the host and the engine's pipes.
//!
//! The device presents a single CDC-ACM serial port.  Line coding is
//! ignored: the link is a plain byte stream.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_futures::select::{Either, select};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver as RpUsbDriver, InterruptHandler};
use embassy_time::Timer;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::{ConstStaticCell, StaticCell};

use crate::constants::{
    MANUFACTURER, MAX_EP_PACKET_SIZE, MAX_EP_PACKET_SIZE_USIZE, MAX_PACKET_SIZE_0, PRODUCT,
    PRODUCT_ID, USB_CLASS, USB_POWER_MA, USB_PROTOCOL, USB_SUB_CLASS, USB_TX_TIMEOUT, VENDOR_ID,
};
use crate::link::{HOST_RX, HOST_TX};

// Bind the hardware USB interrupt to the USB stack.  Interrupts are the
// primary mechanism the USB stack uses to receive data from hardware.
bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

pub type UsbDriver = RpUsbDriver<'static, USB>;

// The USB_DEVICE is stored as a static to allow us to spawn a task using the
// USB runner.  It isn't Send safe, so we return the mutable reference
// StaticCell::init() provides and pass that into usb_task().
static USB_DEVICE: StaticCell<UsbDevice<'static, UsbDriver>> = StaticCell::new();

// The CDC-ACM class keeps its control state here for the life of the device.
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

// The following statics are used to store the USB descriptor buffers and
// control buffer.  We store them as statics to avoid lifetime issues when
// creating the USB builder.
//
// The ownership of these is passed to the USB builder.
static CONFIG_DESC: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
static BOS_DESC: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
static MSOS_DESC: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
static CONTROL_BUF: ConstStaticCell<[u8; 64]> = ConstStaticCell::new([0; 64]);

/// The host facing halves of the serial port.
pub struct SerialPort {
    pub sender: Sender<'static, UsbDriver>,
    pub receiver: Receiver<'static, UsbDriver>,
}

/// Used to create the embassy USB stack.
pub struct UsbStack {}

impl UsbStack {
    /// Creates the USB stack, with a single CDC-ACM serial port.
    ///
    /// # Arguments
    /// - `usb` - The USB peripheral
    /// - `serial` - This device's USB serial number
    pub fn create_static(
        p_usb: USB,
        serial: &'static str,
    ) -> (&'static mut UsbDevice<'static, UsbDriver>, SerialPort) {
        let driver = RpUsbDriver::new(p_usb, Irqs);

        let mut config = Config::new(VENDOR_ID, PRODUCT_ID);
        config.manufacturer = Some(MANUFACTURER);
        config.product = Some(PRODUCT);
        config.serial_number = Some(serial);
        config.max_power = USB_POWER_MA;
        config.max_packet_size_0 = MAX_PACKET_SIZE_0;

        // CDC-ACM uses two interfaces, tied together by an interface
        // association descriptor, so the device has to say so.
        config.device_class = USB_CLASS;
        config.device_sub_class = USB_SUB_CLASS;
        config.device_protocol = USB_PROTOCOL;
        config.composite_with_iads = true;

        let mut builder = Builder::new(
            driver,
            config,
            CONFIG_DESC.take(),
            BOS_DESC.take(),
            MSOS_DESC.take(),
            CONTROL_BUF.take(),
        );

        let state = CDC_STATE.init(State::new());
        let class = CdcAcmClass::new(&mut builder, state, MAX_EP_PACKET_SIZE);
        let (sender, receiver) = class.split();

        let usb = USB_DEVICE.init(builder.build());

        (usb, SerialPort { sender, receiver })
    }
}

// Method to run the USB stack.
#[embassy_executor::task]
pub async fn usb_task(usb: &'static mut UsbDevice<'static, UsbDriver>) -> ! {
    let core = embassy_rp::pac::SIO.cpuid().read();
    info!("Core{}: USB task started", core);

    // Run the USB Device runner.  This loop is the internal implemenation of
    // usb.run().
    loop {
        // Run the USB stack until it suspends.  This is a blocking call and
        // is not safely cancellable.
        usb.run_until_suspend().await;

        // Cancel-safe
        usb.wait_resume().await;
    }
}

/// Moves bytes from the host into [`HOST_RX`].
#[embassy_executor::task]
pub async fn serial_rx_task(mut receiver: Receiver<'static, UsbDriver>) -> ! {
    let mut buf = [0u8; MAX_EP_PACKET_SIZE_USIZE];
    loop {
        receiver.wait_connection().await;
        info!("Host connected");

        loop {
            match receiver.read_packet(&mut buf).await {
                Ok(len) => {
                    trace!("Host sent {} bytes", len);
                    HOST_RX.write_all(&buf[..len]).await;
                }
                Err(e) => {
                    info!("Host disconnected: {}", e);
                    break;
                }
            }
        }
    }
}

/// Moves frames from [`HOST_TX`] to the host.
///
/// Packets the host doesn't collect within [`USB_TX_TIMEOUT`] are dropped,
/// so the engine keeps running with no host attached.
#[embassy_executor::task]
pub async fn serial_tx_task(mut sender: Sender<'static, UsbDriver>) -> ! {
    let mut buf = [0u8; MAX_EP_PACKET_SIZE_USIZE];
    loop {
        let len = HOST_TX.read(&mut buf).await;
        let sent = match select(sender.write_packet(&buf[..len]), Timer::after(USB_TX_TIMEOUT)).await
        {
            Either::First(Ok(())) => true,
            Either::First(Err(e)) => {
                debug!("Dropped {} bytes: {}", len, e);
                false
            }
            Either::Second(()) => {
                debug!("Dropped {} bytes: host not reading", len);
                false
            }
        };

        // A full packet doesn't end the transfer, so follow it with a zero
        // length packet or the host may sit on the data.
        if sent && len == MAX_EP_PACKET_SIZE_USIZE {
            let _ = select(sender.write_packet(&[]), Timer::after(USB_TX_TIMEOUT)).await;
        }
    }
}
