use defmt::*;
use defmt_rtt as _; // global logger
use embassy_futures::join::join;
use embassy_stm32::usb::{DmPin, DpPin, Driver, Instance};
use embassy_stm32::{bind_interrupts, peripherals, usb, Peripheral};
use embassy_stm32::peripherals::USB;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use panic_probe as _;
use core::fmt::Write;
use embassy_sync::pubsub::WaitResult;
use heapless::String;
use crate::sensors::FrameChannel;

bind_interrupts!(struct Irqs {
    USB => usb::InterruptHandler<peripherals::USB>;
});

// ANSI: cursor home, erase line
const HOME: &str = "\x1b[H";
const CLEAR_LINE: &str = "\x1b[2K";

async fn usb_print<'a, T: Instance>(
    class: &mut CdcAcmClass<'a, Driver<'a, T>>,
    args: core::fmt::Arguments<'_>,
) {
    let mut buffer: String<128> = String::new();
    let _ = buffer.write_fmt(args);

    // Send in chunks of 64 or less
    let mut i = 0;
    while i < buffer.len() {
        let end = (i + 64).min(buffer.len());
        let chunk = &buffer.as_bytes()[i..end];
        if let Err(e) = class.write_packet(chunk).await {
            warn!("USB write error: {:?}", e);
            break;
        }
        i = end;
    }

    // If last chunk was exactly 64 bytes, send a ZLP
    if buffer.len() % 64 == 0 {
        let _ = class.write_packet(&[]).await;
    }
}

// Handy macro
#[macro_export]
macro_rules! usb_write {
    ($usb:expr, $($arg:tt)*) => {
        usb_print($usb, format_args!($($arg)*)).await
    };
}

/// Runs the USB CDC-ACM console that stands in for the two-line display.
/// Every frame redraws both lines in place.
pub async fn setup_usb<'d>(
    usb: impl Peripheral<P = USB> + 'd,
    dp: impl Peripheral<P = impl DpPin<USB>> + 'd,
    dm: impl Peripheral<P = impl DmPin<USB>> + 'd,
    frames: &FrameChannel,
) {
    let driver = Driver::new(usb, Irqs, dp, dm);

    // Create embassy-usb Config
    let mut config = embassy_usb::Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("Embassy");
    config.product = Some("BMP180 display");
    config.serial_number = Some("12345678");

    // It needs some buffers for building the descriptors.
    let mut config_descriptor = [0; 256];
    let mut bos_descriptor = [0; 256];
    let mut control_buf = [0; 64];

    let mut state = State::new();

    let mut builder = Builder::new(
        driver,
        config,
        &mut config_descriptor,
        &mut bos_descriptor,
        &mut [], // no msos descriptors
        &mut control_buf,
    );

    let mut class = CdcAcmClass::new(&mut builder, &mut state, 64);

    let mut usb = builder.build();
    let usb_fut = usb.run();

    let mut frame_subscriber = frames.subscriber().unwrap();

    let console_fut = async {
        loop {
            class.wait_connection().await;
            info!("USB Connected");
            usb_write!(&mut class, "\x1b[2J");

            loop {
                match frame_subscriber.next_message().await {
                    WaitResult::Message(frame) => {
                        usb_write!(&mut class, "{}", HOME);
                        for line in frame.lines() {
                            usb_write!(&mut class, "{}{}\r\n", CLEAR_LINE, line.as_str());
                        }
                    }
                    WaitResult::Lagged(n) => {
                        info!("USB Lagged {:?}", n);
                    }
                }
            }
        }
    };

    join(usb_fut, console_fut).await;
}
