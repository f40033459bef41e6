#![no_std]
#![no_main]

mod sensors;
mod usb_serial;

use bmp180::{Bmp180, Oversampling, SoftI2c};
use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, OutputOpenDrain, Pull, Speed};
use embassy_stm32::Config;
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

// Sensors
use crate::sensors::*;

// USB
use crate::usb_serial::*;

const OVERSAMPLING: Oversampling = Oversampling::UltraHighResolution;

async fn heartbeat(led: &mut Output<'_>) {
    loop {
        led.set_high();
        Timer::after_millis(500).await;
        led.set_low();
        Timer::after_millis(500).await;
    }
}

// Main function and entry point of the program after configuration
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hsi = true;
        config.rcc.pll1 = Some(Pll {
            source: PllSource::HSI, // 16 MHz
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL10,
            divp: None,
            divq: None,
            divr: Some(PllDiv::DIV1), // 160 MHz
        });
        config.rcc.sys = Sysclk::PLL1_R;
        config.rcc.voltage_range = VoltageScale::RANGE1;
        config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true }); // needed for USB
        config.rcc.mux.iclksel = mux::Iclksel::HSI48; // USB uses ICLK (48MHz)
    }

    let p = embassy_stm32::init(config);

    // Set up user led as output
    let mut led = Output::new(p.PE2, Level::Low, Speed::Medium);

    // BMP180 on PB3 (SDA) / PB6 (SCL), bit-banged, pull-ups on the board
    let sda = OutputOpenDrain::new(p.PB3, Level::High, Speed::Medium);
    let scl = OutputOpenDrain::new(p.PB6, Level::High, Speed::Medium);
    let sensor_config = bmp180::Config {
        oversampling: OVERSAMPLING,
        ..Default::default()
    };
    let bus = unwrap!(SoftI2c::new(sda, scl, Delay, &sensor_config.bus));
    let sensor = Bmp180::new(bus, Delay, &sensor_config);
    info!("BMP180 oversampling: {}", OVERSAMPLING);

    let button = ExtiInput::new(p.PC13, p.EXTI13, Pull::Up);

    spawner.spawn(bmp180_task(sensor)).unwrap();
    spawner.spawn(button_task(button)).unwrap();

    join(
        setup_usb(p.USB, p.PA12, p.PA11, &FRAME_PUBSUB),
        heartbeat(&mut led),
    )
    .await;
}
