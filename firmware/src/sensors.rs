use bmp180::{show, Bmp180, Error, LineBuffer, SoftI2c};
use defmt::*;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::OutputOpenDrain;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubBehavior, PubSubChannel};
use embassy_time::{Delay, Duration, Ticker};

// one full temperature + pressure cycle per period
const SAMPLE_PERIOD: Duration = Duration::from_millis(1000);

pub const FRAME_CAPACITY: usize = 4;
pub const FRAME_SUBSCRIBERS: usize = 1; // usb console
pub const FRAME_PUBLISHERS: usize = 1;

/// Display frames, one per successful sampling cycle.
pub type FrameChannel =
    PubSubChannel<CriticalSectionRawMutex, LineBuffer, FRAME_CAPACITY, FRAME_SUBSCRIBERS, FRAME_PUBLISHERS>;
pub static FRAME_PUBSUB: FrameChannel = PubSubChannel::new();

pub type SensorBus = SoftI2c<OutputOpenDrain<'static>, OutputOpenDrain<'static>, Delay>;
pub type Sensor = Bmp180<SensorBus, Delay>;

#[embassy_executor::task]
pub async fn bmp180_task(mut sensor: Sensor) {
    let mut frame = LineBuffer::new();
    let mut ticker = Ticker::every(SAMPLE_PERIOD);

    loop {
        // (re)load calibration until the sensor answers with a sane block
        if sensor.calibration().is_none() {
            match sensor.init() {
                Ok(calibration) => info!("BMP180 calibration loaded: {:?}", calibration),
                Err(e) => error!("Failed to initialize BMP180: {:?}", e),
            }
        }

        if sensor.calibration().is_some() {
            match sensor.sample() {
                Ok(reading) => {
                    info!("BMP180: {} C, {} Pa", reading.celsius(), reading.pressure);
                    // writing into the frame buffer cannot fail
                    let _ = show(&mut frame, &reading);
                    FRAME_PUBSUB.publish_immediate(frame.clone());
                }
                Err(Error::InvalidReading) => {
                    warn!("BMP180 sample could not be compensated, skipping");
                }
                Err(e) => {
                    error!("Failed to sample BMP180: {:?}", e);
                }
            }
        }

        ticker.next().await;
    }
}

/// Falling edge on the user button. Only observed; the handler never blocks
/// and shares nothing with the sampling task.
#[embassy_executor::task]
pub async fn button_task(mut button: ExtiInput<'static>) {
    loop {
        button.wait_for_falling_edge().await;
        debug!("Button pressed");
    }
}
