use embedded_hal::delay::DelayNs;

use crate::bus::{BusController, BusEngine};
use crate::calibration::Calibration;
use crate::compensation::{compensate, CompensatedReading, RawSample};
use crate::config::{temperature_conversion_time_ms, Config, Oversampling};
use crate::error::Error;
use crate::registers::*;

/// BMP180 driver.
///
/// Owns the bus engine, the delay used to wait out conversions and the
/// calibration snapshot once it has been loaded.
pub struct Bmp180<C, D> {
    bus: BusEngine<C>,
    delay: D,
    oversampling: Oversampling,
    calibration: Option<Calibration>,
}

impl<C, D> Bmp180<C, D>
where
    C: BusController,
    D: DelayNs,
{
    pub fn new(controller: C, delay: D, config: &Config) -> Self {
        Self {
            bus: BusEngine::new(controller, &config.bus),
            delay,
            oversampling: config.oversampling,
            calibration: None,
        }
    }

    /// Check that a BMP180 answers and load its calibration.
    pub fn init(&mut self) -> Result<&Calibration, Error<C::Error>> {
        let id = self.chip_id()?;
        if id != CHIP_ID {
            error!("BMP180 chip id mismatch: 0x{:02X}", id);
            return Err(Error::UnexpectedChipId(id));
        }
        self.load_calibration()
    }

    pub fn chip_id(&mut self) -> Result<u8, Error<C::Error>> {
        Ok(self.bus.read_block(CHIP_ID_REG, 1)?[0])
    }

    /// Read the 22-byte calibration block and keep it for all later readings.
    ///
    /// A block containing 0x0000 or 0xFFFF words is rejected and any earlier
    /// snapshot is dropped.
    pub fn load_calibration(&mut self) -> Result<&Calibration, Error<C::Error>> {
        self.calibration = None;
        let mut wire = [0u8; CALIBRATION_LEN];
        wire.copy_from_slice(self.bus.read_block(CALIBRATION_REG, CALIBRATION_LEN)?);

        let calibration = Calibration::from_be_bytes(&wire);
        if !calibration.is_valid() {
            error!("invalid calibration block: {:x}", wire);
            return Err(Error::InvalidCalibration);
        }
        debug!("calibration: {:?}", calibration);
        Ok(self.calibration.insert(calibration))
    }

    /// Start a temperature conversion and read UT.
    pub fn acquire_temperature(&mut self) -> Result<u16, Error<C::Error>> {
        self.bus.write_register(CONTROL_REG, CONVERT_TEMP_CMD)?;
        self.delay.delay_ms(temperature_conversion_time_ms());
        let data = self.bus.read_block(RESULT_REG, 2)?;
        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    /// Start a pressure conversion at the configured oversampling and read UP.
    pub fn acquire_pressure(&mut self) -> Result<u32, Error<C::Error>> {
        let oss = self.oversampling;
        self.bus.write_register(CONTROL_REG, oss.pressure_command())?;
        self.delay.delay_ms(oss.conversion_time_ms());
        let data = self.bus.read_block(RESULT_REG, 3)?;
        let raw = u32::from_be_bytes([0, data[0], data[1], data[2]]);
        Ok(raw >> oss.pressure_shift())
    }

    /// Both conversions of one cycle, temperature first.
    pub fn acquire(&mut self) -> Result<RawSample, Error<C::Error>> {
        let ut = self.acquire_temperature()?;
        let up = self.acquire_pressure()?;
        trace!("UT = {}, UP = {}", ut, up);
        Ok(RawSample { ut, up })
    }

    /// One full sampling cycle: acquire both raw values and compensate them.
    pub fn sample(&mut self) -> Result<CompensatedReading, Error<C::Error>> {
        if self.calibration.is_none() {
            return Err(Error::Uncalibrated);
        }
        let raw = self.acquire()?;
        self.compensate(raw)
    }

    pub fn compensate(&self, raw: RawSample) -> Result<CompensatedReading, Error<C::Error>> {
        let calibration = self.calibration.as_ref().ok_or(Error::Uncalibrated)?;
        compensate(raw, calibration, self.oversampling).ok_or(Error::InvalidReading)
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    /// Give back the controller and delay.
    pub fn release(self) -> (C, D) {
        (self.bus.release(), self.delay)
    }
}
