//! Blocking bit-banged two-wire master on two open-drain GPIO lines.
//!
//! Assumptions:
//! - Both lines are open-drain with pull-ups: `set_high` releases the line,
//!   `set_low` drives it, `is_high` reads the actual bus level.
//! - SDA changes only while SCL is low, except for START/STOP.
//! - The peripheral may stretch SCL. A stretch that outlasts the poll limit
//!   leaves the controller busy, so the engine reports a timeout.
//!
//! Each phase runs to completion inside the call that starts it, which is why
//! `is_idle` is normally `true` right away.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::bus::{Ack, BusController};
use crate::config::BusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftI2cError {
    Pin,
}

pub struct SoftI2c<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    half_period_ns: u32,
    stretch_limit: Option<u32>,
    stalled: bool,
    received: Option<u8>,
    ack: Ack,
}

impl<SDA, SCL, D> SoftI2c<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    /// Takes both lines and releases them, leaving the bus idle.
    pub fn new(mut sda: SDA, mut scl: SCL, delay: D, config: &BusConfig) -> Result<Self, SoftI2cError> {
        sda.set_high().map_err(|_| SoftI2cError::Pin)?;
        scl.set_high().map_err(|_| SoftI2cError::Pin)?;
        Ok(Self {
            sda,
            scl,
            delay,
            half_period_ns: config.half_period_ns(),
            stretch_limit: config.poll_limit,
            stalled: false,
            received: None,
            ack: Ack::Nack,
        })
    }

    pub fn release(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }

    fn wait(&mut self) {
        self.delay.delay_ns(self.half_period_ns);
    }

    fn sda(&mut self, high: bool) -> Result<(), SoftI2cError> {
        let result = if high { self.sda.set_high() } else { self.sda.set_low() };
        result.map_err(|_| SoftI2cError::Pin)
    }

    fn scl_low(&mut self) -> Result<(), SoftI2cError> {
        self.scl.set_low().map_err(|_| SoftI2cError::Pin)
    }

    /// Release SCL and wait for it to actually go high.
    fn scl_high(&mut self) -> Result<bool, SoftI2cError> {
        self.scl.set_high().map_err(|_| SoftI2cError::Pin)?;
        let mut polls = 0u32;
        while self.scl.is_low().map_err(|_| SoftI2cError::Pin)? {
            polls = polls.saturating_add(1);
            if self.stretch_limit.is_some_and(|limit| polls >= limit) {
                self.stalled = true;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// One clock pulse; returns the SDA level sampled while SCL is high.
    fn clock(&mut self) -> Result<Option<bool>, SoftI2cError> {
        self.wait();
        if !self.scl_high()? {
            return Ok(None);
        }
        self.wait();
        let level = self.sda.is_high().map_err(|_| SoftI2cError::Pin)?;
        self.scl_low()?;
        Ok(Some(level))
    }
}

impl<SDA, SCL, D> BusController for SoftI2c<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = SoftI2cError;

    fn start(&mut self) -> Result<(), SoftI2cError> {
        self.stalled = false;
        self.sda(true)?;
        if !self.scl_high()? {
            return Ok(());
        }
        self.wait();
        self.sda(false)?;
        self.wait();
        self.scl_low()
    }

    fn restart(&mut self) -> Result<(), SoftI2cError> {
        self.sda(true)?;
        self.wait();
        if !self.scl_high()? {
            return Ok(());
        }
        self.wait();
        self.sda(false)?;
        self.wait();
        self.scl_low()
    }

    fn stop(&mut self) -> Result<(), SoftI2cError> {
        self.sda(false)?;
        self.wait();
        if !self.scl_high()? {
            return Ok(());
        }
        self.wait();
        self.sda(true)?;
        self.wait();
        Ok(())
    }

    fn transmit(&mut self, byte: u8) -> Result<(), SoftI2cError> {
        for bit in (0..8).rev() {
            self.sda(byte & (1 << bit) != 0)?;
            if self.clock()?.is_none() {
                return Ok(());
            }
        }
        // release SDA for the peripheral's acknowledge
        self.sda(true)?;
        self.ack = match self.clock()? {
            Some(false) => Ack::Ack,
            _ => Ack::Nack,
        };
        Ok(())
    }

    fn enable_receive(&mut self) -> Result<(), SoftI2cError> {
        self.sda(true)?;
        let mut byte = 0u8;
        for _ in 0..8 {
            match self.clock()? {
                Some(level) => byte = (byte << 1) | level as u8,
                None => return Ok(()),
            }
        }
        self.received = Some(byte);
        Ok(())
    }

    fn acknowledge(&mut self, ack: Ack) -> Result<(), SoftI2cError> {
        self.sda(ack == Ack::Nack)?;
        self.clock()?;
        self.sda(true)
    }

    fn is_idle(&mut self) -> Result<bool, SoftI2cError> {
        Ok(!self.stalled)
    }

    fn read_received(&mut self) -> Result<Option<u8>, SoftI2cError> {
        Ok(self.received.take())
    }

    fn last_ack(&mut self) -> Result<Ack, SoftI2cError> {
        Ok(self.ack)
    }
}
