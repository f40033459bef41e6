use crate::registers::CONVERT_PRESSURE_CMD;

// one bus phase is a few clocks, so this is far beyond any healthy transfer
const DEFAULT_POLL_LIMIT: u32 = 100_000;

const TEMPERATURE_WAIT_MS: u32 = 5; // datasheet max 4.5ms

/// Pressure oversampling. Higher settings average more internal samples at
/// the cost of a longer conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    UltraLowPower = 0,
    Standard = 1,
    HighResolution = 2,
    #[default]
    UltraHighResolution = 3,
}

impl Oversampling {
    /// Maps `0..=3` onto a setting.
    pub fn from_bits(oss: u8) -> Option<Self> {
        match oss {
            0 => Some(Oversampling::UltraLowPower),
            1 => Some(Oversampling::Standard),
            2 => Some(Oversampling::HighResolution),
            3 => Some(Oversampling::UltraHighResolution),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Control register command that starts a pressure conversion.
    pub fn pressure_command(self) -> u8 {
        CONVERT_PRESSURE_CMD | (self.bits() << 6)
    }

    /// Wait between the pressure command and the result read.
    ///
    /// Grows by 7ms per step and stays above the datasheet maxima of
    /// 4.5, 7.5, 13.5 and 25.5ms.
    pub fn conversion_time_ms(self) -> u32 {
        5 + 7 * self.bits() as u32
    }

    /// Right shift applied to the 24-bit result to keep `16 + oss` bits.
    pub fn pressure_shift(self) -> u8 {
        8 - self.bits()
    }
}

/// Wait between the temperature command and the result read.
pub fn temperature_conversion_time_ms() -> u32 {
    TEMPERATURE_WAIT_MS
}

/// Two-wire bus timing and fault detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// SCL frequency in Hz.
    pub frequency: u32,

    /// How many times a completion flag is polled before the engine gives up
    /// with a timeout.
    ///
    /// `None` waits forever: a missing peripheral then hangs the caller.
    pub poll_limit: Option<u32>,
}

impl BusConfig {
    /// Half of one SCL period, the unit of the software bus timing.
    pub fn half_period_ns(&self) -> u32 {
        500_000_000 / self.frequency.max(1)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            frequency: 100_000,
            poll_limit: Some(DEFAULT_POLL_LIMIT),
        }
    }
}

/// Driver configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub oversampling: Oversampling,
    pub bus: BusConfig,
}
