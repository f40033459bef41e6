use core::fmt;

/// Bus phase in which a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Start,
    Restart,
    /// Address byte with write intent.
    AddressWrite,
    /// Address byte with read intent.
    AddressRead,
    Register,
    Data,
    Receive,
    Acknowledge,
    Stop,
}

/// Driver errors, generic over the bus controller's own error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus controller itself reported a failure.
    Bus(E),
    /// The peripheral did not acknowledge a byte.
    NoAck(Phase),
    /// A completion flag did not rise within the configured poll limit.
    Timeout(Phase),
    /// Block reads must request between 1 and 22 bytes.
    InvalidLength,
    /// Something other than a BMP180 answered on the address.
    UnexpectedChipId(u8),
    /// Calibration words read back as 0x0000 or 0xFFFF.
    InvalidCalibration,
    /// A reading was requested before calibration was loaded.
    Uncalibrated,
    /// The compensation hit a zero divisor.
    InvalidReading,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus controller error: {:?}", e),
            Error::NoAck(phase) => write!(f, "no acknowledge during {:?}", phase),
            Error::Timeout(phase) => write!(f, "bus timeout during {:?}", phase),
            Error::InvalidLength => write!(f, "invalid block length"),
            Error::UnexpectedChipId(id) => write!(f, "unexpected chip id 0x{:02X}", id),
            Error::InvalidCalibration => write!(f, "invalid calibration data"),
            Error::Uncalibrated => write!(f, "calibration not loaded"),
            Error::InvalidReading => write!(f, "raw sample cannot be compensated"),
        }
    }
}
