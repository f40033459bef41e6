use crate::registers::CALIBRATION_LEN;

/// Factory calibration coefficients from the sensor's EEPROM.
///
/// Every unit is calibrated individually; the values never change for a given
/// part, so they are read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    /// Decode the 22-byte block at 0xAA, eleven big-endian words in register
    /// order.
    pub fn from_be_bytes(bytes: &[u8; CALIBRATION_LEN]) -> Self {
        let word = |i: usize| [bytes[2 * i], bytes[2 * i + 1]];
        Self {
            ac1: i16::from_be_bytes(word(0)),
            ac2: i16::from_be_bytes(word(1)),
            ac3: i16::from_be_bytes(word(2)),
            ac4: u16::from_be_bytes(word(3)),
            ac5: u16::from_be_bytes(word(4)),
            ac6: u16::from_be_bytes(word(5)),
            b1: i16::from_be_bytes(word(6)),
            b2: i16::from_be_bytes(word(7)),
            mb: i16::from_be_bytes(word(8)),
            mc: i16::from_be_bytes(word(9)),
            md: i16::from_be_bytes(word(10)),
        }
    }

    /// Encode back into wire order.
    pub fn to_be_bytes(&self) -> [u8; CALIBRATION_LEN] {
        let mut bytes = [0u8; CALIBRATION_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(2).zip(self.words()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// The eleven coefficients as raw 16-bit words, in register order.
    pub fn words(&self) -> [u16; 11] {
        [
            self.ac1 as u16,
            self.ac2 as u16,
            self.ac3 as u16,
            self.ac4,
            self.ac5,
            self.ac6,
            self.b1 as u16,
            self.b2 as u16,
            self.mb as u16,
            self.mc as u16,
            self.md as u16,
        ]
    }

    /// The datasheet rules out 0x0000 and 0xFFFF for every word; either one
    /// means the EEPROM read did not go through.
    pub fn is_valid(&self) -> bool {
        self.words().iter().all(|&w| w != 0x0000 && w != 0xFFFF)
    }
}
