// address
pub const BMP180_ADDRESS: u8 = 0x77; // fixed, no address pin

// address byte on the wire, R/W in the LSB
pub const ADDRESS_WRITE: u8 = BMP180_ADDRESS << 1; // 0xEE
pub const ADDRESS_READ: u8 = (BMP180_ADDRESS << 1) | 1; // 0xEF

// registers
pub const CALIBRATION_REG: u8 = 0xAA; // 11 big-endian words, 0xAA..=0xBF
pub const CHIP_ID_REG: u8 = 0xD0;
pub const CONTROL_REG: u8 = 0xF4;
pub const RESULT_REG: u8 = 0xF6; // MSB, LSB, XLSB

pub const CHIP_ID: u8 = 0x55;

// commands written to CONTROL_REG
pub const CONVERT_TEMP_CMD: u8 = 0x2E;
pub const CONVERT_PRESSURE_CMD: u8 = 0x34; // OR'd with oss << 6

pub const CALIBRATION_LEN: usize = 22;

/// Size of the engine's receive buffer, large enough for the calibration block.
pub const SCRATCH_LEN: usize = CALIBRATION_LEN;
