//! Driver for the Bosch BMP180 barometric pressure and temperature sensor.
//!
//! The crate is split along the two parts that carry real contracts:
//!
//! - [`bus`]: a register-level transaction engine on top of a
//!   [`BusController`], i.e. a two-wire master that exposes its individual
//!   phases (START, byte out, byte in, ACK/NACK, STOP). [`SoftI2c`] provides
//!   one over two open-drain GPIO lines.
//! - [`Bmp180`]: calibration loading, raw conversions and the datasheet's
//!   fixed-point [`compensate`] routine.
//!
//! ```ignore
//! let bus = SoftI2c::new(sda, scl, Delay, &config.bus)?;
//! let mut sensor = Bmp180::new(bus, Delay, &config);
//! sensor.init()?;
//! let reading = sensor.sample()?; // 0.1 °C and Pa
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod config;
pub mod display;
pub mod error;
pub mod registers;
pub mod sensor;
pub mod soft_i2c;

#[cfg(test)]
mod testing;

// Re-export the public API things
pub use bus::{Ack, BusController, BusEngine};
pub use calibration::Calibration;
pub use compensation::{compensate, CompensatedReading, RawSample};
pub use config::{BusConfig, Config, Oversampling};
pub use display::{show, GraphicsDisplay, LineBuffer, LineDisplay};
pub use error::{Error, Phase};
pub use sensor::Bmp180;
pub use soft_i2c::{SoftI2c, SoftI2cError};
