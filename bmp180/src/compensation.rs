//! Raw-to-physical conversion.
//!
//! This is the fixed-point algorithm from the BMP180 datasheet. The order of
//! operations and the integer widths are part of the result: 32-bit signed
//! intermediates, unsigned B4 and B7, power-of-two scalings as arithmetic
//! shifts and truncating divisions elsewhere. Products wrap the way the
//! 32-bit reference implementation does.

use crate::calibration::Calibration;
use crate::config::Oversampling;

/// Uncompensated conversion results of one sampling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// UT, 16 bits.
    pub ut: u16,
    /// UP, `16 + oss` bits.
    pub up: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedReading {
    /// 0.1 °C
    pub temperature: i32,
    /// Pa
    pub pressure: i32,
}

impl CompensatedReading {
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 / 10.0
    }
}

/// Compensate one raw sample.
///
/// Returns `None` when the calibration and sample lead to a zero divisor,
/// which never happens for a healthy part.
pub fn compensate(
    raw: RawSample,
    cal: &Calibration,
    oversampling: Oversampling,
) -> Option<CompensatedReading> {
    let ut = raw.ut as i32;
    let up = raw.up as i32;
    let oss = oversampling.bits() as u32;

    // temperature
    let x1 = (ut - cal.ac6 as i32).wrapping_mul(cal.ac5 as i32) >> 15;
    let x2 = ((cal.mc as i32) << 11).checked_div(x1.wrapping_add(cal.md as i32))?;
    let b5 = x1.wrapping_add(x2);
    let temperature = b5.wrapping_add(8) >> 4;

    // pressure
    let b6 = b5.wrapping_sub(4000);
    let b6_sq = b6.wrapping_mul(b6) >> 12;
    let x1 = (cal.b2 as i32).wrapping_mul(b6_sq) >> 11;
    let x2 = (cal.ac2 as i32).wrapping_mul(b6) >> 11;
    let x3 = x1.wrapping_add(x2);
    let b3 = (((cal.ac1 as i32 * 4).wrapping_add(x3) << oss).wrapping_add(2)) >> 2;

    let x1 = (cal.ac3 as i32).wrapping_mul(b6) >> 13;
    let x2 = (cal.b1 as i32).wrapping_mul(b6_sq) >> 16;
    let x3 = x1.wrapping_add(x2).wrapping_add(2) >> 2;
    let b4 = (cal.ac4 as u32).wrapping_mul(x3.wrapping_add(32768) as u32) >> 15;
    let b7 = (up.wrapping_sub(b3) as u32).wrapping_mul(50000 >> oss);

    let p = b7_quotient(b7, b4)? as i32;

    let x1 = (p >> 8).wrapping_mul(p >> 8);
    let x1 = x1.wrapping_mul(3038) >> 16;
    let x2 = p.wrapping_mul(-7357) >> 16;
    let pressure = p.wrapping_add(x1.wrapping_add(x2).wrapping_add(3791) >> 4);

    Some(CompensatedReading {
        temperature,
        pressure,
    })
}

/// `2 * B7 / B4` without leaving 32 bits: the doubling happens before the
/// division while B7 has a free top bit, after it otherwise.
pub(crate) fn b7_quotient(b7: u32, b4: u32) -> Option<u32> {
    if b4 == 0 {
        return None;
    }
    if b7 < 0x8000_0000 {
        Some((b7 << 1) / b4)
    } else {
        Some((b7 / b4).wrapping_mul(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::DATASHEET;

    #[test]
    fn datasheet_example() {
        let raw = RawSample {
            ut: 27898,
            up: 23843,
        };
        let reading = compensate(raw, &DATASHEET, Oversampling::UltraLowPower).unwrap();
        assert_eq!(reading.temperature, 150);
        assert_eq!(reading.pressure, 69964);
        assert_eq!(reading.celsius(), 15.0);
    }

    #[test]
    fn same_pressure_at_full_oversampling() {
        // same physical pressure, three extra bits of resolution
        let raw = RawSample {
            ut: 27898,
            up: 23843 << 3,
        };
        let reading = compensate(raw, &DATASHEET, Oversampling::UltraHighResolution).unwrap();
        assert_eq!(reading.temperature, 150);
        assert_eq!(reading.pressure, 69963);
    }

    #[test]
    fn b7_branches_agree_with_wide_division() {
        let b4 = 33457;
        for b7 in [
            0,
            1_171_050_000,
            0x7FFF_FFFE,
            0x7FFF_FFFF,
            0x8000_0000,
            0x8000_0001,
            0xC000_0000,
            u32::MAX,
        ] {
            let exact = (2 * b7 as u64 / b4 as u64) as u32;
            let got = b7_quotient(b7, b4).unwrap();
            if b7 < 0x8000_0000 {
                assert_eq!(got, exact, "b7 = {:#x}", b7);
            } else {
                // dividing first drops at most the last bit
                assert!(exact - got <= 1, "b7 = {:#x}", b7);
                assert_eq!(got, (b7 / b4) * 2);
            }
        }
    }

    #[test]
    fn b7_straddling_raw_pressures() {
        // B3 = 422 with the datasheet set at oss 0, so (UP - 422) * 50000
        // crosses 0x80000000 between these two samples
        let below = RawSample { ut: 27898, up: 43371 };
        let above = RawSample { ut: 27898, up: 43372 };
        assert!(((43371u32 - 422) * 50000) < 0x8000_0000);
        assert!(((43372u32 - 422) * 50000) >= 0x8000_0000);

        let low = compensate(below, &DATASHEET, Oversampling::UltraLowPower).unwrap();
        let high = compensate(above, &DATASHEET, Oversampling::UltraLowPower).unwrap();
        assert!(high.pressure >= low.pressure);
        assert!(high.pressure - low.pressure <= 3);
    }

    #[test]
    fn zero_divisor_yields_no_reading() {
        assert_eq!(b7_quotient(1234, 0), None);

        // x1 + md == 0 when ut == ac6 and md == 0
        let cal = Calibration { md: 0, ..DATASHEET };
        let raw = RawSample { ut: cal.ac6, up: 23843 };
        assert_eq!(compensate(raw, &cal, Oversampling::UltraLowPower), None);
    }
}
