//! Two-line text output of a reading.
//!
//! Line 0 shows the temperature with one decimal (`"15.0 C"`), line 1 the
//! pressure in pascals (`"69964 Pa"`). Each line is cleared before it is
//! rewritten.

use core::convert::Infallible;
use core::fmt::Write;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use crate::compensation::CompensatedReading;

pub const COLUMNS: usize = 16;
pub const ROWS: usize = 2;

pub type Line = String<COLUMNS>;

/// A character display with fixed-width lines.
pub trait LineDisplay {
    type Error;

    fn clear_line(&mut self, row: usize) -> Result<(), Self::Error>;
    fn write_line(&mut self, row: usize, text: &str) -> Result<(), Self::Error>;
}

pub fn temperature_line(reading: &CompensatedReading) -> Line {
    let tenths = reading.temperature;
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    let mut line = Line::new();
    // at most 14 characters for any i32
    let _ = write!(line, "{}{}.{} C", sign, abs / 10, abs % 10);
    line
}

pub fn pressure_line(reading: &CompensatedReading) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "{} Pa", reading.pressure);
    line
}

/// Redraw both lines for `reading`.
pub fn show<D: LineDisplay>(display: &mut D, reading: &CompensatedReading) -> Result<(), D::Error> {
    let lines = [temperature_line(reading), pressure_line(reading)];
    for (row, text) in lines.iter().enumerate() {
        display.clear_line(row)?;
        display.write_line(row, text)?;
    }
    Ok(())
}

/// In-memory frame of the display contents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: [Line; ROWS],
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", |line| line.as_str())
    }

    pub fn lines(&self) -> &[Line; ROWS] {
        &self.lines
    }
}

impl LineDisplay for LineBuffer {
    type Error = Infallible;

    fn clear_line(&mut self, row: usize) -> Result<(), Infallible> {
        if let Some(line) = self.lines.get_mut(row) {
            line.clear();
        }
        Ok(())
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<(), Infallible> {
        if let Some(line) = self.lines.get_mut(row) {
            line.clear();
            for c in text.chars().take(COLUMNS) {
                if line.push(c).is_err() {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Draws the lines with a 6x10 font onto a monochrome `embedded-graphics`
/// target, one text row per 10 pixels.
pub struct GraphicsDisplay<D> {
    target: D,
}

impl<D> GraphicsDisplay<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    const CHAR_WIDTH: u32 = 6;
    const ROW_HEIGHT: u32 = 10;

    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn release(self) -> D {
        self.target
    }

    fn row_origin(row: usize) -> Point {
        Point::new(0, (row as u32 * Self::ROW_HEIGHT) as i32)
    }
}

impl<D> LineDisplay for GraphicsDisplay<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    type Error = D::Error;

    fn clear_line(&mut self, row: usize) -> Result<(), D::Error> {
        let size = Size::new(COLUMNS as u32 * Self::CHAR_WIDTH, Self::ROW_HEIGHT);
        Rectangle::new(Self::row_origin(row), size)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.target)
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<(), D::Error> {
        let end = text.char_indices().nth(COLUMNS).map_or(text.len(), |(i, _)| i);
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(&text[..end], Self::row_origin(row), style, Baseline::Top)
            .draw(&mut self.target)?;
        Ok(())
    }
}
