//! Standard-font metrics for text measurement.
//!
//! Surfaces that render to PDF use the standard Type1 fonts, which need no
//! embedding. Widths come from the Helvetica AFM (1/1000 em) for printable
//! ASCII; Courier is fixed-pitch. Everything else measures as a digit.

use super::{Font, Size};

/// Points per device unit (device units are 1/100 inch).
pub const POINTS_PER_DEVICE_UNIT: f64 = 0.72;

/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.15;

/// Ascent as a fraction of the font size, used to place baselines.
pub const ASCENT: f64 = 0.718;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // ' ' .. '/'
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // '0' .. '?'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // '@' .. 'O'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // 'P' .. '_'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // '`' .. 'o'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // 'p' .. '~'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const DEFAULT_WIDTH: u16 = 556;
const COURIER_WIDTH: u16 = 600;

fn is_fixed_pitch(font: &Font) -> bool {
    font.name.to_ascii_lowercase().contains("courier")
}

/// Advance width of one character, in 1/1000 em.
pub fn char_width(ch: char, font: &Font) -> u16 {
    if is_fixed_pitch(font) {
        return COURIER_WIDTH;
    }
    let code = ch as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

/// Width of a single line of text, in points.
pub fn line_width_pt(line: &str, font: &Font) -> f64 {
    let units: u32 = line.chars().map(|c| u32::from(char_width(c, font))).sum();
    let width = units as f64 / 1000.0 * font.size;
    if font.bold {
        width * 1.05
    } else {
        width
    }
}

/// Extent of possibly multi-line text, in device units.
pub fn measure(text: &str, font: &Font) -> Size {
    let lines: Vec<&str> = text.split('\n').collect();
    let widest = lines
        .iter()
        .map(|l| line_width_pt(l, font))
        .fold(0.0, f64::max);
    let height = lines.len() as f64 * font.size * LINE_SPACING;
    Size {
        width: widest / POINTS_PER_DEVICE_UNIT,
        height: height / POINTS_PER_DEVICE_UNIT,
    }
}
