//! # Graphics Surfaces
//!
//! The print engine never draws pixels or PDF operators itself. It issues
//! absolute drawing calls, in device units, against a [`GraphicsSurface`].
//! Two surfaces ship with the crate:
//!
//! - [`RecordingSurface`] keeps every call, page by page. Previews and tests
//!   inspect it, and the CLI can dump it as JSON.
//! - [`PdfSurface`] renders the calls to a PDF document.
//!
//! Device units are hundredths of an inch. Font sizes are in points.

pub mod metrics;
pub mod pdf;
pub mod recording;

pub use pdf::PdfSurface;
pub use recording::{DrawOp, RecordingSurface};

use serde::Serialize;

use crate::error::Result;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or a decimal `r,g,b` triple.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.contains(',') {
            let parts: Vec<u8> = value
                .split(',')
                .map(|p| p.trim().parse::<u8>())
                .collect::<std::result::Result<_, _>>()
                .ok()?;
            return match parts.as_slice() {
                [r, g, b] => Some(Color::rgb(*r, *g, *b)),
                _ => None,
            };
        }

        let hex = value.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Color::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Look up a named color (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        let c = match name.trim().to_ascii_lowercase().as_str() {
            "black" => Color::rgb(0, 0, 0),
            "white" => Color::rgb(255, 255, 255),
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "lime" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "navy" => Color::rgb(0, 0, 128),
            "yellow" => Color::rgb(255, 255, 0),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "darkgray" | "darkgrey" => Color::rgb(169, 169, 169),
            "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
            "silver" => Color::rgb(192, 192, 192),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "maroon" => Color::rgb(128, 0, 0),
            "cyan" | "aqua" => Color::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
            _ => return None,
        };
        Some(c)
    }
}

/// A text font: family name, size in points, weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub name: String,
    pub size: f64,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Arial".to_string(),
            size: 10.0,
            bold: false,
        }
    }
}

/// Stroke settings for lines and ellipses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pen {
    pub color: Color,
    /// Stroke width in device units.
    pub width: f64,
}

impl Pen {
    pub fn new(color: Color) -> Self {
        Self { color, width: 1.0 }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

/// Fill settings for text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Brush {
    pub color: Color,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
        }
    }
}

/// Horizontal placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Alignment {
    /// Text starts at the anchor.
    #[default]
    Near,
    /// Text is centred on the anchor.
    Center,
    /// Text ends at the anchor.
    Far,
}

impl Alignment {
    /// Map a template `align` value. Anything unrecognised is near.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("center") => Alignment::Center,
            Some("right") => Alignment::Far,
            _ => Alignment::Near,
        }
    }
}

/// A measured extent in device units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// The drawing target of the print engine.
///
/// The page-iteration driver brackets every page with [`begin_page`] and
/// [`end_page`], and keeps calling the print engine while
/// [`has_more_pages`] is true. Draw calls return `Err` to abort the report;
/// there is no partial-page recovery.
///
/// [`begin_page`]: GraphicsSurface::begin_page
/// [`end_page`]: GraphicsSurface::end_page
/// [`has_more_pages`]: GraphicsSurface::has_more_pages
pub trait GraphicsSurface {
    /// Extent of `text` in device units when drawn with `font`.
    fn measure_string(&self, text: &str, font: &Font) -> Size;

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        x: f64,
        y: f64,
        alignment: Alignment,
    ) -> Result<()>;

    fn draw_line(&mut self, pen: &Pen, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()>;

    /// Stroke the ellipse inscribed in the given bounding box.
    fn draw_ellipse(&mut self, pen: &Pen, x: f64, y: f64, width: f64, height: f64) -> Result<()>;

    fn set_has_more_pages(&mut self, more: bool);

    fn has_more_pages(&self) -> bool;

    fn begin_page(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        Ok(())
    }
}
