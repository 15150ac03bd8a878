//! # Page Setup
//!
//! Resolves page size, margins and orientation from the template's root
//! attributes, preferring a physical paper size offered by the host's
//! printing subsystem.
//!
//! Document units are millimetres. Device units are hundredths of an inch,
//! the unit printer paper catalogs report sizes in.

use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::model::{is_true, DocumentModel};

/// Device units (1/100 inch) per document unit (mm).
pub const DEVICE_UNITS_PER_MM: f64 = 100.0 / 25.4;

/// A physical paper size as reported by the printing subsystem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperSize {
    pub name: String,
    /// Width in device units.
    pub width: f64,
    /// Height in device units.
    pub height: f64,
}

impl PaperSize {
    pub fn new(name: &str, width: f64, height: f64) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
        }
    }

    /// Common paper sizes, for hosts without a printer catalog.
    pub fn standard_catalog() -> Vec<PaperSize> {
        vec![
            PaperSize::new("A4", 827.0, 1169.0),
            PaperSize::new("A3", 1169.0, 1654.0),
            PaperSize::new("A5", 583.0, 827.0),
            PaperSize::new("Letter", 850.0, 1100.0),
            PaperSize::new("Legal", 850.0, 1400.0),
        ]
    }
}

/// Resolved page geometry in document units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// Name of the adopted physical paper size, if one matched.
    pub paper: Option<String>,
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub landscape: bool,
    /// Device units per document unit.
    pub print_factor: f64,
}

impl PageGeometry {
    /// Lowest y coordinate content may reach before a page break.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.bottom
    }

    /// Page size in device units.
    pub fn device_size(&self) -> (f64, f64) {
        (self.width * self.print_factor, self.height * self.print_factor)
    }

    /// Convert a document coordinate to a device coordinate.
    pub fn to_device(&self, value: f64) -> f64 {
        (value * self.print_factor).round()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            paper: None,
            width: 210.0,
            height: 297.0,
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            landscape: false,
            print_factor: DEVICE_UNITS_PER_MM,
        }
    }
}

/// Compute page geometry from the template root and the available paper.
pub fn setup_document(document: &DocumentModel, paper_sizes: &[PaperSize]) -> Result<PageGeometry> {
    let root = &document.root;
    let paper_name = root.attr("paperSize").unwrap_or("A4").to_ascii_lowercase();

    let matched = paper_sizes
        .iter()
        .find(|p| p.name.to_ascii_lowercase().starts_with(&paper_name));

    let (paper, mut width, mut height, print_factor) = match matched {
        Some(paper) => (
            Some(paper.name.clone()),
            paper.width / DEVICE_UNITS_PER_MM,
            paper.height / DEVICE_UNITS_PER_MM,
            DEVICE_UNITS_PER_MM,
        ),
        None => {
            let scale = root.number_or("scale", 1.0)?;
            (
                None,
                root.number_or("width", 210.0)?,
                root.number_or("height", 297.0)?,
                DEVICE_UNITS_PER_MM * scale,
            )
        }
    };

    let landscape = is_true(root.attr("landscape"));
    if landscape {
        std::mem::swap(&mut width, &mut height);
    }

    let geometry = PageGeometry {
        paper,
        width,
        height,
        left: root.number_or("left", 0.0)?,
        right: root.number_or("right", 0.0)?,
        top: root.number_or("top", 0.0)?,
        bottom: root.number_or("bottom", 0.0)?,
        landscape,
        print_factor,
    };
    validate(&geometry)?;
    Ok(geometry)
}

fn validate(g: &PageGeometry) -> Result<()> {
    if g.print_factor <= 0.0 || !g.print_factor.is_finite() {
        return Err(ReportError::InvalidGeometry(format!(
            "print factor {} must be positive",
            g.print_factor
        )));
    }
    if g.width <= g.left + g.right {
        return Err(ReportError::InvalidGeometry(format!(
            "width {} does not exceed horizontal margins {} + {}",
            g.width, g.left, g.right
        )));
    }
    if g.height <= g.top + g.bottom {
        return Err(ReportError::InvalidGeometry(format!(
            "height {} does not exceed vertical margins {} + {}",
            g.height, g.top, g.bottom
        )));
    }
    Ok(())
}
