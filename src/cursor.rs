//! The pen position shared by the transform and print passes.
//!
//! Positions follow one rule everywhere: an `abs*` attribute places the
//! coordinate relative to the page margin, otherwise the cursor is the base;
//! a `rel*` attribute is then added on top.

use crate::error::Result;
use crate::model::DocumentNode;
use crate::page_setup::PageGeometry;

/// The attribute names that position one coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub abs: &'static str,
    pub rel: &'static str,
}

pub const X: Axis = Axis {
    abs: "absX",
    rel: "relX",
};
pub const Y: Axis = Axis {
    abs: "absY",
    rel: "relY",
};
pub const FROM_X: Axis = Axis {
    abs: "absFromX",
    rel: "relFromX",
};
pub const FROM_Y: Axis = Axis {
    abs: "absFromY",
    rel: "relFromY",
};
pub const TO_X: Axis = Axis {
    abs: "absToX",
    rel: "relToX",
};
pub const TO_Y: Axis = Axis {
    abs: "absToY",
    rel: "relToY",
};

/// Current position in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

impl Cursor {
    /// A cursor at the top-left corner of the printable area.
    pub fn at_origin(geometry: &PageGeometry) -> Self {
        Self {
            x: geometry.left,
            y: geometry.top,
        }
    }

    pub fn reset(&mut self, geometry: &PageGeometry) {
        *self = Self::at_origin(geometry);
    }

    pub fn resolve_x(&self, node: &DocumentNode, axis: Axis, geometry: &PageGeometry) -> Result<f64> {
        resolve(node, axis, geometry.left, self.x)
    }

    pub fn resolve_y(&self, node: &DocumentNode, axis: Axis, geometry: &PageGeometry) -> Result<f64> {
        resolve(node, axis, geometry.top, self.y)
    }

    /// Apply a `move` node: absolute first, then relative.
    pub fn apply_move(&mut self, node: &DocumentNode, geometry: &PageGeometry) -> Result<()> {
        let x = self.resolve_x(node, X, geometry)?;
        let y = self.resolve_y(node, Y, geometry)?;
        self.x = x;
        self.y = y;
        Ok(())
    }
}

fn resolve(node: &DocumentNode, axis: Axis, margin: f64, current: f64) -> Result<f64> {
    let base = match node.number(axis.abs)? {
        Some(abs) => margin + abs,
        None => current,
    };
    Ok(base + node.number_or(axis.rel, 0.0)?)
}
