//! A surface that records drawing calls instead of rendering them.

use serde::Serialize;

use super::{metrics, Alignment, Brush, Font, GraphicsSurface, Pen, Size};
use crate::error::Result;

/// One recorded drawing call, in device units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Text {
        text: String,
        font: Font,
        brush: Brush,
        x: f64,
        y: f64,
        alignment: Alignment,
    },
    Line {
        pen: Pen,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Ellipse {
        pen: Pen,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// Records every call, grouped by page.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSurface {
    pub pages: Vec<Vec<DrawOp>>,
    #[serde(skip)]
    has_more_pages: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Vec<DrawOp> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Every text drawn on one page, in drawing order.
    pub fn texts(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GraphicsSurface for RecordingSurface {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        metrics::measure(text, font)
    }

    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        brush: &Brush,
        x: f64,
        y: f64,
        alignment: Alignment,
    ) -> Result<()> {
        self.current().push(DrawOp::Text {
            text: text.to_string(),
            font: font.clone(),
            brush: *brush,
            x,
            y,
            alignment,
        });
        Ok(())
    }

    fn draw_line(&mut self, pen: &Pen, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.current().push(DrawOp::Line {
            pen: *pen,
            x1,
            y1,
            x2,
            y2,
        });
        Ok(())
    }

    fn draw_ellipse(&mut self, pen: &Pen, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.current().push(DrawOp::Ellipse {
            pen: *pen,
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn set_has_more_pages(&mut self, more: bool) {
        self.has_more_pages = more;
    }

    fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    fn begin_page(&mut self) -> Result<()> {
        self.pages.push(Vec::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_into_current_page() {
        let mut s = RecordingSurface::new();
        s.begin_page().unwrap();
        s.draw_line(&Pen::default(), 0.0, 0.0, 1.0, 1.0).unwrap();
        s.begin_page().unwrap();
        s.draw_string("hi", &Font::default(), &Brush::default(), 1.0, 2.0, Alignment::Near)
            .unwrap();
        assert_eq!(s.pages.len(), 2);
        assert_eq!(s.pages[0].len(), 1);
        assert_eq!(s.texts(1), vec!["hi"]);
    }

    #[test]
    fn drawing_without_begin_opens_a_page() {
        let mut s = RecordingSurface::new();
        s.draw_ellipse(&Pen::default(), 0.0, 0.0, 2.0, 2.0).unwrap();
        assert_eq!(s.pages.len(), 1);
    }

    #[test]
    fn serializes_with_op_tag() {
        let mut s = RecordingSurface::new();
        s.draw_line(&Pen::default(), 0.0, 0.0, 1.0, 1.0).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["pages"][0][0]["op"], "line");
    }
}
