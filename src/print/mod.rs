//! # Print Engine
//!
//! Walks a transformed document and issues absolute drawing calls against a
//! [`GraphicsSurface`], one physical page per call.
//!
//! The walk is an explicit stack of continuation frames rather than
//! recursion. Each frame holds a sibling list, the index of the next node to
//! draw, and the scope to close when the list is exhausted. A `newpage` node
//! stops the walk with the frames intact, so the next call resumes with the
//! node after it and with the same fonts and colors in effect.
//!
//! A [`PagePrinter`] borrows its document, so one printer is bound to one
//! report and cannot be driven from two places at once.

pub mod scope;

use log::{info, trace};

use crate::cursor::{Cursor, FROM_X, FROM_Y, TO_X, TO_Y, X, Y};
use crate::error::Result;
use crate::model::{DocumentModel, DocumentNode, Tag};
use crate::page_setup::PageGeometry;
use crate::surface::{Alignment, GraphicsSurface};
use scope::{Scope, ScopeStacks};

struct Frame<'a> {
    nodes: &'a [DocumentNode],
    next: usize,
    scope: Option<Scope>,
}

/// Resumable page-by-page renderer of a transformed document.
pub struct PagePrinter<'a> {
    geometry: PageGeometry,
    frames: Vec<Frame<'a>>,
    stacks: ScopeStacks,
    cursor: Cursor,
    pages_printed: usize,
}

impl<'a> PagePrinter<'a> {
    pub fn new(document: &'a DocumentModel, geometry: &PageGeometry) -> Self {
        Self::with_stacks(document, geometry, ScopeStacks::default())
    }

    /// Start with custom default font and color.
    pub fn with_stacks(
        document: &'a DocumentModel,
        geometry: &PageGeometry,
        stacks: ScopeStacks,
    ) -> Self {
        Self {
            geometry: geometry.clone(),
            frames: vec![Frame {
                nodes: &document.root.children,
                next: 0,
                scope: None,
            }],
            stacks,
            cursor: Cursor::at_origin(geometry),
            pages_printed: 0,
        }
    }

    pub fn pages_printed(&self) -> usize {
        self.pages_printed
    }

    /// True once the end of the document has been reached.
    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Render one page. Returns whether more pages follow; the same value is
    /// stored on the surface.
    pub fn print_page(&mut self, surface: &mut dyn GraphicsSurface) -> Result<bool> {
        if self.is_finished() {
            surface.set_has_more_pages(false);
            return Ok(false);
        }
        self.cursor.reset(&self.geometry);

        while let Some(frame) = self.frames.last_mut() {
            let nodes: &'a [DocumentNode] = frame.nodes;
            if frame.next >= nodes.len() {
                if let Some(scope) = frame.scope {
                    self.stacks.pop(scope);
                }
                self.frames.pop();
                continue;
            }
            let node = &nodes[frame.next];
            frame.next += 1;

            if self.print_node(node, surface)? {
                self.pages_printed += 1;
                surface.set_has_more_pages(true);
                return Ok(true);
            }
        }

        self.pages_printed += 1;
        info!("Printed page {} (last)", self.pages_printed);
        surface.set_has_more_pages(false);
        Ok(false)
    }

    /// Draw one node. Returns true when the node ends the page.
    fn print_node(&mut self, node: &'a DocumentNode, surface: &mut dyn GraphicsSurface) -> Result<bool> {
        let g = &self.geometry;
        match &node.tag {
            Tag::Move => {
                self.cursor.apply_move(node, g)?;
                trace!("move to ({:.2}, {:.2})", self.cursor.x, self.cursor.y);
            }
            Tag::Text => {
                let x = self.cursor.resolve_x(node, X, g)?;
                let y = self.cursor.resolve_y(node, Y, g)?;
                let alignment = Alignment::from_attr(node.attr("align"));
                trace!("text {:?} at ({:.2}, {:.2})", node.inner_text, x, y);
                surface.draw_string(
                    &node.inner_text,
                    self.stacks.font(),
                    self.stacks.brush(),
                    g.to_device(x),
                    g.to_device(y),
                    alignment,
                )?;
            }
            Tag::Line => {
                let x1 = self.cursor.resolve_x(node, FROM_X, g)?;
                let y1 = self.cursor.resolve_y(node, FROM_Y, g)?;
                let x2 = self.cursor.resolve_x(node, TO_X, g)?;
                let y2 = self.cursor.resolve_y(node, TO_Y, g)?;
                trace!("line ({:.2}, {:.2})-({:.2}, {:.2})", x1, y1, x2, y2);
                surface.draw_line(
                    self.stacks.pen(),
                    g.to_device(x1),
                    g.to_device(y1),
                    g.to_device(x2),
                    g.to_device(y2),
                )?;
            }
            Tag::Circle => {
                let cx = self.cursor.resolve_x(node, X, g)?;
                let cy = self.cursor.resolve_y(node, Y, g)?;
                let rx = node.required_number("radX")?;
                let ry = node.required_number("radY")?;
                surface.draw_ellipse(
                    self.stacks.pen(),
                    g.to_device(cx - rx),
                    g.to_device(cy - ry),
                    g.to_device(2.0 * rx),
                    g.to_device(2.0 * ry),
                )?;
            }
            Tag::Font => {
                let scope = self.stacks.apply_font(node)?;
                self.enter(node, scope);
            }
            Tag::Color => {
                let scope = self.stacks.apply_color(node)?;
                self.enter(node, scope);
            }
            Tag::NewPage => {
                trace!("page {} ends", self.pages_printed + 1);
                return Ok(true);
            }
            other => trace!("skipping <{}>", other.name()),
        }
        Ok(false)
    }

    fn enter(&mut self, node: &'a DocumentNode, scope: Option<Scope>) {
        if let Some(scope) = scope {
            self.frames.push(Frame {
                nodes: &node.children,
                next: 0,
                scope: Some(scope),
            });
        }
    }
}

/// Drive a printer to completion, bracketing every page on the surface.
/// Returns the number of pages printed.
pub fn print_document(
    document: &DocumentModel,
    geometry: &PageGeometry,
    surface: &mut dyn GraphicsSurface,
) -> Result<usize> {
    let mut printer = PagePrinter::new(document, geometry);
    loop {
        surface.begin_page()?;
        let more = printer.print_page(surface)?;
        surface.end_page()?;
        if !more {
            break;
        }
    }
    Ok(printer.pages_printed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Color, DrawOp, RecordingSurface};
    use crate::template::parse_template;

    fn print(xml: &str) -> RecordingSurface {
        let doc = parse_template(xml.as_bytes()).unwrap();
        let mut surface = RecordingSurface::new();
        print_document(&doc, &PageGeometry::default(), &mut surface).unwrap();
        surface
    }

    fn text_fonts(surface: &RecordingSurface, page: usize) -> Vec<(String, f64)> {
        surface.pages[page]
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, font, .. } => Some((text.clone(), font.size)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn line_converts_to_device_units() {
        let s = print(r#"<r><line relFromX="10" relFromY="20" relToX="30" relToY="40"/></r>"#);
        match &s.pages[0][0] {
            DrawOp::Line { x1, y1, x2, y2, .. } => {
                assert_eq!((*x1, *y1, *x2, *y2), (39.0, 79.0, 118.0, 157.0));
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn text_uses_cursor_and_alignment() {
        let s = print(r#"<r><move absX="10" absY="10"/><text relX="5" align="right">x</text></r>"#);
        match &s.pages[0][0] {
            DrawOp::Text { x, y, alignment, .. } => {
                assert_eq!(*x, (15.0 * crate::page_setup::DEVICE_UNITS_PER_MM).round());
                assert_eq!(*y, (10.0 * crate::page_setup::DEVICE_UNITS_PER_MM).round());
                assert_eq!(*alignment, Alignment::Far);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn scoped_font_restores_after_subtree() {
        let s = print(
            r#"<r><text>a</text><font size="20"><text>b</text></font><text>c</text></r>"#,
        );
        assert_eq!(
            text_fonts(&s, 0),
            vec![("a".into(), 10.0), ("b".into(), 20.0), ("c".into(), 10.0)]
        );
    }

    #[test]
    fn childless_font_changes_remaining_siblings() {
        let s = print(r#"<r><text>a</text><font size="20"/><text>b</text><text>c</text></r>"#);
        assert_eq!(
            text_fonts(&s, 0),
            vec![("a".into(), 10.0), ("b".into(), 20.0), ("c".into(), 20.0)]
        );
    }

    #[test]
    fn permanent_change_inside_scope_ends_with_scope() {
        let s = print(
            r#"<r><font size="12"><font size="8"/><text>a</text></font><text>b</text></r>"#,
        );
        assert_eq!(
            text_fonts(&s, 0),
            vec![("a".into(), 8.0), ("b".into(), 10.0)]
        );
    }

    #[test]
    fn newpage_splits_pages_and_resets_cursor() {
        let s = print(
            r#"<r><move relY="50"/><text>one</text><newpage/><text>two</text></r>"#,
        );
        assert_eq!(s.pages.len(), 2);
        assert_eq!(s.texts(0), vec!["one"]);
        assert_eq!(s.texts(1), vec!["two"]);
        match &s.pages[1][0] {
            DrawOp::Text { y, .. } => assert_eq!(*y, 0.0),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn scope_survives_page_break() {
        let s = print(
            r#"<r><color name="red"><text>a</text><newpage/><text>b</text></color><text>c</text></r>"#,
        );
        let colors: Vec<Color> = s
            .pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                DrawOp::Text { brush, .. } => Some(brush.color),
                _ => None,
            })
            .collect();
        assert_eq!(
            colors,
            vec![Color::rgb(255, 0, 0), Color::rgb(255, 0, 0), Color::BLACK]
        );
    }

    #[test]
    fn circle_draws_bounding_box() {
        let s = print(r#"<r><circle absX="20" absY="20" radX="10" radY="5"/></r>"#);
        match &s.pages[0][0] {
            DrawOp::Ellipse { x, y, width, height, .. } => {
                assert_eq!((*x, *y), (39.0, 59.0));
                assert_eq!((*width, *height), (79.0, 39.0));
            }
            other => panic!("expected ellipse, got {:?}", other),
        }
    }

    #[test]
    fn circle_without_radius_fails() {
        let doc = parse_template(br#"<r><circle radX="1"/></r>"#).unwrap();
        let mut surface = RecordingSurface::new();
        assert!(print_document(&doc, &PageGeometry::default(), &mut surface).is_err());
    }

    #[test]
    fn printer_reports_more_pages_until_done() {
        let doc = parse_template(b"<r><text>a</text><newpage/><text>b</text></r>").unwrap();
        let mut printer = PagePrinter::new(&doc, &PageGeometry::default());
        let mut surface = RecordingSurface::new();
        assert!(printer.print_page(&mut surface).unwrap());
        assert!(surface.has_more_pages());
        assert!(!printer.print_page(&mut surface).unwrap());
        assert!(!surface.has_more_pages());
        assert!(printer.is_finished());
        assert!(!printer.print_page(&mut surface).unwrap());
        assert_eq!(printer.pages_printed(), 2);
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let s = print(r#"<r><image src="x"/><text>a</text></r>"#);
        assert_eq!(s.texts(0), vec!["a"]);
    }
}
