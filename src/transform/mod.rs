//! # Transform Engine
//!
//! Rewrites a loaded template in place so that it holds only primitives the
//! print engine understands: `move`, `text`, `line`, `circle`, `font`,
//! `color` and `newpage`.
//!
//! ```text
//! table      -> header block + row blocks (+ newpage, header again, ...)
//! rectangle  -> four lines: top, right, bottom, left
//! pageTexts  -> removed; a numbered copy is inserted before every newpage
//!               and at the end of the document
//! text[wrap] -> text with hard line breaks at line break opportunities
//! ```
//!
//! The pass tracks a virtual cursor the same way the print engine will.
//! After each node, if the cursor has reached the bottom margin and another
//! sibling follows, a `newpage` is inserted before that sibling.

pub mod page_texts;
pub mod table;
pub mod wrap;

use log::debug;

use crate::cursor::{Axis, Cursor, FROM_X, FROM_Y, TO_X, TO_Y};
use crate::error::Result;
use crate::model::{DocumentModel, DocumentNode, Tag};
use crate::page_setup::PageGeometry;
use crate::print::scope::ScopeStacks;
use crate::surface::GraphicsSurface;

/// Transform `document` in place for printing on pages of `geometry`.
/// `surface` is only used to measure text.
pub fn transform_document(
    document: &mut DocumentModel,
    geometry: &PageGeometry,
    surface: &dyn GraphicsSurface,
) -> Result<()> {
    let mut pass = Transformer::new(geometry, surface, true);
    pass.transform_siblings(&mut document.root.children)?;

    let mut block = std::mem::take(&mut pass.page_texts);
    let pages = if block.is_empty() {
        page_texts::page_count(&document.root.children)
    } else {
        Transformer::new(geometry, surface, false).transform_siblings(&mut block)?;
        page_texts::insert_page_texts(&mut document.root.children, &block)
    };

    debug!("Transformed <{}> into {} pages", document.element_name, pages);
    Ok(())
}

struct Transformer<'a> {
    geometry: &'a PageGeometry,
    surface: &'a dyn GraphicsSurface,
    cursor: Cursor,
    fonts: ScopeStacks,
    paginate: bool,
    page_texts: Vec<DocumentNode>,
}

impl<'a> Transformer<'a> {
    fn new(geometry: &'a PageGeometry, surface: &'a dyn GraphicsSurface, paginate: bool) -> Self {
        Self {
            geometry,
            surface,
            cursor: Cursor::at_origin(geometry),
            fonts: ScopeStacks::default(),
            paginate,
            page_texts: Vec::new(),
        }
    }

    fn transform_siblings(&mut self, nodes: &mut Vec<DocumentNode>) -> Result<()> {
        let mut i = 0;
        while i < nodes.len() {
            match nodes[i].tag {
                Tag::Table => {
                    let expanded =
                        table::expand_table(&nodes[i], &mut self.cursor, self.geometry, self.paginate)?;
                    let n = expanded.len();
                    nodes.splice(i..=i, expanded);
                    i += n;
                }
                Tag::Rectangle => {
                    let lines = rectangle_lines(&nodes[i]);
                    let n = lines.len();
                    nodes.splice(i..=i, lines);
                    i += n;
                }
                Tag::PageTexts => {
                    let block = nodes.remove(i);
                    self.page_texts.extend(block.children);
                    continue;
                }
                Tag::Move => {
                    self.cursor.apply_move(&nodes[i], self.geometry)?;
                    i += 1;
                }
                Tag::NewPage => {
                    self.cursor.reset(self.geometry);
                    i += 1;
                }
                Tag::Text => {
                    self.wrap_text(&mut nodes[i])?;
                    i += 1;
                }
                Tag::Font => {
                    let scope = self.fonts.apply_font(&nodes[i])?;
                    self.transform_siblings(&mut nodes[i].children)?;
                    if let Some(scope) = scope {
                        self.fonts.pop(scope);
                    }
                    i += 1;
                }
                _ => {
                    self.transform_siblings(&mut nodes[i].children)?;
                    i += 1;
                }
            }

            if self.paginate
                && self.cursor.y >= self.geometry.content_bottom()
                && nodes[i..]
                    .iter()
                    .find(|next| next.tag != Tag::PageTexts)
                    .is_some_and(|next| next.tag != Tag::NewPage)
            {
                debug!("Page break at y={:.2}", self.cursor.y);
                nodes.insert(i, DocumentNode::new(Tag::NewPage));
                self.cursor.reset(self.geometry);
                i += 1;
            }
        }
        Ok(())
    }

    fn wrap_text(&self, node: &mut DocumentNode) -> Result<()> {
        let Some(width) = node.number("wrap")? else {
            return Ok(());
        };
        node.inner_text = wrap::wrap_text(
            &node.inner_text,
            width,
            self.fonts.font(),
            self.surface,
            self.geometry.print_factor,
        );
        Ok(())
    }
}

/// The four sides of a rectangle in drawing order: top, right, bottom, left.
fn rectangle_lines(rect: &DocumentNode) -> Vec<DocumentNode> {
    let side = |x1: Axis, y1: Axis, x2: Axis, y2: Axis| {
        let mut line = DocumentNode::new(Tag::Line);
        copy_axis(rect, x1, &mut line, FROM_X);
        copy_axis(rect, y1, &mut line, FROM_Y);
        copy_axis(rect, x2, &mut line, TO_X);
        copy_axis(rect, y2, &mut line, TO_Y);
        line
    };
    vec![
        side(FROM_X, FROM_Y, TO_X, FROM_Y),
        side(TO_X, FROM_Y, TO_X, TO_Y),
        side(FROM_X, TO_Y, TO_X, TO_Y),
        side(FROM_X, FROM_Y, FROM_X, TO_Y),
    ]
}

fn copy_axis(from: &DocumentNode, src: Axis, to: &mut DocumentNode, dst: Axis) {
    if let Some(v) = from.attr(src.abs) {
        to.set_attr(dst.abs, v);
    }
    if let Some(v) = from.attr(src.rel) {
        to.set_attr(dst.rel, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use crate::template::parse_template;

    fn transform(xml: &str, geometry: &PageGeometry) -> DocumentModel {
        let mut doc = parse_template(xml.as_bytes()).unwrap();
        transform_document(&mut doc, geometry, &RecordingSurface::new()).unwrap();
        doc
    }

    fn tags(nodes: &[DocumentNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.tag.name()).collect()
    }

    fn short_page(height: f64) -> PageGeometry {
        PageGeometry {
            height,
            ..PageGeometry::default()
        }
    }

    #[test]
    fn rectangle_becomes_four_lines() {
        let doc = transform(
            r#"<r><rectangle relFromX="10" relFromY="20" relToX="30" relToY="40"/></r>"#,
            &PageGeometry::default(),
        );
        let nodes = &doc.root.children;
        assert_eq!(tags(nodes), vec!["line"; 4]);
        assert_eq!(doc.root.count(&Tag::Rectangle), 0);

        let corners: Vec<[&str; 4]> = nodes
            .iter()
            .map(|l| {
                [
                    l.attr("relFromX").unwrap(),
                    l.attr("relFromY").unwrap(),
                    l.attr("relToX").unwrap(),
                    l.attr("relToY").unwrap(),
                ]
            })
            .collect();
        assert_eq!(
            corners,
            vec![
                ["10", "20", "30", "20"],
                ["30", "20", "30", "40"],
                ["10", "40", "30", "40"],
                ["10", "20", "10", "40"],
            ]
        );
    }

    #[test]
    fn rectangle_keeps_absolute_corners() {
        let doc = transform(
            r#"<r><rectangle absFromX="1" absFromY="2" absToX="3" absToY="4"/></r>"#,
            &PageGeometry::default(),
        );
        let top = &doc.root.children[0];
        assert_eq!(top.attr("absFromX"), Some("1"));
        assert_eq!(top.attr("absToY"), Some("2"));
        assert_eq!(top.attr("relFromX"), None);
    }

    #[test]
    fn moves_are_kept() {
        let doc = transform(r#"<r><move relY="5"/><text>a</text></r>"#, &PageGeometry::default());
        assert_eq!(tags(&doc.root.children), vec!["move", "text"]);
    }

    #[test]
    fn overflowing_cursor_inserts_page_break() {
        let doc = transform(
            r#"<r><move relY="12"/><text>a</text><move relY="1"/></r>"#,
            &short_page(10.0),
        );
        assert_eq!(tags(&doc.root.children), vec!["move", "newpage", "text", "move"]);
    }

    #[test]
    fn no_break_after_last_node() {
        let doc = transform(r#"<r><text>a</text><move relY="12"/></r>"#, &short_page(10.0));
        assert_eq!(doc.root.count(&Tag::NewPage), 0);
    }

    #[test]
    fn no_double_break_before_explicit_newpage() {
        let doc = transform(
            r#"<r><move relY="12"/><newpage/><text>a</text></r>"#,
            &short_page(10.0),
        );
        assert_eq!(doc.root.count(&Tag::NewPage), 1);
    }

    #[test]
    fn trailing_page_texts_do_not_start_a_page() {
        let doc = transform(
            r#"<r><text>a</text><move relY="12"/>
               <pageTexts><text>p{pageNumber}/{pageCount}</text></pageTexts></r>"#,
            &short_page(10.0),
        );
        assert_eq!(doc.root.count(&Tag::NewPage), 0);
        let texts: Vec<&str> = doc
            .root
            .children
            .iter()
            .filter(|n| n.tag == Tag::Text)
            .map(|n| n.inner_text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "p1/1"]);
    }

    #[test]
    fn break_looks_past_page_texts() {
        let doc = transform(
            r#"<r><move relY="12"/><pageTexts><text>f</text></pageTexts><text>b</text></r>"#,
            &short_page(10.0),
        );
        assert_eq!(
            tags(&doc.root.children),
            vec!["move", "text", "newpage", "text", "text"]
        );
    }

    #[test]
    fn table_is_replaced_and_header_repeats() {
        let doc = transform(
            r#"<r><move relY="5"/><table><columns><column width="10">H</column></columns>
               <data><tr><td>1</td></tr><tr><td>2</td></tr></data></table></r>"#,
            &short_page(10.0),
        );
        assert_eq!(doc.root.count(&Tag::Table), 0);
        let texts: Vec<&str> = doc
            .root
            .children
            .iter()
            .filter(|n| n.tag == Tag::Text)
            .map(|n| n.inner_text.as_str())
            .collect();
        assert_eq!(texts, vec!["H", "1", "H", "2"]);
        assert_eq!(doc.root.children[1].tag, Tag::NewPage);
    }

    #[test]
    fn page_texts_are_numbered_per_page() {
        let doc = transform(
            r#"<r><pageTexts><text absY="280">page {pageNumber}</text></pageTexts>
               <text>a</text><newpage/><text>b</text></r>"#,
            &PageGeometry::default(),
        );
        let texts: Vec<&str> = doc
            .root
            .children
            .iter()
            .filter(|n| n.tag == Tag::Text)
            .map(|n| n.inner_text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "page 1", "b", "page 2"]);
        assert_eq!(doc.root.count(&Tag::PageTexts), 0);
    }

    #[test]
    fn rectangles_inside_page_texts_are_expanded() {
        let doc = transform(
            r#"<r><pageTexts><rectangle relFromX="0" relFromY="0" relToX="1" relToY="1"/></pageTexts></r>"#,
            &PageGeometry::default(),
        );
        assert_eq!(tags(&doc.root.children), vec!["line"; 4]);
    }

    #[test]
    fn wrap_uses_the_current_font() {
        let doc = transform(
            r#"<r><font name="Courier"><text wrap="20">aaa bbb ccc</text></font></r>"#,
            &PageGeometry {
                print_factor: 1.0,
                ..PageGeometry::default()
            },
        );
        // Courier 10pt: 8.33 units per char, so two words never fit in 20.
        assert_eq!(doc.root.children[0].children[0].inner_text, "aaa\nbbb\nccc");
    }

    #[test]
    fn breaks_inside_scopes() {
        let doc = transform(
            r#"<r><font size="8"><move relY="12"/><text>a</text></font></r>"#,
            &short_page(10.0),
        );
        assert_eq!(tags(&doc.root.children[0].children), vec!["move", "newpage", "text"]);
    }
}
