//! Scoped drawing state: the pen, brush and font stacks.
//!
//! `font` and `color` nodes change drawing state in one of two ways,
//! chosen by whether the node has children:
//!
//! - with children, the change is scoped: pushed before the children are
//!   drawn, popped after them;
//! - without children, the change is permanent: the top entry is replaced
//!   and stays in effect for the rest of that sibling list and beyond.
//!
//! Templates rely on both behaviours.

use crate::error::{ReportError, Result};
use crate::model::DocumentNode;
use crate::surface::{Brush, Color, Font, Pen};

/// How a `font` or `color` node applies its change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Push, draw the children, pop.
    Scoped,
    /// Replace the top of the stack.
    Permanent,
}

impl ChangeKind {
    pub fn for_node(node: &DocumentNode) -> Self {
        if node.has_children() {
            ChangeKind::Scoped
        } else {
            ChangeKind::Permanent
        }
    }
}

/// Which stacks a scope frame must pop when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Font,
    Color,
}

/// The three drawing-state stacks. None of them is ever empty.
#[derive(Debug, Clone)]
pub struct ScopeStacks {
    fonts: Vec<Font>,
    pens: Vec<Pen>,
    brushes: Vec<Brush>,
}

impl Default for ScopeStacks {
    fn default() -> Self {
        Self::new(Font::default(), Color::BLACK)
    }
}

impl ScopeStacks {
    pub fn new(font: Font, color: Color) -> Self {
        Self {
            fonts: vec![font],
            pens: vec![Pen::new(color)],
            brushes: vec![Brush { color }],
        }
    }

    pub fn font(&self) -> &Font {
        &self.fonts[self.fonts.len() - 1]
    }

    pub fn pen(&self) -> &Pen {
        &self.pens[self.pens.len() - 1]
    }

    pub fn brush(&self) -> &Brush {
        &self.brushes[self.brushes.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.fonts.len()
    }

    /// Apply a `font` node. Returns the scope to close later, if any.
    pub fn apply_font(&mut self, node: &DocumentNode) -> Result<Option<Scope>> {
        let mut font = self.font().clone();
        if let Some(name) = node.attr("name") {
            font.name = name.to_string();
        }
        if let Some(size) = node.number("size")? {
            font.size = size;
        }
        if node.attr("bold").is_some() {
            font.bold = node.flag("bold");
        }

        match ChangeKind::for_node(node) {
            ChangeKind::Scoped => {
                self.fonts.push(font);
                Ok(Some(Scope::Font))
            }
            ChangeKind::Permanent => {
                let top = self.fonts.len() - 1;
                self.fonts[top] = font;
                Ok(None)
            }
        }
    }

    /// Apply a `color` node to the pen and brush together.
    pub fn apply_color(&mut self, node: &DocumentNode) -> Result<Option<Scope>> {
        let color = resolve_color(node)?;
        let pen = Pen {
            color,
            ..*self.pen()
        };
        let brush = Brush { color };

        match ChangeKind::for_node(node) {
            ChangeKind::Scoped => {
                self.pens.push(pen);
                self.brushes.push(brush);
                Ok(Some(Scope::Color))
            }
            ChangeKind::Permanent => {
                let top = self.pens.len() - 1;
                self.pens[top] = pen;
                let top = self.brushes.len() - 1;
                self.brushes[top] = brush;
                Ok(None)
            }
        }
    }

    /// Close a scope opened by [`apply_font`](Self::apply_font) or
    /// [`apply_color`](Self::apply_color). The seed entry is never popped.
    pub fn pop(&mut self, scope: Scope) {
        match scope {
            Scope::Font => {
                if self.fonts.len() > 1 {
                    self.fonts.pop();
                }
            }
            Scope::Color => {
                if self.pens.len() > 1 {
                    self.pens.pop();
                }
                if self.brushes.len() > 1 {
                    self.brushes.pop();
                }
            }
        }
    }
}

fn resolve_color(node: &DocumentNode) -> Result<Color> {
    if let Some(rgb) = node.attr("rgb") {
        return Color::parse(rgb).ok_or_else(|| ReportError::Format {
            tag: node.tag.name().to_string(),
            attribute: "rgb".to_string(),
            value: rgb.to_string(),
        });
    }
    if let Some(name) = node.attr("name") {
        return Color::named(name).ok_or_else(|| ReportError::Format {
            tag: node.tag.name().to_string(),
            attribute: "name".to_string(),
            value: name.to_string(),
        });
    }
    Err(ReportError::MissingAttribute {
        tag: node.tag.name().to_string(),
        attribute: "rgb".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tag;

    fn font_node(attrs: &[(&str, &str)], with_child: bool) -> DocumentNode {
        let mut node = DocumentNode::new(Tag::Font);
        for (k, v) in attrs {
            node.set_attr(k, *v);
        }
        if with_child {
            node.children.push(DocumentNode::new(Tag::Text));
        }
        node
    }

    #[test]
    fn scoped_font_pushes_and_pops() {
        let mut stacks = ScopeStacks::default();
        let scope = stacks
            .apply_font(&font_node(&[("size", "14"), ("bold", "1")], true))
            .unwrap();
        assert_eq!(scope, Some(Scope::Font));
        assert_eq!(stacks.font().size, 14.0);
        assert!(stacks.font().bold);
        assert_eq!(stacks.depth(), 2);

        stacks.pop(Scope::Font);
        assert_eq!(stacks.font(), &Font::default());
    }

    #[test]
    fn childless_font_replaces_top() {
        let mut stacks = ScopeStacks::default();
        let scope = stacks
            .apply_font(&font_node(&[("name", "Courier")], false))
            .unwrap();
        assert_eq!(scope, None);
        assert_eq!(stacks.depth(), 1);
        assert_eq!(stacks.font().name, "Courier");
        assert_eq!(stacks.font().size, 10.0);
    }

    #[test]
    fn bold_can_be_switched_off() {
        let mut stacks = ScopeStacks::new(
            Font {
                bold: true,
                ..Font::default()
            },
            Color::BLACK,
        );
        stacks
            .apply_font(&font_node(&[("bold", "false")], false))
            .unwrap();
        assert!(!stacks.font().bold);
    }

    #[test]
    fn color_sets_pen_and_brush() {
        let mut stacks = ScopeStacks::default();
        let node = DocumentNode::new(Tag::Color)
            .with_attr("rgb", "#ff0000")
            .with_children(vec![DocumentNode::new(Tag::Line)]);
        let scope = stacks.apply_color(&node).unwrap();
        assert_eq!(scope, Some(Scope::Color));
        assert_eq!(stacks.pen().color, Color::rgb(255, 0, 0));
        assert_eq!(stacks.brush().color, Color::rgb(255, 0, 0));
        stacks.pop(Scope::Color);
        assert_eq!(stacks.pen().color, Color::BLACK);
    }

    #[test]
    fn named_color_without_children_is_permanent() {
        let mut stacks = ScopeStacks::default();
        let node = DocumentNode::new(Tag::Color).with_attr("name", "blue");
        assert_eq!(stacks.apply_color(&node).unwrap(), None);
        assert_eq!(stacks.brush().color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn unknown_color_is_a_format_error() {
        let mut stacks = ScopeStacks::default();
        let node = DocumentNode::new(Tag::Color).with_attr("name", "octarine");
        assert!(matches!(
            stacks.apply_color(&node),
            Err(ReportError::Format { .. })
        ));
    }

    #[test]
    fn seed_entry_survives_extra_pops() {
        let mut stacks = ScopeStacks::default();
        stacks.pop(Scope::Font);
        stacks.pop(Scope::Color);
        assert_eq!(stacks.depth(), 1);
        assert_eq!(stacks.pen().color, Color::BLACK);
    }
}
