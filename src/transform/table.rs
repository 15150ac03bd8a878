//! Table expansion.
//!
//! A `table` node is replaced by primitives: one header block, then one
//! block per `tr`. Each block is a run of `text` and border `line` nodes
//! positioned relative to the cursor, closed by a `move relY=<height>`.
//!
//! ```text
//! <table lineheight="5">
//!   <columns lineheight="6">
//!     <column width="30" bottomLine="1">Date</column>
//!     <column width="20" align="right">Amount</column>
//!   </columns>
//!   <data>
//!     <tr topLine="1"><td>2024-01-31</td><td>12.50</td></tr>
//!   </data>
//! </table>
//! ```
//!
//! Row heights use a fixed estimate of one line per 40 characters, and cell
//! text is hard-broken at the same boundary so the estimate holds.

use log::{debug, warn};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::model::{format_number, DocumentNode, Tag};
use crate::page_setup::PageGeometry;

/// Body row height when neither the table nor the row declares one.
pub const DEFAULT_ROW_HEIGHT: f64 = 4.0;

/// Characters per estimated line of cell text.
pub const CHARS_PER_LINE: usize = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Borders {
    left: bool,
    right: bool,
    top: bool,
    bottom: bool,
}

impl Borders {
    fn from_node(node: &DocumentNode) -> Self {
        Self {
            left: node.flag("leftLine"),
            right: node.flag("rightLine"),
            top: node.flag("topLine"),
            bottom: node.flag("bottomLine"),
        }
    }
}

#[derive(Debug, Clone)]
struct Column {
    label: String,
    width: f64,
    offset: f64,
    align: Option<String>,
    borders: Borders,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    align: Option<String>,
}

#[derive(Debug, Clone)]
struct Row {
    cells: Vec<Cell>,
    height: f64,
    borders: Borders,
}

/// The layout-relevant content of one `table` node.
#[derive(Debug, Clone)]
pub struct TableLayout {
    name: Option<String>,
    columns: Vec<Column>,
    header_height: f64,
    rows: Vec<Row>,
    row_height: f64,
}

impl TableLayout {
    pub fn from_node(table: &DocumentNode) -> Result<Self> {
        let row_height = table.number_or("lineheight", DEFAULT_ROW_HEIGHT)?;

        let mut columns = Vec::new();
        let mut header_height = row_height;
        if let Some(cols) = table.child(&Tag::Columns) {
            header_height = cols.number_or("lineheight", row_height)?;
            let mut offset = 0.0;
            for col in cols.children.iter().filter(|c| c.tag == Tag::Column) {
                let width = col.required_number("width")?;
                columns.push(Column {
                    label: col.inner_text.clone(),
                    width,
                    offset,
                    align: col.attr("align").map(str::to_string),
                    borders: Borders::from_node(col),
                });
                offset += width;
            }
        }

        let mut rows = Vec::new();
        if let Some(data) = table.child(&Tag::Data) {
            for tr in data.children.iter().filter(|c| c.tag == Tag::Tr) {
                rows.push(Row::from_node(tr, row_height)?);
            }
        }

        Ok(Self {
            name: table.attr("name").map(str::to_string),
            columns,
            header_height,
            rows,
            row_height,
        })
    }

    fn has_header(&self) -> bool {
        !self.columns.is_empty()
    }

    fn emit_header(&self, out: &mut Vec<DocumentNode>, cursor: &mut Cursor) {
        if !self.has_header() {
            return;
        }
        for col in &self.columns {
            out.push(cell_text(
                &col.label,
                col.offset,
                col.width,
                col.align.as_deref(),
            ));
            push_borders(out, col.offset, col.width, self.header_height, col.borders);
        }
        out.push(advance(self.header_height));
        cursor.y += self.header_height;
    }

    fn emit_row(&self, row: &Row, out: &mut Vec<DocumentNode>, cursor: &mut Cursor) {
        for (i, cell) in row.cells.iter().enumerate() {
            let Some(col) = self.columns.get(i) else {
                warn!(
                    "Table {:?}: cell {} has no column, skipped",
                    self.name.as_deref().unwrap_or(""),
                    i + 1
                );
                continue;
            };
            let align = cell.align.as_deref().or(col.align.as_deref());
            out.push(cell_text(&cell.text, col.offset, col.width, align));
            push_borders(out, col.offset, col.width, row.height, row.borders);
        }
        out.push(advance(row.height));
        cursor.y += row.height;
    }
}

impl Row {
    fn from_node(tr: &DocumentNode, row_height: f64) -> Result<Self> {
        let tds: Vec<&DocumentNode> = tr.children.iter().filter(|c| c.tag == Tag::Td).collect();
        let height = match tr.number("lineheight")? {
            Some(h) => h,
            None => {
                let lines = tds
                    .iter()
                    .map(|td| estimated_lines(&td.inner_text))
                    .max()
                    .unwrap_or(1);
                row_height * lines as f64
            }
        };
        let cells = tds
            .iter()
            .map(|td| Cell {
                text: break_every(&td.inner_text, CHARS_PER_LINE),
                align: td.attr("align").map(str::to_string),
            })
            .collect();
        Ok(Self {
            cells,
            height,
            borders: Borders::from_node(tr),
        })
    }
}

/// Expand a table at the cursor. Returns the replacement nodes and advances
/// the cursor past them. With `paginate` off no page breaks are inserted.
pub fn expand_table(
    table: &DocumentNode,
    cursor: &mut Cursor,
    geometry: &PageGeometry,
    paginate: bool,
) -> Result<Vec<DocumentNode>> {
    let layout = TableLayout::from_node(table)?;
    let bottom = geometry.content_bottom();
    let mut out = Vec::new();
    let mut breaks = 0;

    if paginate && !at_page_top(cursor, geometry) && cursor.y + 2.0 * layout.row_height > bottom {
        out.push(DocumentNode::new(Tag::NewPage));
        cursor.reset(geometry);
        breaks += 1;
    }

    let mut fresh_page = at_page_top(cursor, geometry);
    layout.emit_header(&mut out, cursor);

    for row in &layout.rows {
        let overflows = cursor.y + row.height > bottom;
        // A row that overflows a fresh page would overflow the next one too.
        if paginate && overflows && !fresh_page {
            out.push(DocumentNode::new(Tag::NewPage));
            cursor.reset(geometry);
            layout.emit_header(&mut out, cursor);
            breaks += 1;
        }
        layout.emit_row(row, &mut out, cursor);
        fresh_page = false;
    }

    debug!(
        "Expanded table {:?}: {} columns, {} rows, {} page breaks",
        layout.name.as_deref().unwrap_or(""),
        layout.columns.len(),
        layout.rows.len(),
        breaks
    );
    Ok(out)
}

fn at_page_top(cursor: &Cursor, geometry: &PageGeometry) -> bool {
    cursor.y <= geometry.top
}

/// Estimated line count of a cell: one per started block of 40 characters.
fn estimated_lines(text: &str) -> usize {
    1 + text.chars().count() / CHARS_PER_LINE
}

/// Insert a hard line break every `n` characters.
fn break_every(text: &str, n: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(n)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn align_offset(align: Option<&str>, width: f64) -> f64 {
    match align {
        Some("center") => width / 2.0,
        Some("right") => width,
        _ => 0.0,
    }
}

fn cell_text(text: &str, offset: f64, width: f64, align: Option<&str>) -> DocumentNode {
    let mut node = DocumentNode::new(Tag::Text)
        .with_number("relX", offset + align_offset(align, width))
        .with_text(text);
    if let Some(align) = align {
        node.set_attr("align", align);
    }
    node
}

fn border_line(x1: f64, y1: f64, x2: f64, y2: f64) -> DocumentNode {
    DocumentNode::new(Tag::Line)
        .with_number("relFromX", x1)
        .with_number("relFromY", y1)
        .with_number("relToX", x2)
        .with_number("relToY", y2)
}

fn push_borders(out: &mut Vec<DocumentNode>, x: f64, width: f64, height: f64, borders: Borders) {
    if borders.left {
        out.push(border_line(x, 0.0, x, height));
    }
    if borders.right {
        out.push(border_line(x + width, 0.0, x + width, height));
    }
    if borders.top {
        out.push(border_line(x, 0.0, x + width, 0.0));
    }
    if borders.bottom {
        out.push(border_line(x, height, x + width, height));
    }
}

fn advance(height: f64) -> DocumentNode {
    DocumentNode::new(Tag::Move).with_attr("relY", format_number(height))
}
