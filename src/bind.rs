//! Data binding: fill a loaded template with report data before transform.
//!
//! Two kinds of data are bound:
//!
//! - `texts`: `{key}` placeholders in `text` nodes are replaced by value.
//! - `tables`: rows are appended to the `data` element of every `table`
//!   whose `name` matches.
//!
//! Data is usually read from JSON:
//!
//! ```json
//! {
//!   "texts": { "title": "Journal", "period": "2024" },
//!   "tables": {
//!     "journal": [
//!       ["2024-01-31", "Rent", "1200.00"],
//!       { "cells": ["", "Total", "1200.00"], "topLine": true }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{format_number, DocumentModel, DocumentNode, Tag};
use crate::transform::page_texts::{PAGE_COUNT, PAGE_NUMBER};

/// Values bound into a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    pub texts: BTreeMap<String, String>,
    pub tables: BTreeMap<String, Vec<RowData>>,
}

/// One table row: bare cells, or cells with row settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowData {
    Cells(Vec<String>),
    Detailed(DetailedRow),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedRow {
    pub cells: Vec<String>,
    /// Overrides the estimated row height.
    pub lineheight: Option<f64>,
    /// Applied to every cell of the row.
    pub align: Option<String>,
    pub left_line: bool,
    pub right_line: bool,
    pub top_line: bool,
    pub bottom_line: bool,
}

impl ReportData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.texts.insert(key.to_string(), value.into());
        self
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<RowData>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }
}

impl RowData {
    pub fn cells(cells: &[&str]) -> Self {
        RowData::Cells(cells.iter().map(|c| c.to_string()).collect())
    }

    fn to_node(&self) -> DocumentNode {
        match self {
            RowData::Cells(cells) => row_node(cells, None),
            RowData::Detailed(row) => {
                let mut tr = row_node(&row.cells, row.align.as_deref());
                if let Some(h) = row.lineheight {
                    tr.set_attr("lineheight", format_number(h));
                }
                for (name, on) in [
                    ("leftLine", row.left_line),
                    ("rightLine", row.right_line),
                    ("topLine", row.top_line),
                    ("bottomLine", row.bottom_line),
                ] {
                    if on {
                        tr.set_attr(name, "1");
                    }
                }
                tr
            }
        }
    }
}

fn row_node(cells: &[String], align: Option<&str>) -> DocumentNode {
    let tds = cells
        .iter()
        .map(|text| {
            let td = DocumentNode::new(Tag::Td).with_text(text.as_str());
            match align {
                Some(a) => td.with_attr("align", a),
                None => td,
            }
        })
        .collect();
    DocumentNode::new(Tag::Tr).with_children(tds)
}

/// Bind `data` into `document`.
pub fn apply(document: &mut DocumentModel, data: &ReportData) {
    if !data.texts.is_empty() {
        document.root.walk_mut(&mut |node| {
            if node.tag == Tag::Text && node.inner_text.contains('{') {
                node.inner_text = substitute(&node.inner_text, &data.texts);
            }
        });
    }

    for (name, rows) in &data.tables {
        let mut matched = 0;
        document.root.walk_mut(&mut |node| {
            if node.tag == Tag::Table && node.attr("name") == Some(name.as_str()) {
                append_rows(node, rows);
                matched += 1;
            }
        });
        if matched == 0 {
            warn!("No table named {:?} in template; {} rows dropped", name, rows.len());
        } else {
            debug!("Bound {} rows to table {:?}", rows.len(), name);
        }
    }
}

/// Replace `{key}` placeholders in one pass over `text`. Substituted values
/// are not scanned again. Page placeholders are left for pagination.
fn substitute(text: &str, texts: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('}') else {
            break;
        };
        let placeholder = &after[..=close];
        let value = if placeholder == PAGE_NUMBER || placeholder == PAGE_COUNT {
            None
        } else {
            texts.get(&placeholder[1..close])
        };
        out.push_str(value.map_or(placeholder, String::as_str));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn append_rows(table: &mut DocumentNode, rows: &[RowData]) {
    if table.child(&Tag::Data).is_none() {
        table.children.push(DocumentNode::new(Tag::Data));
    }
    if let Some(data) = table.child_mut(&Tag::Data) {
        data.children.extend(rows.iter().map(RowData::to_node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse_template;

    const TEMPLATE: &str = r#"<report>
        <text>{title} ({period})</text>
        <text>page {pageNumber}</text>
        <table name="journal">
          <columns><column width="20">Date</column></columns>
        </table>
        <table name="other"><data><tr><td>kept</td></tr></data></table>
      </report>"#;

    fn doc() -> DocumentModel {
        parse_template(TEMPLATE.as_bytes()).unwrap()
    }

    #[test]
    fn substitutes_text_placeholders() {
        let mut d = doc();
        let data = ReportData::default()
            .with_text("title", "Journal")
            .with_text("period", "2024")
            .with_text("pageNumber", "x");
        apply(&mut d, &data);
        assert_eq!(d.root.children[0].inner_text, "Journal (2024)");
        assert_eq!(d.root.children[1].inner_text, "page {pageNumber}");
    }

    #[test]
    fn bound_values_are_not_expanded_again() {
        let mut d = doc();
        let data = ReportData::default()
            .with_text("title", "{period}")
            .with_text("period", "{title}");
        apply(&mut d, &data);
        assert_eq!(d.root.children[0].inner_text, "{period} ({title})");
    }

    #[test]
    fn unknown_and_unclosed_placeholders_are_kept() {
        let mut d = parse_template(b"<r><text>{a} {missing} {b</text></r>").unwrap();
        apply(&mut d, &ReportData::default().with_text("a", "1"));
        assert_eq!(d.root.children[0].inner_text, "1 {missing} {b");
    }

    #[test]
    fn creates_data_element_and_appends_rows() {
        let mut d = doc();
        let data = ReportData::default().with_rows(
            "journal",
            vec![RowData::cells(&["2024-01-01"]), RowData::cells(&["2024-01-02"])],
        );
        apply(&mut d, &data);
        let table = &d.root.children[2];
        let rows = &table.child(&Tag::Data).unwrap().children;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].children[0].inner_text, "2024-01-02");
    }

    #[test]
    fn appends_after_existing_rows() {
        let mut d = doc();
        apply(&mut d, &ReportData::default().with_rows("other", vec![RowData::cells(&["new"])]));
        let rows = &d.root.children[3].child(&Tag::Data).unwrap().children;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].children[0].inner_text, "kept");
    }

    #[test]
    fn unknown_table_is_ignored() {
        let mut d = doc();
        let before = d.clone();
        apply(&mut d, &ReportData::default().with_rows("missing", vec![RowData::cells(&["x"])]));
        assert_eq!(d, before);
    }

    #[test]
    fn parses_both_row_shapes_from_json() {
        let data = ReportData::from_json(
            r#"{"tables": {"journal": [
                ["a", "b"],
                {"cells": ["c"], "lineheight": 8, "align": "right", "topLine": true}
            ]}}"#,
        )
        .unwrap();
        let rows = &data.tables["journal"];
        assert_eq!(rows[0], RowData::cells(&["a", "b"]));
        let tr = rows[1].to_node();
        assert_eq!(tr.attr("lineheight"), Some("8"));
        assert_eq!(tr.attr("topLine"), Some("1"));
        assert_eq!(tr.attr("bottomLine"), None);
        assert_eq!(tr.children[0].attr("align"), Some("right"));
        assert!(data.texts.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ReportData::from_json("{\"tables\": 3}").is_err());
    }
}
