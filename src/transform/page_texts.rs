//! Repeating page texts (headers, footers, page numbers).
//!
//! The children of every `pageTexts` block are collected during the
//! transform pass. Once all page breaks are known, one copy is inserted
//! before each `newpage` node, wherever it sits in the tree, and one at the
//! end of the document.

use crate::model::{DocumentNode, Tag};

pub const PAGE_NUMBER: &str = "{pageNumber}";
pub const PAGE_COUNT: &str = "{pageCount}";

/// Number of physical pages the tree prints to.
pub fn page_count(nodes: &[DocumentNode]) -> usize {
    1 + nodes.iter().map(|n| n.count(&Tag::NewPage)).sum::<usize>()
}

/// Insert a numbered copy of `block` at the end of every page. Returns the
/// page count.
pub fn insert_page_texts(nodes: &mut Vec<DocumentNode>, block: &[DocumentNode]) -> usize {
    let count = page_count(nodes);
    let mut page = 1;
    insert_before_breaks(nodes, block, &mut page, count);
    nodes.extend(numbered_copy(block, page, count));
    count
}

fn insert_before_breaks(
    nodes: &mut Vec<DocumentNode>,
    block: &[DocumentNode],
    page: &mut usize,
    count: usize,
) {
    let mut i = 0;
    while i < nodes.len() {
        if nodes[i].tag == Tag::NewPage {
            let copy = numbered_copy(block, *page, count);
            let n = copy.len();
            nodes.splice(i..i, copy);
            i += n;
            *page += 1;
        } else {
            insert_before_breaks(&mut nodes[i].children, block, page, count);
        }
        i += 1;
    }
}

fn numbered_copy(block: &[DocumentNode], page: usize, count: usize) -> Vec<DocumentNode> {
    let page = page.to_string();
    let count = count.to_string();
    let mut copy = block.to_vec();
    for node in &mut copy {
        node.walk_mut(&mut |n| {
            if n.tag == Tag::Text && n.inner_text.contains('{') {
                n.inner_text = n
                    .inner_text
                    .replace(PAGE_NUMBER, &page)
                    .replace(PAGE_COUNT, &count);
            }
        });
    }
    copy
}
