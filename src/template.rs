//! # Template Loader
//!
//! Resolves a report template by name and parses it into a
//! [`DocumentModel`]. Templates live in a [`TemplateStore`]: the built-in
//! reports are compiled into the binary, hosts may add their own from memory
//! or from a directory.
//!
//! Resolution is by case-insensitive name suffix, and it must be unambiguous:
//! `journal.xml` finds `templates/journal.xml`, but `.xml` alone fails
//! as soon as two templates exist.

use std::fs;
use std::path::Path;

use log::debug;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ReportError, Result};
use crate::model::{DocumentModel, DocumentNode, Tag};

/// A source of named template resources.
pub trait TemplateStore {
    /// Every resource name in the store, in a stable order.
    fn resource_names(&self) -> Vec<&str>;

    /// The raw bytes of the resource with exactly this name.
    fn resource(&self, name: &str) -> Option<&[u8]>;
}

/// The report templates shipped with the crate.
pub struct EmbeddedTemplates;

const EMBEDDED: &[(&str, &[u8])] = &[
    (
        "templates/journal.xml",
        include_bytes!("../templates/journal.xml"),
    ),
    (
        "templates/balance.xml",
        include_bytes!("../templates/balance.xml"),
    ),
];

impl TemplateStore for EmbeddedTemplates {
    fn resource_names(&self) -> Vec<&str> {
        EMBEDDED.iter().map(|(name, _)| *name).collect()
    }

    fn resource(&self, name: &str) -> Option<&[u8]> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bytes)| *bytes)
    }
}

/// Templates supplied by the caller as `(name, bytes)` pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplates {
    entries: Vec<(String, Vec<u8>)>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), bytes.into()));
    }

    pub fn with(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl TemplateStore for MemoryTemplates {
    fn resource_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn resource(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_slice())
    }
}

/// Every `*.xml` file directly inside a directory, read eagerly.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    inner: MemoryTemplates,
}

impl DirTemplates {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_xml = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if path.is_file() && is_xml {
                names.push(path);
            }
        }
        names.sort();

        let mut inner = MemoryTemplates::new();
        for path in names {
            let bytes = fs::read(&path)?;
            let name = path.to_string_lossy().replace('\\', "/");
            inner.insert(&name, bytes);
        }
        debug!(
            "Loaded {} templates from {}",
            inner.entries.len(),
            dir.as_ref().display()
        );
        Ok(Self { inner })
    }
}

impl TemplateStore for DirTemplates {
    fn resource_names(&self) -> Vec<&str> {
        self.inner.resource_names()
    }

    fn resource(&self, name: &str) -> Option<&[u8]> {
        self.inner.resource(name)
    }
}

/// Resolve `resource_name` by suffix and parse the matching template.
pub fn load_template(store: &dyn TemplateStore, resource_name: &str) -> Result<DocumentModel> {
    let wanted = resource_name.to_ascii_lowercase();
    let matches: Vec<&str> = store
        .resource_names()
        .into_iter()
        .filter(|name| name.to_ascii_lowercase().ends_with(&wanted))
        .collect();

    let not_found = |count: usize| ReportError::TemplateNotFound {
        name: resource_name.to_string(),
        matches: count,
    };

    if matches.len() != 1 {
        return Err(not_found(matches.len()));
    }
    let bytes = store.resource(matches[0]).ok_or_else(|| not_found(0))?;
    debug!("Resolved template '{}' to {}", resource_name, matches[0]);
    parse_template(bytes)
}

/// Parse template XML into a document tree.
///
/// Whitespace-only text between elements is dropped; other text keeps its
/// spacing. Entities are unescaped and CDATA is kept verbatim. The document element becomes the [`Tag::Root`] node.
pub fn parse_template(bytes: &[u8]) -> Result<DocumentModel> {
    let content = std::str::from_utf8(bytes)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = Reader::from_str(content);

    let mut stack: Vec<(String, DocumentNode)> = Vec::new();
    let mut document: Option<DocumentModel> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let opened = open_element(&e, stack.is_empty(), document.is_some())?;
                stack.push(opened);
            }
            Event::Empty(e) => {
                let (name, node) = open_element(&e, stack.is_empty(), document.is_some())?;
                close_element(name, node, &mut stack, &mut document);
            }
            Event::End(e) => {
                let found = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let (expected, node) = stack.pop().ok_or_else(|| ReportError::MismatchedTag {
                    expected: String::new(),
                    found: found.clone(),
                })?;
                if expected != found {
                    return Err(ReportError::MismatchedTag { expected, found });
                }
                close_element(expected, node, &mut stack, &mut document);
            }
            Event::Text(e) => {
                if let Some((_, node)) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&e);
                    if !raw.trim().is_empty() {
                        node.inner_text.push_str(&unescape(&raw)?);
                    }
                }
            }
            Event::CData(e) => {
                if let Some((_, node)) = stack.last_mut() {
                    node.inner_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some((expected, _)) = stack.pop() {
        return Err(ReportError::MismatchedTag {
            expected,
            found: String::new(),
        });
    }
    document.ok_or(ReportError::EmptyTemplate)
}

fn open_element(
    e: &BytesStart,
    is_document_element: bool,
    document_closed: bool,
) -> Result<(String, DocumentNode)> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    if is_document_element && document_closed {
        return Err(ReportError::MismatchedTag {
            expected: "end of document".to_string(),
            found: name,
        });
    }

    let tag = if is_document_element {
        Tag::Root
    } else {
        Tag::from_name(&name)
    };
    let mut node = DocumentNode::new(tag);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw)?.into_owned();
        node.attributes.insert(key, value);
    }
    Ok((name, node))
}

fn close_element(
    name: String,
    node: DocumentNode,
    stack: &mut [(String, DocumentNode)],
    document: &mut Option<DocumentModel>,
) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => *document = Some(DocumentModel::new(&name, node)),
    }
}
