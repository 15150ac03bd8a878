//! Structured error types for the report engine.
//!
//! Templates are developer-authored assets, so malformed input is not
//! recovered from: every variant aborts the report that produced it.

use thiserror::Error;

/// The unified error type returned by all public ledgerprint functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No template, or more than one, matched the requested name suffix.
    #[error("template '{name}' not found ({matches} matching resources, expected exactly one)")]
    TemplateNotFound { name: String, matches: usize },

    /// The template is not well-formed XML.
    #[error("failed to parse template: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An entity or character reference in the template could not be resolved.
    #[error("failed to unescape template text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// The template bytes are not valid UTF-8.
    #[error("template is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The template has no document element.
    #[error("template has no document element")]
    EmptyTemplate,

    /// An end tag closed a different element than the one open.
    #[error("mismatched end tag </{found}>, expected </{expected}>")]
    MismatchedTag { expected: String, found: String },

    /// A numeric attribute could not be parsed.
    #[error("<{tag}> attribute {attribute}=\"{value}\" is not a number")]
    Format {
        tag: String,
        attribute: String,
        value: String,
    },

    /// A required attribute is absent.
    #[error("<{tag}> is missing required attribute {attribute}")]
    MissingAttribute { tag: String, attribute: String },

    /// Page geometry leaves no printable area.
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// The graphics surface failed while drawing.
    #[error("graphics surface error: {0}")]
    Surface(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid report data: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
