//! # ledgerprint
//!
//! Report layout and pagination for bookkeeping documents.
//!
//! A report is a declarative XML template: moves, texts, lines, rectangles,
//! font and color scopes, tables and repeating page texts. Layout happens in
//! two passes. The transform pass rewrites the template into drawing
//! primitives and decides where pages break, with the page height as a hard
//! constraint. The print pass walks the primitives and issues absolute
//! drawing calls against a surface, one physical page per call.
//!
//! ## Architecture
//!
//! ```text
//! Template (XML)
//!       ↓
//!   [template]    load by name, parse into the node tree
//!       ↓
//!   [bind]        optional: fill tables and {placeholders} with data
//!       ↓
//!   [page_setup]  paper size, margins, orientation, print factor
//!       ↓
//!   [transform]   tables, rectangles, page texts -> primitives + newpage
//!       ↓
//!   [print]       one page per call -> GraphicsSurface
//!       ↓
//!   [surface]     RecordingSurface (previews, tests) or PdfSurface
//! ```

pub mod bind;
pub mod cursor;
pub mod error;
pub mod model;
pub mod page_setup;
pub mod print;
pub mod surface;
pub mod template;
pub mod transform;

use log::info;

pub use error::{ReportError, Result};
pub use model::{DocumentModel, DocumentNode, Tag};
pub use page_setup::{setup_document, PageGeometry, PaperSize};
pub use print::PagePrinter;
pub use surface::{GraphicsSurface, PdfSurface, RecordingSurface};
pub use template::{load_template, EmbeddedTemplates, TemplateStore};
pub use transform::transform_document;

/// Lay out and print an already geometry-resolved document onto `surface`.
/// Returns the number of pages printed.
pub fn render_with_geometry(
    document: &mut DocumentModel,
    geometry: &PageGeometry,
    surface: &mut dyn GraphicsSurface,
) -> Result<usize> {
    transform_document(document, geometry, &*surface)?;
    let pages = print::print_document(document, geometry, surface)?;
    info!("Rendered <{}>: {} pages", document.element_name, pages);
    Ok(pages)
}

/// Run the whole pipeline on a loaded document: page setup, transform, and
/// every page of print. The document is left in its transformed state.
pub fn render_report(
    document: &mut DocumentModel,
    paper_sizes: &[PaperSize],
    surface: &mut dyn GraphicsSurface,
) -> Result<PageGeometry> {
    let geometry = setup_document(document, paper_sizes)?;
    render_with_geometry(document, &geometry, surface)?;
    Ok(geometry)
}

/// Render a loaded document to PDF bytes.
pub fn render_pdf(document: &mut DocumentModel, paper_sizes: &[PaperSize]) -> Result<Vec<u8>> {
    let geometry = setup_document(document, paper_sizes)?;
    let mut pdf = PdfSurface::new(&geometry).with_title(&document.element_name);
    render_with_geometry(document, &geometry, &mut pdf)?;
    Ok(pdf.finish())
}

/// Load a template from `store`, bind `data` into it and render it to a
/// recording surface.
pub fn render_template(
    store: &dyn TemplateStore,
    name: &str,
    data: Option<&bind::ReportData>,
    paper_sizes: &[PaperSize],
) -> Result<RecordingSurface> {
    let mut document = load_template(store, name)?;
    if let Some(data) = data {
        bind::apply(&mut document, data);
    }
    let mut surface = RecordingSurface::new();
    render_report(&mut document, paper_sizes, &mut surface)?;
    Ok(surface)
}
