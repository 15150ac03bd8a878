//! # ledgerprint CLI
//!
//! Usage:
//!   ledgerprint journal.xml -o journal.pdf --data journal.json
//!   ledgerprint ./my-report.xml --paper Letter --dump-json
//!   ledgerprint --list
//!   ledgerprint --templates ./reports --list
//!
//! Set `RUST_LOG=debug` to follow template resolution and pagination.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use ledgerprint::bind::{self, ReportData};
use ledgerprint::template::{parse_template, DirTemplates};
use ledgerprint::{
    load_template, render_pdf, render_report, DocumentModel, EmbeddedTemplates, PaperSize,
    RecordingSurface, ReportError, TemplateStore,
};

#[derive(Debug, Parser)]
#[command(name = "ledgerprint", version, about = "Render XML report templates to PDF")]
struct Args {
    /// Built-in template name (matched by suffix) or path to an .xml file
    #[arg(required_unless_present = "list")]
    template: Option<String>,

    /// Output PDF path
    #[arg(short, long, default_value = "report.pdf")]
    output: PathBuf,

    /// Look templates up in this directory instead of the built-in set
    #[arg(long)]
    templates: Option<PathBuf>,

    /// JSON file with texts and table rows to bind into the template
    #[arg(long)]
    data: Option<PathBuf>,

    /// Paper sizes offered to page setup (repeatable); defaults to all
    /// standard sizes
    #[arg(long = "paper")]
    papers: Vec<String>,

    /// Print the recorded drawing calls as JSON instead of writing a PDF
    #[arg(long)]
    dump_json: bool,

    /// List the built-in templates and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ledgerprint::Result<()> {
    let store: Box<dyn TemplateStore> = match &args.templates {
        Some(dir) => Box::new(DirTemplates::open(dir)?),
        None => Box::new(EmbeddedTemplates),
    };

    if args.list {
        for name in store.resource_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let Some(template) = args.template.as_deref() else {
        return Ok(());
    };
    let mut document = open_template(store.as_ref(), template)?;

    if let Some(path) = &args.data {
        let data = ReportData::from_json(&fs::read_to_string(path)?)?;
        bind::apply(&mut document, &data);
    }

    let papers = paper_sizes(&args.papers)?;

    if args.dump_json {
        let mut surface = RecordingSurface::new();
        render_report(&mut document, &papers, &mut surface)?;
        println!("{}", serde_json::to_string_pretty(&surface)?);
        return Ok(());
    }

    let pdf = render_pdf(&mut document, &papers)?;
    fs::write(&args.output, &pdf)?;
    eprintln!("✓ Written {} bytes to {}", pdf.len(), args.output.display());
    Ok(())
}

fn open_template(store: &dyn TemplateStore, template: &str) -> ledgerprint::Result<DocumentModel> {
    let path = Path::new(template);
    if path.is_file() {
        parse_template(&fs::read(path)?)
    } else {
        load_template(store, template)
    }
}

fn paper_sizes(names: &[String]) -> ledgerprint::Result<Vec<PaperSize>> {
    let catalog = PaperSize::standard_catalog();
    if names.is_empty() {
        return Ok(catalog);
    }
    names
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| ReportError::InvalidGeometry(format!("unknown paper size '{}'", name)))
        })
        .collect()
}
