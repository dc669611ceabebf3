//! # Sello CLI
//!
//! Command-line interface for certificate rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render one certificate
//! sello render --template course.json --record ada.json --out ada.png
//!
//! # Render every row of a spreadsheet, plus one combined PDF
//! sello batch --template course.json --sheet participants.xlsx \
//!     --out-dir out/ --event "RustConf 2026" --pdf out/all.pdf
//!
//! # Combine existing PNGs into a PDF
//! sello assemble --out bundle.pdf a.png b.png
//! ```
//!
//! Set `RUST_LOG=debug` for font fallback and row-skip details.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use sello::{
    RenderConfig, Renderer, SelloError,
    compositor,
    model::{Record, RecordFields, SharedFields, Template},
    pages,
    pipeline::RowResult,
};

/// Sello - Certificate rendering utility
#[derive(Parser, Debug)]
#[command(name = "sello")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Render config (JSON); defaults are used for anything it omits
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single certificate to PNG
    Render {
        /// Template definition (JSON)
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Record fields (JSON)
        #[arg(long, value_name = "FILE")]
        record: PathBuf,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Render one certificate per spreadsheet row
    Batch {
        /// Template definition (JSON)
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Spreadsheet (xlsx, xls, xlsb or ods)
        #[arg(long, value_name = "FILE")]
        sheet: PathBuf,

        /// Directory for the rendered PNGs
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Event label shared by every record
        #[arg(long)]
        event: Option<String>,

        /// Course label shared by every record
        #[arg(long)]
        course: Option<String>,

        /// Also write all rendered certificates into one PDF
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,
    },

    /// Combine PNG images into a PDF, one page each
    Assemble {
        /// Output PDF file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Images, in page order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SelloError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RenderConfig::from_file(path)?,
        None => RenderConfig::default(),
    };

    match cli.command {
        Commands::Render {
            template,
            record,
            out,
        } => {
            let renderer = Renderer::new(config);
            let template = load_template(&template)?;
            let fields: RecordFields = serde_json::from_str(&std::fs::read_to_string(&record)?)?;
            let record = Record::issue(fields);

            let artifact = renderer.render_from_file(&template, &record)?;
            std::fs::write(&out, artifact.to_png()?)?;

            println!("Rendered {}", out.display());
            println!("  unique code: {}", record.unique_code());
            println!("  hash:        {}", record.integrity_hash());
            Ok(())
        }

        Commands::Batch {
            template,
            sheet,
            out_dir,
            event,
            course,
            pdf,
        } => {
            let renderer = Renderer::new(config);
            let template = load_template(&template)?;
            let background = compositor::load_background(&template.background)?;
            let bytes = std::fs::read(&sheet)?;

            let shared = SharedFields {
                template_id: template.id.clone(),
                event_name: event,
                course_name: course,
            };

            let report = renderer.render_sheet(&template, &background, &bytes, &shared)?;
            std::fs::create_dir_all(&out_dir)?;

            for (record, result) in report.iter() {
                match result {
                    RowResult::Rendered(artifact) => {
                        let path = out_dir.join(format!("{}.png", record.unique_code()));
                        std::fs::write(&path, artifact.to_png()?)?;
                        println!(
                            "{}  {}  {}",
                            record.unique_code(),
                            record.integrity_hash(),
                            record.fields().participant_name
                        );
                    }
                    RowResult::Failed { error, .. } => {
                        println!(
                            "{}  FAILED  {}: {}",
                            record.unique_code(),
                            record.fields().participant_name,
                            error
                        );
                    }
                }
            }

            println!(
                "\n{} rendered, {} failed, {} blank rows skipped",
                report.results.len() - report.failed(),
                report.failed(),
                report.skipped
            );

            if let Some(pdf_path) = pdf {
                let document = renderer.assemble(report.artifacts())?;
                std::fs::write(&pdf_path, &document.pdf)?;
                println!("Wrote {} pages to {}", document.page_count(), pdf_path.display());
            }
            Ok(())
        }

        Commands::Assemble { out, images } => {
            let rasters = images
                .iter()
                .map(|path| compositor::load_background(path))
                .collect::<Result<Vec<_>, _>>()?;

            let document = pages::assemble(&rasters, &config.page)?;
            std::fs::write(&out, &document.pdf)?;
            println!("Wrote {} pages to {}", document.page_count(), out.display());
            Ok(())
        }
    }
}

/// Load a template and resolve its background relative to the template file.
fn load_template(path: &Path) -> Result<Template, SelloError> {
    let mut template: Template = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if template.background.is_relative()
        && let Some(dir) = path.parent()
    {
        template.background = dir.join(&template.background);
    }
    template.validate()?;
    Ok(template)
}
