//! # Render Pipeline
//!
//! [`Renderer`] ties the stages together:
//!
//! ```text
//! Record ─► layout::resolve ─► compositor::render ─► RenderedArtifact
//!              │      │
//!        FontResolver qr::encode
//!
//! [RenderedArtifact] ─► pages::assemble ─► PDF
//! ```
//!
//! ## Batches
//!
//! Records in a batch are independent, so [`Renderer::render_batch`] runs
//! them on the rayon pool. Results are collected through an indexed
//! parallel iterator: slot `i` of the output always belongs to record `i`
//! regardless of completion order. A failing record yields
//! [`RowResult::Failed`] in its slot; the rest of the batch continues.

use image::RgbImage;
use rayon::prelude::*;

use crate::batch::{self, Extraction};
use crate::compositor;
use crate::config::RenderConfig;
use crate::error::{Result, SelloError};
use crate::fonts::FontResolver;
use crate::layout::{self, DrawInstruction};
use crate::model::{Record, RenderedArtifact, SharedFields, Template};
use crate::pages::{self, AssembledDocument};

/// Outcome of rendering one record of a batch.
#[derive(Debug)]
pub enum RowResult {
    Rendered(RenderedArtifact),
    Failed { record_id: String, error: SelloError },
}

impl RowResult {
    pub fn record_id(&self) -> &str {
        match self {
            RowResult::Rendered(artifact) => &artifact.record_id,
            RowResult::Failed { record_id, .. } => record_id,
        }
    }

    pub fn artifact(&self) -> Option<&RenderedArtifact> {
        match self {
            RowResult::Rendered(artifact) => Some(artifact),
            RowResult::Failed { .. } => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, RowResult::Rendered(_))
    }
}

/// A spreadsheet batch: the issued records and, slot for slot, their renders.
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<Record>,
    pub results: Vec<RowResult>,
    /// Blank rows skipped during extraction
    pub skipped: usize,
}

impl BatchReport {
    /// Records paired with their render outcome, in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = (&Record, &RowResult)> {
        self.records.iter().zip(self.results.iter())
    }

    /// Successfully rendered artifacts, in sheet order.
    pub fn artifacts(&self) -> impl Iterator<Item = &RenderedArtifact> {
        self.results.iter().filter_map(RowResult::artifact)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_rendered()).count()
    }
}

/// # Renderer
///
/// Owns the font resolver and configuration for one deployment. Safe to
/// share across threads; fonts are parsed once and read concurrently.
pub struct Renderer {
    fonts: FontResolver,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            fonts: FontResolver::new(config.fonts.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Resolve the draw instructions for one record without compositing.
    pub fn instructions(&self, template: &Template, record: &Record) -> Result<Vec<DrawInstruction>> {
        layout::resolve(template, record, &self.fonts, &self.config)
    }

    /// Render one record over a decoded background.
    pub fn render(
        &self,
        template: &Template,
        background: &RgbImage,
        record: &Record,
    ) -> Result<RenderedArtifact> {
        template.validate()?;
        let instructions = self.instructions(template, record)?;
        let image = compositor::render(template, background, &instructions);

        Ok(RenderedArtifact {
            record_id: record.id().to_string(),
            image,
        })
    }

    /// Render one record, loading the template's background from disk.
    pub fn render_from_file(&self, template: &Template, record: &Record) -> Result<RenderedArtifact> {
        let background = compositor::load_background(&template.background)?;
        self.render(template, &background, record)
    }

    /// Render every record in parallel, keeping input order.
    pub fn render_batch(
        &self,
        template: &Template,
        background: &RgbImage,
        records: &[Record],
    ) -> Vec<RowResult> {
        records
            .par_iter()
            .map(|record| match self.render(template, background, record) {
                Ok(artifact) => RowResult::Rendered(artifact),
                Err(error) => {
                    log::warn!("Record {} failed to render: {}", record.id(), error);
                    RowResult::Failed {
                        record_id: record.id().to_string(),
                        error,
                    }
                }
            })
            .collect()
    }

    /// Extract records from spreadsheet bytes and render them all.
    ///
    /// An unreadable spreadsheet fails the whole call; individual render
    /// failures are reported per row.
    pub fn render_sheet(
        &self,
        template: &Template,
        background: &RgbImage,
        sheet: &[u8],
        shared: &SharedFields,
    ) -> Result<BatchReport> {
        let Extraction {
            records, skipped, ..
        } = batch::extract(sheet, shared)?;

        let results = self.render_batch(template, background, &records);

        let report = BatchReport {
            records,
            results,
            skipped,
        };
        log::info!(
            "Batch rendered: {} ok, {} failed, {} blank rows",
            report.results.len() - report.failed(),
            report.failed(),
            report.skipped
        );
        Ok(report)
    }

    /// Assemble artifacts into a PDF, one page each, in the given order.
    pub fn assemble<'a>(
        &self,
        artifacts: impl IntoIterator<Item = &'a RenderedArtifact>,
    ) -> Result<AssembledDocument> {
        let images: Vec<RgbImage> = artifacts.into_iter().map(|a| a.image.clone()).collect();
        pages::assemble(&images, &self.config.page)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
