//! # Font Resolution
//!
//! Maps a logical font family and size to a [`GlyphSource`] that can both
//! measure and draw text.
//!
//! ## Fallback chain
//!
//! ```text
//! family entry in FontTable ──(missing / unparseable)──┐
//!                                                      ▼
//!                                   FontTable::fallbacks, in order
//!                                                      │ (all fail)
//!                                                      ▼
//!                                   built-in Spleen 12×24 bitmap
//! ```
//!
//! [`FontResolver::resolve`] never fails.
//!
//! ## Measuring and drawing
//!
//! Alignment math in [`layout`](crate::layout) and pixel output in
//! [`compositor`](crate::compositor) both go through
//! [`GlyphSource::measure`] and [`GlyphSource::draw`], which share one glyph
//! positioning routine. A string is always drawn exactly as wide as it was
//! measured.

pub mod bitmap;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::FontTable;

/// Size of a laid-out run of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Something that can lay out and rasterize a single line of text.
#[derive(Clone)]
pub enum GlyphSource {
    /// A TrueType/OpenType face at a pixel scale.
    Outline { font: FontArc, scale: PxScale },
    /// The built-in fixed-size bitmap font.
    Bitmap,
}

impl fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlyphSource::Outline { scale, .. } => f
                .debug_struct("Outline")
                .field("scale_x", &scale.x)
                .field("scale_y", &scale.y)
                .finish(),
            GlyphSource::Bitmap => f.write_str("Bitmap"),
        }
    }
}

/// Glyph positions for one line of text.
struct GlyphRun {
    /// Character and pen x-position of each glyph
    glyphs: Vec<(char, f32)>,
    extent: TextExtent,
    baseline: f32,
}

impl GlyphSource {
    /// Wrap an outline font so that `size` is its em size in pixels.
    pub fn outline(font: FontArc, size: u32) -> Self {
        let size = size.max(1) as f32;
        let scale = match font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                size * font.height_unscaled() / units_per_em
            }
            _ => size,
        };
        GlyphSource::Outline {
            font,
            scale: PxScale::from(scale),
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, GlyphSource::Bitmap)
    }

    /// The same face stretched by independent horizontal and vertical factors.
    ///
    /// Used when template canvas space and background pixels differ. The
    /// bitmap font has a single size and is returned unchanged.
    pub fn scaled(&self, sx: f32, sy: f32) -> GlyphSource {
        match self {
            GlyphSource::Outline { font, scale } => GlyphSource::Outline {
                font: font.clone(),
                scale: PxScale {
                    x: scale.x * sx,
                    y: scale.y * sy,
                },
            },
            GlyphSource::Bitmap => GlyphSource::Bitmap,
        }
    }

    /// Measure a line of text.
    pub fn measure(&self, text: &str) -> TextExtent {
        self.layout(text).extent
    }

    /// Rasterize a line of text.
    ///
    /// `plot(x, y, coverage)` is called for every touched pixel, with
    /// coordinates relative to the top-left of the text box and coverage in
    /// `0.0..=1.0`. Coordinates can be negative for glyphs overhanging the
    /// pen origin.
    pub fn draw(&self, text: &str, mut plot: impl FnMut(i32, i32, f32)) {
        let run = self.layout(text);

        match self {
            GlyphSource::Outline { font, scale } => {
                for &(ch, glyph_x) in &run.glyphs {
                    let glyph = font
                        .glyph_id(ch)
                        .with_scale_and_position(*scale, point(glyph_x, run.baseline));

                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|px, py, coverage| {
                            let x = px as i32 + bounds.min.x as i32;
                            let y = py as i32 + bounds.min.y as i32;
                            plot(x, y, coverage.min(1.0));
                        });
                    }
                }
            }
            GlyphSource::Bitmap => {
                for &(ch, glyph_x) in &run.glyphs {
                    let glyph = bitmap::generate_glyph(ch);
                    let origin_x = glyph_x as i32;
                    for (idx, &on) in glyph.iter().enumerate() {
                        if on != 0 {
                            let x = origin_x + (idx % bitmap::GLYPH_WIDTH) as i32;
                            let y = (idx / bitmap::GLYPH_WIDTH) as i32;
                            plot(x, y, 1.0);
                        }
                    }
                }
            }
        }
    }

    /// Position every glyph of `text` on a single line.
    fn layout(&self, text: &str) -> GlyphRun {
        match self {
            GlyphSource::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let mut glyphs = Vec::with_capacity(text.len());
                let mut caret_x = 0.0f32;
                let mut previous = None;

                for ch in text.chars() {
                    let glyph_id = font.glyph_id(ch);
                    if let Some(previous) = previous {
                        caret_x += scaled.kern(previous, glyph_id);
                    }
                    glyphs.push((ch, caret_x));
                    caret_x += scaled.h_advance(glyph_id);
                    previous = Some(glyph_id);
                }

                GlyphRun {
                    glyphs,
                    extent: TextExtent {
                        width: caret_x,
                        height: scaled.ascent() - scaled.descent(),
                    },
                    baseline: scaled.ascent(),
                }
            }
            GlyphSource::Bitmap => {
                let glyphs: Vec<(char, f32)> = text
                    .chars()
                    .enumerate()
                    .map(|(i, ch)| (ch, (i * bitmap::GLYPH_WIDTH) as f32))
                    .collect();
                let width = (glyphs.len() * bitmap::GLYPH_WIDTH) as f32;

                GlyphRun {
                    glyphs,
                    extent: TextExtent {
                        width,
                        height: bitmap::GLYPH_HEIGHT as f32,
                    },
                    baseline: bitmap::GLYPH_HEIGHT as f32,
                }
            }
        }
    }
}

/// # Font Resolver
///
/// Resolves family names through an injected [`FontTable`].
///
/// Font files are parsed at most once per resolver. The cache map is keyed
/// by every file the table names and is fixed at construction; each entry
/// is a `OnceLock`, so concurrent renders share one parsed face without
/// locking.
pub struct FontResolver {
    table: FontTable,
    faces: HashMap<PathBuf, OnceLock<Option<FontArc>>>,
}

impl FontResolver {
    pub fn new(table: FontTable) -> Self {
        let faces = table
            .files()
            .map(|path| (path.clone(), OnceLock::new()))
            .collect();
        Self { table, faces }
    }

    pub fn table(&self) -> &FontTable {
        &self.table
    }

    /// Resolve a family and em size to a glyph source.
    ///
    /// Never fails: unknown families and unloadable files fall through to
    /// the table's fallbacks, then to the built-in bitmap font.
    pub fn resolve(&self, family: &str, size: u32) -> GlyphSource {
        if let Some(path) = self.table.families.get(family) {
            if let Some(font) = self.face(path) {
                return GlyphSource::outline(font, size);
            }
        } else {
            log::debug!("No font table entry for family '{}'", family);
        }

        for path in &self.table.fallbacks {
            if let Some(font) = self.face(path) {
                log::debug!("Family '{}' resolved to fallback {}", family, path.display());
                return GlyphSource::outline(font, size);
            }
        }

        log::warn!(
            "Every font for family '{}' failed to load; using built-in bitmap font",
            family
        );
        GlyphSource::Bitmap
    }

    /// Parsed face for a table file, loading it on first use.
    fn face(&self, path: &Path) -> Option<FontArc> {
        self.faces
            .get(path)?
            .get_or_init(|| load_face(path))
            .clone()
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(FontTable::default())
    }
}

fn load_face(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Font file {} unavailable: {}", path.display(), e);
            return None;
        }
    };

    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Font file {} failed to parse: {}", path.display(), e);
            None
        }
    }
}
