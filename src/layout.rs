//! # Field Layout
//!
//! Turns a template's field list and one record into concrete draw
//! instructions in template canvas space.
//!
//! ## Architecture
//!
//! ```text
//! Template.fields ──┐
//!                   ├─ resolve() ──► [DrawInstruction] ──► compositor
//! Record ───────────┘      │
//!                          ├─ FontResolver  (text kinds)
//!                          └─ qr::encode    (QR kind)
//! ```
//!
//! Instructions come out in field-list order. The compositor draws them in
//! that order, so a later field paints over an earlier one where their
//! boxes overlap.

use image::GrayImage;
use std::fmt::Write;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::fonts::{FontResolver, GlyphSource};
use crate::model::{Alignment, FieldKind, FieldSpec, Record, Rgb, Template};
use crate::qr;

const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single drawing step, positioned in canvas space.
#[derive(Debug, Clone)]
pub enum DrawInstruction {
    /// A line of text whose top-left corner sits at (`x`, `y`).
    ///
    /// `x` is already aligned within the field box. The box and alignment
    /// are kept so the run can be re-anchored when drawn at another scale.
    Text {
        kind: FieldKind,
        text: String,
        glyphs: GlyphSource,
        color: Rgb,
        x: f32,
        y: f32,
        box_x: f32,
        box_width: f32,
        align: Alignment,
    },
    /// An opaque raster pasted with its top-left corner at (`x`, `y`),
    /// stretched to an `edge` × `edge` square.
    Raster {
        kind: FieldKind,
        image: GrayImage,
        x: f32,
        y: f32,
        edge: f32,
    },
}

impl DrawInstruction {
    pub fn kind(&self) -> FieldKind {
        match self {
            DrawInstruction::Text { kind, .. } | DrawInstruction::Raster { kind, .. } => *kind,
        }
    }
}

/// Resolve every field of `template` against `record`.
///
/// Optional kinds with no value on the record produce no instruction. The
/// only failure is a QR payload that does not fit a symbol.
pub fn resolve(
    template: &Template,
    record: &Record,
    fonts: &FontResolver,
    config: &RenderConfig,
) -> Result<Vec<DrawInstruction>> {
    let mut instructions = Vec::with_capacity(template.fields.len());

    for field in &template.fields {
        if field.kind == FieldKind::QrCode {
            instructions.push(resolve_qr(field, record, config)?);
            continue;
        }

        let Some(text) = field_text(field.kind, record, config) else {
            continue;
        };

        let glyphs = fonts.resolve(&field.font_family, field.font_size);
        let text_width = glyphs.measure(&text).width;

        instructions.push(DrawInstruction::Text {
            kind: field.kind,
            x: field.align.anchor_x(field.x, field.width, text_width),
            y: field.y,
            box_x: field.x,
            box_width: field.width,
            align: field.align,
            text,
            glyphs,
            color: field.font_color,
        });
    }

    Ok(instructions)
}

/// The string a text field shows, or `None` when the field is hidden.
fn field_text(kind: FieldKind, record: &Record, config: &RenderConfig) -> Option<String> {
    let fields = record.fields();

    let value = match kind {
        FieldKind::ParticipantName => Some(fields.participant_name.clone()),
        FieldKind::DocumentId => Some(fields.document_id.clone()),
        FieldKind::CertifierName => Some(fields.certifier_name.clone()),
        FieldKind::RepresentativeName => Some(fields.representative_name.clone()),
        FieldKind::RepresentativeName2 => fields.representative_name_2.clone(),
        FieldKind::RepresentativeName3 => fields.representative_name_3.clone(),
        FieldKind::EventName => fields.event_name.clone(),
        FieldKind::CourseName => fields.course_name.clone(),
        FieldKind::IssueDate => Some(format_date(record, &config.date_format)),
        FieldKind::UniqueCode => Some(record.unique_code().to_string()),
        FieldKind::QrCode => None,
    };

    match value {
        Some(v) if kind.is_optional() && v.trim().is_empty() => None,
        other => other,
    }
}

/// Format the issue date, falling back to day/month/year on a bad pattern.
fn format_date(record: &Record, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", record.issued_at().format(pattern)).is_ok() {
        return out;
    }
    log::warn!("Invalid date format '{}'; using {}", pattern, DEFAULT_DATE_FORMAT);
    record.issued_at().format(DEFAULT_DATE_FORMAT).to_string()
}

fn resolve_qr(field: &FieldSpec, record: &Record, config: &RenderConfig) -> Result<DrawInstruction> {
    let payload = config.verification_url_for(record.unique_code().as_str());
    let edge = field.width.max(1.0);
    let image = qr::encode(&payload, edge.round() as u32)?;

    Ok(DrawInstruction::Raster {
        kind: FieldKind::QrCode,
        image,
        x: field.x,
        y: field.y,
        edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontTable;
    use crate::integrity::UniqueCode;
    use crate::model::RecordFields;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn bitmap_fonts() -> FontResolver {
        FontResolver::new(FontTable::empty())
    }

    fn record(rep2: Option<&str>) -> Record {
        let fields = RecordFields {
            participant_name: "Ada".to_string(),
            document_id: "DOC-1".to_string(),
            certifier_name: "Babbage".to_string(),
            representative_name: "Somerville".to_string(),
            representative_name_2: rep2.map(str::to_string),
            ..Default::default()
        };
        Record::with_identity(
            fields,
            "rec-1",
            UniqueCode::new("AB12CD34"),
            Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap(),
        )
    }

    fn template(fields: Vec<FieldSpec>) -> Template {
        Template {
            id: "tpl".to_string(),
            name: "test".to_string(),
            background: PathBuf::from("unused.png"),
            width: 800.0,
            height: 600.0,
            fields,
        }
    }

    fn count_kind(instructions: &[DrawInstruction], kind: FieldKind) -> usize {
        instructions.iter().filter(|i| i.kind() == kind).count()
    }

    #[test]
    fn test_optional_representative_visibility() {
        let t = template(vec![
            FieldSpec::new(FieldKind::RepresentativeName, 10.0, 10.0, 200.0, 30.0),
            FieldSpec::new(FieldKind::RepresentativeName2, 10.0, 50.0, 200.0, 30.0),
        ]);
        let fonts = bitmap_fonts();
        let config = RenderConfig::default();

        let absent = resolve(&t, &record(None), &fonts, &config).unwrap();
        assert_eq!(count_kind(&absent, FieldKind::RepresentativeName2), 0);
        assert_eq!(count_kind(&absent, FieldKind::RepresentativeName), 1);

        let blank = resolve(&t, &record(Some("  ")), &fonts, &config).unwrap();
        assert_eq!(count_kind(&blank, FieldKind::RepresentativeName2), 0);

        let present = resolve(&t, &record(Some("Herschel")), &fonts, &config).unwrap();
        assert_eq!(count_kind(&present, FieldKind::RepresentativeName2), 1);
    }

    #[test]
    fn test_date_and_code_formatting() {
        let t = template(vec![
            FieldSpec::new(FieldKind::IssueDate, 0.0, 0.0, 100.0, 20.0),
            FieldSpec::new(FieldKind::UniqueCode, 0.0, 30.0, 100.0, 20.0),
        ]);
        let out = resolve(&t, &record(None), &bitmap_fonts(), &RenderConfig::default()).unwrap();

        let texts: Vec<&str> = out
            .iter()
            .filter_map(|i| match i {
                DrawInstruction::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["07/03/2024", "AB12CD34"]);
    }

    #[test]
    fn test_bad_date_pattern_falls_back() {
        let config = RenderConfig {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        let t = template(vec![FieldSpec::new(FieldKind::IssueDate, 0.0, 0.0, 100.0, 20.0)]);
        let out = resolve(&t, &record(None), &bitmap_fonts(), &config).unwrap();
        match &out[..] {
            [DrawInstruction::Text { text, .. }] => assert_eq!(text, "07/03/2024"),
            other => panic!("expected one text run, got {:?}", other),
        }
    }

    #[test]
    fn test_alignment_anchor() {
        // Bitmap font: "Ada" is exactly 36px wide.
        let mut left = FieldSpec::new(FieldKind::ParticipantName, 100.0, 0.0, 200.0, 30.0);
        let mut center = left.clone();
        let mut right = left.clone();
        left.align = Alignment::Left;
        center.align = Alignment::Center;
        right.align = Alignment::Right;

        let t = template(vec![left, center, right]);
        let out = resolve(&t, &record(None), &bitmap_fonts(), &RenderConfig::default()).unwrap();

        let xs: Vec<f32> = out
            .iter()
            .map(|i| match i {
                DrawInstruction::Text { x, .. } => *x,
                DrawInstruction::Raster { x, .. } => *x,
            })
            .collect();
        assert_eq!(xs, vec![100.0, 182.0, 264.0]);
    }

    #[test]
    fn test_qr_instruction_is_square_at_field_width() {
        let t = template(vec![FieldSpec::new(FieldKind::QrCode, 600.0, 400.0, 150.0, 150.0)]);
        let out = resolve(&t, &record(None), &bitmap_fonts(), &RenderConfig::default()).unwrap();

        match &out[..] {
            [DrawInstruction::Raster { image, x, y, edge, .. }] => {
                assert_eq!(image.dimensions(), (150, 150));
                assert_eq!((*x, *y, *edge), (600.0, 400.0, 150.0));
            }
            other => panic!("expected a single raster insert, got {:?}", other),
        }
    }

    #[test]
    fn test_field_order_preserved() {
        let t = template(vec![
            FieldSpec::new(FieldKind::UniqueCode, 0.0, 0.0, 100.0, 20.0),
            FieldSpec::new(FieldKind::QrCode, 0.0, 0.0, 60.0, 60.0),
            FieldSpec::new(FieldKind::ParticipantName, 0.0, 0.0, 100.0, 20.0),
            FieldSpec::new(FieldKind::UniqueCode, 50.0, 50.0, 100.0, 20.0),
        ]);
        let out = resolve(&t, &record(None), &bitmap_fonts(), &RenderConfig::default()).unwrap();
        let kinds: Vec<FieldKind> = out.iter().map(DrawInstruction::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::UniqueCode,
                FieldKind::QrCode,
                FieldKind::ParticipantName,
                FieldKind::UniqueCode,
            ]
        );
    }

    #[test]
    fn test_qr_capacity_error_surfaces() {
        let config = RenderConfig {
            verification_url: format!("https://example.com/{}/{{code}}", "p".repeat(1400)),
            ..Default::default()
        };
        let t = template(vec![FieldSpec::new(FieldKind::QrCode, 0.0, 0.0, 100.0, 100.0)]);
        assert!(resolve(&t, &record(None), &bitmap_fonts(), &config).is_err());
    }
}
