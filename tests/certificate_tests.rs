//! # Certificate Pipeline Tests
//!
//! End-to-end checks across the public API: rendering determinism, QR
//! round-trips through a real decoder, spreadsheet ingestion from genuine
//! xlsx bytes and PDF assembly.
//!
//! Fonts come from the default table when the host has them installed and
//! fall back to the built-in bitmap font otherwise; none of the assertions
//! depend on which one is used.

use chrono::{TimeZone, Utc};
use image::GrayImage;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;

use sello::compositor;
use sello::config::{FontTable, RenderConfig};
use sello::integrity::UniqueCode;
use sello::layout::DrawInstruction;
use sello::model::{FieldKind, Record, RecordFields, Rgb, SharedFields, Template};
use sello::pipeline::{Renderer, RowResult};
use sello::{SelloError, batch, pages, qr};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const TEMPLATE_JSON: &str = r##"{
    "id": "tpl-course",
    "name": "Course completion",
    "background": "unused.png",
    "width": 1000,
    "height": 700,
    "fields": [
        {"field_type": "participant_name", "x": 100, "y": 200, "width": 600, "height": 60,
         "font_family": "Great Vibes", "font_size": 48, "font_color": "#1a2b3c", "text_align": "center"},
        {"field_type": "document_id", "x": 100, "y": 280, "width": 300, "height": 30},
        {"field_type": "certifier_name", "x": 100, "y": 420, "width": 250, "height": 30},
        {"field_type": "representative_name", "x": 450, "y": 420, "width": 250, "height": 30,
         "text_align": "right"},
        {"field_type": "representative_name_2", "x": 450, "y": 460, "width": 250, "height": 30,
         "text_align": "right"},
        {"field_type": "date", "x": 100, "y": 320, "width": 200, "height": 30},
        {"field_type": "unique_code", "x": 20, "y": 520, "width": 200, "height": 24,
         "font_family": "Courier New", "font_size": 16},
        {"field_type": "qr_code", "x": 740, "y": 440, "width": 245, "height": 245}
    ]
}"##;

fn course_template() -> Template {
    serde_json::from_str(TEMPLATE_JSON).unwrap()
}

fn background() -> image::RgbImage {
    compositor::blank_background(1000, 700, Rgb([250, 245, 230]))
}

fn fixed_record(representative_2: Option<&str>) -> Record {
    Record::with_identity(
        RecordFields {
            participant_name: "Ada Lovelace".to_string(),
            document_id: "DOC-0001".to_string(),
            certifier_name: "Charles Babbage".to_string(),
            representative_name: "Mary Somerville".to_string(),
            representative_name_2: representative_2.map(str::to_string),
            ..Default::default()
        },
        "rec-0001",
        UniqueCode::new("AB12CD34"),
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
    )
}

/// Decode every QR symbol found in a grayscale image.
fn decode_qr(image: &GrayImage) -> Vec<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32)[0],
    );
    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| grid.decode().ok().map(|(_, content)| content))
        .collect()
}

fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

const HEADER: &[&str] = &[
    "Participant",
    "Document",
    "Certifier",
    "Representative",
    "Representative 2",
];

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn test_render_is_deterministic() {
    let renderer = Renderer::default();
    let template = course_template();
    let bg = background();
    let record = fixed_record(Some("Caroline Herschel"));

    let first = renderer.render(&template, &bg, &record).unwrap().to_png().unwrap();
    let second = renderer.render(&template, &bg, &record).unwrap().to_png().unwrap();

    assert!(first == second, "identical inputs produced different PNG bytes");
}

#[test]
fn test_render_changes_background() {
    let renderer = Renderer::default();
    let bg = background();
    let artifact = renderer
        .render(&course_template(), &bg, &fixed_record(None))
        .unwrap();

    assert_eq!(artifact.image.dimensions(), bg.dimensions());
    assert!(artifact.image != bg);
}

#[test]
fn test_embedded_qr_decodes_to_verification_url() {
    let renderer = Renderer::default();
    let artifact = renderer
        .render(&course_template(), &background(), &fixed_record(None))
        .unwrap();

    let gray = image::DynamicImage::ImageRgb8(artifact.image).to_luma8();
    assert_eq!(
        decode_qr(&gray),
        vec!["https://certificates.example.com/verify/AB12CD34".to_string()]
    );
}

#[test]
fn test_secondary_representative_visibility() {
    let renderer = Renderer::default();
    let template = course_template();

    let count = |record: &Record| {
        renderer
            .instructions(&template, record)
            .unwrap()
            .iter()
            .filter(|i| i.kind() == FieldKind::RepresentativeName2)
            .count()
    };

    assert_eq!(count(&fixed_record(None)), 0);
    assert_eq!(count(&fixed_record(Some(""))), 0);
    assert_eq!(count(&fixed_record(Some("Caroline Herschel"))), 1);
}

#[test]
fn test_text_anchor_respects_measured_width() {
    let renderer = Renderer::default();
    let template = course_template();
    let instructions = renderer.instructions(&template, &fixed_record(None)).unwrap();

    let DrawInstruction::Text { x, glyphs, text, .. } = &instructions[0] else {
        panic!("participant name should be a text run");
    };
    let width = glyphs.measure(text).width;
    // Centered in the 600-wide box starting at x=100.
    assert!((x + width / 2.0 - 400.0).abs() < 0.01);
}

#[test]
fn test_nonexistent_font_family_still_renders() {
    let renderer = Renderer::new(RenderConfig {
        fonts: FontTable::empty()
            .with_family("Fancy", "/nonexistent/fancy.ttf")
            .with_fallback("/nonexistent/fallback.ttf"),
        ..Default::default()
    });
    let mut template = course_template();
    for field in &mut template.fields {
        field.font_family = "Fancy".to_string();
    }

    let artifact = renderer.render(&template, &background(), &fixed_record(None));
    assert!(artifact.is_ok());

    let source = renderer.fonts().resolve("Definitely Not A Font", 30);
    assert!(source.measure("Ada").width > 0.0);
}

// ============================================================================
// QR ROUND TRIPS
// ============================================================================

#[test]
fn test_qr_round_trip_short_url() {
    let payload = "https://e.co/v/AB12CD34";
    let img = qr::encode(payload, 300).unwrap();
    assert_eq!(decode_qr(&img), vec![payload.to_string()]);
}

#[test]
fn test_qr_round_trip_near_capacity() {
    let prefix = "https://certificates.example.com/verify/";
    let payload = format!("{}{}", prefix, "a".repeat(1200 - prefix.len()));
    assert_eq!(payload.len(), 1200);

    let img = qr::encode(&payload, 1850).unwrap();
    assert_eq!(decode_qr(&img), vec![payload]);
}

#[test]
fn test_qr_over_capacity() {
    let payload = "z".repeat(2000);
    assert!(matches!(qr::encode(&payload, 300), Err(SelloError::Capacity(_))));
}

// ============================================================================
// BATCH EXTRACTION
// ============================================================================

#[test]
fn test_xlsx_blank_row_skipped() {
    let bytes = xlsx(&[
        HEADER,
        &["Ada Lovelace", "D-1", "Babbage", "Somerville"],
        &["", "D-2", "Babbage", "Somerville"],
        &["Grace Hopper", "D-3", "Babbage", "Somerville", "Herschel"],
        &["Edsger Dijkstra", "D-4", "Babbage", "Somerville"],
    ]);

    let out = batch::extract(&bytes, &SharedFields::default()).unwrap();

    let names: Vec<&str> = out
        .records
        .iter()
        .map(|r| r.fields().participant_name.as_str())
        .collect();
    assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper", "Edsger Dijkstra"]);
    assert_eq!(out.accepted, 3);
    assert_eq!(out.skipped, 1);
    assert_eq!(
        out.records[1].fields().representative_name_2.as_deref(),
        Some("Herschel")
    );
    assert_eq!(out.records[0].fields().representative_name_2, None);
}

#[test]
fn test_xlsx_whitespace_name_is_blank() {
    let bytes = xlsx(&[
        HEADER,
        &["   ", "D-1", "Babbage", "Somerville"],
        &["  Grace Hopper ", "D-2", "Babbage", "Somerville"],
    ]);

    let out = batch::extract(&bytes, &SharedFields::default()).unwrap();
    assert_eq!(out.skipped, 1);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].fields().participant_name, "Grace Hopper");
}

#[test]
fn test_xlsx_reads_first_sheet_not_active() {
    let mut workbook = Workbook::new();
    let first = workbook.add_worksheet();
    first.write_string(0, 0, "Participant").unwrap();
    first.write_string(1, 0, "Ada Lovelace").unwrap();
    let second = workbook.add_worksheet();
    second.write_string(0, 0, "Participant").unwrap();
    second.write_string(1, 0, "Grace Hopper").unwrap();
    second.set_active(true);
    let bytes = workbook.save_to_buffer().unwrap();

    let out = batch::extract(&bytes, &SharedFields::default()).unwrap();
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].fields().participant_name, "Ada Lovelace");
}

#[test]
fn test_xlsx_header_only() {
    let bytes = xlsx(&[HEADER]);
    let out = batch::extract(&bytes, &SharedFields::default()).unwrap();
    assert_eq!(out.accepted, 0);
    assert!(out.records.is_empty());
}

#[test]
fn test_xlsx_numeric_cells() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Participant").unwrap();
    worksheet.write_string(1, 0, "Ada").unwrap();
    worksheet.write_number(1, 1, 1042.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let out = batch::extract(&bytes, &SharedFields::default()).unwrap();
    assert_eq!(out.records[0].fields().document_id, "1042");
}

#[test]
fn test_corrupt_sheet_fails_batch() {
    let renderer = Renderer::default();
    let result = renderer.render_sheet(
        &course_template(),
        &background(),
        b"PK\x03\x04 truncated zip",
        &SharedFields::default(),
    );
    assert!(matches!(result, Err(SelloError::Sheet(_))));
}

// ============================================================================
// FULL BATCH + DOCUMENT
// ============================================================================

#[test]
fn test_sheet_to_pdf() {
    let renderer = Renderer::default();
    let template = course_template();
    let bytes = xlsx(&[
        HEADER,
        &["Ada Lovelace", "D-1", "Babbage", "Somerville"],
        &["Grace Hopper", "D-2", "Babbage", "Somerville", "Herschel"],
        &["", "", "", ""],
        &["Edsger Dijkstra", "D-3", "Babbage", "Somerville"],
    ]);
    let shared = SharedFields {
        template_id: template.id.clone(),
        event_name: Some("Summit".to_string()),
        course_name: None,
    };

    let report = renderer
        .render_sheet(&template, &background(), &bytes, &shared)
        .unwrap();

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.failed(), 0);
    for (record, result) in report.iter() {
        assert_eq!(result.record_id(), record.id());
        assert_eq!(record.fields().template_id, "tpl-course");
        assert!(matches!(result, RowResult::Rendered(_)));
    }

    let document = renderer.assemble(report.artifacts()).unwrap();
    assert_eq!(document.page_count(), 3);
    assert!(document.pdf.starts_with(b"%PDF"));
}

#[test]
fn test_assemble_preserves_aspect_ratio() {
    let images = vec![
        compositor::blank_background(1600, 1100, Rgb([255, 255, 255])),
        compositor::blank_background(900, 1400, Rgb([255, 255, 255])),
    ];
    let document = pages::assemble(&images, &RenderConfig::default().page).unwrap();

    for (image, placement) in images.iter().zip(&document.placements) {
        let source = image.width() as f32 / image.height() as f32;
        let placed = placement.width_mm / placement.height_mm;
        assert!((source - placed).abs() < 1e-3);
    }
}

#[test]
fn test_assemble_nothing() {
    let result = pages::assemble(&[], &RenderConfig::default().page);
    assert!(matches!(result, Err(SelloError::EmptyDocument)));
}
