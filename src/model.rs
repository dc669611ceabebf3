//! # Data Model
//!
//! Templates, field specs and records as exchanged with the collaborator
//! layer. Field names match the JSON the template editor produces, so a
//! stored template deserializes directly:
//!
//! ```
//! use sello::model::{Alignment, FieldKind, Template};
//!
//! let template: Template = serde_json::from_str(r##"{
//!     "name": "Course completion",
//!     "background": "completion.png",
//!     "width": 1754,
//!     "height": 1240,
//!     "fields": [
//!         {"field_type": "participant_name", "x": 200, "y": 540,
//!          "width": 1354, "height": 90, "font_family": "Great Vibes",
//!          "font_size": 72, "font_color": "#1a2b3c", "text_align": "center"},
//!         {"field_type": "qr_code", "x": 1480, "y": 960, "width": 200, "height": 200}
//!     ]
//! }"##).unwrap();
//!
//! assert_eq!(template.fields[0].align, Alignment::Center);
//! assert_eq!(template.fields[1].kind, FieldKind::QrCode);
//! assert_eq!(template.fields[1].font_family, "Arial");
//! ```

use chrono::{DateTime, SubsecRound, Timelike, Utc};
use image::RgbImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use uuid::Uuid;

use crate::compositor;
use crate::error::{Result, SelloError};
use crate::integrity::{self, UniqueCode};

/// What a template field displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    ParticipantName,
    DocumentId,
    CertifierName,
    RepresentativeName,
    #[serde(rename = "representative_name_2")]
    RepresentativeName2,
    #[serde(rename = "representative_name_3")]
    RepresentativeName3,
    #[serde(rename = "date")]
    IssueDate,
    UniqueCode,
    QrCode,
    EventName,
    CourseName,
}

impl FieldKind {
    /// Kinds that are left out of the render when the record has no value.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            FieldKind::RepresentativeName2
                | FieldKind::RepresentativeName3
                | FieldKind::EventName
                | FieldKind::CourseName
        )
    }
}

/// Horizontal text alignment within a field's box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Left edge of a run `text_width` wide placed in the box
    /// `box_x..box_x + box_width`. Text wider than the box overhangs it.
    pub fn anchor_x(self, box_x: f32, box_width: f32, text_width: f32) -> f32 {
        match self {
            Alignment::Left => box_x,
            Alignment::Center => box_x + (box_width - text_width) / 2.0,
            Alignment::Right => box_x + box_width - text_width,
        }
    }
}

/// An RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Rgb::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", hex)))
    }
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    14
}

/// One positioned, styled field on a template.
///
/// Coordinates are in template canvas space. For QR fields `width` is the
/// edge length of the (square) code and the text styling is unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "field_type", alias = "kind")]
    pub kind: FieldKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub font_color: Rgb,
    #[serde(default, rename = "text_align", alias = "align")]
    pub align: Alignment,
}

impl FieldSpec {
    /// Unstyled field at a position, with the template editor's defaults.
    pub fn new(kind: FieldKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_color: Rgb::BLACK,
            align: Alignment::Left,
        }
    }
}

/// # Template
///
/// A background plus an ordered field list. Fields later in the list draw
/// over earlier ones where their boxes overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Background image file
    pub background: PathBuf,
    /// Canvas width in design units
    pub width: f32,
    /// Canvas height in design units
    pub height: f32,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl Template {
    /// Check the canvas is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(SelloError::Template(format!(
                "canvas must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Per-certificate data as supplied by the caller or a spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    pub participant_name: String,
    pub document_id: String,
    pub certifier_name: String,
    pub representative_name: String,
    #[serde(default)]
    pub representative_name_2: Option<String>,
    #[serde(default)]
    pub representative_name_3: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub template_id: String,
}

/// Batch-level values copied into every record of a spreadsheet import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFields {
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
}

impl SharedFields {
    /// Copy the shared values onto a record's fields.
    pub fn apply(&self, fields: &mut RecordFields) {
        fields.template_id = self.template_id.clone();
        fields.event_name = self.event_name.clone();
        fields.course_name = self.course_name.clone();
    }
}

/// # Record
///
/// An issued certificate's data. The unique code and issue date are fixed
/// at construction and the integrity hash is derived from them right away,
/// so a `Record` never exists without its hash.
///
/// The issue date is kept to microsecond precision. Its canonical text form
/// (see [`Record::issue_date_iso`]) is both what gets hashed and what gets
/// serialized as `issued_at`, so a stored record can be re-verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: String,
    unique_code: UniqueCode,
    #[serde(skip)]
    issued_at: DateTime<Utc>,
    #[serde(rename = "issued_at")]
    issue_date: String,
    hash: String,
    #[serde(flatten)]
    fields: RecordFields,
}

impl Record {
    /// Issue a new record now, with a fresh id and unique code.
    pub fn issue(fields: RecordFields) -> Self {
        Self::with_identity(
            fields,
            Uuid::new_v4().to_string(),
            UniqueCode::generate(),
            Utc::now(),
        )
    }

    /// Build a record with caller-fixed identity (re-renders, tests).
    pub fn with_identity(
        fields: RecordFields,
        id: impl Into<String>,
        unique_code: UniqueCode,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let issued_at = issued_at.trunc_subsecs(6);
        let issue_date = canonical_issue_date(issued_at);
        let hash = integrity::integrity_hash(
            unique_code.as_str(),
            &fields.participant_name,
            &fields.document_id,
            &issue_date,
        );

        Self {
            id: id.into(),
            unique_code,
            issued_at,
            issue_date,
            hash,
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn unique_code(&self) -> &UniqueCode {
        &self.unique_code
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The issue date exactly as hashed, e.g. `2024-03-01T09:30:00.250000+00:00`.
    pub fn issue_date_iso(&self) -> &str {
        &self.issue_date
    }

    /// SHA-256 integrity fingerprint (lowercase hex).
    pub fn integrity_hash(&self) -> &str {
        &self.hash
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }
}

/// ISO 8601 with an explicit `+00:00` offset. Microseconds are written only
/// when non-zero: `2024-03-01T09:30:00+00:00`, `2024-03-01T09:30:00.000250+00:00`.
fn canonical_issue_date(issued_at: DateTime<Utc>) -> String {
    if issued_at.nanosecond() == 0 {
        issued_at.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        issued_at.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

/// A rendered certificate, keyed by its record id.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub record_id: String,
    pub image: RgbImage,
}

impl RenderedArtifact {
    /// Encode the raster as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        compositor::encode_png(&self.image)
    }
}
