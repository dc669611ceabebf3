//! # Render Configuration
//!
//! Deployment-level settings that are injected into the renderer rather
//! than baked into it.
//!
//! ## Usage
//!
//! ```
//! use sello::config::{FontTable, RenderConfig};
//!
//! let config = RenderConfig::default();
//! assert!(config.verification_url.contains("{code}"));
//!
//! // A test or deployment can swap the whole font set.
//! let fonts = FontTable::empty().with_family("Arial", "/opt/fonts/Arial.ttf");
//! assert_eq!(fonts.families.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

const LIBERATION: &str = "/usr/share/fonts/truetype/liberation";
const DEJAVU: &str = "/usr/share/fonts/truetype/dejavu";
const CURSIVE: &str = "/usr/share/fonts/truetype/cursive";

/// Placeholder replaced by the record's unique code in the verification URL.
pub const CODE_PLACEHOLDER: &str = "{code}";

/// # Font Table
///
/// Maps logical family names (as a template editor names them) to font
/// files, plus the ordered fallback list tried when a family is unknown or
/// its file does not load.
///
/// The table is immutable once handed to a
/// [`FontResolver`](crate::fonts::FontResolver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontTable {
    /// Family name → font file
    pub families: BTreeMap<String, PathBuf>,
    /// Tried in order after the family entry fails
    pub fallbacks: Vec<PathBuf>,
}

impl FontTable {
    /// A table with no families and no fallbacks.
    ///
    /// Every lookup against it lands on the built-in bitmap font.
    pub fn empty() -> Self {
        Self {
            families: BTreeMap::new(),
            fallbacks: Vec::new(),
        }
    }

    /// Add or replace a family entry.
    pub fn with_family(mut self, family: &str, path: impl Into<PathBuf>) -> Self {
        self.families.insert(family.to_string(), path.into());
        self
    }

    /// Append a fallback font file.
    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallbacks.push(path.into());
        self
    }

    /// Every distinct file the table can reference.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.families.values().chain(self.fallbacks.iter())
    }
}

impl Default for FontTable {
    /// Common system sans/serif/mono families mapped onto the Liberation and
    /// DejaVu sets, plus the bundled script families.
    fn default() -> Self {
        let liberation = |file: &str| Path::new(LIBERATION).join(file);
        let dejavu = |file: &str| Path::new(DEJAVU).join(file);
        let cursive = |file: &str| Path::new(CURSIVE).join(file);

        let sans = liberation("LiberationSans-Regular.ttf");
        let serif = liberation("LiberationSerif-Regular.ttf");
        let mono = liberation("LiberationMono-Regular.ttf");
        let dejavu_sans = dejavu("DejaVuSans.ttf");

        let entries = [
            ("Arial", sans.clone()),
            ("Helvetica", sans.clone()),
            ("Times New Roman", serif.clone()),
            ("Georgia", serif.clone()),
            ("Courier New", mono),
            ("Verdana", dejavu_sans.clone()),
            ("Palatino", serif.clone()),
            ("Garamond", serif.clone()),
            ("Bookman", serif),
            ("Comic Sans MS", dejavu_sans.clone()),
            ("Trebuchet MS", dejavu_sans.clone()),
            ("Impact", dejavu("DejaVuSans-Bold.ttf")),
            ("Dancing Script", cursive("DancingScript.ttf")),
            ("Great Vibes", cursive("GreatVibes.ttf")),
            ("Parisienne", cursive("Parisienne.ttf")),
            ("Allura", cursive("Allura.ttf")),
        ];

        Self {
            families: entries
                .into_iter()
                .map(|(name, path)| (name.to_string(), path))
                .collect(),
            fallbacks: vec![dejavu_sans, sans],
        }
    }
}

/// # Page Setup
///
/// Physical page used by the [`pages`](crate::pages) assembler. All
/// dimensions are millimetres.
///
/// ```text
/// ┌──────────────── width_mm ────────────────┐
/// │ margin                                   │
/// │   ┌────── available width ──────────┐    │
/// │   │  image scaled uniformly and      │    │
/// │   │  centered in this box            │    │
/// │   └──────────────────────────────────┘    │
/// └──────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSetup {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageSetup {
    /// A4 landscape with a 10mm margin.
    pub const A4_LANDSCAPE: PageSetup = PageSetup {
        width_mm: 297.0,
        height_mm: 210.0,
        margin_mm: 10.0,
    };

    /// Width left for the image once margins are removed.
    pub fn available_width(&self) -> f32 {
        (self.width_mm - 2.0 * self.margin_mm).max(0.0)
    }

    /// Height left for the image once margins are removed.
    pub fn available_height(&self) -> f32 {
        (self.height_mm - 2.0 * self.margin_mm).max(0.0)
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::A4_LANDSCAPE
    }
}

/// # Render Configuration
///
/// Everything the renderer needs besides the template and the record.
/// Every field has a default, so a config file only names what it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Verification URL embedded in QR fields; `{code}` is replaced by the
    /// record's unique code.
    pub verification_url: String,
    /// `chrono` format string used by date fields.
    pub date_format: String,
    pub page: PageSetup,
    pub fonts: FontTable,
}

impl RenderConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Build the verification URL for a unique code.
    pub fn verification_url_for(&self, code: &str) -> String {
        self.verification_url.replace(CODE_PLACEHOLDER, code)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            verification_url: "https://certificates.example.com/verify/{code}".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            page: PageSetup::default(),
            fonts: FontTable::default(),
        }
    }
}
