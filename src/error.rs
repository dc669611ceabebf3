//! # Error Types
//!
//! This module defines the error type shared by every stage of the
//! certificate pipeline.
//!
//! ## Scope of each variant
//!
//! | Variant | Fatal to |
//! |---------|----------|
//! | `Capacity` | one record's render |
//! | `Background` | one record's render |
//! | `Sheet` | the whole batch call |
//! | `EmptyDocument` | the assemble call |
//!
//! Font loading has no variant: the resolver always degrades to the
//! built-in bitmap font instead of failing.

use thiserror::Error;

/// Main error type for sello operations
#[derive(Debug, Error)]
pub enum SelloError {
    /// QR payload does not fit any symbol version at the configured
    /// error-correction level
    #[error("QR capacity exceeded: {0}")]
    Capacity(String),

    /// Background image could not be read or decoded
    #[error("Background error: {0}")]
    Background(String),

    /// Spreadsheet could not be parsed as tabular data
    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    /// Page assembly was asked for a document with no pages
    #[error("Cannot assemble a document from zero images")]
    EmptyDocument,

    /// Template failed validation
    #[error("Invalid template: {0}")]
    Template(String),

    /// PDF writer error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SelloError>;
