//! # Sello - Certificate Rendering Core
//!
//! Sello stamps participant data onto certificate templates. It provides:
//!
//! - **Field layout**: template fields resolved against a record, with text
//!   alignment measured on the same glyphs that get drawn
//! - **Compositing**: text and QR codes painted over the template background
//! - **Verification**: SHA-256 integrity hashes and QR verification URLs
//! - **Batches**: spreadsheet rows turned into records and rendered in parallel
//! - **Documents**: any number of certificates assembled into one PDF
//!
//! ## Quick Start
//!
//! ```no_run
//! use sello::{
//!     compositor,
//!     model::{Record, RecordFields, Template},
//!     pipeline::Renderer,
//! };
//!
//! let template: Template = serde_json::from_str(&std::fs::read_to_string("template.json")?)?;
//! let background = compositor::load_background(&template.background)?;
//!
//! let record = Record::issue(RecordFields {
//!     participant_name: "Ada Lovelace".into(),
//!     document_id: "DOC-0001".into(),
//!     certifier_name: "Charles Babbage".into(),
//!     representative_name: "Mary Somerville".into(),
//!     ..Default::default()
//! });
//!
//! let renderer = Renderer::default();
//! let artifact = renderer.render(&template, &background, &record)?;
//! std::fs::write("certificate.png", artifact.to_png()?)?;
//! println!("hash: {}", record.integrity_hash());
//!
//! # Ok::<(), sello::error::SelloError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Templates, fields, records, artifacts |
//! | [`fonts`] | Font resolution with fallback chain |
//! | [`integrity`] | Integrity hashes and unique codes |
//! | [`qr`] | QR verification codes |
//! | [`layout`] | Field → draw instruction resolution |
//! | [`compositor`] | Raster compositing and PNG output |
//! | [`pages`] | Multi-page PDF assembly |
//! | [`batch`] | Spreadsheet record extraction |
//! | [`pipeline`] | Single and batch rendering |
//! | [`config`] | Font table and render settings |
//! | [`error`] | Error types |

pub mod batch;
pub mod compositor;
pub mod config;
pub mod error;
pub mod fonts;
pub mod integrity;
pub mod layout;
pub mod model;
pub mod pages;
pub mod pipeline;
pub mod qr;

// Re-exports for convenience
pub use config::RenderConfig;
pub use error::SelloError;
pub use pipeline::Renderer;
