//! # Page Assembly
//!
//! Lays certificate rasters out into one multi-page PDF, one image per
//! page.
//!
//! ## Placement
//!
//! Every page has the same physical size ([`PageSetup`]). Each image is
//! scaled uniformly so it fits inside the margins, then centered:
//!
//! ```text
//! scale  = min(avail_w / img_w, avail_h / img_h)     (mm per pixel)
//! placed = (img_w * scale, img_h * scale)
//! offset = margin + (avail - placed) / 2             (per axis)
//! ```
//!
//! The aspect ratio is preserved exactly; the image touches the margin on
//! at least one axis.

use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, PdfLayerReference,
    Px,
};

use crate::config::PageSetup;
use crate::error::{Result, SelloError};

const MM_PER_INCH: f32 = 25.4;
const LAYER_NAME: &str = "Certificate";

/// Where one image lands on its page, in millimetres from the page's
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    /// Millimetres per image pixel
    pub scale: f32,
}

impl Placement {
    /// Fit an image of `width` × `height` pixels onto a page.
    pub fn fit(page: &PageSetup, width: u32, height: u32) -> Self {
        let avail_w = page.available_width();
        let avail_h = page.available_height();
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);

        let scale = (avail_w / w).min(avail_h / h);
        let width_mm = w * scale;
        let height_mm = h * scale;

        Self {
            x_mm: page.margin_mm + (avail_w - width_mm) / 2.0,
            y_mm: page.margin_mm + (avail_h - height_mm) / 2.0,
            width_mm,
            height_mm,
            scale,
        }
    }

    /// Resolution that renders the image at its placed size.
    pub fn dpi(&self) -> f32 {
        MM_PER_INCH / self.scale
    }
}

/// A finished multi-page document.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    /// Serialized PDF
    pub pdf: Vec<u8>,
    /// One placement per page, in input order
    pub placements: Vec<Placement>,
}

impl AssembledDocument {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }
}

/// Assemble `images` into a PDF, one page per image, in order.
///
/// Fails with [`SelloError::EmptyDocument`] when `images` is empty; no
/// document is produced in that case.
pub fn assemble(images: &[RgbImage], page: &PageSetup) -> Result<AssembledDocument> {
    let Some((first, rest)) = images.split_first() else {
        return Err(SelloError::EmptyDocument);
    };

    let page_w = Mm(page.width_mm);
    let page_h = Mm(page.height_mm);

    let (doc, first_page, first_layer) =
        PdfDocument::new("Certificates", page_w, page_h, LAYER_NAME);

    let mut placements = Vec::with_capacity(images.len());

    let layer = doc.get_page(first_page).get_layer(first_layer);
    placements.push(place_image(&layer, first, page));

    // A new page per remaining image; none after the last one.
    for image in rest {
        let (page_index, layer_index) = doc.add_page(page_w, page_h, LAYER_NAME);
        let layer = doc.get_page(page_index).get_layer(layer_index);
        placements.push(place_image(&layer, image, page));
    }

    let pdf = doc
        .save_to_bytes()
        .map_err(|e| SelloError::Pdf(e.to_string()))?;

    log::debug!("Assembled {} page PDF ({} bytes)", placements.len(), pdf.len());

    Ok(AssembledDocument { pdf, placements })
}

fn place_image(layer: &PdfLayerReference, image: &RgbImage, page: &PageSetup) -> Placement {
    let (width, height) = image.dimensions();
    let placement = Placement::fit(page, width, height);

    let xobject = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: image.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // PDF origin is bottom-left.
    let bottom_mm = page.height_mm - placement.y_mm - placement.height_mm;

    xobject.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placement.x_mm)),
            translate_y: Some(Mm(bottom_mm)),
            dpi: Some(placement.dpi()),
            ..Default::default()
        },
    );

    placement
}
