//! # Image Compositor
//!
//! Paints resolved draw instructions onto a template background.
//!
//! ## Coordinate spaces
//!
//! Field positions live in template canvas space. The background keeps its
//! native pixel resolution, so every coordinate is mapped on the way in:
//!
//! ```text
//! sx = background.width  / template.width
//! sy = background.height / template.height
//! native = (canvas.x * sx, canvas.y * sy)
//! ```
//!
//! Text glyphs are stretched by the same factors. QR rasters stay square
//! and use the smaller factor. When the canvas matches the background
//! (the usual case) the mapping is the identity.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageEncoder, Rgb as Pixel, RgbImage};
use std::path::Path;

use crate::error::{Result, SelloError};
use crate::layout::DrawInstruction;
use crate::model::{Rgb, Template};

/// Canvas-space to background-pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub sx: f32,
    pub sy: f32,
}

impl CanvasTransform {
    pub fn for_template(template: &Template, background: &RgbImage) -> Self {
        Self {
            sx: background.width() as f32 / template.width,
            sy: background.height() as f32 / template.height,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.sx == 1.0 && self.sy == 1.0
    }

    fn point(&self, x: f32, y: f32) -> (i64, i64) {
        ((x * self.sx).round() as i64, (y * self.sy).round() as i64)
    }

    fn square_edge(&self, edge: f32) -> u32 {
        (edge * self.sx.min(self.sy)).round().max(1.0) as u32
    }
}

/// Decode background bytes into an opaque RGB raster. Alpha is discarded.
pub fn decode_background(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| SelloError::Background(format!("Failed to decode image: {}", e)))?;
    Ok(image.to_rgb8())
}

/// Read and decode a background image file.
pub fn load_background(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| SelloError::Background(format!("Failed to read {}: {}", path.display(), e)))?;
    decode_background(&bytes)
}

/// Composite `instructions`, in order, over a copy of `background`.
///
/// The result has the background's native resolution.
pub fn render(
    template: &Template,
    background: &RgbImage,
    instructions: &[DrawInstruction],
) -> RgbImage {
    let transform = CanvasTransform::for_template(template, background);
    let mut canvas = background.clone();

    for instruction in instructions {
        match instruction {
            DrawInstruction::Text {
                text,
                glyphs,
                color,
                x,
                y,
                box_x,
                box_width,
                align,
                ..
            } => {
                let (glyphs, origin_x, origin_y) = if transform.is_identity() {
                    let (origin_x, origin_y) = transform.point(*x, *y);
                    (glyphs.clone(), origin_x, origin_y)
                } else {
                    // Re-anchor against the drawn width; the bitmap font
                    // does not stretch with the canvas.
                    let glyphs = glyphs.scaled(transform.sx, transform.sy);
                    let (native_box_x, origin_y) = transform.point(*box_x, *y);
                    let anchor = align.anchor_x(
                        native_box_x as f32,
                        box_width * transform.sx,
                        glyphs.measure(text).width,
                    );
                    (glyphs, anchor.round() as i64, origin_y)
                };

                glyphs.draw(text, |gx, gy, coverage| {
                    blend_pixel(
                        &mut canvas,
                        origin_x + gx as i64,
                        origin_y + gy as i64,
                        *color,
                        coverage,
                    );
                });
            }
            DrawInstruction::Raster {
                image, x, y, edge, ..
            } => {
                let target = transform.square_edge(*edge);
                let (origin_x, origin_y) = transform.point(*x, *y);

                let insert = if image.width() == target && image.height() == target {
                    DynamicImage::ImageLuma8(image.clone()).to_rgb8()
                } else {
                    let resized = imageops::resize(image, target, target, FilterType::Lanczos3);
                    DynamicImage::ImageLuma8(resized).to_rgb8()
                };

                imageops::replace(&mut canvas, &insert, origin_x, origin_y);
            }
        }
    }

    canvas
}

/// Blend `color` over one pixel with the given coverage. Out-of-bounds
/// pixels are clipped.
fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage == 0.0 {
        return;
    }

    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        let mixed = *dst as f32 * (1.0 - coverage) + src as f32 * coverage;
        *dst = mixed.round().clamp(0.0, 255.0) as u8;
    }
}

/// Encode an RGB raster as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e: image::ImageError| SelloError::Image(e.to_string()))?;

    Ok(png_bytes)
}

/// Solid-color raster, handy as a plain background.
pub fn blank_background(width: u32, height: u32, color: Rgb) -> RgbImage {
    RgbImage::from_pixel(width, height, Pixel(color.0))
}
