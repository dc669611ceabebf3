//! # QR Verification Codes
//!
//! Encodes a payload (normally the certificate's verification URL) into a
//! square black-on-white QR raster.
//!
//! Error correction is fixed at level H (~30% of the symbol can be damaged)
//! so the code still scans when printed small or partly covered by other
//! fields. The smallest symbol version that fits is chosen automatically.
//!
//! ```
//! let qr = sello::qr::encode("https://example.com/verify/AB12CD34", 200).unwrap();
//! assert_eq!(qr.dimensions(), (200, 200));
//! ```

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

use crate::error::{Result, SelloError};

/// Pixels per module in the natural-resolution symbol.
pub const MODULE_PIXELS: u32 = 10;

/// Light modules surrounding the symbol on each side.
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Encode `payload` and resample it to `edge_pixels` × `edge_pixels`.
///
/// Fails with [`SelloError::Capacity`] when the payload does not fit even
/// the largest symbol at level H. Never truncates.
pub fn encode(payload: &str, edge_pixels: u32) -> Result<GrayImage> {
    let natural = encode_natural(payload)?;
    let edge = edge_pixels.max(1);

    if natural.width() == edge {
        return Ok(natural);
    }
    Ok(imageops::resize(&natural, edge, edge, FilterType::Lanczos3))
}

/// Encode `payload` at its natural module resolution, quiet zone included.
pub fn encode_natural(payload: &str) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| capacity_error(payload, e))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS;

    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));

    for qy in 0..modules {
        for qx in 0..modules {
            if colors[(qy * modules + qx) as usize] != Color::Dark {
                continue;
            }
            let start_x = (qx + QUIET_ZONE_MODULES) * MODULE_PIXELS;
            let start_y = (qy + QUIET_ZONE_MODULES) * MODULE_PIXELS;
            for cy in 0..MODULE_PIXELS {
                for cx in 0..MODULE_PIXELS {
                    img.put_pixel(start_x + cx, start_y + cy, Luma([0u8]));
                }
            }
        }
    }

    Ok(img)
}

fn capacity_error(payload: &str, error: QrError) -> SelloError {
    match error {
        QrError::DataTooLong => SelloError::Capacity(format!(
            "{} byte payload exceeds QR version 40 at error level H",
            payload.len()
        )),
        other => SelloError::Capacity(format!("QR code generation failed: {}", other)),
    }
}
