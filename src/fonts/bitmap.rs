//! Built-in bitmap font, the last resort of the font fallback chain.
//!
//! Uses the Spleen 12×24 PSF2 font compiled into the binary, so it is
//! always available regardless of what is installed on the host. It has a
//! single fixed size; requested sizes are ignored.

use spleen_font::{FONT_12X24, PSF2Font};

/// Width of every glyph cell in pixels.
pub const GLYPH_WIDTH: usize = 12;

/// Height of every glyph cell in pixels.
pub const GLYPH_HEIGHT: usize = 24;

/// Generate a glyph bitmap for a character.
///
/// Returns `GLYPH_WIDTH * GLYPH_HEIGHT` bytes, row-major, where each byte is
/// 0 (background) or 1 (ink). Characters missing from Spleen render as a
/// box outline.
pub fn generate_glyph(ch: char) -> Vec<u8> {
    let mut glyph = vec![0u8; GLYPH_WIDTH * GLYPH_HEIGHT];

    let Ok(mut spleen) = PSF2Font::new(FONT_12X24) else {
        draw_box(&mut glyph, GLYPH_WIDTH, GLYPH_HEIGHT);
        return glyph;
    };

    let utf8_bytes = ch.to_string();
    match spleen.glyph_for_utf8(utf8_bytes.as_bytes()) {
        Some(spleen_glyph) => {
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if col_x >= GLYPH_WIDTH {
                        continue;
                    }
                    let idx = row_y * GLYPH_WIDTH + col_x;
                    if idx < glyph.len() {
                        glyph[idx] = if on { 1 } else { 0 };
                    }
                }
            }
        }
        None => draw_box(&mut glyph, GLYPH_WIDTH, GLYPH_HEIGHT),
    }

    glyph
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}
