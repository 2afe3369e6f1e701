//! Text layout on top of the compositor and the glyph source
//!
//! Draws a UTF-8 string into a box with horizontal alignment and vertical
//! centering. Glyph coverage (8-bit) is quantized down to the surface's
//! 4-bit alpha and blended pixel by pixel, clipped to the destination box.

use crate::font::FontContext;
use crate::render::{Color, Compositor, Rect, CHANNEL_MAX};

/// Fixed spacing added after every non-space glyph, in pixels.
const GLYPH_SPACING: i32 = 3;

/// Horizontal alignment of a text run inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Decode the next code point from a UTF-8 byte stream, leniently.
///
/// Returns the code point and the number of bytes consumed. Continuation
/// bytes are not validated, and a malformed or truncated leading byte is
/// passed through as a literal one-byte code point. This is deliberately
/// non-conformant: mailbox text is untrusted and a garbled glyph beats a
/// dropped notification.
pub(crate) fn next_codepoint(bytes: &[u8]) -> (u32, usize) {
    let b0 = bytes[0] as u32;
    if b0 < 0x80 {
        (b0, 1)
    } else if b0 & 0xE0 == 0xC0 && bytes.len() >= 2 {
        (((b0 & 0x1F) << 6) | (bytes[1] as u32 & 0x3F), 2)
    } else if b0 & 0xF0 == 0xE0 && bytes.len() >= 3 {
        (
            ((b0 & 0x0F) << 12) | ((bytes[1] as u32 & 0x3F) << 6) | (bytes[2] as u32 & 0x3F),
            3,
        )
    } else if b0 & 0xF8 == 0xF0 && bytes.len() >= 4 {
        (
            ((b0 & 0x07) << 18)
                | ((bytes[1] as u32 & 0x3F) << 12)
                | ((bytes[2] as u32 & 0x3F) << 6)
                | (bytes[3] as u32 & 0x3F),
            4,
        )
    } else {
        (b0, 1)
    }
}

fn codepoints(text: &str) -> impl Iterator<Item = u32> + '_ {
    let bytes = text.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let (cp, consumed) = next_codepoint(&bytes[pos..]);
        pos += consumed;
        Some(cp)
    })
}

/// Measure the advance width of `text` at the given visible glyph height.
///
/// Space glyphs contribute their advance but no extra spacing; everything
/// else adds [`GLYPH_SPACING`] on top, matching `draw_text`.
pub fn measure_text(fonts: &FontContext, text: &str, size: f32) -> f32 {
    let mut width = 0.0;
    for cp in codepoints(text) {
        let Some(glyph) = fonts.rasterize(cp, size) else {
            continue;
        };
        let spacing = if cp == ' ' as u32 { 0 } else { GLYPH_SPACING };
        width += (glyph.advance + spacing) as f32;
    }
    width
}

impl Compositor {
    /// Draw `text` inside `rect`, horizontally aligned and vertically
    /// centered on the visual center of the glyphs. Pixels falling outside
    /// `rect` are dropped.
    pub fn draw_text(
        &mut self,
        fonts: &FontContext,
        text: &str,
        rect: Rect,
        size: f32,
        color: Color,
        align: TextAlign,
    ) {
        let text_width = measure_text(fonts, text, size);

        let start_x = match align {
            TextAlign::Left => rect.x,
            TextAlign::Right => rect.x + rect.w - text_width as i32,
            TextAlign::Center => rect.x + (rect.w - text_width as i32) / 2,
        };

        // Center on the visual middle of ascent/descent rather than the
        // box model, so mixed-script runs sit where the eye expects.
        let baseline_y = rect.y + rect.h / 2 + fonts.centered_baseline_offset(size) as i32;

        let mut cursor_x = start_x;
        for cp in codepoints(text) {
            let Some(glyph) = fonts.rasterize(cp, size) else {
                continue;
            };

            for by in 0..glyph.height as i32 {
                for bx in 0..glyph.width as i32 {
                    let px = cursor_x + bx + glyph.x_offset;
                    let py = baseline_y + by + glyph.y_offset;
                    if !rect.contains(px, py) {
                        continue;
                    }

                    let coverage = glyph.coverage[(by * glyph.width as i32 + bx) as usize];
                    if coverage == 0 {
                        continue;
                    }

                    // 8-bit coverage -> 4-bit alpha, scaled by the run color's
                    // own alpha.
                    let alpha = coverage / 17;
                    let mut text_color = color;
                    text_color.a = alpha * color.a / CHANNEL_MAX;
                    self.set_pixel_blend(px, py, text_color);
                }
            }

            let spacing = if cp == ' ' as u32 { 0 } else { GLYPH_SPACING };
            cursor_x += glyph.advance + spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii() {
        assert_eq!(next_codepoint(b"A"), (0x41, 1));
        assert_eq!(next_codepoint(b"Abc"), (0x41, 1));
    }

    #[test]
    fn test_decode_two_byte() {
        // U+00E9 LATIN SMALL LETTER E WITH ACUTE
        assert_eq!(next_codepoint("é".as_bytes()), (0xE9, 2));
    }

    #[test]
    fn test_decode_three_byte() {
        // U+4E2D CJK "middle"
        assert_eq!(next_codepoint("中".as_bytes()), (0x4E2D, 3));
        // Private-use icon range used by the extension font
        assert_eq!(next_codepoint("\u{E137}".as_bytes()), (0xE137, 3));
    }

    #[test]
    fn test_decode_four_byte() {
        // U+1F600
        assert_eq!(next_codepoint("😀".as_bytes()), (0x1F600, 4));
    }

    #[test]
    fn test_decode_malformed_byte_passes_through() {
        assert_eq!(next_codepoint(&[0xFF, 0x41]), (0xFF, 1));
        // Bare continuation byte
        assert_eq!(next_codepoint(&[0x80]), (0x80, 1));
    }

    #[test]
    fn test_decode_truncated_sequence_falls_back_to_literal() {
        // A 3-byte leader with only one byte left cannot be decoded as a
        // sequence; it degrades to a literal byte instead of reading past
        // the end.
        assert_eq!(next_codepoint(&[0xEE]), (0xEE, 1));
        assert_eq!(next_codepoint(&[0xF0, 0x9F]), (0xF0, 1));
    }

    #[test]
    fn test_codepoints_iterates_mixed_input() {
        let cps: Vec<u32> = codepoints("A中").collect();
        assert_eq!(cps, vec![0x41, 0x4E2D]);
    }
}
