//! Glyph source with multi-font fallback
//!
//! The platform hands us raw TTF bytes for up to three logical slots: a
//! script-specific local font, an extension font carrying icon glyphs in
//! the private-use area, and an always-present standard font. Glyphs are
//! rasterized per call to an 8-bit coverage bitmap; nothing is cached.
//!
//! Sizes are requested as *visible* heights: the scale is chosen so a
//! capital letter's bounding box maps to the requested pixel height. Raw
//! font units differ wildly between fallback fonts, and naive pixel-height
//! scaling makes the same string jump in size whenever the font changes
//! mid-run.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use log::debug;

/// When the capital-letter box cannot be measured, approximate cap height
/// as this fraction of the font's ascent.
const CAP_HEIGHT_ASCENT_RATIO: f32 = 0.7;

/// A rasterized glyph: one coverage byte per pixel plus placement metrics.
///
/// `x_offset`/`y_offset` position the bitmap's top-left corner relative to
/// the pen on the baseline; `advance` is the pen movement after the glyph.
/// Produced per call and simply dropped by the caller when done.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub coverage: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub x_offset: i32,
    pub y_offset: i32,
    pub advance: i32,
}

/// Owns the loaded font slots and all glyph rasterization.
///
/// Constructed once at startup and passed by reference into the text
/// layout engine; there is no hidden global font state.
pub struct FontContext {
    standard: Font,
    local: Option<Font>,
    extension: Option<Font>,
}

impl FontContext {
    /// Build from raw font bytes. The standard slot is mandatory; the
    /// local and extension slots are used only if their font contains the
    /// requested glyph.
    pub fn from_slots(
        standard: &[u8],
        local: Option<&[u8]>,
        extension: Option<&[u8]>,
    ) -> Result<Self> {
        let load = |data: &[u8], slot: &str| -> Result<Font> {
            Font::from_bytes(data, FontSettings::default())
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("failed to parse {} font", slot))
        };

        let standard = load(standard, "standard")?;
        let local = local.map(|data| load(data, "local")).transpose()?;
        let extension = extension.map(|data| load(data, "extension")).transpose()?;

        debug!(
            "font slots loaded: standard, local={}, extension={}",
            local.is_some(),
            extension.is_some()
        );

        Ok(Self {
            standard,
            local,
            extension,
        })
    }

    /// Fallback order: local font, then extension font, then standard.
    /// The first two only win if they actually carry the glyph.
    fn pick(&self, ch: char) -> &Font {
        if let Some(local) = &self.local {
            if local.lookup_glyph_index(ch) != 0 {
                return local;
            }
        }
        if let Some(ext) = &self.extension {
            if ext.lookup_glyph_index(ch) != 0 {
                return ext;
            }
        }
        &self.standard
    }

    /// Rasterization size (in px) at which `font`'s cap height equals the
    /// requested visible height.
    fn scaled_px(font: &Font, visible_height: f32) -> f32 {
        let probe = font.metrics('H', visible_height);
        let cap_height = if probe.height > 0 {
            probe.height as f32
        } else {
            font.horizontal_line_metrics(visible_height)
                .map(|lm| lm.ascent * CAP_HEIGHT_ASCENT_RATIO)
                .unwrap_or(visible_height)
        };
        visible_height * (visible_height / cap_height)
    }

    /// Rasterize one code point at a visible height. Returns `None` for
    /// code points outside the Unicode scalar range; invisible glyphs such
    /// as the space come back with an empty bitmap but a real advance.
    pub fn rasterize(&self, codepoint: u32, visible_height: f32) -> Option<GlyphBitmap> {
        let ch = char::from_u32(codepoint)?;
        let font = self.pick(ch);
        let px = Self::scaled_px(font, visible_height);

        let (metrics, coverage) = font.rasterize(ch, px);
        Some(GlyphBitmap {
            coverage,
            width: metrics.width,
            height: metrics.height,
            // fontdue reports the bitmap's bottom edge relative to the
            // baseline with y pointing up; the compositor's y points down.
            x_offset: metrics.xmin,
            y_offset: -(metrics.ymin + metrics.height as i32),
            advance: metrics.advance_width as i32,
        })
    }

    /// Offset from a box's vertical center down to the baseline that
    /// visually centers text, derived from the standard font's ascent and
    /// descent at the cap-height-corrected size.
    pub fn centered_baseline_offset(&self, visible_height: f32) -> f32 {
        let px = Self::scaled_px(&self.standard, visible_height);
        match self.standard.horizontal_line_metrics(px) {
            // descent is negative; the midpoint of [descent, ascent] sits
            // above the baseline by (ascent + descent) / 2.
            Some(lm) => (lm.ascent + lm.descent) / 2.0,
            None => 0.0,
        }
    }
}
