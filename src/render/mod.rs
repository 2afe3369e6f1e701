//! Software compositor for the overlay surface
//!
//! Owns the RGBA4444 pixel buffer in the block-linear layout the display
//! hardware consumes, and provides the drawing primitives everything else
//! is built on: pixel set/blend, filled and rounded rectangles, a scissor
//! region, and full-surface clear.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

mod text;

pub use text::{measure_text, TextAlign};

/// Pixels per block-linear macro-block edge. Surface widths must be a
/// multiple of 32 so every gob row is fully populated.
pub const WIDTH_ALIGN: u32 = 32;

/// One color channel is 4 bits; 15 is fully opaque / full intensity.
pub const CHANNEL_MAX: u8 = 15;

/// RGBA color with 4-bit channels (each 0-15), packed to 16 bits on the
/// surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack to the RGBA4444 wire format.
    pub fn to_u16(self) -> u16 {
        (self.r as u16 & 0xF)
            | ((self.g as u16 & 0xF) << 4)
            | ((self.b as u16 & 0xF) << 8)
            | ((self.a as u16 & 0xF) << 12)
    }

    /// Unpack from the RGBA4444 wire format.
    pub fn from_u16(raw: u16) -> Self {
        Self {
            r: (raw & 0xF) as u8,
            g: ((raw >> 4) & 0xF) as u8,
            b: ((raw >> 8) & 0xF) as u8,
            a: ((raw >> 12) & 0xF) as u8,
        }
    }

    /// With an alpha of `a`, return how much of the destination channel
    /// `dst` shows over the existing channel `src`, rounded to the nearest
    /// 4-bit step.
    fn blend_channel(src: u8, dst: u8, alpha: u8) -> u8 {
        let one_minus = CHANNEL_MAX - alpha;
        let num = dst as u16 * alpha as u16 + src as u16 * one_minus as u16;
        ((num + 7) / 15) as u8
    }
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// Which corner pairs of a rounded rectangle are actually rounded.
///
/// The partial variants are used when the panel background is sliced into
/// a top highlight strip and a bottom shadow strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundedPart {
    All,
    Top,
    Bottom,
}

/// Map surface coordinates to a u16 offset in the block-linear layout.
///
/// The surface is partitioned into 16x16-pixel blocks grouped into gobs of
/// 32x16 pixels; gob rows stride by a width-derived count, and pixels are
/// bit-interleaved within each gob. The display hardware expects exactly
/// this layout, so the formula must not be "simplified".
pub fn pixel_offset(x: u32, y: u32, width: u32) -> u32 {
    let mut pos = ((y & 127) / 16) + (x / 32) * 8 + (y / 16 / 8) * ((width / 2) / 16 * 8);
    pos *= 16 * 16 * 4;
    pos += ((y % 16) / 8) * 512
        + ((x % 32) / 16) * 256
        + ((y % 8) / 2) * 64
        + ((x % 16) / 8) * 32
        + (y % 2) * 16
        + (x % 8) * 2;
    pos / 2
}

/// Size in u16 units of a block-linear buffer holding a `width` x `height`
/// surface. Heights are padded to whole 128-row bands; the padding rows are
/// never addressed.
pub fn buffer_len(width: u32, height: u32) -> usize {
    let bands = height.div_ceil(128) as usize;
    let gobs_per_band = (width / 32 * 8) as usize;
    bands * gobs_per_band * 512
}

/// The software compositor. One instance per overlay surface.
pub struct Compositor {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
    scissor: Option<Rect>,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width % WIDTH_ALIGN == 0,
            "surface width {} is not a multiple of {}",
            width,
            WIDTH_ALIGN
        );
        ensure!(width > 0 && height > 0, "surface dimensions must be non-zero");
        Ok(Self {
            width,
            height,
            pixels: vec![0; buffer_len(width, height)],
            scissor: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw block-linear buffer, as handed to `Surface::present`.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Restrict all subsequent pixel writes to `rect`. At most one region
    /// is active at a time; enabling replaces any previous region.
    pub fn enable_scissor(&mut self, rect: Rect) {
        self.scissor = Some(rect);
    }

    pub fn disable_scissor(&mut self) {
        self.scissor = None;
    }

    fn writable(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        match self.scissor {
            Some(rect) => rect.contains(x, y),
            None => true,
        }
    }

    /// Read back a pixel. Out-of-bounds reads are transparent.
    pub fn pixel_at(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Color::TRANSPARENT;
        }
        let offset = pixel_offset(x as u32, y as u32, self.width) as usize;
        Color::from_u16(self.pixels[offset])
    }

    /// Write a pixel directly, without blending. Bounds- and clip-checked.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if !self.writable(x, y) {
            return;
        }
        let offset = pixel_offset(x as u32, y as u32, self.width) as usize;
        self.pixels[offset] = color.to_u16();
    }

    /// Blend `color` over the existing pixel. RGB channels mix by the
    /// incoming alpha; alpha itself is a saturating sum.
    pub fn set_pixel_blend(&mut self, x: i32, y: i32, color: Color) {
        if !self.writable(x, y) {
            return;
        }
        let src = self.pixel_at(x, y);
        let out = Color {
            r: Color::blend_channel(src.r, color.r, color.a),
            g: Color::blend_channel(src.g, color.g, color.a),
            b: Color::blend_channel(src.b, color.b, color.a),
            a: (src.a as u16 + color.a as u16).min(CHANNEL_MAX as u16) as u8,
        };
        self.set_pixel(x, y, out);
    }

    /// Fill a rectangle with blending, clamped to the surface.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let x2 = (x + w).min(self.width as i32);
        let y2 = (y + h).min(self.height as i32);
        if x2 < 0 || y2 < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let x = x.max(0);
        let y = y.max(0);
        for xi in x..x2 {
            for yi in y..y2 {
                self.set_pixel_blend(xi, yi, color);
            }
        }
    }

    /// Overwrite the whole surface. Direct writes, no blending.
    pub fn fill_screen(&mut self, color: Color) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Filled rectangle with all four corners rounded to `radius`.
    pub fn rounded_rect(&mut self, x: i32, y: i32, w: i32, h: i32, radius: i32, color: Color) {
        self.rounded_rect_partial(x, y, w, h, radius, color, RoundedPart::All);
    }

    /// Filled rectangle with only the selected corner pair rounded.
    ///
    /// Corners are carved out after the fill: any pixel whose center lies
    /// outside the corner circle is overwritten with full transparency.
    pub fn rounded_rect_partial(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        radius: i32,
        color: Color,
        part: RoundedPart,
    ) {
        self.fill_rect(x, y, w, h, color);

        let top = matches!(part, RoundedPart::All | RoundedPart::Top);
        let bottom = matches!(part, RoundedPart::All | RoundedPart::Bottom);
        let radius_sq = (radius * radius) as f32;

        for cy in 0..radius {
            for cx in 0..radius {
                if top {
                    let dx = (cx - radius) as f32 + 0.5;
                    let dy = (cy - radius) as f32 + 0.5;
                    if dx * dx + dy * dy > radius_sq {
                        self.set_pixel(x + cx, y + cy, Color::TRANSPARENT);
                    }

                    let dx = cx as f32 + 0.5;
                    let dy = (cy - radius) as f32 + 0.5;
                    if dx * dx + dy * dy > radius_sq {
                        self.set_pixel(x + w - radius + cx, y + cy, Color::TRANSPARENT);
                    }
                }

                if bottom {
                    let dx = (cx - radius) as f32 + 0.5;
                    let dy = cy as f32 + 0.5;
                    if dx * dx + dy * dy > radius_sq {
                        self.set_pixel(x + cx, y + h - radius + cy, Color::TRANSPARENT);
                    }

                    let dx = cx as f32 + 0.5;
                    let dy = cy as f32 + 0.5;
                    if dx * dx + dy * dy > radius_sq {
                        self.set_pixel(x + w - radius + cx, y + h - radius + cy, Color::TRANSPARENT);
                    }
                }
            }
        }
    }
}
