//! Panel rendering: chrome drawing and the show/hide presenter
//!
//! The chrome is a rounded background with a subtle top highlight strip
//! and bottom shadow strip, a leading icon glyph and the body text. The
//! presenter ties the chrome to a surface: showing plays the position's
//! entry transition, hiding scrubs both buffers of the swap chain.

use anyhow::Result;
use log::debug;

use crate::anim::Transition;
use crate::config::PanelConfig;
use crate::font::FontContext;
use crate::render::{Color, Compositor, Rect, RoundedPart, TextAlign};
use crate::request::NotificationRequest;
use crate::surface::{FocusRestorer, Surface};

/// Private-use code points in this range at the start of the text act as
/// an icon override, replacing the kind-selected glyph.
const ICON_OVERRIDE_RANGE: std::ops::RangeInclusive<char> = '\u{E000}'..='\u{EFFF}';

/// Horizontal gap between the icon cell and the body text.
const ICON_TEXT_GAP: i32 = 4;

/// Abstraction the display state machine drives. The production
/// implementation is [`PanelPresenter`]; tests substitute a recorder.
pub trait PanelSink {
    fn show(&mut self, request: &NotificationRequest) -> Result<()>;
    fn hide(&mut self) -> Result<()>;
}

/// Split a leading icon-override code point off the body text, also
/// dropping the spaces that conventionally follow it.
fn split_icon_override(text: &str, default_icon: char) -> (char, &str) {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if ICON_OVERRIDE_RANGE.contains(&first) => {
            (first, chars.as_str().trim_start_matches(' '))
        }
        _ => (default_icon, text),
    }
}

/// Draws panel chrome into a compositor at a horizontal draw offset.
pub struct PanelPainter {
    cfg: PanelConfig,
}

impl PanelPainter {
    pub fn new(cfg: PanelConfig) -> Self {
        Self { cfg }
    }

    /// Draw the complete panel with its left edge at `origin_x`. The
    /// animation sequencer moves `origin_x` (or clips) per frame.
    pub fn draw(
        &self,
        comp: &mut Compositor,
        fonts: &FontContext,
        request: &NotificationRequest,
        origin_x: i32,
    ) {
        let c = &self.cfg;
        let (w, h) = (c.width as i32, c.height as i32);
        let radius = c.corner_radius as i32;

        comp.rounded_rect(origin_x, 0, w, h, radius, c.background);

        comp.rounded_rect_partial(
            origin_x,
            0,
            w,
            c.highlight_height as i32,
            radius,
            c.highlight,
            RoundedPart::Top,
        );

        let shadow_h = c.shadow_height as i32;
        comp.rounded_rect_partial(
            origin_x,
            h - shadow_h,
            w,
            shadow_h,
            radius,
            c.shadow,
            RoundedPart::Bottom,
        );

        let (icon, body) = split_icon_override(&request.text, request.kind.icon());

        let icon_rect = Rect::new(
            origin_x + c.icon_inset as i32,
            0,
            c.icon_cell_width as i32,
            h,
        );
        comp.draw_text(
            fonts,
            icon.encode_utf8(&mut [0u8; 4]),
            icon_rect,
            c.icon_size,
            c.icon_color,
            TextAlign::Center,
        );

        let text_x = icon_rect.x + icon_rect.w + ICON_TEXT_GAP;
        let text_rect = Rect::new(
            text_x,
            0,
            origin_x + w - text_x - c.text_inset as i32,
            h,
        );
        comp.draw_text(
            fonts,
            body,
            text_rect,
            c.text_size,
            c.text_color,
            TextAlign::Left,
        );
    }
}

/// Owns the compositor, surface, fonts and focus restorer; shows and
/// hides panels on behalf of the state machine.
pub struct PanelPresenter<S: Surface, F: FocusRestorer> {
    compositor: Compositor,
    surface: S,
    fonts: FontContext,
    focus: F,
    painter: PanelPainter,
    panel_width: i32,
}

impl<S: Surface, F: FocusRestorer> PanelPresenter<S, F> {
    pub fn new(cfg: PanelConfig, fonts: FontContext, surface: S, focus: F) -> Result<Self> {
        let compositor = Compositor::new(cfg.surface_width(), cfg.height)?;
        let panel_width = cfg.width as i32;
        Ok(Self {
            compositor,
            surface,
            fonts,
            focus,
            painter: PanelPainter::new(cfg),
            panel_width,
        })
    }
}

impl<S: Surface, F: FocusRestorer> PanelSink for PanelPresenter<S, F> {
    fn show(&mut self, request: &NotificationRequest) -> Result<()> {
        debug!(
            "showing {:?} panel at {:?}: {:?}",
            request.kind, request.position, request.text
        );
        self.focus.restore();

        let painter = &self.painter;
        let fonts = &self.fonts;
        Transition::for_position(request.position).play(
            &mut self.compositor,
            &mut self.surface,
            self.panel_width,
            |comp, draw_x| painter.draw(comp, fonts, request, draw_x),
        )
    }

    fn hide(&mut self) -> Result<()> {
        debug!("hiding panel");
        // Present the clear twice so both buffers of the double-buffered
        // chain are scrubbed.
        for _ in 0..2 {
            self.compositor.fill_screen(Color::TRANSPARENT);
            self.surface.present(self.compositor.pixels())?;
            self.surface.wait_frame_ready();
        }
        Ok(())
    }
}
