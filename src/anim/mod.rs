//! Frame-by-frame panel transitions
//!
//! Each transition is a fixed-duration sequence of discrete frames:
//! progress is wall-clock elapsed over the total duration, clamped to
//! [0, 1] and remapped through an ease-out-cubic curve. Every frame clears
//! the surface, clips to the transition's visible window, redraws the full
//! panel through the caller's closure, presents, and then blocks on the
//! frame-ready signal. The sequencer owns the calling thread until the
//! transition completes.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::trace;

use crate::render::{Color, Compositor, Rect};
use crate::request::PanelPosition;
use crate::surface::Surface;

const SLIDE_DURATION: Duration = Duration::from_millis(250);
const EXPAND_DURATION: Duration = Duration::from_millis(300);

/// Fast start, gentle settle: `f(t) = 1 - (1 - t)^3`.
pub fn ease_out_cubic(t: f32) -> f32 {
    let f = t - 1.0;
    f * f * f + 1.0
}

/// The three entry transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SlideFromLeft,
    SlideFromRight,
    ExpandFromCenter,
}

impl Transition {
    /// Left panels slide in from the left edge, right panels from the
    /// right, centered panels expand out of their midline.
    pub fn for_position(position: PanelPosition) -> Self {
        match position {
            PanelPosition::Left => Transition::SlideFromLeft,
            PanelPosition::Right => Transition::SlideFromRight,
            PanelPosition::Middle => Transition::ExpandFromCenter,
        }
    }

    fn duration(self) -> Duration {
        match self {
            Transition::SlideFromLeft | Transition::SlideFromRight => SLIDE_DURATION,
            Transition::ExpandFromCenter => EXPAND_DURATION,
        }
    }

    /// Panel draw offset and clip window at eased progress `p`.
    ///
    /// Slides move the draw position from off-surface toward zero and clip
    /// to the portion already on the surface. Expand keeps the panel at
    /// its final position and widens a centered reveal window instead.
    fn frame(self, p: f32, panel_width: i32, surface_w: i32, surface_h: i32) -> (i32, Rect) {
        match self {
            Transition::SlideFromLeft => {
                let draw_x = -panel_width + (panel_width as f32 * p) as i32;
                (draw_x, Rect::new(0, 0, draw_x + panel_width, surface_h))
            }
            Transition::SlideFromRight => {
                let draw_x = panel_width - (panel_width as f32 * p) as i32;
                (draw_x, Rect::new(draw_x, 0, surface_w - draw_x, surface_h))
            }
            Transition::ExpandFromCenter => {
                let visible = (panel_width as f32 * p) as i32;
                let clip_x = (panel_width - visible) / 2;
                (0, Rect::new(clip_x, 0, visible, surface_h))
            }
        }
    }

    /// Run the transition to completion, redrawing the panel each frame
    /// via `draw(compositor, draw_x)`.
    pub fn play<S: Surface>(
        self,
        compositor: &mut Compositor,
        surface: &mut S,
        panel_width: i32,
        mut draw: impl FnMut(&mut Compositor, i32),
    ) -> Result<()> {
        let start = Instant::now();
        let total = self.duration().as_secs_f32();
        let surface_w = compositor.width() as i32;
        let surface_h = compositor.height() as i32;

        loop {
            let t = (start.elapsed().as_secs_f32() / total).min(1.0);
            let p = ease_out_cubic(t);
            let (draw_x, clip) = self.frame(p, panel_width, surface_w, surface_h);
            trace!("{:?} frame t={:.3} draw_x={}", self, t, draw_x);

            compositor.fill_screen(Color::TRANSPARENT);
            compositor.enable_scissor(clip);
            draw(compositor, draw_x);
            compositor.disable_scissor();

            surface.present(compositor.pixels())?;
            surface.wait_frame_ready();

            if t >= 1.0 {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
    }

    #[test]
    fn test_transition_for_position() {
        assert_eq!(
            Transition::for_position(PanelPosition::Left),
            Transition::SlideFromLeft
        );
        assert_eq!(
            Transition::for_position(PanelPosition::Right),
            Transition::SlideFromRight
        );
        assert_eq!(
            Transition::for_position(PanelPosition::Middle),
            Transition::ExpandFromCenter
        );
    }

    #[test]
    fn test_slide_from_left_endpoints() {
        let (x0, clip0) = Transition::SlideFromLeft.frame(0.0, 600, 608, 150);
        assert_eq!(x0, -600);
        assert_eq!(clip0.w, 0);
        let (x1, clip1) = Transition::SlideFromLeft.frame(1.0, 600, 608, 150);
        assert_eq!(x1, 0);
        assert_eq!(clip1, Rect::new(0, 0, 600, 150));
    }

    #[test]
    fn test_slide_from_right_endpoints() {
        let (x0, clip0) = Transition::SlideFromRight.frame(0.0, 600, 608, 150);
        assert_eq!(x0, 600);
        assert_eq!(clip0, Rect::new(600, 0, 8, 150));
        let (x1, clip1) = Transition::SlideFromRight.frame(1.0, 600, 608, 150);
        assert_eq!(x1, 0);
        assert_eq!(clip1, Rect::new(0, 0, 608, 150));
    }

    #[test]
    fn test_expand_reveals_centered_window() {
        let (x, clip) = Transition::ExpandFromCenter.frame(0.5, 600, 608, 150);
        // Content never moves; the clip window does.
        assert_eq!(x, 0);
        assert_eq!(clip.w, 300);
        assert_eq!(clip.x, 150);
        let (_, full) = Transition::ExpandFromCenter.frame(1.0, 600, 608, 150);
        assert_eq!(full, Rect::new(0, 0, 600, 150));
    }

    proptest! {
        #[test]
        fn prop_ease_monotone_nondecreasing(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease_out_cubic(lo) <= ease_out_cubic(hi) + 1e-6);
        }

        #[test]
        fn prop_ease_stays_in_unit_range(t in 0.0f32..=1.0) {
            let p = ease_out_cubic(t);
            prop_assert!((-1e-6..=1.0 + 1e-6).contains(&p));
        }
    }
}
