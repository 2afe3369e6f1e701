//! External display collaborators
//!
//! Acquiring the display session, creating the overlay layer and binding a
//! swap chain all happen outside this crate. The engine only ever sees an
//! opaque [`Surface`]: a frame-ready wait primitive plus a present
//! operation taking the block-linear pixel buffer. Input-focus restoration
//! is a fire-and-forget side effect behind [`FocusRestorer`].

use std::time::{Duration, Instant};

use anyhow::Result;

/// An overlay surface bound to the display pipeline.
///
/// `present` hands off a full frame in the block-linear RGBA4444 layout;
/// `wait_frame_ready` blocks until the display can take the next frame,
/// bounding animation frame rate to the refresh cadence.
pub trait Surface {
    fn wait_frame_ready(&mut self);
    fn present(&mut self, pixels: &[u16]) -> Result<()>;
}

/// Restores system input focus before a panel is shown. The platform
/// implementation injects a synthetic touch; nothing is reported back.
pub trait FocusRestorer {
    fn restore(&mut self);
}

/// No-op focus restorer for platforms that do not need one.
#[derive(Debug, Default)]
pub struct NoFocusRestore;

impl FocusRestorer for NoFocusRestore {
    fn restore(&mut self) {}
}

/// Surface stand-in that paces frames off a wall-clock refresh interval
/// and discards presented pixels. Used until a platform layer binds a real
/// overlay, and by examples.
#[derive(Debug)]
pub struct HeadlessSurface {
    refresh: Duration,
    next_frame: Instant,
}

impl HeadlessSurface {
    pub fn new(refresh_hz: u32) -> Self {
        let refresh = Duration::from_secs(1) / refresh_hz.max(1);
        Self {
            refresh,
            next_frame: Instant::now() + refresh,
        }
    }
}

impl Surface for HeadlessSurface {
    fn wait_frame_ready(&mut self) {
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
        }
        self.next_frame = Instant::now() + self.refresh;
    }

    fn present(&mut self, _pixels: &[u16]) -> Result<()> {
        Ok(())
    }
}

/// In-memory surface recording what was presented. Test double.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub presented: usize,
    pub last_frame: Vec<u16>,
}

impl Surface for MemorySurface {
    fn wait_frame_ready(&mut self) {}

    fn present(&mut self, pixels: &[u16]) -> Result<()> {
        self.presented += 1;
        self.last_frame.clear();
        self.last_frame.extend_from_slice(pixels);
        Ok(())
    }
}
