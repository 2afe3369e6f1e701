//! Configuration management for toastd
//!
//! Loading, parsing and validating the service configuration from a TOML
//! file: mailbox location, loop timing, parser strictness, panel geometry
//! and palette, and font slot paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::render::Color;


/// Main configuration struct containing all toastd settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServiceConfig {
    /// Mailbox directory settings
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// Main-loop timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Entry parser behavior
    #[serde(default)]
    pub parser: ParserConfig,

    /// Panel geometry and palette
    #[serde(default)]
    pub panel: PanelConfig,

    /// Font slot file paths
    #[serde(default)]
    pub fonts: FontsConfig,
}

/// Where request entries are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailboxConfig {
    /// Well-known directory watched for entries
    pub directory: PathBuf,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            directory: std::env::temp_dir().join("toastd-mailbox"),
        }
    }
}

/// Main-loop timing constants, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Sleep between mailbox polls
    pub poll_interval_ms: u64,

    /// With no activity in Idle for this long, the service exits
    pub idle_timeout_ms: u64,

    /// Minimum time a panel stays visible before it may be preempted;
    /// also the floored duration when further entries are queued
    pub min_display_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            idle_timeout_ms: 10_000,
            min_display_ms: 1_000,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn min_display(&self) -> Duration {
        Duration::from_millis(self.min_display_ms)
    }
}

/// Entry parser strictness.
///
/// The lenient default accepts any entry with non-empty text; strict mode
/// additionally requires all four recognized keys to be present.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ParserConfig {
    #[serde(default)]
    pub require_all_fields: bool,
}

/// Panel geometry and palette, in surface pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    /// Panel size as displayed
    pub width: u32,
    pub height: u32,

    /// Corner rounding radius
    pub corner_radius: u32,

    /// Heights of the top highlight and bottom shadow strips
    pub highlight_height: u32,
    pub shadow_height: u32,

    /// Icon cell: left inset, cell width, and glyph height
    pub icon_inset: u32,
    pub icon_cell_width: u32,
    pub icon_size: f32,

    /// Body text: glyph height and right inset
    pub text_size: f32,
    pub text_inset: u32,

    /// Palette
    pub background: Color,
    pub highlight: Color,
    pub shadow: Color,
    pub icon_color: Color,
    pub text_color: Color,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 150,
            corner_radius: 12,
            highlight_height: 6,
            shadow_height: 6,
            icon_inset: 22,
            icon_cell_width: 105,
            icon_size: 60.0,
            text_size: 42.0,
            text_inset: 22,
            background: Color::new(13, 13, 13, 15),
            highlight: Color::new(15, 15, 15, 8),
            shadow: Color::new(0, 0, 0, 2),
            icon_color: Color::new(4, 4, 4, 15),
            text_color: Color::new(5, 5, 5, 15),
        }
    }
}

impl PanelConfig {
    /// Surface width rounded up to the block-linear alignment. The slack
    /// columns on the right are never drawn.
    pub fn surface_width(&self) -> u32 {
        self.width.div_ceil(crate::render::WIDTH_ALIGN) * crate::render::WIDTH_ALIGN
    }
}

/// Paths to the raw font files backing the three logical slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontsConfig {
    /// Always-available fallback font
    pub standard: PathBuf,

    /// Script-specific font matching the system language, if any
    pub local: Option<PathBuf>,

    /// Icon/extension font carrying private-use glyphs, if any
    pub extension: Option<PathBuf>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            standard: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            local: None,
            extension: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: ServiceConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.timing.poll_interval_ms > 0, "poll_interval_ms must be positive");
        ensure!(self.timing.min_display_ms > 0, "min_display_ms must be positive");
        ensure!(
            self.timing.idle_timeout_ms >= self.timing.poll_interval_ms,
            "idle_timeout_ms must be at least one poll interval"
        );
        ensure!(self.panel.width > 0 && self.panel.height > 0, "panel size must be non-zero");
        ensure!(
            self.panel.corner_radius * 2 <= self.panel.height
                && self.panel.corner_radius * 2 <= self.panel.width,
            "corner radius does not fit the panel"
        );
        ensure!(
            self.panel.icon_inset + self.panel.icon_cell_width + self.panel.text_inset
                < self.panel.width,
            "icon cell and insets leave no room for text"
        );
        ensure!(self.panel.icon_size > 0.0, "icon_size must be positive");
        ensure!(self.panel.text_size > 0.0, "text_size must be positive");
        Ok(())
    }
}
