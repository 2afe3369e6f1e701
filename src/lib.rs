//! # Toastd Notification Overlay Library
//!
//! A small notification-overlay service: requesters drop plain-text
//! entries into a file mailbox, and a single-threaded daemon pops them up
//! as rounded panels composited into a block-linear RGBA4444 overlay
//! surface.
//!
//! ## Architecture
//!
//! Toastd is built on a modular architecture:
//! - `render`: RGBA4444 software compositor over the block-linear layout
//! - `font`: three-slot font stack with cap-height scaling
//! - `panel`: panel chrome drawing and the show/hide presenter
//! - `anim`: frame-by-frame entry transitions
//! - `mailbox`: file-mailbox scanner and producer writer
//! - `request`: notification requests and the entry grammar
//! - `service`: display state machine and poll loop
//! - `surface`: display surface and focus-restore seams
//! - `config`: configuration parsing and validation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toastd::{
//!     FontContext, NotificationService, PanelPresenter, ServiceConfig,
//!     surface::{HeadlessSurface, NoFocusRestore},
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::default();
//!     let standard = std::fs::read(&config.fonts.standard)?;
//!     let fonts = FontContext::from_slots(&standard, None, None)?;
//!     let presenter = PanelPresenter::new(
//!         config.panel.clone(),
//!         fonts,
//!         HeadlessSurface::new(60),
//!         NoFocusRestore,
//!     )?;
//!     NotificationService::new(&config, presenter)?.run()
//! }
//! ```

pub mod anim;
pub mod config;
pub mod font;
pub mod mailbox;
pub mod panel;
pub mod render;
pub mod request;
pub mod service;
pub mod surface;

// Re-export main types for easy access
pub use config::ServiceConfig;
pub use font::FontContext;
pub use mailbox::MailboxWriter;
pub use panel::{PanelPresenter, PanelSink};
pub use render::Compositor;
pub use request::{NotificationKind, NotificationRequest, PanelPosition};
pub use service::NotificationService;

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for toastd
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
