//! # Toastd - Notification Overlay Service
//!
//! Watches a file mailbox for notification entries and pops each one up as
//! a rounded panel on an overlay surface, then exits after a stretch of
//! inactivity. Configuration comes from a TOML file; there are no
//! command-line flags, so a supervisor can respawn the binary bare.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info};

use toastd::surface::{HeadlessSurface, NoFocusRestore};
use toastd::{FontContext, NotificationService, PanelPresenter, ServiceConfig};

/// Environment override for the config file location.
const CONFIG_ENV: &str = "TOASTD_CONFIG";

const REFRESH_HZ: u32 = 60;

fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".config/toastd/toastd.toml")
}

fn load_config() -> ServiceConfig {
    let path = config_path();
    if !path.exists() {
        info!("no config at {}, using defaults", path.display());
        return ServiceConfig::default();
    }
    match ServiceConfig::load(&path) {
        Ok(config) => {
            info!("configuration loaded from {}", path.display());
            config
        }
        Err(e) => {
            error!("failed to load configuration: {:#}", e);
            info!("using default configuration");
            ServiceConfig::default()
        }
    }
}

fn load_fonts(config: &ServiceConfig) -> Result<FontContext> {
    let read_slot = |path: &std::path::Path| -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("failed to read font {}", path.display()))
    };

    let standard = read_slot(&config.fonts.standard)?;
    let local = config.fonts.local.as_deref().map(read_slot).transpose()?;
    let extension = config.fonts.extension.as_deref().map(read_slot).transpose()?;

    FontContext::from_slots(&standard, local.as_deref(), extension.as_deref())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("starting toastd {}", toastd::VERSION);

    let config = load_config();

    let fonts = load_fonts(&config)?;
    let surface = HeadlessSurface::new(REFRESH_HZ);
    let presenter = PanelPresenter::new(config.panel.clone(), fonts, surface, NoFocusRestore)?;

    let mut service = NotificationService::new(&config, presenter)?;
    service.run()
}
