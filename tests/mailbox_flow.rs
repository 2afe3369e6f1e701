//! Integration tests for the producer-to-service mailbox flow
//!
//! These tests exercise the full path an entry travels: a producer
//! publishes through [`MailboxWriter`], the scanner observes only the
//! finalized file, the consumer reads, parses and deletes it, and the
//! state machine drives a panel sink off the result.

use std::fs;
use std::time::{Duration, Instant};

use anyhow::Result;
use tempfile::tempdir;

use toastd::mailbox::{self, MailboxWriter};
use toastd::request::{self, NotificationKind, NotificationRequest, PanelPosition};
use toastd::service::{NotificationService, Tick};
use toastd::{PanelSink, ServiceConfig};

#[derive(Default)]
struct CountingSink {
    shown: Vec<NotificationRequest>,
    hides: usize,
}

impl PanelSink for CountingSink {
    fn show(&mut self, request: &NotificationRequest) -> Result<()> {
        self.shown.push(request.clone());
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.hides += 1;
        Ok(())
    }
}

/// What a producer publishes is exactly what the consumer reconstructs.
#[test]
fn test_publish_scan_parse_equivalence() -> Result<()> {
    let dir = tempdir()?;
    let original =
        NotificationRequest::new("update ready", 4, NotificationKind::Info, PanelPosition::Left);

    let mut writer = MailboxWriter::new(dir.path());
    writer.publish(&original)?;

    let entry = mailbox::first_entry(dir.path()).expect("published entry not found");
    let raw = mailbox::read_entry(&entry).expect("entry unreadable");
    let reparsed = request::parse(&raw, &ServiceConfig::default().parser);
    assert_eq!(reparsed, original);

    mailbox::remove_entry(&entry);
    assert_eq!(mailbox::first_entry(dir.path()), None);
    Ok(())
}

/// In-progress writes are invisible; publication is the rename.
#[test]
fn test_scanner_never_sees_temporary_files() -> Result<()> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("notif_12345678.ini.tmp"),
        "text=half written",
    )?;
    assert_eq!(mailbox::first_entry(dir.path()), None);

    let mut writer = MailboxWriter::new(dir.path());
    writer.publish(&NotificationRequest::new(
        "done",
        2,
        NotificationKind::Info,
        PanelPosition::Right,
    ))?;
    let entry = mailbox::first_entry(dir.path()).expect("finalized entry not found");
    assert!(!entry.to_string_lossy().ends_with(".tmp"));
    Ok(())
}

/// End to end: producer publishes, one tick shows the panel and consumes
/// the entry, the duration elapses and the panel comes down.
#[test]
fn test_service_consumes_published_entry() -> Result<()> {
    let dir = tempdir()?;
    let mut config = ServiceConfig::default();
    config.mailbox.directory = dir.path().to_path_buf();

    let mut writer = MailboxWriter::new(dir.path());
    writer.publish(&NotificationRequest::new(
        "battery low",
        3,
        NotificationKind::Error,
        PanelPosition::Middle,
    ))?;

    let mut service = NotificationService::new(&config, CountingSink::default())?;
    let t0 = Instant::now();

    assert_eq!(service.tick(t0), Tick::Visible);
    assert_eq!(mailbox::first_entry(dir.path()), None);

    assert_eq!(service.tick(t0 + Duration::from_secs(3)), Tick::Idle);
    Ok(())
}

/// Foreign files in the mailbox directory are never consumed or deleted.
#[test]
fn test_service_leaves_foreign_files_alone() -> Result<()> {
    let dir = tempdir()?;
    let mut config = ServiceConfig::default();
    config.mailbox.directory = dir.path().to_path_buf();

    let foreign = dir.path().join("README.txt");
    fs::write(&foreign, "not a notification")?;

    let mut service = NotificationService::new(&config, CountingSink::default())?;
    assert_eq!(service.tick(Instant::now()), Tick::Idle);
    assert!(foreign.exists());
    Ok(())
}
