//! Display state machine and main loop
//!
//! A single-threaded poll loop over the mailbox. The service is either
//! Idle or Showing a panel; entries preempt the visible panel only after
//! a minimum display floor, every consumed entry is deleted before it is
//! acted on, and a stretch of inactivity shuts the service down so it
//! spends nothing while nobody is notifying.
//!
//! Panel failures never escape the loop: a show or hide that errors is
//! logged, the request (if any) is dropped, and polling continues.

use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::{ParserConfig, ServiceConfig, TimingConfig};
use crate::mailbox;
use crate::panel::PanelSink;
use crate::request;

/// Outcome of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing on screen, idle clock running.
    Idle,
    /// A panel is on screen.
    Visible,
    /// Idle timeout elapsed; the loop should exit.
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum PanelState {
    Idle,
    Showing { since: Instant, deadline: Instant },
}

/// Drives a [`PanelSink`] from mailbox entries.
pub struct NotificationService<P: PanelSink> {
    panel: P,
    mailbox_dir: PathBuf,
    timing: TimingConfig,
    parser: ParserConfig,
    state: PanelState,
    last_activity: Instant,
}

impl<P: PanelSink> NotificationService<P> {
    pub fn new(config: &ServiceConfig, panel: P) -> Result<Self> {
        mailbox::ensure_directory(&config.mailbox.directory).with_context(|| {
            format!(
                "failed to create mailbox directory {}",
                config.mailbox.directory.display()
            )
        })?;
        Ok(Self {
            panel,
            mailbox_dir: config.mailbox.directory.clone(),
            timing: config.timing.clone(),
            parser: config.parser.clone(),
            state: PanelState::Idle,
            last_activity: Instant::now(),
        })
    }

    fn hide_panel(&mut self, now: Instant) {
        if let Err(e) = self.panel.hide() {
            warn!("panel hide failed: {:#}", e);
        }
        self.state = PanelState::Idle;
        self.last_activity = now;
    }

    /// One pass of the poll loop at time `now`. Infallible: panel errors
    /// are absorbed here so the loop outlives them.
    ///
    /// Taking `now` as a parameter keeps the state machine deterministic
    /// under test; [`run`](Self::run) feeds it the wall clock.
    pub fn tick(&mut self, now: Instant) -> Tick {
        if let Some(entry) = mailbox::first_entry(&self.mailbox_dir) {
            self.last_activity = now;

            if let PanelState::Showing { since, .. } = self.state {
                if now.duration_since(since) < self.timing.min_display() {
                    // Preemption floor not reached; leave the entry queued.
                    return Tick::Visible;
                }
                self.hide_panel(now);
            }

            // Delete before acting: a crash mid-display must not replay.
            let raw = mailbox::read_entry(&entry);
            mailbox::remove_entry(&entry);

            let Some(raw) = raw else {
                return Tick::Idle;
            };
            let req = request::parse(&raw, &self.parser);
            if !req.is_valid() {
                warn!("discarding malformed mailbox entry {}", entry.display());
                return Tick::Idle;
            }

            if let Err(e) = self.panel.show(&req) {
                warn!("dropping notification after failed show: {:#}", e);
                return Tick::Idle;
            }

            // With another entry already waiting, floor this panel's stay
            // at the preemption minimum instead of its full duration.
            let stay = if mailbox::first_entry(&self.mailbox_dir).is_some() {
                self.timing.min_display().min(req.duration)
            } else {
                req.duration
            };
            debug!("panel up for {:?}", stay);
            self.state = PanelState::Showing {
                since: now,
                deadline: now + stay,
            };
            return Tick::Visible;
        }

        match self.state {
            PanelState::Showing { deadline, .. } => {
                if now >= deadline {
                    self.hide_panel(now);
                    return Tick::Idle;
                }
                Tick::Visible
            }
            PanelState::Idle => {
                if now.duration_since(self.last_activity) >= self.timing.idle_timeout() {
                    Tick::Shutdown
                } else {
                    Tick::Idle
                }
            }
        }
    }

    /// Poll until the idle timeout fires.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "watching mailbox {} (poll {:?}, idle timeout {:?})",
            self.mailbox_dir.display(),
            self.timing.poll_interval(),
            self.timing.idle_timeout()
        );
        loop {
            match self.tick(Instant::now()) {
                Tick::Shutdown => {
                    info!("idle timeout reached, shutting down");
                    return Ok(());
                }
                Tick::Idle | Tick::Visible => thread::sleep(self.timing.poll_interval()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailboxConfig;
    use crate::mailbox::MailboxWriter;
    use crate::request::{NotificationKind, NotificationRequest, PanelPosition};
    use anyhow::bail;
    use std::fs;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct RecordingSink {
        shown: Vec<NotificationRequest>,
        hides: usize,
    }

    impl PanelSink for RecordingSink {
        fn show(&mut self, request: &NotificationRequest) -> Result<()> {
            self.shown.push(request.clone());
            Ok(())
        }

        fn hide(&mut self) -> Result<()> {
            self.hides += 1;
            Ok(())
        }
    }

    /// Sink whose show and/or hide can be made to fail.
    #[derive(Default)]
    struct FlakySink {
        fail_show: bool,
        fail_hide: bool,
        shows: usize,
        hides: usize,
    }

    impl PanelSink for FlakySink {
        fn show(&mut self, _request: &NotificationRequest) -> Result<()> {
            self.shows += 1;
            if self.fail_show {
                bail!("present failed: display went away");
            }
            Ok(())
        }

        fn hide(&mut self) -> Result<()> {
            self.hides += 1;
            if self.fail_hide {
                bail!("present failed: display went away");
            }
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.mailbox = MailboxConfig {
            directory: dir.path().to_path_buf(),
        };
        config
    }

    fn service(dir: &TempDir) -> NotificationService<RecordingSink> {
        service_with(dir, RecordingSink::default())
    }

    fn service_with<P: PanelSink>(dir: &TempDir, panel: P) -> NotificationService<P> {
        NotificationService::new(&test_config(dir), panel).unwrap()
    }

    fn publish(dir: &TempDir, text: &str, duration_secs: u64) {
        let mut writer = MailboxWriter::new(dir.path());
        writer
            .publish(&NotificationRequest::new(
                text,
                duration_secs,
                NotificationKind::Info,
                PanelPosition::Right,
            ))
            .unwrap();
    }

    #[test]
    fn test_entry_shows_for_requested_duration() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();

        publish(&dir, "hello", 3);
        assert_eq!(svc.tick(t0), Tick::Visible);
        assert_eq!(svc.panel.shown.len(), 1);
        assert_eq!(svc.panel.shown[0].text, "hello");
        // Entry consumed before the panel went up.
        assert_eq!(mailbox::first_entry(dir.path()), None);

        assert_eq!(svc.tick(t0 + Duration::from_secs(2)), Tick::Visible);
        assert_eq!(svc.tick(t0 + Duration::from_secs(3)), Tick::Idle);
        assert_eq!(svc.panel.hides, 1);
    }

    #[test]
    fn test_preemption_waits_for_display_floor() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();

        publish(&dir, "first", 8);
        assert_eq!(svc.tick(t0), Tick::Visible);

        publish(&dir, "second", 2);
        // Below the 1 s floor: second stays queued, first stays up.
        assert_eq!(svc.tick(t0 + Duration::from_millis(200)), Tick::Visible);
        assert_eq!(svc.panel.shown.len(), 1);
        assert_eq!(svc.panel.hides, 0);

        // Floor reached: first comes down, second goes up.
        assert_eq!(svc.tick(t0 + Duration::from_secs(1)), Tick::Visible);
        assert_eq!(svc.panel.hides, 1);
        assert_eq!(svc.panel.shown.len(), 2);
        assert_eq!(svc.panel.shown[1].text, "second");
    }

    #[test]
    fn test_queued_entry_floors_current_panels_stay() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();

        // Directory enumeration order is unspecified, so either entry may
        // win; both ask for 8 s to make the floored stay observable.
        publish(&dir, "first", 8);
        publish(&dir, "second", 8);
        assert_eq!(svc.tick(t0), Tick::Visible);
        assert_eq!(svc.panel.shown.len(), 1);

        // The winner would have stayed 8 s, but the other entry is
        // waiting, so its stay collapsed to the 1 s floor.
        assert_eq!(svc.tick(t0 + Duration::from_millis(999)), Tick::Visible);
        assert_eq!(svc.panel.shown.len(), 1);
        assert_eq!(svc.tick(t0 + Duration::from_secs(1)), Tick::Visible);
        assert_eq!(svc.panel.hides, 1);
        assert_eq!(svc.panel.shown.len(), 2);

        let mut texts: Vec<_> = svc.panel.shown.iter().map(|r| r.text.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, ["first", "second"]);

        // Nothing queued behind the last panel; it keeps its full stay.
        assert_eq!(svc.tick(t0 + Duration::from_secs(5)), Tick::Visible);
        assert_eq!(svc.tick(t0 + Duration::from_secs(9)), Tick::Idle);
    }

    #[test]
    fn test_malformed_entry_consumed_and_skipped() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();

        fs::write(dir.path().join("notif_00000000.ini"), "type=INFO\n").unwrap();
        assert_eq!(svc.tick(t0), Tick::Idle);
        assert!(svc.panel.shown.is_empty());
        assert_eq!(mailbox::first_entry(dir.path()), None);
    }

    #[test]
    fn test_failed_show_drops_request_and_keeps_looping() {
        let dir = tempdir().unwrap();
        let mut svc = service_with(
            &dir,
            FlakySink {
                fail_show: true,
                ..FlakySink::default()
            },
        );
        let t0 = Instant::now();

        publish(&dir, "doomed", 3);
        assert_eq!(svc.tick(t0), Tick::Idle);
        // Consumed despite the failure; never retried.
        assert_eq!(mailbox::first_entry(dir.path()), None);
        assert_eq!(svc.panel.shows, 1);

        // The loop is still alive and takes the next entry.
        publish(&dir, "also doomed", 2);
        assert_eq!(svc.tick(t0 + Duration::from_millis(100)), Tick::Idle);
        assert_eq!(svc.panel.shows, 2);
    }

    #[test]
    fn test_failed_hide_still_returns_to_idle() {
        let dir = tempdir().unwrap();
        let mut svc = service_with(
            &dir,
            FlakySink {
                fail_hide: true,
                ..FlakySink::default()
            },
        );
        let t0 = Instant::now();

        publish(&dir, "up", 1);
        assert_eq!(svc.tick(t0), Tick::Visible);
        assert_eq!(svc.tick(t0 + Duration::from_secs(1)), Tick::Idle);
        assert_eq!(svc.panel.hides, 1);
        // State is Idle; the failed hide is not re-attempted.
        assert_eq!(svc.tick(t0 + Duration::from_secs(2)), Tick::Idle);
        assert_eq!(svc.panel.hides, 1);
    }

    #[test]
    fn test_idle_timeout_shuts_down_and_activity_resets_it() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();
        svc.last_activity = t0;

        assert_eq!(svc.tick(t0 + Duration::from_secs(5)), Tick::Idle);
        assert_eq!(svc.tick(t0 + Duration::from_secs(10)), Tick::Shutdown);

        // Activity pushes the deadline out.
        publish(&dir, "wake", 1);
        let t1 = t0 + Duration::from_secs(11);
        assert_eq!(svc.tick(t1), Tick::Visible);
        assert_eq!(svc.tick(t1 + Duration::from_secs(1)), Tick::Idle);
        assert_eq!(svc.tick(t1 + Duration::from_secs(10)), Tick::Idle);
        assert_eq!(svc.tick(t1 + Duration::from_secs(11)), Tick::Shutdown);
    }

    #[test]
    fn test_shutdown_decision_is_stateless_until_loop_exits() {
        let dir = tempdir().unwrap();
        let mut svc = service(&dir);
        let t0 = Instant::now();
        svc.last_activity = t0;

        let late = t0 + Duration::from_secs(60);
        assert_eq!(svc.tick(late), Tick::Shutdown);
        // A tick after the decision still reports shutdown; nothing was hidden
        // because nothing was shown.
        assert_eq!(svc.tick(late), Tick::Shutdown);
        assert_eq!(svc.panel.hides, 0);
    }
}
