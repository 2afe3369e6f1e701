//! File-based mailbox between requesters and the service
//!
//! A mailbox is just a well-known directory. Producers write an entry
//! under a randomized temporary name and atomically rename it into place;
//! the scanner only ever observes finalized names, and the consumer
//! deletes an entry before acting on it, so at most one consumer ever
//! processes a given entry and a crash mid-display never replays it.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::request::NotificationRequest;

/// Reserved extension for finalized entries, matched case-insensitively.
pub const ENTRY_EXTENSION: &str = "ini";

/// Final entry names are `notif_<8 random digits>.ini`.
pub const ENTRY_PREFIX: &str = "notif_";

/// Suffix appended while an entry is being written; stripped by the
/// atomic rename that publishes it.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Entries larger than this are malformed by definition and rejected.
pub const ENTRY_MAX_BYTES: u64 = 256;

/// Idempotent directory creation: an "already exists" outcome is success,
/// including when another process wins the creation race.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// First finalized entry in `dir`, in filesystem enumeration order (no
/// sort guarantee). `None` if the directory is missing or holds none.
/// Read-only; never touches the entries.
pub fn first_entry(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let is_entry = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(ENTRY_EXTENSION))
            .unwrap_or(false);
        if is_entry {
            return Some(path);
        }
    }
    None
}

/// Bounded whole-file read. Empty or oversized entries come back as
/// `None` and will be consumed as malformed.
pub fn read_entry(path: &Path) -> Option<String> {
    let len = fs::metadata(path).ok()?.len();
    if len == 0 || len > ENTRY_MAX_BYTES {
        warn!("mailbox entry {} has bad size {}", path.display(), len);
        return None;
    }
    let bytes = fs::read(path).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Delete a consumed entry. Failure is logged and absorbed; the worst
/// case is reprocessing a file we already acted on.
pub fn remove_entry(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("failed to delete mailbox entry {}: {}", path.display(), e);
    }
}

/// Producer side: publishes requests into a mailbox directory.
///
/// Owns its own random source for temp-file naming, seeded once at
/// construction.
pub struct MailboxWriter {
    dir: PathBuf,
    rng: StdRng,
}

impl MailboxWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Write the entry under a temporary name, then atomically rename it
    /// into visibility. Any write failure abandons the publish and removes
    /// the temporary file; there is no retry.
    pub fn publish(&mut self, request: &NotificationRequest) -> Result<PathBuf> {
        if !request.is_valid() {
            bail!("refusing to publish a notification with empty text");
        }

        ensure_directory(&self.dir)
            .with_context(|| format!("failed to create mailbox directory {}", self.dir.display()))?;

        let serial: u32 = self.rng.gen_range(0..100_000_000);
        let final_path = self
            .dir
            .join(format!("{}{:08}.{}", ENTRY_PREFIX, serial, ENTRY_EXTENSION));
        let temp_path = {
            let mut name = final_path.as_os_str().to_owned();
            name.push(TEMP_SUFFIX);
            PathBuf::from(name)
        };

        if let Err(e) = fs::write(&temp_path, request.serialize()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("failed to write {}", temp_path.display()));
        }

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("failed to publish {}", final_path.display()));
        }

        debug!("published notification entry {}", final_path.display());
        Ok(final_path)
    }
}
