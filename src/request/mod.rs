//! Notification requests and the mailbox entry grammar
//!
//! Entries are plain text, one `key=value` pair per line, keys `text`,
//! `type`, `position` and `duration`. The parser is deliberately
//! forgiving: lines without `=` and unknown keys are skipped, enum values
//! that do not match a label fall back to their defaults, and the only
//! rejection signal is an empty `text` after parsing.

use std::time::Duration;

use crate::config::ParserConfig;

/// Maximum notification text length in bytes, after truncation.
pub const TEXT_MAX_BYTES: usize = 31;

/// Duration bounds in seconds, and the fallback when the value is absent
/// or unparseable.
pub const DURATION_MIN_SECS: u64 = 1;
pub const DURATION_MAX_SECS: u64 = 10;
pub const DURATION_DEFAULT_SECS: u64 = 2;

/// What the notification is about; selects the leading icon glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    Info,
    Error,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Info => "INFO",
            NotificationKind::Error => "ERROR",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "INFO" => Some(NotificationKind::Info),
            "ERROR" => Some(NotificationKind::Error),
            _ => None,
        }
    }

    /// Icon glyph in the extension font's private-use area.
    pub fn icon(self) -> char {
        match self {
            NotificationKind::Info => '\u{E137}',
            NotificationKind::Error => '\u{E140}',
        }
    }
}

/// Where on screen the panel appears; also selects the entry animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPosition {
    Left,
    Middle,
    #[default]
    Right,
}

impl PanelPosition {
    pub fn label(self) -> &'static str {
        match self {
            PanelPosition::Left => "LEFT",
            PanelPosition::Middle => "MIDDLE",
            PanelPosition::Right => "RIGHT",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "LEFT" => Some(PanelPosition::Left),
            "MIDDLE" => Some(PanelPosition::Middle),
            "RIGHT" => Some(PanelPosition::Right),
            _ => None,
        }
    }
}

/// A validated notification request.
///
/// An empty `text` is the sentinel for "malformed, discard": such a
/// request is never shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub text: String,
    pub kind: NotificationKind,
    pub position: PanelPosition,
    pub duration: Duration,
}

impl Default for NotificationRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: NotificationKind::default(),
            position: PanelPosition::default(),
            duration: Duration::from_secs(DURATION_DEFAULT_SECS),
        }
    }
}

impl NotificationRequest {
    /// Producer-side constructor: sanitizes the text and clamps the
    /// duration so the published entry is always within contract.
    pub fn new(
        text: &str,
        duration_secs: u64,
        kind: NotificationKind,
        position: PanelPosition,
    ) -> Self {
        Self {
            text: sanitize_text(text),
            kind,
            position,
            duration: Duration::from_secs(
                duration_secs.clamp(DURATION_MIN_SECS, DURATION_MAX_SECS),
            ),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.text.is_empty()
    }

    /// Serialize to the mailbox entry format.
    pub fn serialize(&self) -> String {
        format!(
            "text={}\ntype={}\nposition={}\nduration={}\n",
            self.text,
            self.kind.label(),
            self.position.label(),
            self.duration.as_secs()
        )
    }
}

/// Normalize newlines to spaces and truncate to [`TEXT_MAX_BYTES`] on a
/// character boundary.
pub fn sanitize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    truncate_on_boundary(&cleaned, TEXT_MAX_BYTES).to_owned()
}

fn truncate_on_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Leading decimal digits only; anything else ends the number. No digits
/// means zero, which the caller treats as "not given".
fn parse_leading_digits(value: &str) -> u64 {
    let mut secs: u64 = 0;
    for b in value.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        secs = secs.saturating_mul(10).saturating_add((b - b'0') as u64);
    }
    secs
}

/// Parse raw entry text into a request.
///
/// Always returns a request; callers reject it via [`NotificationRequest::is_valid`].
/// With `config.require_all_fields` set, a request missing any of the four
/// recognized keys is also marked invalid.
pub fn parse(raw: &str, config: &ParserConfig) -> NotificationRequest {
    let mut request = NotificationRequest::default();
    let (mut saw_text, mut saw_kind, mut saw_position, mut saw_duration) =
        (false, false, false, false);

    for line in raw.lines() {
        // Split on the first '=' only; '=' in the value is part of it.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim_matches([' ', '\t']);
        let value = value.trim_matches([' ', '\t', '\r']);

        match key {
            "text" => {
                if value.is_empty() {
                    continue;
                }
                request.text = truncate_on_boundary(value, TEXT_MAX_BYTES).to_owned();
                saw_text = true;
            }
            "duration" => {
                let secs = parse_leading_digits(value);
                let secs = if secs < DURATION_MIN_SECS {
                    DURATION_DEFAULT_SECS
                } else {
                    secs.min(DURATION_MAX_SECS)
                };
                request.duration = Duration::from_secs(secs);
                saw_duration = true;
            }
            "type" => {
                if let Some(kind) = NotificationKind::from_label(value) {
                    request.kind = kind;
                }
                saw_kind = true;
            }
            "position" => {
                if let Some(position) = PanelPosition::from_label(value) {
                    request.position = position;
                }
                saw_position = true;
            }
            _ => {}
        }
    }

    if config.require_all_fields && !(saw_text && saw_kind && saw_position && saw_duration) {
        request.text.clear();
    }

    request
}
