//! Where notices end up.

use std::io::Write;
use std::sync::Mutex;

use super::outcome::{Notice, NoticeKind};

/// Displays a notice to the user. Fire and forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices as single lines, e.g. to stdout for the CLI.
pub struct ConsoleSink<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> NotificationSink for ConsoleSink<W> {
    fn notify(&self, notice: Notice) {
        let marker = match notice.kind {
            NoticeKind::Success => "✓",
            NoticeKind::Error => "✗",
        };
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{} {}: {}", marker, notice.title, notice.text) {
            tracing::warn!(error = %e, "Failed to write notice");
        }
    }
}
