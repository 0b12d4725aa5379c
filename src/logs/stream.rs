//! Log console state
//!
//! Consumes the ordered, push-based line stream from the running server.
//! Lines arrive through an unbounded channel owned by the process manager;
//! the console classifies each one on arrival, tracks the active-backend
//! signal, and exposes per-category visibility filters that apply
//! retroactively at render time.

use crate::logs::classify::{classify, LogCategory};
use std::collections::HashSet;

/// One classified log line. Constructed once per raw line, immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub category: LogCategory,
    pub text: String,
}

/// Console state for one supervision session.
///
/// The event buffer is unbounded by design: the source stream has no
/// backpressure and the operator clears the buffer explicitly.
#[derive(Debug, Clone)]
pub struct LogConsole {
    events: Vec<LogEvent>,
    hidden: HashSet<LogCategory>,
    /// Canonical name of the backend observed in the log stream. Set once
    /// per session, refreshed in place on later announcements, never
    /// cleared while the session lives.
    active_backend: Option<&'static str>,
}

impl Default for LogConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConsole {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            hidden: HashSet::new(),
            active_backend: None,
        }
    }

    /// Ingest one raw line, in arrival order. Classifies, updates the
    /// active-backend signal, and appends the event. Never drops a line.
    pub fn push(&mut self, line: impl Into<String>) {
        let text = line.into();
        let classified = classify(&text);
        if let Some(backend) = classified.backend {
            if self.active_backend != Some(backend) {
                tracing::info!("active backend detected from logs: {}", backend);
            }
            self.active_backend = Some(backend);
        }
        self.events.push(LogEvent {
            category: classified.category,
            text,
        });
    }

    /// Backend announced by the stream, displayed with priority over the
    /// probe-based report.
    pub fn active_backend(&self) -> Option<&'static str> {
        self.active_backend
    }

    /// Reset the active-backend signal for a new server session. The event
    /// buffer is left alone so logs from the previous run stay readable.
    pub fn begin_session(&mut self) {
        self.active_backend = None;
    }

    pub fn set_visible(&mut self, category: LogCategory, visible: bool) {
        if visible {
            self.hidden.remove(&category);
        } else {
            self.hidden.insert(category);
        }
    }

    pub fn is_visible(&self, category: LogCategory) -> bool {
        !self.hidden.contains(&category)
    }

    /// All events, filtered by the current visibility toggles. Filtering
    /// happens here rather than at ingestion, so toggles apply to already
    /// received events as well as future ones.
    pub fn visible_events(&self) -> impl Iterator<Item = &LogEvent> {
        self.events
            .iter()
            .filter(|e| !self.hidden.contains(&e.category))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Empty the buffer. Filters and the active-backend signal survive.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
