//! Output sinks
//!
//! The loop renders everything the user sees through an [`OutputSink`]:
//! streamed model text, a progress label per tool call, and warnings for
//! failed tools or the iteration cap.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::logging::Logger;

/// Destination for user-visible loop output
pub trait OutputSink: Send + Sync {
    /// Streamed model text, in stream order
    fn emit_text(&self, text: &str);

    /// Short progress label (e.g. "calling tool: `query_table`")
    fn emit_progress(&self, label: &str);

    /// Inline warning or informational notice
    fn emit_warning(&self, message: &str);
}

/// Writes text to stdout and progress/warnings to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit_text(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn emit_progress(&self, label: &str) {
        eprintln!("\n> {}", label);
    }

    fn emit_warning(&self, message: &str) {
        eprintln!("\n⚠ {}", message);
    }
}

/// One call made on a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Text(String),
    Progress(String),
    Warning(String),
}

/// Keeps every emission in order, for tests and transcripts
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// All emitted text concatenated
    pub fn text(&self) -> String {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Progress(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Warning(w) => Some(w.clone()),
                _ => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn emit_text(&self, text: &str) {
        self.events.lock().push(SinkEvent::Text(text.to_string()));
    }

    fn emit_progress(&self, label: &str) {
        self.events.lock().push(SinkEvent::Progress(label.to_string()));
    }

    fn emit_warning(&self, message: &str) {
        self.events.lock().push(SinkEvent::Warning(message.to_string()));
    }
}

/// Forwards output to a [`Logger`], for headless hosts
pub struct LoggerSink {
    logger: Arc<dyn Logger>,
}

impl LoggerSink {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl OutputSink for LoggerSink {
    fn emit_text(&self, text: &str) {
        self.logger.info(&format!("[Output] {}", text));
    }

    fn emit_progress(&self, label: &str) {
        self.logger.info(&format!("[Output] {}", label));
    }

    fn emit_warning(&self, message: &str) {
        self.logger.warn(&format!("[Output] {}", message));
    }
}
