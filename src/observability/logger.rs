//! Structured JSON logger
//!
//! - one log line = one event, valid JSON
//! - `event` first, `severity` second, remaining fields sorted by key,
//!   so identical events always serialize identically
//! - synchronous, unbuffered writes; INFO and below to stdout, ERROR to
//!   stderr

use std::fmt::Display;
use std::io::{self, Write};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Fine-grained detail.
    Trace = 0,
    /// Normal operations.
    Info = 1,
    /// Degraded but recovered operations.
    Warn = 2,
    /// Operation failures.
    Error = 3,
}

impl Severity {
    /// String form used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

/// A structured event under construction.
///
/// ```ignore
/// LogEvent::new("VERSION_FROZEN")
///     .field("owner_id", owner_id)
///     .field("semantic_version", &request.semantic_version)
///     .info();
/// ```
#[derive(Debug)]
pub struct LogEvent {
    event: &'static str,
    fields: Vec<(String, String)>,
}

impl LogEvent {
    /// Starts an event with the given name.
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            fields: Vec::new(),
        }
    }

    /// Attaches a field. Values are captured via `Display`.
    pub fn field(mut self, key: &str, value: impl Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Emits at TRACE severity.
    pub fn trace(self) {
        self.emit(Severity::Trace);
    }

    /// Emits at INFO severity.
    pub fn info(self) {
        self.emit(Severity::Info);
    }

    /// Emits at WARN severity.
    pub fn warn(self) {
        self.emit(Severity::Warn);
    }

    /// Emits at ERROR severity.
    pub fn error(self) {
        self.emit(Severity::Error);
    }

    fn emit(self, severity: Severity) {
        let line = self.render(severity);
        if severity >= Severity::Error {
            let mut err = io::stderr();
            let _ = err.write_all(line.as_bytes());
            let _ = err.flush();
        } else {
            let mut out = io::stdout();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }
    }

    /// Renders the event as one JSON line.
    ///
    /// Built by hand: field order stays deterministic regardless of
    /// call-site order, with no serializer in the hot path.
    fn render(mut self, severity: Severity) -> String {
        self.fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":\"");
        escape_into(&mut line, self.event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        for (key, value) in &self.fields {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }

        line.push('}');
        line.push('\n');
        line
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
}
