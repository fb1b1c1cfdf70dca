// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The default message sink.
//!
//! Messages are partitioned per file while that file is being analysed and
//! released, sorted by location, when the file is unregistered. Files can
//! therefore be analysed in any order (or concurrently, each behind its own
//! handler) without interleaving their output.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{Message, MessageSink, Severity};

/// Message counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub info: usize,
    pub style: usize,
    pub warning: usize,
    pub lex_error: usize,
    pub error: usize,
}

impl Summary {
    fn record(&mut self, severity: Severity) {
        *self.slot(severity) += 1;
    }

    fn slot(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Info => &mut self.info,
            Severity::Style => &mut self.style,
            Severity::Warning => &mut self.warning,
            Severity::LexError => &mut self.lex_error,
            Severity::Error => &mut self.error,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Info => self.info,
            Severity::Style => self.style,
            Severity::Warning => self.warning,
            Severity::LexError => self.lex_error,
            Severity::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        self.info + self.style + self.warning + self.lex_error + self.error
    }

    pub fn has_errors(&self) -> bool {
        self.lex_error + self.error > 0
    }
}

#[derive(Debug, Default)]
pub struct MessageHandler {
    pending: HashMap<String, Vec<Message>>,
    flushed: Vec<Message>,
    summary: Summary,
    files: usize,
}

impl MessageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of every file unregistered so far, file by file.
    pub fn messages(&self) -> &[Message] {
        &self.flushed
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Number of files that completed analysis.
    pub fn files_processed(&self) -> usize {
        self.files
    }

    /// Whether any flushed message asked for the run to stop.
    pub fn fatal(&self) -> bool {
        self.flushed.iter().any(|m| m.fatal)
    }

    /// 0 when clean, 1 when any error was reported.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.summary.has_errors())
    }
}

impl MessageSink for MessageHandler {
    fn register_file(&mut self, filename: &str) {
        if self.pending.insert(filename.to_string(), Vec::new()).is_some() {
            warn!(file = filename, "file registered twice; earlier messages dropped");
        }
    }

    fn emit(&mut self, message: Message) {
        let file = message.location.filename().to_string();
        if !self.pending.contains_key(&file) {
            warn!(file = %file, "message for unregistered file");
        }
        self.pending.entry(file).or_default().push(message);
    }

    fn unregister_file(&mut self, filename: &str) {
        let Some(mut messages) = self.pending.remove(filename) else {
            warn!(file = filename, "unregistering unknown file");
            return;
        };
        messages.sort_by(|a, b| a.location.cmp(&b.location));
        messages.dedup();
        for message in &messages {
            self.summary.record(message.severity);
        }
        debug!(file = filename, messages = messages.len(), "file flushed");
        self.flushed.extend(messages);
        self.files += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlang_ast::{Columns, Location};

    fn at(file: &str, line: u32, col: u32) -> Location {
        Location::span(file, line, Columns::new(col, col))
    }

    #[test]
    fn messages_flush_sorted_per_file() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.register_file("b.m");
        handler.emit(Message::warning(at("a.m", 5, 0), "late"));
        handler.emit(Message::error(at("b.m", 1, 0), "other file"));
        handler.emit(Message::warning(at("a.m", 2, 3), "early"));
        assert!(handler.messages().is_empty());

        handler.unregister_file("a.m");
        let texts: Vec<_> = handler.messages().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["early", "late"]);

        handler.unregister_file("b.m");
        assert_eq!(handler.messages().len(), 3);
        assert_eq!(handler.files_processed(), 2);
    }

    #[test]
    fn duplicates_are_reported_once() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.emit(Message::warning(at("a.m", 1, 0), "same"));
        handler.emit(Message::warning(at("a.m", 1, 0), "same"));
        handler.unregister_file("a.m");
        assert_eq!(handler.messages().len(), 1);
    }

    #[test]
    fn summary_and_exit_code() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.emit(Message::new(at("a.m", 1, 0), Severity::Style, "spacing"));
        handler.unregister_file("a.m");
        assert_eq!(handler.summary().style, 1);
        assert_eq!(handler.exit_code(), 0);

        handler.register_file("b.m");
        handler.emit(Message::new(at("b.m", 1, 0), Severity::LexError, "bad char"));
        handler.unregister_file("b.m");
        assert_eq!(handler.summary().count(Severity::LexError), 1);
        assert_eq!(handler.summary().total(), 2);
        assert_eq!(handler.exit_code(), 1);
    }

    #[test]
    fn fatal_messages_are_visible() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.emit(Message::error(Location::file("a.m"), "broken").fatal());
        handler.unregister_file("a.m");
        assert!(handler.fatal());
    }

    #[test]
    fn unregistered_messages_are_kept() {
        let mut handler = MessageHandler::new();
        handler.emit(Message::warning(Location::file("x.m"), "stray"));
        handler.unregister_file("x.m");
        assert_eq!(handler.messages().len(), 1);
    }
}
