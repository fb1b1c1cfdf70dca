// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostics for the MATLAB-family front end.
//!
//! The lexer and parser only decide whether a file is well formed. Whatever
//! they have to say goes through a [`MessageSink`], which owns ordering,
//! per-file partitioning and the final summary. Error types of the
//! individual phases are turned into [`Message`]s via [`ToMessage`].

pub mod convert;
pub mod formatter;
pub mod handler;
pub mod json;

use mlang_ast::Location;
use serde::Serialize;

pub use formatter::MessageFormatter;
pub use handler::{MessageHandler, Summary};

// ============================================================================
// Core Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Style,
    Warning,
    LexError,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Style => "style",
            Severity::Warning => "warning",
            Severity::LexError => "lex error",
            Severity::Error => "error",
        }
    }

    /// Whether a message of this severity makes the run fail.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::LexError | Severity::Error)
    }
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub location: Location,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// The run cannot continue past this message.
    pub fatal: bool,
}

// ============================================================================
// Builder API
// ============================================================================

impl Message {
    pub fn new(location: Location, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            location,
            severity,
            message: message.into(),
            hint: None,
            fatal: false,
        }
    }

    pub fn error(location: Location, message: impl Into<String>) -> Self {
        Self::new(location, Severity::Error, message)
    }

    pub fn warning(location: Location, message: impl Into<String>) -> Self {
        Self::new(location, Severity::Warning, message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

// ============================================================================
// Collaborator Interface
// ============================================================================

/// Where the front end sends its messages.
///
/// A file is registered before its analysis starts and unregistered when it
/// completes; messages for a file are only emitted in between.
pub trait MessageSink {
    fn register_file(&mut self, filename: &str);
    fn emit(&mut self, message: Message);
    fn unregister_file(&mut self, filename: &str);
}

/// Convert a phase error into a message.
pub trait ToMessage {
    fn to_message(&self) -> Message;
}
