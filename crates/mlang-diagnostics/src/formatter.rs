// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for messages.
//!
//! ```text
//! model/step.m:3:9: error: Expected ')', found end of line
//!    3 | y = f(x,
//!      |         ^
//!      = help: add ')' to close the parenthesis
//! ```

use colored::Colorize;

use crate::{Message, Severity};

/// Formats messages for terminal output. Colour follows the `colored`
/// crate's global setting.
#[derive(Debug, Clone, Default)]
pub struct MessageFormatter {
    show_context: bool,
}

impl MessageFormatter {
    pub fn new() -> Self {
        Self { show_context: true }
    }

    /// Only the header line, no source excerpt or hint.
    pub fn brief() -> Self {
        Self { show_context: false }
    }

    pub fn format(&self, message: &Message) -> String {
        let mut out = String::new();
        self.format_header(&mut out, message);
        if self.show_context {
            self.format_context(&mut out, message);
            if let Some(ref hint) = message.hint {
                out.push_str(&format!("{}{} {}: {}\n", " ".repeat(6), "=".cyan(), "help".cyan().bold(), hint));
            }
        }
        out
    }

    /// Every message, then a one-line summary.
    pub fn format_all<'a>(&self, messages: impl IntoIterator<Item = &'a Message>) -> String {
        let mut out = String::new();
        let mut errors = 0;
        let mut warnings = 0;
        for message in messages {
            out.push_str(&self.format(message));
            if message.severity.is_error() {
                errors += 1;
            } else if message.severity == Severity::Warning {
                warnings += 1;
            }
        }
        out.push_str(&format!("{} error(s), {} warning(s)\n", errors, warnings));
        out
    }

    fn format_header(&self, out: &mut String, message: &Message) {
        let severity = match message.severity {
            Severity::Error | Severity::LexError => message.severity.label().red().bold(),
            Severity::Warning => message.severity.label().yellow().bold(),
            Severity::Style => message.severity.label().magenta().bold(),
            Severity::Info => message.severity.label().blue().bold(),
        };
        let fatal = if message.fatal { " (fatal)" } else { "" };
        out.push_str(&format!(
            "{}: {}{}: {}\n",
            message.location,
            severity,
            fatal,
            message.message.bold()
        ));
    }

    fn format_context(&self, out: &mut String, message: &Message) {
        let loc = &message.location;
        let (Some(line), Some(text)) = (loc.line_number(), loc.context()) else {
            return;
        };
        out.push_str(&format!("{:>4} {} {}\n", line.to_string().blue().bold(), "|".blue(), text));
        if let Some(cols) = loc.columns() {
            let shown = text.chars().count() as u32;
            let start = cols.start().min(shown);
            let width = cols.width().min(shown.saturating_sub(start)).max(1);
            out.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(4),
                "|".blue(),
                " ".repeat(start as usize),
                "^".repeat(width as usize).red().bold()
            ));
        }
    }
}
