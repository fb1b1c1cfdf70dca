// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON output for machine consumption.

use serde::Serialize;

use crate::{Message, MessageHandler, Summary};

/// Everything a handler collected, in serializable form.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub success: bool,
    pub files: usize,
    pub summary: Summary,
    pub messages: &'a [Message],
}

impl<'a> Report<'a> {
    pub fn new(handler: &'a MessageHandler) -> Self {
        let summary = handler.summary();
        Self {
            version: 1,
            success: !summary.has_errors(),
            files: handler.files_processed(),
            summary,
            messages: handler.messages(),
        }
    }
}

/// Pretty JSON for the handler's flushed messages.
pub fn render_report(handler: &MessageHandler) -> String {
    serde_json::to_string_pretty(&Report::new(handler))
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageSink, Severity};
    use mlang_ast::{Columns, Location};

    #[test]
    fn report_shape() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.emit(
            Message::new(
                Location::span("a.m", 4, Columns::new(2, 5)),
                Severity::LexError,
                "Unterminated character array",
            )
            .with_hint("add a closing '"),
        );
        handler.unregister_file("a.m");

        let value: serde_json::Value = serde_json::from_str(&render_report(&handler)).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["success"], false);
        assert_eq!(value["files"], 1);
        assert_eq!(value["summary"]["lex_error"], 1);
        let msg = &value["messages"][0];
        assert_eq!(msg["severity"], "lex-error");
        assert_eq!(msg["location"]["filename"], "a.m");
        assert_eq!(msg["location"]["line"], 4);
        assert_eq!(msg["location"]["columns"]["start"], 2);
        assert_eq!(msg["location"]["columns"]["end"], 5);
        assert_eq!(msg["hint"], "add a closing '");
        assert_eq!(msg["fatal"], false);
    }

    #[test]
    fn hint_is_omitted_when_absent() {
        let mut handler = MessageHandler::new();
        handler.register_file("a.m");
        handler.emit(Message::warning(Location::file("a.m"), "w"));
        handler.unregister_file("a.m");
        let value: serde_json::Value = serde_json::from_str(&render_report(&handler)).unwrap();
        assert!(value["messages"][0].get("hint").is_none());
        assert_eq!(value["success"], true);
    }
}
