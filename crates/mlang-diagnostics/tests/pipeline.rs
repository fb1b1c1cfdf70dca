// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer errors flowing through a handler into the formatter and JSON.

use mlang_ast::Location;
use mlang_diagnostics::json::render_report;
use mlang_diagnostics::{Message, MessageFormatter, MessageHandler, MessageSink, Severity, ToMessage};
use mlang_lexer::{LexerConfig, SourceText, TokenBuffer};

fn lex_into(handler: &mut MessageHandler, name: &str, text: &str) {
    let config = LexerConfig::default();
    let source = SourceText::from_string(name, text, &config);
    if let Err(err) = TokenBuffer::tokenize(&source, &config) {
        handler.emit(err.to_message());
    }
}

#[test]
fn files_flush_in_unregister_order() {
    colored::control::set_override(false);
    let mut handler = MessageHandler::new();
    handler.register_file("a.m");
    handler.register_file("b.m");

    lex_into(&mut handler, "b.m", "x = \"open\n");
    handler.emit(Message::warning(Location::line("a.m", 3), "late"));
    handler.emit(Message::new(Location::line("a.m", 1), Severity::Info, "early"));

    handler.unregister_file("b.m");
    handler.unregister_file("a.m");

    let order: Vec<_> = handler
        .messages()
        .iter()
        .map(|m| (m.location.filename().to_string(), m.severity))
        .collect();
    assert_eq!(
        order,
        [
            ("b.m".to_string(), Severity::LexError),
            ("a.m".to_string(), Severity::Info),
            ("a.m".to_string(), Severity::Warning),
        ]
    );
    assert_eq!(handler.files_processed(), 2);
    assert_eq!(handler.exit_code(), 1);

    let text = MessageFormatter::brief().format_all(handler.messages());
    assert!(text.starts_with("b.m:1:5: lex error: "), "{text}");
    assert!(text.ends_with("1 error(s), 1 warning(s)\n"), "{text}");
}

#[test]
fn clean_files_report_success() {
    let mut handler = MessageHandler::new();
    handler.register_file("ok.m");
    lex_into(&mut handler, "ok.m", "x = [1 2 3]';\n");
    handler.unregister_file("ok.m");

    assert!(handler.messages().is_empty());
    let value: serde_json::Value = serde_json::from_str(&render_report(&handler)).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["files"], 1);
}

#[test]
fn unreadable_file_becomes_an_error_message() {
    let config = LexerConfig::default();
    let err = SourceText::load("/nonexistent/dir/missing.m", &config).unwrap_err();
    let message = err.to_message();
    assert_eq!(message.severity, Severity::Error);
    assert_eq!(message.location.filename(), "/nonexistent/dir/missing.m");
    assert!(message.message.starts_with("cannot read"));
}
