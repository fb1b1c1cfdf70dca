// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for MATLAB-family source code.
//!
//! Transforms the token stream of one file into a [`CompilationUnit`].
//! Parsing stops at the first error; [`parse_source`] runs the whole
//! lex-and-parse pipeline for a file and reports that error to a
//! [`MessageSink`].

mod error;
mod flatten;
mod hints;
mod parser;

pub use error::ParseError;
pub use parser::Parser;

use mlang_ast::decl::CompilationUnit;
use mlang_diagnostics::{MessageSink, ToMessage};
use mlang_lexer::{LexerConfig, SourceText, TokenBuffer};
use tracing::error;

/// Lex and parse `source`.
pub fn parse(source: &SourceText, config: &LexerConfig) -> Result<CompilationUnit, ParseError> {
    let buffer = TokenBuffer::tokenize(source, config)?;
    Parser::new(buffer.tokens(), source.shared_name()).parse_file()
}

/// [`parse`], with the file registered in `sink` for the duration and any
/// error reported there. `None` when the file could not be parsed.
pub fn parse_source(
    source: &SourceText,
    config: &LexerConfig,
    sink: &mut dyn MessageSink,
) -> Option<CompilationUnit> {
    sink.register_file(source.name());
    let result = parse(source, config);
    let unit = match result {
        Ok(unit) => Some(unit),
        Err(err) => {
            if err.is_fatal() {
                error!(file = source.name(), %err, "internal parser error");
            }
            sink.emit(err.to_message());
            None
        }
    };
    sink.unregister_file(source.name());
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlang_ast::decl::{BlockItem, BlockKind};
    use mlang_ast::expr::{BinaryOp, ExprKind, NameKind};
    use mlang_ast::stmt::StmtKind;
    use mlang_diagnostics::{MessageHandler, Severity};

    fn parse_str(src: &str) -> Result<CompilationUnit, ParseError> {
        let config = LexerConfig::default();
        let source = SourceText::from_string("t.m", src, &config);
        parse(&source, &config)
    }

    fn script(src: &str) -> mlang_ast::decl::ScriptFile {
        match parse_str(src) {
            Ok(CompilationUnit::Script(file)) => file,
            other => panic!("Expected a script, got {:?}", other),
        }
    }

    #[test]
    fn parse_assignment() {
        let file = script("x = 1 + 2;\n");
        assert_eq!(file.body.len(), 1);
        match &file.body[0].kind {
            StmtKind::Assign { lhs, rhs } => {
                assert_eq!(lhs.identifier(), Some("x"));
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn dispatch_on_first_token() {
        assert!(matches!(parse_str("function f\nend\n"), Ok(CompilationUnit::Function(_))));
        assert!(matches!(parse_str("% header\nclassdef C\nend\n"), Ok(CompilationUnit::Class(_))));
        assert!(matches!(parse_str("disp(1)\n"), Ok(CompilationUnit::Script(_))));
    }

    #[test]
    fn empty_file_is_an_empty_script() {
        let file = script("");
        assert!(file.body.is_empty());
        assert!(file.functions.is_empty());
    }

    #[test]
    fn comments_and_continuations_are_invisible() {
        let file = script("x = 1 + ... comment\n  2; % trailing\n\n\n% only a comment\ny = x;\n");
        assert_eq!(file.body.len(), 2);
    }

    #[test]
    fn script_with_local_functions() {
        let file = script("a = f(1);\nfunction y = f(x)\n  y = x;\nend\n");
        assert_eq!(file.body.len(), 1);
        assert_eq!(file.functions.len(), 1);
        assert!(file.functions[0].terminated);
    }

    #[test]
    fn shell_escape_statement() {
        let file = script("!ls -la\n");
        match &file.body[0].kind {
            StmtKind::Shell(cmd) => assert_eq!(cmd, "ls -la"),
            other => panic!("Expected shell escape, got {:?}", other),
        }
    }

    #[test]
    fn arguments_block_in_function() {
        let src = "function f(x, opts)\narguments\n  x (1,:) double {mustBePositive} = 1\n  opts.Mode string\nend\ndisp(x)\nend\n";
        let unit = parse_str(src).unwrap();
        let function = &unit.functions()[0];
        assert_eq!(function.validation.len(), 1);
        let block = &function.validation[0];
        assert_eq!(block.kind, BlockKind::Arguments);
        assert_eq!(block.items().len(), 2);
        match &block.items()[0] {
            BlockItem::Property(p) => {
                assert_eq!(p.name.identifier(), Some("x"));
                assert_eq!(p.dimensions.len(), 2);
                assert!(matches!(p.dimensions[1].kind, ExprKind::Reshape));
                assert_eq!(p.class_name.as_ref().and_then(|n| n.identifier()), Some("double"));
                assert_eq!(p.validators.len(), 1);
                assert!(p.default.is_some());
            }
            other => panic!("Expected property, got {:?}", other),
        }
        match &block.items()[1] {
            BlockItem::Property(p) => assert_eq!(p.name.dotted().as_deref(), Some("opts.Mode")),
            other => panic!("Expected property, got {:?}", other),
        }
        assert_eq!(function.body.len(), 1);
    }

    #[test]
    fn end_inside_index_is_a_value() {
        let file = script("y = x(end - 1, :);\n");
        let StmtKind::Assign { rhs, .. } = &file.body[0].kind else {
            panic!("Expected assignment");
        };
        let ExprKind::Name(NameKind::Reference { args, .. }) = &rhs.kind else {
            panic!("Expected reference, got {:?}", rhs.kind);
        };
        assert!(matches!(args[0].kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(args[1].kind, ExprKind::Reshape));
    }

    #[test]
    fn lex_errors_surface_as_parse_errors() {
        let err = parse_str("s = 'open\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn parse_source_reports_to_sink() {
        let config = LexerConfig::default();
        let source = SourceText::from_string("bad.m", "x = (1 + 2\n", &config);
        let mut handler = MessageHandler::new();
        assert!(parse_source(&source, &config, &mut handler).is_none());
        assert_eq!(handler.files_processed(), 1);
        let messages = handler.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
        assert_eq!(messages[0].location.filename(), "bad.m");
        assert_eq!(handler.exit_code(), 1);
    }

    #[test]
    fn parse_source_success_is_silent() {
        let config = LexerConfig::default();
        let source = SourceText::from_string("ok.m", "x = 1;\n", &config);
        let mut handler = MessageHandler::new();
        assert!(parse_source(&source, &config, &mut handler).is_some());
        assert!(handler.messages().is_empty());
        assert_eq!(handler.exit_code(), 0);
    }
}
