// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from lexer error types to `Message`.
//!
//! Parse errors convert in the parser crate, which depends on this one.

use mlang_ast::Location;
use mlang_lexer::{LexError, SourceError};

use crate::{Message, Severity, ToMessage};

impl ToMessage for LexError {
    fn to_message(&self) -> Message {
        let mut msg = Message::new(self.location.clone(), Severity::LexError, &self.message);
        if let Some(ref hint) = self.hint {
            msg = msg.with_hint(hint.as_str());
        }
        msg
    }
}

impl ToMessage for SourceError {
    fn to_message(&self) -> Message {
        match self {
            SourceError::Io { path, .. } => {
                Message::error(Location::file(path.to_string_lossy().as_ref()), self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlang_lexer::{LexErrorKind, LexerConfig, SourceText, TokenBuffer};

    #[test]
    fn lex_error_keeps_location_and_hint() {
        let config = LexerConfig::default();
        let source = SourceText::from_string("bad.m", "s = 'open", &config);
        let err = TokenBuffer::tokenize(&source, &config).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedCharArray);

        let msg = err.to_message();
        assert_eq!(msg.severity, Severity::LexError);
        assert_eq!(msg.location.line_number(), Some(1));
        assert_eq!(msg.location.col_start(), Some(4));
        assert!(msg.hint.is_some());
        assert!(!msg.fatal);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = SourceText::load("/no/such/file.m", &LexerConfig::default()).unwrap_err();
        let msg = err.to_message();
        assert_eq!(msg.severity, Severity::Error);
        assert_eq!(msg.location.filename(), "/no/such/file.m");
    }
}
