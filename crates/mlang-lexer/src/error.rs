// SPDX-License-Identifier: (MIT OR Apache-2.0)

use mlang_ast::{Location, Span};

/// What went wrong while lexing.
///
/// Also the logos error type; anything logos cannot match at all is an
/// unexpected character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    UnexpectedCharacter,
    UnterminatedCharArray,
    UnterminatedString,
    MalformedNumber,
    AmbiguousQuote,
    ContinuationInDirectoryCommand,
    UnterminatedBlockComment,
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: Location,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl LexError {
    /// Build the error for `kind`; `text` is the offending source text.
    pub fn new(kind: LexErrorKind, location: Location, span: Span, text: &str) -> Self {
        let (message, hint) = match kind {
            LexErrorKind::UnexpectedCharacter => {
                let c = text.chars().next().unwrap_or('?');
                (format!("Unexpected character '{}'", c.escape_default()), None)
            }
            LexErrorKind::UnterminatedCharArray => (
                "Unterminated character array".to_string(),
                Some("add a closing ' before the end of the line".to_string()),
            ),
            LexErrorKind::UnterminatedString => (
                "Unterminated string".to_string(),
                Some("add a closing \" before the end of the line".to_string()),
            ),
            LexErrorKind::MalformedNumber => (
                format!("Malformed number '{text}'"),
                Some("a number has at most one decimal point".to_string()),
            ),
            LexErrorKind::AmbiguousQuote => (
                "Cannot tell whether ' is a transpose or starts a character array".to_string(),
                Some("put a space before a character array, or parenthesise the transposed operand".to_string()),
            ),
            LexErrorKind::ContinuationInDirectoryCommand => (
                "Continuation is not allowed in a directory command".to_string(),
                Some("write the whole path on one line".to_string()),
            ),
            LexErrorKind::UnterminatedBlockComment => (
                "Unterminated block comment".to_string(),
                Some("close it with a line containing only %}".to_string()),
            ),
        };
        Self {
            kind,
            location,
            span,
            message,
            hint,
        }
    }
}
