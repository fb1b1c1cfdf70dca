// SPDX-License-Identifier: (MIT OR Apache-2.0)

use mlang_ast::token::{Token, TokenKind};
use mlang_ast::{InvariantViolation, Location};
use mlang_diagnostics::{Message, Severity, ToMessage};
use mlang_lexer::LexError;

/// Why a file could not be parsed.
///
/// `Lex` and `Syntax` abort only the current file. `Internal` is a defect in
/// the parser and should stop the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{message}")]
    Syntax {
        location: Location,
        message: String,
        hint: Option<String>,
    },
    #[error("internal parser error: {message}")]
    Internal { location: Location, message: String },
}

impl ParseError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::Internal { .. })
    }

    pub fn location(&self) -> &Location {
        match self {
            ParseError::Lex(e) => &e.location,
            ParseError::Syntax { location, .. } | ParseError::Internal { location, .. } => location,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            ParseError::Lex(e) => e.hint.as_deref(),
            ParseError::Syntax { hint, .. } => hint.as_deref(),
            ParseError::Internal { .. } => None,
        }
    }

    pub(crate) fn syntax(location: Location, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            location,
            message: message.into(),
            hint: None,
        }
    }

    /// "Expected X, found Y". `found` is `None` at end of input.
    pub(crate) fn expected(expected: &str, found: Option<&Token>, location: Location) -> Self {
        let message = format_expected_message(expected, found);
        let hint = crate::hints::for_expected(expected, found.map(|t| t.kind)).map(String::from);
        ParseError::Syntax {
            location,
            message,
            hint,
        }
    }

    pub(crate) fn internal(location: Location, violation: InvariantViolation) -> Self {
        ParseError::Internal {
            location,
            message: violation.message,
        }
    }

    pub(crate) fn with_hint(mut self, text: impl Into<String>) -> Self {
        if let ParseError::Syntax { ref mut hint, .. } = self {
            *hint = Some(text.into());
        }
        self
    }
}

/// How a token is named in messages: kind, plus its text where that helps.
pub(crate) fn describe(token: Option<&Token>) -> String {
    let Some(token) = token else {
        return "end of file".to_string();
    };
    match token.kind {
        TokenKind::Identifier
        | TokenKind::Keyword
        | TokenKind::Number
        | TokenKind::Operator
        | TokenKind::CharArray
        | TokenKind::String => format!("{} '{}'", token.kind.display_name(), token.raw),
        TokenKind::Comma if token.anonymous => "whitespace".to_string(),
        _ => token.kind.display_name().to_string(),
    }
}

fn format_expected_message(expected: &str, found: Option<&Token>) -> String {
    let found_text = describe(found);
    match expected {
        "')'" | "']'" | "'}'" if found.is_none() => {
            format!("Unclosed bracket, missing {expected}")
        }
        "separator" => format!("Expected newline, ';' or ',' after statement, found {found_text}"),
        _ => format!("Expected {expected}, found {found_text}"),
    }
}

impl ToMessage for ParseError {
    fn to_message(&self) -> Message {
        match self {
            ParseError::Lex(e) => e.to_message(),
            ParseError::Syntax {
                location,
                message,
                hint,
            } => {
                let msg = Message::new(location.clone(), Severity::Error, message);
                match hint {
                    Some(h) => msg.with_hint(h.as_str()),
                    None => msg,
                }
            }
            ParseError::Internal { location, message } => Message::new(
                location.clone(),
                Severity::Error,
                format!("internal parser error: {message}"),
            )
            .with_hint("this is a bug in the parser, please report it")
            .fatal(),
        }
    }
}
