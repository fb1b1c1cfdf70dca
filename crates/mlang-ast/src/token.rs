// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions for the lexer.

use crate::{Location, Span};

/// Reserved words. An identifier whose text is in this set is a keyword.
pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "classdef",
    "continue",
    "else",
    "elseif",
    "end",
    "for",
    "function",
    "global",
    "if",
    "otherwise",
    "parfor",
    "persistent",
    "return",
    "spmd",
    "switch",
    "try",
    "while",
];

/// Words that are keywords only in specific positions (class bodies and
/// function preambles). The lexer decides; everywhere else they are names.
pub const CONTEXTUAL_KEYWORDS: &[&str] = &[
    "arguments",
    "enumeration",
    "events",
    "methods",
    "properties",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// A token produced by the lexer.
///
/// `raw` is always the exact source text, so a token stream can be
/// re-emitted byte for byte. Anonymous tokens are synthesized by the lexer
/// (element separators inside matrices) and have empty raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub location: Location,
    pub span: Span,
    pub first_in_line: bool,
    pub first_in_statement: bool,
    pub anonymous: bool,
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    /// Single-quoted character array, or one word of a command-syntax call.
    CharArray,
    /// Double-quoted string.
    String,
    Operator,

    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Assignment,
    Selection,
    At,
    /// Shell escape: `!` and the rest of its line.
    Bang,
    /// The `?` of a metaclass query.
    Metaclass,

    Newline,
    Continuation,
    Comment,
    /// Verbatim argument text of `cd`, `mkdir` or `rmdir`.
    Directory,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::CharArray => "character array",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Assignment => "'='",
            TokenKind::Selection => "'.'",
            TokenKind::At => "'@'",
            TokenKind::Bang => "shell escape",
            TokenKind::Metaclass => "'?'",
            TokenKind::Newline => "end of line",
            TokenKind::Continuation => "continuation",
            TokenKind::Comment => "comment",
            TokenKind::Directory => "directory argument",
        }
    }

    pub fn is_opening_bracket(&self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    pub fn is_closing_bracket(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }

    /// Tokens the parser never sees.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Continuation)
    }
}

impl Token {
    /// The semantic value: the raw text with its delimiters removed.
    ///
    /// Quotes are stripped (and doubled quotes collapsed) for character
    /// arrays and strings, the leading marker for comments and
    /// continuations. Every other kind returns the raw text.
    pub fn value(&self) -> String {
        match self.kind {
            TokenKind::CharArray => dequote(&self.raw, '\''),
            TokenKind::String => dequote(&self.raw, '"'),
            TokenKind::Comment => comment_text(&self.raw).to_string(),
            TokenKind::Continuation => {
                let rest = self.raw.strip_prefix("...").unwrap_or(&self.raw);
                trim_line_break(rest).to_string()
            }
            TokenKind::Bang => self.raw.strip_prefix('!').unwrap_or(&self.raw).to_string(),
            TokenKind::Directory => {
                if self.raw.len() >= 2 && self.raw.starts_with('\'') && self.raw.ends_with('\'') {
                    dequote(&self.raw, '\'')
                } else {
                    self.raw.clone()
                }
            }
            _ => self.raw.clone(),
        }
    }

    pub fn is(&self, kind: TokenKind, raw: &str) -> bool {
        self.kind == kind && self.raw == raw
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.is(TokenKind::Keyword, word)
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.is(TokenKind::Operator, op)
    }

    /// `'` or `.'` used as a postfix operator.
    pub fn is_transpose(&self) -> bool {
        self.is_operator("'") || self.is_operator(".'")
    }

    /// Number of line breaks contained in the raw text.
    pub fn line_breaks(&self) -> usize {
        self.raw.matches('\n').count()
    }
}

/// Remove quote delimiters: quoted runs lose their quotes and a doubled
/// quote inside a run stands for one quote character. Text outside quoted
/// runs (command-syntax words) is kept as is.
pub fn dequote(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        if c != quote {
            out.push(c);
        } else if !quoted {
            quoted = true;
        } else if chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else {
            quoted = false;
        }
    }
    out
}

/// Wrap text in quotes, doubling embedded quotes. Inverse of [`dequote`]
/// for fully-quoted literals.
pub fn enquote(text: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!("{quote}{}{quote}", text.replace(quote, &doubled))
}

fn comment_text(raw: &str) -> &str {
    for (open, close) in [("%{", "%}"), ("#{", "#}")] {
        if let Some(body) = raw.strip_prefix(open) {
            let body = body.trim_end();
            let body = body.strip_suffix(close).unwrap_or(body);
            return body.trim_matches(|c| c == '\n' || c == '\r');
        }
    }
    raw.strip_prefix('%')
        .or_else(|| raw.strip_prefix('#'))
        .unwrap_or(raw)
}

fn trim_line_break(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}
