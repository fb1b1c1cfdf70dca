// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.
//!
//! Logos matches the context-free lexemes. [`Lexer`] wraps it and keeps the
//! state logos cannot see: the previous token (quote disambiguation), the
//! open brackets (element separators in matrices), statement starts
//! (command syntax) and the enclosing blocks (contextual keywords).

use std::collections::VecDeque;
use std::sync::Arc;

use logos::Logos;
use mlang_ast::token::{is_keyword, Token, TokenKind, CONTEXTUAL_KEYWORDS};
use mlang_ast::{Columns, Location, Span};
use tracing::trace;

use crate::config::LexerConfig;
use crate::error::{LexError, LexErrorKind};
use crate::source::SourceText;

/// Commands whose argument is a raw path rather than words.
const DIRECTORY_COMMANDS: &[&str] = &["cd", "mkdir", "rmdir"];

/// Operators that, followed by a blank, make `name op ...` an expression
/// rather than a command. Longest first.
const BINARY_OPERATORS: &[&str] = &[
    "==", "~=", "!=", "<=", ">=", "&&", "||", ".^", ".*", "./", ".\\", "+", "-", "*", "/", "\\",
    "^", "<", ">", "&", "|", ":",
];

const INTEGER_SUFFIXES: &[&str] = &["u8", "u16", "u32", "u64", "s8", "s16", "s32", "s64"];

/// How the next `'` is read. Set by [`Lexer`] before every logos step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum QuoteMode {
    #[default]
    String,
    Transpose,
    Ambiguous,
}

#[derive(Debug, Default)]
struct LexState {
    quote: QuoteMode,
}

/// Raw token type for logos; classified by [`Lexer`].
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(extras = LexState)]
#[logos(error = LexErrorKind)]
enum RawToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n", merge_blank_lines)]
    Newline,

    #[token("...", continuation)]
    Continuation,

    #[regex(r"%[^\r\n]*")]
    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+", number)]
    #[regex(r"\.[0-9]+", fraction)]
    Number,

    #[token("'", quote)]
    Quote,

    #[token("\"", double_quoted)]
    DoubleQuoted,

    #[token("==")]
    #[token("~=")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token(".^")]
    #[token(".*")]
    #[token("./")]
    #[token(".\\")]
    #[token(".'")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("\\")]
    #[token("^")]
    #[token("<")]
    #[token(">")]
    #[token("&")]
    #[token("|")]
    #[token("~")]
    Operator,

    #[token("!")]
    #[token("!=")]
    Bang,

    #[token("=")]
    Assignment,
    #[token(".")]
    Selection,
    #[token("@")]
    At,
    #[token("?")]
    Metaclass,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

/// Fold following blank lines into the newline token.
fn merge_blank_lines(lex: &mut logos::Lexer<RawToken>) {
    let rest = lex.remainder().as_bytes();
    let mut consumed = 0;
    loop {
        let blank = rest[consumed..]
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r'))
            .count();
        if rest.get(consumed + blank) == Some(&b'\n') {
            consumed += blank + 1;
        } else {
            break;
        }
    }
    lex.bump(consumed);
}

/// `...` swallows the rest of its line, line break included.
fn continuation(lex: &mut logos::Lexer<RawToken>) {
    let rest = lex.remainder();
    let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
    lex.bump(len);
}

fn digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `0x1F`, `0b101`, with an optional integer class suffix.
fn radix_literal(bytes: &[u8]) -> Option<usize> {
    let run = match bytes.first()? {
        b'x' | b'X' => bytes[1..].iter().take_while(|b| b.is_ascii_hexdigit()).count(),
        b'b' | b'B' => bytes[1..].iter().take_while(|b| matches!(b, b'0' | b'1')).count(),
        _ => return None,
    };
    if run == 0 {
        return None;
    }
    let len = 1 + run;
    let suffix = INTEGER_SUFFIXES
        .iter()
        .find(|s| bytes[len..].starts_with(s.as_bytes()))
        .map_or(0, |s| s.len());
    if bytes.get(len + suffix).is_some_and(|&b| is_ident_byte(b)) {
        return Some(len);
    }
    Some(len + suffix)
}

/// Exponent and imaginary suffix after the mantissa. A further `.digit`
/// makes the whole run malformed.
fn number_tail(bytes: &[u8]) -> (usize, Result<(), LexErrorKind>) {
    let mut i = 0;
    if matches!(bytes.first(), Some(b'e' | b'E' | b'd' | b'D')) {
        let sign = usize::from(matches!(bytes.get(1), Some(b'+' | b'-')));
        if bytes.get(1 + sign).is_some_and(u8::is_ascii_digit) {
            i = 1 + sign + digits(&bytes[1 + sign..]);
        }
    }
    if matches!(bytes.get(i), Some(b'i' | b'j' | b'I' | b'J'))
        && !bytes.get(i + 1).is_some_and(|&b| is_ident_byte(b))
    {
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        let run = 1 + digits(&bytes[i + 1..]);
        return (i + run, Err(LexErrorKind::MalformedNumber));
    }
    (i, Ok(()))
}

fn number(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let bytes = lex.remainder().as_bytes();
    if lex.slice() == "0" {
        if let Some(len) = radix_literal(bytes) {
            lex.bump(len);
            return Ok(());
        }
    }
    let mut mantissa = 0;
    if bytes.first() == Some(&b'.') {
        match bytes.get(1) {
            Some(b) if b.is_ascii_digit() => mantissa = 1 + digits(&bytes[1..]),
            // `1.*x`, `1.'` and `1...` keep the dot for the next token.
            Some(b'*' | b'/' | b'\\' | b'^' | b'\'' | b'.') => {}
            _ => mantissa = 1,
        }
    }
    let (tail, result) = number_tail(&bytes[mantissa..]);
    lex.bump(mantissa + tail);
    result
}

fn fraction(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let (tail, result) = number_tail(lex.remainder().as_bytes());
    lex.bump(tail);
    result
}

/// Scan to the closing `quote`; a doubled quote is an escaped quote.
fn quoted(
    lex: &mut logos::Lexer<RawToken>,
    quote: u8,
    unterminated: LexErrorKind,
) -> Result<(), LexErrorKind> {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    loop {
        match bytes.get(i) {
            None | Some(b'\n' | b'\r') => {
                lex.bump(i);
                return Err(unterminated);
            }
            Some(&b) if b == quote => {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    lex.bump(i + 1);
                    return Ok(());
                }
            }
            Some(_) => i += 1,
        }
    }
}

fn quote(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    match lex.extras.quote {
        QuoteMode::Transpose => Ok(()),
        QuoteMode::Ambiguous => Err(LexErrorKind::AmbiguousQuote),
        QuoteMode::String => quoted(lex, b'\'', LexErrorKind::UnterminatedCharArray),
    }
}

fn double_quoted(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    quoted(lex, b'"', LexErrorKind::UnterminatedString)
}

/// Length of the `(\.ident)*` chain after a command head.
fn dotted_chain_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
        i += 2;
        while bytes.get(i).is_some_and(|&b| is_ident_byte(b)) {
            i += 1;
        }
    }
    i
}

/// Whether the text after a statement-initial name makes it a command:
/// a blank, then something that cannot continue an expression.
fn starts_command(after: &str) -> bool {
    let body = after.trim_start_matches([' ', '\t']);
    if body.len() == after.len() {
        return false;
    }
    let bytes = body.as_bytes();
    match bytes.first() {
        None | Some(b'\n' | b'\r' | b';' | b',' | b'%' | b'#' | b'(') => return false,
        Some(b'=') if bytes.get(1) != Some(&b'=') => return false,
        _ => {}
    }
    if body.starts_with("...") {
        return false;
    }
    if let Some(op) = BINARY_OPERATORS.iter().find(|op| body.starts_with(**op)) {
        let next = bytes.get(op.len());
        if next.map_or(true, |b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
            return false;
        }
    }
    true
}

/// Length of command text up to a terminator. Blanks end a word unless
/// `keep_blanks`; quoted runs never end early. `Err` carries the length
/// scanned when a quote is left open.
fn command_text_len(body: &str, keep_blanks: bool) -> Result<usize, usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    let mut in_quotes = false;
    while let Some(&b) = bytes.get(i) {
        if in_quotes {
            match b {
                b'\n' | b'\r' => return Err(i),
                b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 1,
                b'\'' => in_quotes = false,
                _ => {}
            }
        } else {
            match b {
                b'\n' | b'\r' | b';' | b',' | b'%' | b'#' => break,
                b' ' | b'\t' if !keep_blanks => break,
                b'\'' => in_quotes = true,
                _ => {}
            }
        }
        i += 1;
    }
    if in_quotes {
        Err(i)
    } else {
        Ok(i)
    }
}

fn ends_block_header(rest: &str) -> bool {
    let body = rest.trim_start_matches([' ', '\t']);
    body.is_empty() || body.starts_with(['\n', '\r', '%', '#', '('])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Words,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// A command whose dotted head ends at this byte offset.
    CommandAfter(usize, CommandKind),
    Command(CommandKind),
}

/// Blocks closed by `end`, as far as the lexer needs to know them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Classdef,
    Function,
    Methods,
    /// `properties`, `events`, `enumeration` and `arguments`.
    Declarations,
    Control,
}

#[derive(Debug, Clone, Copy)]
struct Bracket {
    kind: TokenKind,
    /// `(` right after `@`.
    lambda_params: bool,
}

/// The previous significant token.
#[derive(Debug, Clone, Copy)]
struct Prev {
    kind: TokenKind,
    value_end: bool,
    transpose: bool,
    closes_lambda: bool,
}

/// The lexer for one source text.
pub struct Lexer<'a> {
    text: &'a str,
    filename: Arc<str>,
    octave: bool,
    inner: logos::Lexer<'a, RawToken>,
    pending: VecDeque<Token>,
    line: u32,
    line_start: usize,
    line_context: Arc<str>,
    col_cache: (usize, u32),
    first_in_line: bool,
    first_in_statement: bool,
    after_ws: bool,
    prev: Option<Prev>,
    brackets: Vec<Bracket>,
    blocks: Vec<Block>,
    mode: Mode,
    last_end: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceText, config: &LexerConfig) -> Self {
        let text = source.text();
        let mut lexer = Self {
            text,
            filename: source.shared_name(),
            octave: config.octave,
            inner: RawToken::lexer_with_extras(text, LexState::default()),
            pending: VecDeque::new(),
            line: 1,
            line_start: 0,
            line_context: Arc::from(""),
            col_cache: (0, 0),
            first_in_line: true,
            first_in_statement: true,
            after_ws: false,
            prev: None,
            brackets: Vec::new(),
            blocks: Vec::new(),
            mode: Mode::Normal,
            last_end: 0,
        };
        lexer.refresh_context();
        lexer
    }

    /// The text being lexed. Token spans index into it.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Whitespace after the last token. Complete once `next_token` has
    /// returned `None`.
    pub fn trailing_whitespace(&self) -> &'a str {
        &self.text[self.last_end..]
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(Some(token));
        }
        if let Mode::CommandAfter(at, kind) = self.mode {
            if self.last_end == at {
                self.mode = Mode::Command(kind);
            } else if self.last_end > at {
                self.mode = Mode::Normal;
            }
        }
        if let Mode::Command(kind) = self.mode {
            if let Some(token) = self.command_token(kind)? {
                return Ok(Some(token));
            }
        }
        loop {
            self.inner.extras.quote = self.quote_mode();
            let Some(result) = self.inner.next() else {
                return Ok(None);
            };
            let span = self.inner.span();
            let raw = match result {
                Ok(raw) => raw,
                Err(kind) => return Err(self.error(kind, span.start, span.end)),
            };
            let mut end = span.end;
            let kind = match raw {
                RawToken::Whitespace => {
                    self.after_ws = true;
                    continue;
                }
                RawToken::Newline => TokenKind::Newline,
                RawToken::Continuation => TokenKind::Continuation,
                RawToken::Comment => {
                    end = self.block_comment(span.start, span.end)?;
                    TokenKind::Comment
                }
                RawToken::Identifier => self.identifier(span.start, span.end),
                RawToken::Number => TokenKind::Number,
                RawToken::Quote if self.inner.extras.quote == QuoteMode::Transpose => {
                    TokenKind::Operator
                }
                RawToken::Quote => TokenKind::CharArray,
                RawToken::DoubleQuoted => TokenKind::String,
                RawToken::Operator => TokenKind::Operator,
                RawToken::Bang => {
                    if self.first_in_statement && self.brackets.is_empty() && !self.octave {
                        let rest = self.inner.remainder();
                        let len = rest.find(['\r', '\n']).unwrap_or(rest.len());
                        self.inner.bump(len);
                        end += len;
                        TokenKind::Bang
                    } else if self.octave {
                        TokenKind::Operator
                    } else {
                        return Err(self.error(
                            LexErrorKind::UnexpectedCharacter,
                            span.start,
                            span.start + 1,
                        ));
                    }
                }
                RawToken::Assignment => TokenKind::Assignment,
                RawToken::Selection => TokenKind::Selection,
                RawToken::At => TokenKind::At,
                RawToken::Metaclass => TokenKind::Metaclass,
                RawToken::Comma => TokenKind::Comma,
                RawToken::Semicolon => TokenKind::Semicolon,
                RawToken::Colon => TokenKind::Colon,
                RawToken::LParen => TokenKind::LParen,
                RawToken::RParen => TokenKind::RParen,
                RawToken::LBracket => TokenKind::LBracket,
                RawToken::RBracket => TokenKind::RBracket,
                RawToken::LBrace => TokenKind::LBrace,
                RawToken::RBrace => TokenKind::RBrace,
            };
            return Ok(Some(self.emit(kind, span.start, end)));
        }
    }

    fn pos(&self) -> usize {
        self.inner.span().end
    }

    /// Quote reading for the character at the current position.
    fn quote_mode(&self) -> QuoteMode {
        if self.after_ws || self.first_in_line {
            return QuoteMode::String;
        }
        let Some(prev) = self.prev else {
            return QuoteMode::String;
        };
        match prev.kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::CharArray
            | TokenKind::String
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => QuoteMode::Transpose,
            TokenKind::Operator if prev.transpose => QuoteMode::Transpose,
            TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Comma
            | TokenKind::Assignment
            | TokenKind::Operator
            | TokenKind::Semicolon
            | TokenKind::Colon => QuoteMode::String,
            _ => QuoteMode::Ambiguous,
        }
    }

    /// Classify an identifier and switch to command mode when it heads a
    /// command-syntax call.
    fn identifier(&mut self, start: usize, end: usize) -> TokenKind {
        let text = &self.text[start..end];
        let after_dot = self.prev.is_some_and(|p| p.kind == TokenKind::Selection);
        if after_dot {
            return TokenKind::Identifier;
        }
        if is_keyword(text) {
            return TokenKind::Keyword;
        }
        let at_statement_start = self.first_in_statement && self.brackets.is_empty();
        if at_statement_start && CONTEXTUAL_KEYWORDS.contains(&text) {
            let positional = match text {
                "arguments" => {
                    self.blocks.last() == Some(&Block::Function)
                        && ends_block_header(&self.text[end..])
                }
                _ => self.blocks.last() == Some(&Block::Classdef),
            };
            if positional {
                return TokenKind::Keyword;
            }
        }
        if at_statement_start && self.blocks.last() != Some(&Block::Declarations) {
            let rest = &self.text[end..];
            let chain = dotted_chain_len(rest);
            if starts_command(&rest[chain..]) {
                let kind = if chain == 0 && DIRECTORY_COMMANDS.contains(&text) {
                    CommandKind::Directory
                } else {
                    CommandKind::Words
                };
                trace!(head = text, ?kind, line = self.line, "command syntax");
                self.mode = if chain == 0 {
                    Mode::Command(kind)
                } else {
                    Mode::CommandAfter(end + chain, kind)
                };
            }
        }
        TokenKind::Identifier
    }

    /// Extend a `%{` line into a block comment ending at a `%}` line.
    /// Returns the end offset of the comment token.
    fn block_comment(&mut self, start: usize, end: usize) -> Result<usize, LexError> {
        let head = self.text[start..end].trim_end();
        let close = match head {
            "%{" => "%}",
            "#{" => "#}",
            _ => return Ok(end),
        };
        if !self.first_in_line {
            return Ok(end);
        }
        let rest = self.inner.remainder();
        let mut offset = 0;
        for (index, piece) in rest.split_inclusive('\n').enumerate() {
            let content = piece.trim_end_matches(['\n', '\r']);
            if index > 0 && content.trim() == close {
                let len = offset + content.len();
                self.inner.bump(len);
                return Ok(end + len);
            }
            offset += piece.len();
        }
        Err(self.error(LexErrorKind::UnterminatedBlockComment, start, end))
    }

    /// One token of a command-syntax call, or `None` once the command's
    /// line is used up.
    fn command_token(&mut self, kind: CommandKind) -> Result<Option<Token>, LexError> {
        let rest = self.inner.remainder();
        let blanks = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        let body = &rest[blanks..];
        if body.is_empty() || body.starts_with(['\n', '\r', ';', ',', '%', '#']) {
            self.mode = Mode::Normal;
            return Ok(None);
        }
        self.inner.bump(blanks);
        self.after_ws |= blanks > 0;
        let start = self.pos();

        if body.starts_with("...") {
            if kind == CommandKind::Directory {
                return Err(self.error(
                    LexErrorKind::ContinuationInDirectoryCommand,
                    start,
                    start + 3,
                ));
            }
            let len = body.find('\n').map_or(body.len(), |i| i + 1);
            self.inner.bump(len);
            return Ok(Some(self.emit(TokenKind::Continuation, start, start + len)));
        }

        let keep_blanks = kind == CommandKind::Directory;
        let len = match command_text_len(body, keep_blanks) {
            Ok(len) => len,
            Err(len) => {
                return Err(self.error(
                    LexErrorKind::UnterminatedCharArray,
                    start,
                    start + len,
                ))
            }
        };
        let len = match kind {
            CommandKind::Words => len,
            CommandKind::Directory => {
                let text = body[..len].trim_end_matches([' ', '\t']);
                if let Some(at) = text.find("...") {
                    return Err(self.error(
                        LexErrorKind::ContinuationInDirectoryCommand,
                        start + at,
                        start + at + 3,
                    ));
                }
                text.len()
            }
        };
        self.inner.bump(len);
        let token_kind = match kind {
            CommandKind::Words => TokenKind::CharArray,
            CommandKind::Directory => TokenKind::Directory,
        };
        Ok(Some(self.emit(token_kind, start, start + len)))
    }

    /// Build the token for `start..end` and update the lexer state. May
    /// queue the token behind a synthesized element separator.
    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> Token {
        let raw = &self.text[start..end];
        let separator = self.needs_separator(kind, raw, end);
        let location = self.location(start, raw);
        let token = Token {
            kind,
            raw: raw.to_string(),
            location,
            span: Span::new(start, end),
            first_in_line: self.first_in_line,
            first_in_statement: self.first_in_statement,
            anonymous: false,
        };
        let comma = separator.then(|| Token {
            kind: TokenKind::Comma,
            raw: String::new(),
            location: self.location(start, ""),
            span: Span::new(start, start),
            first_in_line: false,
            first_in_statement: false,
            anonymous: true,
        });
        self.advance(&token);
        match comma {
            Some(comma) => {
                self.pending.push_back(token);
                comma
            }
            None => token,
        }
    }

    /// Whitespace between two elements of a matrix or cell row acts as a
    /// comma.
    fn needs_separator(&self, kind: TokenKind, raw: &str, end: usize) -> bool {
        if !self.after_ws {
            return false;
        }
        let in_row = self
            .brackets
            .last()
            .is_some_and(|b| matches!(b.kind, TokenKind::LBracket | TokenKind::LBrace));
        let after_value = self
            .prev
            .is_some_and(|p| p.value_end && !p.closes_lambda);
        if !in_row || !after_value {
            return false;
        }
        match kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::CharArray
            | TokenKind::String
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::At
            | TokenKind::Metaclass => true,
            TokenKind::Operator => {
                matches!(raw, "+" | "-" | "~" | "!")
                    && !self.text[end..].starts_with([' ', '\t', '\r', '\n'])
            }
            _ => false,
        }
    }

    fn advance(&mut self, token: &Token) {
        let kind = token.kind;
        let mut closes_lambda = false;
        if kind.is_opening_bracket() {
            let lambda_params =
                kind == TokenKind::LParen && self.prev.is_some_and(|p| p.kind == TokenKind::At);
            self.brackets.push(Bracket {
                kind,
                lambda_params,
            });
        } else if kind.is_closing_bracket() {
            closes_lambda = self.brackets.pop().is_some_and(|b| b.lambda_params);
        }
        if kind == TokenKind::Keyword {
            self.track_block(&token.raw);
        }

        let breaks = token.line_breaks();
        if breaks > 0 {
            self.line += breaks as u32;
            let last_break = token.raw.rfind('\n').unwrap_or(0);
            self.line_start = token.span.start + last_break + 1;
            self.refresh_context();
        }
        self.first_in_line = breaks > 0;
        self.first_in_statement = match kind {
            TokenKind::Newline => true,
            TokenKind::Semicolon | TokenKind::Comma => self.brackets.is_empty(),
            TokenKind::Keyword => matches!(token.raw.as_str(), "else" | "try" | "otherwise"),
            TokenKind::Comment | TokenKind::Continuation => self.first_in_statement,
            _ => false,
        };
        self.after_ws = kind == TokenKind::Continuation;
        self.last_end = token.span.end;

        if !kind.is_trivia() {
            let value_end = matches!(
                kind,
                TokenKind::Identifier | TokenKind::Number | TokenKind::CharArray | TokenKind::String
            ) || kind.is_closing_bracket()
                || token.is_transpose()
                || token.is_keyword("end");
            self.prev = Some(Prev {
                kind,
                value_end,
                transpose: token.is_transpose(),
                closes_lambda,
            });
        }
    }

    fn track_block(&mut self, word: &str) {
        match word {
            "classdef" => self.blocks.push(Block::Classdef),
            "function" => self.blocks.push(Block::Function),
            "methods" => self.blocks.push(Block::Methods),
            "properties" | "events" | "enumeration" | "arguments" => {
                self.blocks.push(Block::Declarations)
            }
            "if" | "for" | "parfor" | "while" | "switch" | "try" | "spmd" => {
                self.blocks.push(Block::Control)
            }
            "end" if self.brackets.is_empty() => {
                self.blocks.pop();
            }
            _ => {}
        }
    }

    fn refresh_context(&mut self) {
        let rest = &self.text[self.line_start..];
        let line = rest.split('\n').next().unwrap_or("");
        self.line_context = Arc::from(line.strip_suffix('\r').unwrap_or(line));
    }

    /// 0-based character column of a byte offset on the current line.
    fn column(&mut self, offset: usize) -> u32 {
        let (cached_offset, cached_col) = self.col_cache;
        let (from, base) = if cached_offset >= self.line_start && cached_offset <= offset {
            (cached_offset, cached_col)
        } else {
            (self.line_start, 0)
        };
        let col = base + self.text[from..offset].chars().count() as u32;
        self.col_cache = (offset, col);
        col
    }

    /// Location of text starting at `start`; the column range covers its
    /// first physical line.
    fn location(&mut self, start: usize, raw: &str) -> Location {
        let col = self.column(start);
        let first_line = raw.split('\n').next().unwrap_or("");
        let width = first_line.chars().count().max(1) as u32;
        Location::span(
            Arc::clone(&self.filename),
            self.line,
            Columns::new(col, col + width - 1),
        )
        .with_context(Arc::clone(&self.line_context))
    }

    fn error(&mut self, kind: LexErrorKind, start: usize, end: usize) -> LexError {
        let raw = &self.text[start..end];
        let location = self.location(start, raw);
        LexError::new(kind, location, Span::new(start, end), raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_with(text: &str, config: &LexerConfig) -> Result<Vec<Token>, LexError> {
        let source = SourceText::from_string("t.m", text, config);
        let mut lexer = Lexer::new(&source, config);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        lex_with(text, &LexerConfig::default())
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.raw))
            .collect()
    }

    fn err(text: &str) -> LexErrorKind {
        lex_with(text, &LexerConfig::default()).unwrap_err().kind
    }

    use TokenKind::{
        Assignment, Bang, CharArray, Comment, Continuation, Identifier, Keyword, Newline, Number,
        Operator, Selection, Semicolon,
    };

    fn t(kind: TokenKind, raw: &str) -> (TokenKind, String) {
        (kind, raw.to_string())
    }

    #[test]
    fn simple_assignment() {
        assert_eq!(
            kinds("x = 1;"),
            vec![t(Identifier, "x"), t(Assignment, "="), t(Number, "1"), t(Semicolon, ";")]
        );
    }

    #[test]
    fn keywords_are_reclassified_identifiers() {
        assert_eq!(
            kinds("if x\nend"),
            vec![t(Keyword, "if"), t(Identifier, "x"), t(Newline, "\n"), t(Keyword, "end")]
        );
    }

    #[test]
    fn keyword_after_dot_is_a_field() {
        assert_eq!(
            kinds("s.end"),
            vec![t(Identifier, "s"), t(Selection, "."), t(Identifier, "end")]
        );
    }

    #[test]
    fn compound_operators_are_greedy() {
        let ops: Vec<_> = kinds("a.^b.*c./d.\\e~=f<=g>=h==i&&j||k.'")
            .into_iter()
            .filter(|(k, _)| *k == Operator)
            .map(|(_, raw)| raw)
            .collect();
        assert_eq!(
            ops,
            vec![".^", ".*", "./", ".\\", "~=", "<=", ">=", "==", "&&", "||", ".'"]
        );
    }

    #[test]
    fn blank_lines_merge_into_one_newline() {
        assert_eq!(
            kinds("a\n\n  \n\nb"),
            vec![t(Identifier, "a"), t(Newline, "\n\n  \n\n"), t(Identifier, "b")]
        );
    }

    #[test]
    fn continuation_swallows_rest_of_line() {
        assert_eq!(
            kinds("x = 1 + ... comment\n2"),
            vec![
                t(Identifier, "x"),
                t(Assignment, "="),
                t(Number, "1"),
                t(Operator, "+"),
                t(Continuation, "... comment\n"),
                t(Number, "2"),
            ]
        );
    }

    #[test]
    fn continuation_advances_one_line() {
        let tokens = lex_with("a = ...\n  b", &LexerConfig::default()).unwrap();
        let b = tokens.last().unwrap();
        assert_eq!(b.location.line_number(), Some(2));
        assert_eq!(b.location.col_start(), Some(2));
        assert!(b.first_in_line);
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("x % note\n# other"),
            vec![
                t(Identifier, "x"),
                t(Comment, "% note"),
                t(Newline, "\n"),
                t(Comment, "# other"),
            ]
        );
    }

    #[test]
    fn block_comment_spans_lines() {
        assert_eq!(
            kinds("%{\nanything 'here\n%}\nx"),
            vec![
                t(Comment, "%{\nanything 'here\n%}"),
                t(Newline, "\n"),
                t(Identifier, "x"),
            ]
        );
        assert_eq!(err("%{\nnever closed\n"), LexErrorKind::UnterminatedBlockComment);
    }

    #[test]
    fn double_quoted_strings() {
        assert_eq!(kinds(r#"s = "a""b""#)[2], t(TokenKind::String, r#""a""b""#));
        assert_eq!(err("s = \"abc\n"), LexErrorKind::UnterminatedString);
    }

    #[test]
    fn unexpected_character() {
        let e = lex_with("x = $", &LexerConfig::default()).unwrap_err();
        assert_eq!(e.kind, LexErrorKind::UnexpectedCharacter);
        assert_eq!(e.location.col_start(), Some(4));
        assert_eq!(e.message, "Unexpected character '$'");
    }

    #[test]
    fn shell_escape_at_statement_start() {
        assert_eq!(
            kinds("!ls -l\nx"),
            vec![t(Bang, "!ls -l"), t(Newline, "\n"), t(Identifier, "x")]
        );
        assert_eq!(err("x = !y"), LexErrorKind::UnexpectedCharacter);
    }

    #[test]
    fn octave_bang_operators() {
        let config = LexerConfig {
            octave: true,
            ..LexerConfig::default()
        };
        let tokens = lex_with("a != !b", &config).unwrap();
        assert_eq!(tokens[1].kind, Operator);
        assert_eq!(tokens[1].raw, "!=");
        assert_eq!(tokens[2].kind, Operator);
        assert_eq!(tokens[2].raw, "!");
    }

    #[test]
    fn contextual_keywords_in_classdef() {
        let tokens = kinds("classdef C\nproperties\nend\nend");
        assert_eq!(tokens[3], t(Keyword, "properties"));
        let tokens = kinds("properties = 1;");
        assert_eq!(tokens[0], t(Identifier, "properties"));
    }

    #[test]
    fn arguments_keyword_needs_function() {
        let tokens = kinds("function f(x)\narguments\nx\nend\nend");
        assert_eq!(tokens[6], t(Keyword, "arguments"));
        let tokens = kinds("function f(x)\narguments = 3;\nend");
        assert_eq!(tokens[6], t(Identifier, "arguments"));
    }

    #[test]
    fn properties_block_disables_commands() {
        let tokens = kinds("classdef C\nproperties\nName double\nend\nend");
        assert_eq!(tokens[5], t(Identifier, "Name"));
        assert_eq!(tokens[6], t(Identifier, "double"));
    }

    #[test]
    fn method_body_inside_classdef_sees_commands() {
        let tokens = kinds("classdef C\nmethods\nfunction f(o)\nhold on\nend\nend\nend");
        assert!(tokens.contains(&t(CharArray, "on")));
    }
}
