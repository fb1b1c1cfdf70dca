// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Property-based tests for the lexer.
//!
//! 1. The lexer never panics on arbitrary input.
//! 2. Reported lines and columns agree with a naive character count.
//! 3. Replaying an unmodified buffer reproduces the source text, with or
//!    without tab expansion.
//! 4. Spans are ordered and never overlap.

use proptest::prelude::*;

use crate::{LexerConfig, SourceText, TokenBuffer};

/// Fragments of plausible code, glued together by the generators below.
const FRAGMENTS: &[&str] = &[
    "x", "y1", "foo_bar", "42", "3.14", ".5", "1e-3", "2i", "0x1F", "'abc'", "'it''s'",
    "\"str\"", "+", "-", ".*", "./", "^", ".^", "'", ".'", "==", "~=", "<=", "&&", "||", "~",
    "=", "(", ")", "[", "]", "{", "}", ",", ";", ":", ".", "@", "% comment", "...", "if",
    "end", "for", "function", "disp hello", "cd ..", "hold on", "a(end)", "s.f", "@(x) x+1",
];

const SEPARATORS: &[&str] = &["", " ", "  ", "\n", "\n\n", " \n  ", "\t", "; ", ", "];

fn code() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (prop::sample::select(FRAGMENTS), prop::sample::select(SEPARATORS)),
        0..40,
    )
    .prop_map(|parts| parts.into_iter().map(|(f, s)| format!("{f}{s}")).collect())
}

/// Default is 512 cases; override via `PROPTEST_CASES`.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

fn naive_line_col(text: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 0;
    for c in text[..offset].chars() {
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn tokenize(text: &str) -> (SourceText, Option<TokenBuffer>) {
    tokenize_with(text, &LexerConfig::default())
}

fn tokenize_with(text: &str, config: &LexerConfig) -> (SourceText, Option<TokenBuffer>) {
    let source = SourceText::from_string("p.m", text, config);
    let buffer = TokenBuffer::tokenize(&source, config).ok();
    (source, buffer)
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn lexer_never_panics(input in "\\PC{0,300}") {
        let _ = tokenize(&input);
    }

    #[test]
    fn lexer_never_panics_on_code(input in code()) {
        let _ = tokenize(&input);
    }

    #[test]
    fn locations_match_naive_scan(input in code()) {
        let (source, buffer) = tokenize(&input);
        let Some(buffer) = buffer else { return Ok(()); };
        for token in buffer.iter() {
            let (line, col) = naive_line_col(source.text(), token.span.start);
            prop_assert_eq!(token.location.line_number(), Some(line), "{:?}", token);
            prop_assert_eq!(token.location.col_start(), Some(col), "{:?}", token);
            let first_line = token.raw.split('\n').next().unwrap_or("");
            let width = first_line.chars().count().max(1) as u32;
            prop_assert_eq!(token.location.col_end(), Some(col + width - 1), "{:?}", token);
        }
    }

    #[test]
    fn replay_reproduces_source(input in code()) {
        let (source, buffer) = tokenize(&input);
        if let Some(buffer) = buffer {
            prop_assert_eq!(buffer.replay(), source.text());
        }
    }

    #[test]
    fn replay_reproduces_arbitrary_source(input in "\\PC{0,200}") {
        let (source, buffer) = tokenize(&input);
        if let Some(buffer) = buffer {
            prop_assert_eq!(buffer.replay(), source.text());
        }
    }

    #[test]
    fn replay_keeps_tabs(input in code()) {
        let config = LexerConfig { tab_width: None, ..LexerConfig::default() };
        let (source, buffer) = tokenize_with(&input, &config);
        prop_assert_eq!(source.text(), input.as_str());
        if let Some(buffer) = buffer {
            prop_assert_eq!(buffer.replay(), input);
        }
    }

    #[test]
    fn spans_are_ordered(input in code()) {
        let (source, buffer) = tokenize(&input);
        let Some(buffer) = buffer else { return Ok(()); };
        let mut end = 0;
        for token in buffer.iter() {
            prop_assert!(token.span.start >= end, "{:?} overlaps", token);
            prop_assert!(token.span.end <= source.text().len());
            prop_assert_eq!(&source.text()[token.span.start..token.span.end], token.raw.as_str());
            end = token.span.end;
        }
    }
}
