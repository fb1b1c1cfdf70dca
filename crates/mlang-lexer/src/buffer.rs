// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The materialized token sequence of one file, and its replay.

use std::collections::HashMap;

use mlang_ast::token::Token;
use tracing::debug;

use crate::config::LexerConfig;
use crate::error::LexError;
use crate::lexer::Lexer;
use crate::source::SourceText;

/// Spacing changes a rule engine wants around one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenFix {
    pub ensure_ws_before: bool,
    pub ensure_ws_after: bool,
    pub ensure_trim_before: bool,
    pub ensure_trim_after: bool,
}

/// Fixes keyed by token index. Kept apart from the tokens so the lexer
/// output itself never changes.
#[derive(Debug, Clone, Default)]
pub struct FixHints {
    fixes: HashMap<usize, TokenFix>,
}

impl FixHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> TokenFix {
        self.fixes.get(&index).copied().unwrap_or_default()
    }

    pub fn entry(&mut self, index: usize) -> &mut TokenFix {
        self.fixes.entry(index).or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Every token of a file, in source order.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    /// Source text between the previous token and this one, per token.
    /// Empty for anonymous tokens.
    gaps: Vec<String>,
    trailing: String,
}

impl TokenBuffer {
    /// Drain a lexer. Stops at the first error.
    pub fn from_lexer(mut lexer: Lexer<'_>) -> Result<Self, LexError> {
        let text = lexer.text();
        let mut tokens = Vec::new();
        let mut gaps = Vec::new();
        let mut last_end = 0;
        while let Some(token) = lexer.next_token()? {
            if token.anonymous {
                gaps.push(String::new());
            } else {
                let gap = text.get(last_end..token.span.start).unwrap_or_default();
                gaps.push(gap.to_string());
                last_end = token.span.end;
            }
            tokens.push(token);
        }
        let trailing = lexer.trailing_whitespace().to_string();
        debug!(tokens = tokens.len(), "lexing finished");
        Ok(Self {
            tokens,
            gaps,
            trailing,
        })
    }

    pub fn tokenize(source: &SourceText, config: &LexerConfig) -> Result<Self, LexError> {
        Self::from_lexer(Lexer::new(source, config))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Re-emit the source text from the tokens alone.
    pub fn replay(&self) -> String {
        self.replay_with(&FixHints::default())
    }

    /// Re-emit the source text, applying spacing fixes. Gaps are the
    /// original text between tokens; a fix trims a gap to nothing or widens
    /// an empty one to a single space. Indentation is never touched.
    pub fn replay_with(&self, hints: &FixHints) -> String {
        let mut out = String::with_capacity(self.tokens.iter().map(|t| t.raw.len() + 1).sum());
        let mut at_line_start = true;
        let mut prev: Option<usize> = None;
        for (index, (token, gap)) in self.tokens.iter().zip(&self.gaps).enumerate() {
            if token.anonymous {
                continue;
            }
            let mut gap = gap.as_str();
            if !at_line_start {
                let here = hints.get(index);
                let before = prev.map(|p| hints.get(p)).unwrap_or_default();
                if here.ensure_trim_before || before.ensure_trim_after {
                    gap = "";
                } else if (here.ensure_ws_before || before.ensure_ws_after) && gap.is_empty() {
                    gap = " ";
                }
            }
            out.push_str(gap);
            out.push_str(&token.raw);
            at_line_start = token.raw.ends_with('\n');
            prev = Some(index);
        }
        out.push_str(&self.trailing);
        out
    }
}

impl<'a> IntoIterator for &'a TokenBuffer {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
