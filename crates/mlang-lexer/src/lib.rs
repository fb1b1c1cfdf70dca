// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for MATLAB-family source code.
//!
//! Turns a [`SourceText`] into tokens with exact spans. The token stream of
//! a file is materialized in a [`TokenBuffer`], which the parser reads and
//! which can replay the source text byte for byte.

mod buffer;
mod config;
mod error;
mod lexer;
mod source;

#[cfg(test)]
mod property_tests;

pub use buffer::{FixHints, TokenBuffer, TokenFix};
pub use config::LexerConfig;
pub use error::{LexError, LexErrorKind};
pub use lexer::Lexer;
pub use source::{expand_tabs, Encoding, SourceError, SourceText};
