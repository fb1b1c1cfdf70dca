// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter. The table is keyed
//! on the expectation text the parser reports (`"')'"`, `"keyword 'end'"`,
//! `"expression"`, ...) and on the kind of token found instead. More
//! specific arms come first. Expectations with nothing useful to add
//! return `None`, and the message stands alone.
//!
//! Call sites that know more than the table (the line of an unclosed block,
//! statements after functions) attach their own hint with `with_hint`,
//! which replaces the one chosen here.

use mlang_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context. `found` is
/// `None` at end of input.
pub fn for_expected(expected: &str, found: Option<TokenKind>) -> Option<&'static str> {
    match (expected, found) {
        // Parentheses hints
        ("'('", _) => Some("attribute lists are written as (Name, Name = value)"),
        ("')'", None) => Some("add ')' to close the parenthesis"),
        ("')'", Some(TokenKind::Newline)) => {
            Some("an argument list cannot span lines without '...'")
        }
        ("')'", Some(TokenKind::Assignment)) => {
            Some("use '==' to compare; name=value arguments are not supported")
        }
        ("')'", _) => Some("separate items with ','"),

        // Matrix and cell hints
        ("']'", None) => Some("add ']' to close the matrix"),
        ("'}'", None) => Some("add '}' to close the cell array"),
        ("',', ';' or ']'" | "',', ';' or '}'", _) => {
            Some("separate elements with ',' or a space, and rows with ';' or a line break")
        }

        // Block hints
        ("keyword 'end'", None) => Some("every block needs a matching 'end'"),
        ("keyword 'end'", _) => Some("close the block with 'end'"),
        ("keyword 'case', 'otherwise' or 'end'", _) => {
            Some("a switch body holds only 'case' and 'otherwise' branches")
        }
        ("keyword 'function'", _) => Some("only functions can follow a function definition"),

        // Expression hints
        ("expression", Some(TokenKind::Assignment)) => Some("put the value after '='"),
        ("expression", Some(TokenKind::Newline | TokenKind::Semicolon)) | ("expression", None) => {
            Some("statement is incomplete")
        }
        ("expression", Some(TokenKind::Keyword)) => {
            Some("'end' as a value is only allowed inside an index")
        }
        ("expression", Some(TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)) => {
            Some("an operator is missing its right-hand side")
        }
        ("expression", _) => Some("try a value, variable, or function call"),

        // Name/identifier hints
        ("identifier", Some(TokenKind::Number)) => Some("names can't start with a number"),
        ("identifier", Some(TokenKind::Keyword)) => Some("keywords cannot be used as names"),
        ("identifier", _) => Some("names start with a letter"),

        // Assignment hints
        ("'=' after the output list", _) => {
            Some("multiple outputs are written as [a, b] = f(...)")
        }
        ("'='", Some(TokenKind::Newline | TokenKind::Semicolon)) | ("'='", None) => {
            Some("a loop needs a variable and a range, as in 'for k = 1:n'")
        }
        ("'='", _) => Some("assign the loop range with '=', as in 'k = 1:n'"),

        // Statement terminator
        ("separator", Some(TokenKind::Identifier | TokenKind::Number)) => {
            Some("put each statement on its own line, or separate them with ';' or ','")
        }
        ("separator", _) => Some("end statements with a newline, ';' or ','"),

        _ => None,
    }
}
