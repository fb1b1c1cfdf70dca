// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Command syntax, directory commands and shell escapes.

use mlang_ast::token::TokenKind;
use mlang_lexer::{LexErrorKind, LexerConfig, SourceText, TokenBuffer};

fn lex(text: &str) -> Result<Vec<(TokenKind, String)>, LexErrorKind> {
    let config = LexerConfig::default();
    let source = SourceText::from_string("c.m", text, &config);
    TokenBuffer::tokenize(&source, &config)
        .map(|b| b.iter().map(|t| (t.kind, t.raw.clone())).collect())
        .map_err(|e| e.kind)
}

fn t(kind: TokenKind, raw: &str) -> (TokenKind, String) {
    (kind, raw.to_string())
}

#[test]
fn words_become_char_arrays() {
    assert_eq!(
        lex("disp hello world").unwrap(),
        vec![
            t(TokenKind::Identifier, "disp"),
            t(TokenKind::CharArray, "hello"),
            t(TokenKind::CharArray, "world"),
        ]
    );
}

#[test]
fn words_keep_apparent_numbers_and_operators() {
    assert_eq!(
        lex("format long -g 42;").unwrap(),
        vec![
            t(TokenKind::Identifier, "format"),
            t(TokenKind::CharArray, "long"),
            t(TokenKind::CharArray, "-g"),
            t(TokenKind::CharArray, "42"),
            t(TokenKind::Semicolon, ";"),
        ]
    );
}

#[test]
fn quoted_words_may_contain_blanks() {
    let tokens = lex("disp 'hello world' % greet").unwrap();
    assert_eq!(tokens[1], t(TokenKind::CharArray, "'hello world'"));
    assert_eq!(tokens[2], t(TokenKind::Comment, "% greet"));
}

#[test]
fn command_ends_at_separator() {
    let tokens = lex("hold on, x = 1").unwrap();
    assert_eq!(tokens[1], t(TokenKind::CharArray, "on"));
    assert_eq!(tokens[2], t(TokenKind::Comma, ","));
    assert_eq!(tokens[3], t(TokenKind::Identifier, "x"));
    assert_eq!(tokens[4], t(TokenKind::Assignment, "="));
}

#[test]
fn expressions_are_not_commands() {
    for text in ["x = 1", "x == 1", "x + y", "x (1)", "x", "x;", "x % c", "x ...\n+1", "x - y"] {
        let tokens = lex(text).unwrap();
        assert!(
            tokens.iter().all(|(k, _)| *k != TokenKind::CharArray),
            "{text}: {tokens:?}"
        );
    }
}

#[test]
fn unary_looking_argument_is_a_command() {
    let tokens = lex("x -y").unwrap();
    assert_eq!(tokens[1], t(TokenKind::CharArray, "-y"));
}

#[test]
fn only_statement_starts_are_commands() {
    for text in ["y = disp hello", "if x disp hello, end"] {
        let tokens = lex(text).unwrap();
        assert!(tokens.iter().all(|(k, _)| *k != TokenKind::CharArray), "{text}");
    }
}

#[test]
fn dotted_heads() {
    let tokens = lex("pkg.run fast").unwrap();
    assert_eq!(
        tokens,
        vec![
            t(TokenKind::Identifier, "pkg"),
            t(TokenKind::Selection, "."),
            t(TokenKind::Identifier, "run"),
            t(TokenKind::CharArray, "fast"),
        ]
    );
    let tokens = lex("s.a = 1").unwrap();
    assert!(tokens.iter().all(|(k, _)| *k != TokenKind::CharArray));
}

#[test]
fn import_is_a_command() {
    let tokens = lex("import pkg.sub.*").unwrap();
    assert_eq!(tokens[1], t(TokenKind::CharArray, "pkg.sub.*"));
}

#[test]
fn directory_commands_capture_the_rest() {
    assert_eq!(
        lex("cd ../my data  ;").unwrap(),
        vec![
            t(TokenKind::Identifier, "cd"),
            t(TokenKind::Directory, "../my data"),
            t(TokenKind::Semicolon, ";"),
        ]
    );
    let tokens = lex("mkdir 'a b' % new").unwrap();
    assert_eq!(tokens[1], t(TokenKind::Directory, "'a b'"));
    assert_eq!(tokens[2], t(TokenKind::Comment, "% new"));
}

#[test]
fn continuation_in_directory_command_is_an_error() {
    assert_eq!(
        lex("cd some/dir ...\nmore"),
        Err(LexErrorKind::ContinuationInDirectoryCommand)
    );
    assert_eq!(lex("mkdir new...\n"), Err(LexErrorKind::ContinuationInDirectoryCommand));
}

#[test]
fn directory_call_syntax_is_an_expression() {
    let tokens = lex("cd('..')").unwrap();
    assert_eq!(tokens[2], t(TokenKind::CharArray, "'..'"));
    assert!(tokens.iter().all(|(k, _)| *k != TokenKind::Directory));
}

#[test]
fn continuation_between_words() {
    let tokens = lex("disp a ...\n  b").unwrap();
    assert_eq!(
        tokens,
        vec![
            t(TokenKind::Identifier, "disp"),
            t(TokenKind::CharArray, "a"),
            t(TokenKind::Continuation, "...\n"),
            t(TokenKind::CharArray, "b"),
        ]
    );
}
