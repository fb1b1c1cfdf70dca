// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Element separators inside matrix and cell literals.

use mlang_lexer::{LexerConfig, SourceText, TokenBuffer};

/// Raw texts, with synthesized separators shown as `<,>`.
fn lex(text: &str) -> Vec<String> {
    let config = LexerConfig::default();
    let source = SourceText::from_string("m.m", text, &config);
    TokenBuffer::tokenize(&source, &config)
        .unwrap()
        .iter()
        .map(|t| if t.anonymous { "<,>".to_string() } else { t.raw.clone() })
        .collect()
}

fn joined(text: &str) -> String {
    lex(text).join(" ")
}

#[test]
fn blanks_separate_elements() {
    assert_eq!(joined("[1 2 3]"), "[ 1 <,> 2 <,> 3 ]");
    assert_eq!(joined("{'a' \"b\" c}"), "{ 'a' <,> \"b\" <,> c }");
}

#[test]
fn explicit_commas_are_kept() {
    assert_eq!(joined("[1, 2]"), "[ 1 , 2 ]");
}

#[test]
fn binary_operators_with_blanks_do_not_separate() {
    assert_eq!(joined("[a - b]"), "[ a - b ]");
    assert_eq!(joined("[a + b]"), "[ a + b ]");
}

#[test]
fn signed_elements_separate() {
    assert_eq!(joined("[a -b]"), "[ a <,> - b ]");
    assert_eq!(joined("[1 ~x]"), "[ 1 <,> ~ x ]");
}

#[test]
fn transposes_and_calls() {
    assert_eq!(joined("[x' y']"), "[ x ' <,> y ' ]");
    assert_eq!(joined("[f(1) g{2}]"), "[ f ( 1 ) <,> g { 2 } ]");
    assert_eq!(joined("[a (1)]"), "[ a <,> ( 1 ) ]");
}

#[test]
fn parentheses_do_not_separate() {
    assert_eq!(joined("f(a, b)"), "f ( a , b )");
    assert_eq!(joined("[f(a b)]"), "[ f ( a b ) ]");
}

#[test]
fn lambda_parameters_do_not_separate_from_body() {
    assert_eq!(joined("{@(x) x+1 2}"), "{ @ ( x ) x + 1 <,> 2 }");
}

#[test]
fn rows_are_newline_or_semicolon_separated() {
    assert_eq!(joined("[1 2\n3 4]"), "[ 1 <,> 2 \n 3 <,> 4 ]");
    assert_eq!(joined("[1 2; 3 4]"), "[ 1 <,> 2 ; 3 <,> 4 ]");
}

#[test]
fn continuation_acts_as_blank() {
    assert_eq!(joined("[1...\n2]"), "[ 1 ...\n <,> 2 ]");
}

#[test]
fn end_in_index_is_a_value() {
    assert_eq!(joined("[x(end) 1]"), "[ x ( end ) <,> 1 ]");
}
