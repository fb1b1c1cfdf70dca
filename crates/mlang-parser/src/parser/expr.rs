// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expressions: one function per precedence level, loosest first.
//!
//! | level | operators |
//! |---|---|
//! | 12 | `\|\|` |
//! | 11 | `&&` |
//! | 10 | `\|` |
//! | 9 | `&` |
//! | 8 | `== ~= < <= > >=` |
//! | 7 | `:` ranges |
//! | 6 | binary `+ -` |
//! | 5 | `* .* / ./ \ .\` |
//! | 4 | unary `+ - ~` |
//! | 3 | `^` applied to a unary operand |
//! | 2 | `' .' ^ .^` |
//! | 1 | literals, names, brackets |

use mlang_ast::expr::{BinaryOp, Expr, ExprKind, Name, NameKind, Row, UnaryOp};
use mlang_ast::token::{Token, TokenKind};
use mlang_ast::{InvariantViolation, Location};

use super::Parser;
use crate::error::ParseError;

const RELATIONAL: &[&str] = &["==", "~=", "!=", "<", "<=", ">", ">="];
const MULTIPLICATIVE: &[&str] = &["*", ".*", "/", "./", "\\", ".\\"];
const PREFIX: &[&str] = &["+", "-", "~", "!"];

type Level<'t> = fn(&mut Parser<'t>) -> Result<Expr, ParseError>;

impl<'t> Parser<'t> {
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_short_or()
    }

    /// A left-associative binary level: `next (op next)*`.
    fn binary_level(&mut self, ops: &[&str], next: Level<'t>) -> Result<Expr, ParseError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.match_operator(ops) {
            let rhs = next(self)?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn match_operator(&mut self, ops: &[&str]) -> Option<&'t Token> {
        let token = self.current()?;
        if token.kind == TokenKind::Operator && ops.contains(&token.raw.as_str()) {
            self.advance()
        } else {
            None
        }
    }

    fn binary(&mut self, op: &Token, lhs: Expr, rhs: Expr) -> Result<Expr, ParseError> {
        let Some(op) = BinaryOp::from_symbol(&op.raw) else {
            return Err(ParseError::internal(
                op.location.clone(),
                InvariantViolation::new(format!("'{}' is not a binary operator", op.raw)),
            ));
        };
        Ok(Expr {
            id: self.next_id(),
            loc: lhs.loc.to(&rhs.loc),
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        })
    }

    fn unary(&mut self, op: &Token, operand: Expr) -> Expr {
        let (op_kind, loc) = match op.raw.as_str() {
            "'" => (UnaryOp::ConjugateTranspose, operand.loc.to(&op.location)),
            ".'" => (UnaryOp::Transpose, operand.loc.to(&op.location)),
            "+" => (UnaryOp::Plus, op.location.to(&operand.loc)),
            "-" => (UnaryOp::Minus, op.location.to(&operand.loc)),
            _ => (UnaryOp::Not, op.location.to(&operand.loc)),
        };
        Expr {
            id: self.next_id(),
            loc,
            kind: ExprKind::Unary {
                op: op_kind,
                operand: Box::new(operand),
            },
        }
    }

    fn parse_short_or(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["||"], Self::parse_short_and)
    }

    fn parse_short_and(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["&&"], Self::parse_elem_or)
    }

    fn parse_elem_or(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["|"], Self::parse_elem_and)
    }

    fn parse_elem_and(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["&"], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(RELATIONAL, Self::parse_range)
    }

    /// `start:stop` or `start:stride:stop`.
    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let start = self.parse_additive()?;
        if !self.check(TokenKind::Colon) {
            return Ok(start);
        }
        self.advance();
        let second = self.parse_additive()?;
        let (stride, stop) = if self.eat(TokenKind::Colon).is_some() {
            (Some(second), self.parse_additive()?)
        } else {
            (None, second)
        };
        Ok(Expr {
            id: self.next_id(),
            loc: start.loc.to(&stop.loc),
            kind: ExprKind::Range {
                start: Box::new(start),
                stride: stride.map(Box::new),
                stop: Box::new(stop),
            },
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(MULTIPLICATIVE, Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.match_operator(PREFIX) {
            Some(op) => {
                let operand = self.parse_unary()?;
                Ok(self.unary(op, operand))
            }
            None => self.parse_postfix(),
        }
    }

    /// Transposes and powers, left to right.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if let Some(op) = self.match_operator(&["'", ".'"]) {
                expr = self.unary(op, expr);
            } else if let Some(op) = self.match_operator(&["^", ".^"]) {
                let rhs = self.parse_power_operand()?;
                expr = self.binary(op, expr, rhs)?;
            } else {
                return Ok(expr);
            }
        }
    }

    /// The right side of `^`: a chain of prefix operators binds before the
    /// power does, so `2^-1` is `2^(-1)`.
    fn parse_power_operand(&mut self) -> Result<Expr, ParseError> {
        match self.match_operator(PREFIX) {
            Some(op) => {
                let operand = self.parse_power_operand()?;
                Ok(self.unary(op, operand))
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("expression"));
        };
        let literal = |kind| Some((kind, token.location.clone()));
        let simple = match token.kind {
            TokenKind::Number => literal(ExprKind::Number(token.raw.clone())),
            TokenKind::CharArray => literal(ExprKind::CharArray(token.value())),
            TokenKind::String => literal(ExprKind::String(token.value())),
            TokenKind::Keyword if token.raw == "end" && self.index_depth > 0 => {
                literal(ExprKind::End)
            }
            TokenKind::Colon if self.index_depth > 0 && self.closes_argument(1) => {
                literal(ExprKind::Reshape)
            }
            _ => None,
        };
        if let Some((kind, loc)) = simple {
            self.advance();
            return Ok(Expr {
                id: self.next_id(),
                loc,
                kind,
            });
        }

        match token.kind {
            TokenKind::Identifier => Ok(self.parse_name()?.into_expr()),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let (rows, loc) = self.parse_rows(TokenKind::RBracket)?;
                Ok(Expr {
                    id: self.next_id(),
                    loc,
                    kind: ExprKind::Matrix(rows),
                })
            }
            TokenKind::LBrace => {
                let (rows, loc) = self.parse_rows(TokenKind::RBrace)?;
                Ok(Expr {
                    id: self.next_id(),
                    loc,
                    kind: ExprKind::Cell(rows),
                })
            }
            TokenKind::At => self.parse_at(),
            TokenKind::Metaclass => {
                self.advance();
                let name = self.parse_dotted_name()?;
                Ok(Expr {
                    id: self.next_id(),
                    loc: token.location.to(&name.loc),
                    kind: ExprKind::Metaclass(Box::new(name)),
                })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Whether the token `n` ahead ends an argument.
    fn closes_argument(&self, n: usize) -> bool {
        matches!(
            self.peek_kind(n),
            Some(TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace)
        )
    }

    /// `@(params) body` or `@name`.
    fn parse_at(&mut self) -> Result<Expr, ParseError> {
        let Some(at) = self.advance() else {
            return Err(self.unexpected("'@'"));
        };
        if self.eat(TokenKind::LParen).is_none() {
            let name = self.parse_dotted_name()?;
            return Ok(Expr {
                id: self.next_id(),
                loc: at.location.to(&name.loc),
                kind: ExprKind::FunctionHandle(Box::new(name)),
            });
        }

        let mut params = Vec::new();
        loop {
            let Some(token) = self.current() else {
                return Err(self.unexpected("')'"));
            };
            match token.kind {
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Identifier => params.push(self.parse_identifier()?),
                TokenKind::Operator if token.raw == "~" => {
                    self.advance();
                    params.push(self.placeholder(token));
                }
                _ => return Err(self.unexpected("')'")),
            }
        }
        // The body is an ordinary expression, not an index.
        let depth = std::mem::take(&mut self.index_depth);
        let body = self.parse_expression();
        self.index_depth = depth;
        let body = body?;
        Ok(Expr {
            id: self.next_id(),
            loc: at.location.to(&body.loc),
            kind: ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
        })
    }

    /// Rows of a matrix or cell literal, brackets included. Rows end at `;`
    /// or a line break; elements are separated by commas, including the
    /// ones the lexer puts where whitespace separates elements.
    fn parse_rows(&mut self, close: TokenKind) -> Result<(Vec<Row>, Location), ParseError> {
        let Some(open) = self.advance() else {
            return Err(self.unexpected("'['"));
        };
        let closer = if close == TokenKind::RBracket { "']'" } else { "'}'" };
        let placeholders = std::mem::take(&mut self.allow_placeholder);
        let mut rows = Vec::new();
        let mut items: Vec<Expr> = Vec::new();
        let mut after_item = false;
        loop {
            let Some(token) = self.current() else {
                return Err(self.unexpected(closer));
            };
            if token.kind == close {
                self.advance();
                self.finish_row(&mut rows, &mut items);
                break;
            }
            match token.kind {
                TokenKind::Semicolon | TokenKind::Newline => {
                    self.advance();
                    self.finish_row(&mut rows, &mut items);
                    after_item = false;
                }
                TokenKind::Comma => {
                    self.advance();
                    after_item = false;
                }
                _ if after_item => return Err(self.unexpected(&format!("',', ';' or {closer}"))),
                TokenKind::Operator
                    if placeholders && token.raw == "~" && self.ends_element(1, close) =>
                {
                    self.advance();
                    items.push(self.placeholder(token).into_expr());
                    after_item = true;
                }
                _ => {
                    items.push(self.parse_expression()?);
                    after_item = true;
                }
            }
        }
        Ok((rows, open.location.to(&self.last_location())))
    }

    fn ends_element(&self, n: usize, close: TokenKind) -> bool {
        match self.peek_kind(n) {
            Some(kind) => {
                kind == close
                    || matches!(kind, TokenKind::Comma | TokenKind::Semicolon | TokenKind::Newline)
            }
            None => false,
        }
    }

    fn finish_row(&mut self, rows: &mut Vec<Row>, items: &mut Vec<Expr>) {
        if items.is_empty() {
            return;
        }
        let items = std::mem::take(items);
        let loc = match (items.first(), items.last()) {
            (Some(first), Some(last)) => first.loc.to(&last.loc),
            _ => self.last_location(),
        };
        rows.push(Row {
            id: self.next_id(),
            loc,
            items,
        });
    }

    /// An identifier and its suffixes: calls or indexing, cell indexing,
    /// field selection and dynamic field selection. `name@Super` is a
    /// superclass reference.
    pub(super) fn parse_name(&mut self) -> Result<Name, ParseError> {
        let mut name = self.parse_identifier()?;
        if self.check(TokenKind::At) && self.peek_kind(1) == Some(TokenKind::Identifier) {
            self.advance();
            let reference = self.parse_name()?;
            return Ok(Name {
                id: self.next_id(),
                loc: name.loc.to(&reference.loc),
                kind: NameKind::SuperclassReference {
                    prefix: Box::new(name),
                    reference: Box::new(reference),
                },
            });
        }
        loop {
            let kind = match self.peek_kind(0) {
                Some(TokenKind::LParen) => {
                    let args = self.parse_arguments(TokenKind::RParen)?;
                    NameKind::Reference {
                        prefix: Box::new(name),
                        args,
                    }
                }
                Some(TokenKind::LBrace) => {
                    let args = self.parse_arguments(TokenKind::RBrace)?;
                    NameKind::CellReference {
                        prefix: Box::new(name),
                        args,
                    }
                }
                Some(TokenKind::Selection) => {
                    self.advance();
                    if self.eat(TokenKind::LParen).is_some() {
                        let depth = std::mem::take(&mut self.index_depth);
                        let field = self.parse_expression();
                        self.index_depth = depth;
                        let field = field?;
                        self.expect(TokenKind::RParen, "')'")?;
                        NameKind::DynamicSelection {
                            prefix: Box::new(name),
                            field: Box::new(field),
                        }
                    } else {
                        let field = self.expect_identifier()?;
                        NameKind::Selection {
                            prefix: Box::new(name),
                            field: field.raw.clone(),
                        }
                    }
                }
                _ => return Ok(name),
            };
            let loc = match &kind {
                NameKind::Reference { prefix, .. }
                | NameKind::CellReference { prefix, .. }
                | NameKind::Selection { prefix, .. }
                | NameKind::DynamicSelection { prefix, .. }
                | NameKind::SuperclassReference { prefix, .. } => self.span_from(&prefix.loc),
                NameKind::Identifier(_) => self.last_location(),
            };
            name = Name {
                id: self.next_id(),
                loc,
                kind,
            };
        }
    }

    /// `(args)` or `{args}`. Inside, `end` and a lone `:` are values.
    pub(super) fn parse_arguments(&mut self, close: TokenKind) -> Result<Vec<Expr>, ParseError> {
        self.advance();
        let closer = if close == TokenKind::RParen { "')'" } else { "'}'" };
        self.index_depth += 1;
        let mut args = Vec::new();
        if self.eat(close).is_none() {
            loop {
                args.push(self.parse_expression()?);
                if self.eat(close).is_some() {
                    break;
                }
                if self.eat(TokenKind::Comma).is_none() {
                    return Err(self.unexpected(closer));
                }
            }
        }
        self.index_depth -= 1;
        Ok(args)
    }
}
