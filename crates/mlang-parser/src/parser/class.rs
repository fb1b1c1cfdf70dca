// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `classdef` files and the declaration blocks shared with functions.

use std::sync::Arc;

use mlang_ast::decl::{
    Attribute, BlockItem, BlockKind, ClassDef, ClassFile, CompilationUnit, EnumerationDef,
    EventDef, PropertyDef, SpecialBlock,
};
use mlang_ast::token::TokenKind;
use mlang_ast::Location;

use super::{Frame, Parser};
use crate::error::ParseError;
use crate::flatten::{self, FunctionRun};

impl<'t> Parser<'t> {
    pub(super) fn parse_class_file(&mut self) -> Result<CompilationUnit, ParseError> {
        let id = self.next_id();
        let class = self.in_frame(Frame::Classdef, Self::parse_classdef)?;
        let functions = self.parse_local_functions()?;
        Ok(CompilationUnit::Class(ClassFile {
            id,
            loc: Location::file(Arc::clone(&self.filename)),
            class,
            functions,
        }))
    }

    /// `classdef (attrs) Name < Super & pkg.Other` and its blocks.
    fn parse_classdef(&mut self) -> Result<ClassDef, ParseError> {
        let keyword = self.expect_keyword("classdef")?;
        let id = self.next_id();
        let attributes = if self.check(TokenKind::LParen) {
            self.parse_attributes()?
        } else {
            Vec::new()
        };
        let name = self.parse_identifier()?;
        let mut superclasses = Vec::new();
        if self.eat_operator("<").is_some() {
            superclasses.push(self.parse_dotted_name()?);
            while self.eat_operator("&").is_some() {
                superclasses.push(self.parse_dotted_name()?);
            }
        }
        let loc = self.span_from(&keyword.location);

        let mut blocks = Vec::new();
        loop {
            self.skip_separators();
            let Some(token) = self.current() else {
                return Err(self.missing_end(keyword));
            };
            if token.is_keyword("end") {
                self.advance();
                self.end_statement()?;
                break;
            }
            match BlockKind::from_keyword(&token.raw) {
                Some(kind) if token.kind == TokenKind::Keyword && kind != BlockKind::Arguments => {
                    blocks.push(self.parse_special_block(kind)?);
                }
                _ => {
                    return Err(self.unexpected("keyword 'end'").with_hint(
                        "classdef bodies only accept properties, methods, events and enumeration blocks",
                    ))
                }
            }
        }

        Ok(ClassDef {
            id,
            loc,
            name,
            attributes,
            superclasses,
            blocks,
        })
    }

    /// `(Name, ~Name, Name = value, ...)`.
    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut attributes = Vec::new();
        loop {
            if self.eat(TokenKind::RParen).is_some() {
                break;
            }
            if !attributes.is_empty() {
                self.expect(TokenKind::Comma, "')'")?;
            }
            let start = self.here();
            let negated = self.eat_operator("~").or_else(|| self.eat_operator("!")).is_some();
            let name = self.expect_identifier()?;
            let value = if self.eat(TokenKind::Assignment).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            attributes.push(Attribute {
                id: self.next_id(),
                loc: self.span_from(&start),
                name: name.raw.clone(),
                negated,
                value,
            });
        }
        Ok(attributes)
    }

    /// A `properties`, `methods`, `events`, `enumeration` or `arguments`
    /// block, from its keyword to its `end`.
    pub(super) fn parse_special_block(&mut self, kind: BlockKind) -> Result<SpecialBlock, ParseError> {
        let keyword = self.expect_keyword(kind.keyword())?;
        let attributes = if self.check(TokenKind::LParen) {
            self.parse_attributes()?
        } else {
            Vec::new()
        };
        let id = self.next_id();
        let mut block = SpecialBlock::new(id, keyword.location.clone(), kind, attributes);

        loop {
            self.skip_separators();
            if self.eat_keyword("end").is_some() {
                break;
            }
            if self.at_end() {
                return Err(self.missing_end(keyword));
            }
            let start = self.here();
            let item = match kind {
                BlockKind::Properties | BlockKind::Arguments => {
                    BlockItem::Property(self.parse_property()?)
                }
                BlockKind::Methods if self.check_keyword("function") => {
                    let mut run = FunctionRun::new();
                    self.method_depth += 1;
                    let parsed = self.parse_function(&mut run);
                    self.method_depth -= 1;
                    parsed?;
                    for method in flatten::resolve_end_optional(run) {
                        block
                            .add_item(BlockItem::Method(method))
                            .map_err(|v| ParseError::internal(start.clone(), v))?;
                    }
                    continue;
                }
                BlockKind::Methods => BlockItem::Signature(self.parse_signature(&start)?),
                BlockKind::Events => {
                    let name = self.parse_identifier()?;
                    BlockItem::Event(EventDef {
                        id: self.next_id(),
                        loc: name.loc.clone(),
                        name,
                    })
                }
                BlockKind::Enumeration => {
                    let name = self.parse_identifier()?;
                    let args = if self.check(TokenKind::LParen) {
                        self.parse_arguments(TokenKind::RParen)?
                    } else {
                        Vec::new()
                    };
                    BlockItem::Enumeration(EnumerationDef {
                        id: self.next_id(),
                        loc: self.span_from(&start),
                        name,
                        args,
                    })
                }
            };
            block
                .add_item(item)
                .map_err(|v| ParseError::internal(start, v))?;
            self.end_statement()?;
        }

        block.loc = self.span_from(&keyword.location);
        Ok(block)
    }

    /// `name (dims) Class {validators} = default`; everything after the
    /// name is optional.
    fn parse_property(&mut self) -> Result<PropertyDef, ParseError> {
        let start = self.here();
        let name = self.parse_dotted_name()?;
        let dimensions = if self.check(TokenKind::LParen) {
            self.parse_arguments(TokenKind::RParen)?
        } else {
            Vec::new()
        };
        let class_name = if self.check(TokenKind::Identifier) {
            Some(self.parse_dotted_name()?)
        } else {
            None
        };
        let validators = if self.check(TokenKind::LBrace) {
            self.parse_arguments(TokenKind::RBrace)?
        } else {
            Vec::new()
        };
        let default = if self.eat(TokenKind::Assignment).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(PropertyDef {
            id: self.next_id(),
            loc: self.span_from(&start),
            name,
            dimensions,
            class_name,
            validators,
            default,
        })
    }
}
