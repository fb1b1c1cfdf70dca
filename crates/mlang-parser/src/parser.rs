// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The recursive-descent parser.
//!
//! Statements, functions and file dispatch live here; expressions and
//! class bodies are in the child modules.

mod class;
mod expr;

use std::sync::Arc;

use mlang_ast::decl::{
    BlockKind, CompilationUnit, FunctionDef, FunctionFile, FunctionSignature, ScriptFile,
    SpecialBlock,
};
use mlang_ast::expr::{Expr, ExprKind, Name, NameKind};
use mlang_ast::stmt::{Action, Case, Stmt, StmtKind};
use mlang_ast::token::{Token, TokenKind};
use mlang_ast::{Location, NodeId, NodeIds};
use tracing::debug;

use crate::error::ParseError;
use crate::flatten::{self, FunctionRun};

/// Keywords that close or continue an enclosing block. They end the
/// statement before them without being consumed.
const BLOCK_CLOSERS: &[&str] = &["end", "else", "elseif", "case", "otherwise", "catch"];

/// What the parser is currently inside of. Only used for validity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Function,
    Classdef,
    Loop,
    If,
    Switch,
    /// `try`/`catch` and `spmd` bodies.
    Block,
}

impl Frame {
    fn describe(&self) -> &'static str {
        match self {
            Frame::Function => "a function",
            Frame::Classdef => "a classdef",
            Frame::Loop => "a loop",
            Frame::If => "an if block",
            Frame::Switch => "a switch block",
            Frame::Block => "a try or spmd block",
        }
    }
}

/// The parser for one file's tokens.
pub struct Parser<'t> {
    tokens: &'t [Token],
    /// Indices of the tokens grammar rules see: no comments or
    /// continuations, and no two newlines in a row.
    view: Vec<usize>,
    pos: usize,
    filename: Arc<str>,
    ids: NodeIds,
    frames: Vec<Frame>,
    /// Open argument lists, where `end` and a lone `:` are values.
    index_depth: usize,
    /// Open `methods` blocks; their functions always need `end`.
    method_depth: usize,
    /// Some function outside a `methods` block was closed by `end`.
    end_used: bool,
    /// The next matrix may hold `~` placeholders (statement-initial).
    allow_placeholder: bool,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token], filename: impl Into<Arc<str>>) -> Self {
        let mut view = Vec::with_capacity(tokens.len());
        let mut last_newline = false;
        for (index, token) in tokens.iter().enumerate() {
            if token.kind.is_trivia() {
                continue;
            }
            let newline = token.kind == TokenKind::Newline;
            if newline && last_newline {
                continue;
            }
            last_newline = newline;
            view.push(index);
        }
        Self {
            tokens,
            view,
            pos: 0,
            filename: filename.into(),
            ids: NodeIds::new(),
            frames: Vec::new(),
            index_depth: 0,
            method_depth: 0,
            end_used: false,
            allow_placeholder: false,
        }
    }

    /// Number of nodes created so far.
    pub fn node_count(&self) -> u32 {
        self.ids.allocated()
    }

    /// Parse the whole file. The first token decides the kind of unit.
    pub fn parse_file(&mut self) -> Result<CompilationUnit, ParseError> {
        self.skip_separators();
        let unit = if self.check_keyword("function") {
            self.parse_function_file()?
        } else if self.check_keyword("classdef") {
            self.parse_class_file()?
        } else {
            self.parse_script_file()?
        };
        debug!(
            file = %self.filename,
            unit = unit.kind_name(),
            nodes = self.ids.allocated(),
            "parse finished"
        );
        Ok(unit)
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn peek(&self, n: usize) -> Option<&'t Token> {
        let tokens = self.tokens;
        self.view.get(self.pos + n).map(|&i| &tokens[i])
    }

    fn current(&self) -> Option<&'t Token> {
        self.peek(0)
    }

    fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.peek(n).map(|t| t.kind)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.view.len()
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind(0) == Some(kind)
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.current().is_some_and(|t| t.is_keyword(word))
    }

    fn check_operator(&self, op: &str) -> bool {
        self.current().is_some_and(|t| t.is_operator(op))
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'t Token> {
        if self.check(kind) {
            self.advance()
        } else {
            None
        }
    }

    fn eat_keyword(&mut self, word: &str) -> Option<&'t Token> {
        if self.check_keyword(word) {
            self.advance()
        } else {
            None
        }
    }

    fn eat_operator(&mut self, op: &str) -> Option<&'t Token> {
        if self.check_operator(op) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume a token of `kind`; `what` names it in the error.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'t Token, ParseError> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(what)),
        }
    }

    fn expect_identifier(&mut self) -> Result<&'t Token, ParseError> {
        self.expect(TokenKind::Identifier, "identifier")
    }

    /// The `end` closing a block opened at `opened`.
    fn expect_end(&mut self, opened: &Token) -> Result<&'t Token, ParseError> {
        match self.eat_keyword("end") {
            Some(token) => Ok(token),
            None => Err(self.missing_end(opened)),
        }
    }

    fn missing_end(&self, opened: &Token) -> ParseError {
        let line = opened.location.line_number().unwrap_or(0);
        self.unexpected("keyword 'end'")
            .with_hint(format!("to close the '{}' on line {line}", opened.raw))
    }

    /// "Expected `what`" at the current token.
    fn unexpected(&self, what: &str) -> ParseError {
        ParseError::expected(what, self.current(), self.here())
    }

    /// Location of the current token; the last token at end of input.
    fn here(&self) -> Location {
        match self.current() {
            Some(token) => token.location.clone(),
            None => self.last_location(),
        }
    }

    fn last_location(&self) -> Location {
        match self.pos.checked_sub(1).and_then(|p| self.view.get(p)) {
            Some(&i) => self.tokens[i].location.clone(),
            None => Location::file(Arc::clone(&self.filename)),
        }
    }

    /// From `start` to the end of the last consumed token.
    fn span_from(&self, start: &Location) -> Location {
        start.to(&self.last_location())
    }

    fn next_id(&mut self) -> NodeId {
        self.ids.fresh()
    }

    /// Run `f` with `frame` pushed.
    fn in_frame<T>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.frames.push(frame);
        let result = f(self);
        self.frames.pop();
        result
    }

    // =========================================================================
    // Separators
    // =========================================================================

    fn at_separator(&self) -> bool {
        matches!(
            self.peek_kind(0),
            Some(TokenKind::Newline | TokenKind::Semicolon | TokenKind::Comma)
        )
    }

    fn at_block_closer(&self) -> bool {
        self.current()
            .is_some_and(|t| t.kind == TokenKind::Keyword && BLOCK_CLOSERS.contains(&t.raw.as_str()))
    }

    fn skip_separators(&mut self) {
        while self.at_separator() {
            self.advance();
        }
    }

    /// A statement ends at a separator, at end of file, or right before a
    /// block closing keyword.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.at_separator() {
            self.advance();
            Ok(())
        } else if self.at_end() || self.at_block_closer() {
            Ok(())
        } else {
            Err(self.unexpected("separator"))
        }
    }

    // =========================================================================
    // Compilation Units
    // =========================================================================

    fn parse_script_file(&mut self) -> Result<CompilationUnit, ParseError> {
        let id = self.next_id();
        let mut body = Vec::new();
        self.parse_statements(&mut body)?;
        let functions = self.parse_local_functions()?;
        Ok(CompilationUnit::Script(ScriptFile {
            id,
            loc: Location::file(Arc::clone(&self.filename)),
            body,
            functions,
        }))
    }

    fn parse_function_file(&mut self) -> Result<CompilationUnit, ParseError> {
        let id = self.next_id();
        let functions = self.parse_local_functions()?;
        Ok(CompilationUnit::Function(FunctionFile {
            id,
            loc: Location::file(Arc::clone(&self.filename)),
            functions,
        }))
    }

    /// Sibling functions up to end of file.
    fn parse_local_functions(&mut self) -> Result<Vec<FunctionDef>, ParseError> {
        let mut run = FunctionRun::new();
        loop {
            self.skip_separators();
            let Some(token) = self.current() else {
                break;
            };
            if token.is_keyword("function") {
                self.parse_function(&mut run)?;
            } else if token.kind == TokenKind::Keyword && BLOCK_CLOSERS.contains(&token.raw.as_str()) {
                return Err(ParseError::syntax(
                    token.location.clone(),
                    format!("'{}' without a matching block", token.raw),
                ));
            } else {
                return Err(self
                    .unexpected("keyword 'function'")
                    .with_hint("statements cannot follow function definitions"));
            }
        }
        Ok(flatten::resolve_end_optional(run))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// A `function` up to the `end` that closes it, with every function
    /// read inside of it. Functions still open at end of file are closed
    /// there. All of them land in `run`, in source order.
    fn parse_function(&mut self, run: &mut FunctionRun) -> Result<(), ParseError> {
        let depth = self.frames.len();
        let result = self.parse_function_run(run);
        self.frames.truncate(depth);
        result
    }

    fn parse_function_run(&mut self, run: &mut FunctionRun) -> Result<(), ParseError> {
        let mut current = self.open_function(run, None)?;
        let mut enclosing = Vec::new();
        loop {
            self.parse_statements(&mut current.body)?;
            if self.check_keyword("function") {
                let inner = self.open_function(run, Some(current.index))?;
                enclosing.push(std::mem::replace(&mut current, inner));
                continue;
            }
            if self.at_end() {
                enclosing.push(current);
                return self.close_at_end_of_file(enclosing, run);
            }
            self.close_with_end(current, run)?;
            match enclosing.pop() {
                Some(parent) => current = parent,
                None => return Ok(()),
            }
        }
    }

    /// Signature and `arguments` blocks; pushes the function frame.
    fn open_function(
        &mut self,
        run: &mut FunctionRun,
        parent: Option<usize>,
    ) -> Result<OpenFunction<'t>, ParseError> {
        let keyword = self.expect_keyword("function")?;
        let id = self.next_id();
        let signature = self.parse_signature(&keyword.location)?;
        let index = run.open(parent);
        let in_method = self.method_depth > 0;
        self.frames.push(Frame::Function);
        let mut validation = Vec::new();
        loop {
            self.skip_separators();
            if !self.check_keyword("arguments") {
                break;
            }
            validation.push(self.parse_special_block(BlockKind::Arguments)?);
        }
        Ok(OpenFunction {
            keyword,
            index,
            id,
            signature,
            validation,
            body: Vec::new(),
            in_method,
        })
    }

    fn close_with_end(
        &mut self,
        function: OpenFunction<'t>,
        run: &mut FunctionRun,
    ) -> Result<(), ParseError> {
        if self.eat_keyword("end").is_none() {
            return Err(match self.current() {
                Some(token) => ParseError::syntax(
                    token.location.clone(),
                    format!("'{}' without a matching block", token.raw),
                ),
                None => self.unexpected("keyword 'end'"),
            });
        }
        if !function.in_method {
            self.end_used = true;
        }
        self.end_statement()?;
        self.frames.pop();
        run.close(function.index, function.finish(true));
        Ok(())
    }

    /// Every function still open at end of file. Innermost is checked
    /// first.
    fn close_at_end_of_file(
        &self,
        open: Vec<OpenFunction<'t>>,
        run: &mut FunctionRun,
    ) -> Result<(), ParseError> {
        if let Some(function) = open.iter().rev().find(|f| f.in_method || self.end_used) {
            let (what, hint) = if function.in_method {
                ("Method", "methods in a classdef are always closed by 'end'")
            } else {
                (
                    "Function",
                    "once one function in a file is closed by 'end', all of them must be",
                )
            };
            return Err(ParseError::syntax(
                function.keyword.location.clone(),
                format!(
                    "{what} '{}' is not terminated by 'end'",
                    signature_name(&function.signature)
                ),
            )
            .with_hint(hint));
        }
        for function in open {
            run.close(function.index, function.finish(false));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, word: &str) -> Result<&'t Token, ParseError> {
        match self.eat_keyword(word) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(&format!("keyword '{word}'"))),
        }
    }

    /// `[outs] = name(ins)`, `out = name(ins)`, `name(ins)` or `name`, after
    /// the `function` keyword if there is one.
    fn parse_signature(&mut self, start: &Location) -> Result<FunctionSignature, ParseError> {
        let mut outputs = Vec::new();
        let name;
        if self.eat(TokenKind::LBracket).is_some() {
            loop {
                match self.peek_kind(0) {
                    Some(TokenKind::RBracket) => {
                        self.advance();
                        break;
                    }
                    Some(TokenKind::Comma) => {
                        self.advance();
                    }
                    Some(TokenKind::Identifier) => outputs.push(self.parse_identifier()?),
                    _ => return Err(self.unexpected("identifier")),
                }
            }
            self.expect(TokenKind::Assignment, "'=' after the output list")?;
            name = self.parse_dotted_name()?;
        } else {
            let first = self.parse_dotted_name()?;
            if self.check(TokenKind::Assignment) {
                if first.identifier().is_none() {
                    return Err(ParseError::syntax(first.loc, "Function outputs must be plain names"));
                }
                self.advance();
                outputs.push(first);
                name = self.parse_dotted_name()?;
            } else {
                name = first;
            }
        }

        let mut inputs = Vec::new();
        if self.eat(TokenKind::LParen).is_some() {
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
                    TokenKind::Identifier => inputs.push(self.parse_identifier()?),
                    TokenKind::Operator if token.raw == "~" => {
                        self.advance();
                        inputs.push(self.placeholder(token));
                    }
                    _ => return Err(self.unexpected("')'")),
                }
            }
        }

        Ok(FunctionSignature {
            id: self.next_id(),
            loc: self.span_from(start),
            name,
            inputs,
            outputs,
        })
    }

    fn parse_identifier(&mut self) -> Result<Name, ParseError> {
        let token = self.expect_identifier()?;
        Ok(Name {
            id: self.next_id(),
            loc: token.location.clone(),
            kind: NameKind::Identifier(token.raw.clone()),
        })
    }

    /// `a`, `a.b`, `a.b.c`: identifiers joined by plain selections.
    fn parse_dotted_name(&mut self) -> Result<Name, ParseError> {
        let mut name = self.parse_identifier()?;
        while self.check(TokenKind::Selection) && self.peek_kind(1) == Some(TokenKind::Identifier) {
            self.advance();
            let field = self.expect_identifier()?;
            name = Name {
                id: self.next_id(),
                loc: name.loc.to(&field.location),
                kind: NameKind::Selection {
                    prefix: Box::new(name),
                    field: field.raw.clone(),
                },
            };
        }
        Ok(name)
    }

    /// The `~` standing in for an ignored input or output.
    fn placeholder(&mut self, token: &Token) -> Name {
        Name {
            id: self.next_id(),
            loc: token.location.clone(),
            kind: NameKind::Identifier("~".to_string()),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Statements up to end of file, a block closing keyword, or a
    /// `function` that belongs to the caller.
    fn parse_statements(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        loop {
            self.skip_separators();
            let Some(token) = self.current() else {
                return Ok(());
            };
            if token.kind == TokenKind::Keyword {
                if BLOCK_CLOSERS.contains(&token.raw.as_str()) {
                    return Ok(());
                }
                match token.raw.as_str() {
                    "function" => {
                        return match self.frames.last() {
                            None | Some(Frame::Function) => Ok(()),
                            Some(frame) => Err(ParseError::syntax(
                                token.location.clone(),
                                format!("Function definitions cannot appear inside {}", frame.describe()),
                            )),
                        }
                    }
                    "classdef" => {
                        return Err(ParseError::syntax(
                            token.location.clone(),
                            "'classdef' must start its file",
                        ))
                    }
                    _ => {}
                }
            }
            self.parse_statement(out)?;
        }
    }

    fn parse_block(&mut self, frame: Frame) -> Result<Vec<Stmt>, ParseError> {
        self.in_frame(frame, |p| {
            let mut body = Vec::new();
            p.parse_statements(&mut body)?;
            Ok(body)
        })
    }

    fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        let Some(token) = self.current() else {
            return Ok(());
        };
        let start = token.location.clone();
        let kind = match token.kind {
            TokenKind::Keyword => match token.raw.as_str() {
                "if" => self.parse_if()?,
                "switch" => self.parse_switch()?,
                "for" => self.parse_for()?,
                "parfor" => self.parse_parfor()?,
                "while" => self.parse_while()?,
                "try" => self.parse_try()?,
                "spmd" => self.parse_spmd()?,
                "global" | "persistent" => self.parse_declaration()?,
                "break" | "continue" => {
                    self.advance();
                    self.check_in_loop(token)?;
                    if token.raw == "break" {
                        StmtKind::Break
                    } else {
                        StmtKind::Continue
                    }
                }
                "return" => {
                    self.advance();
                    StmtKind::Return
                }
                _ => {
                    return Err(ParseError::syntax(
                        start,
                        format!("Unexpected keyword '{}'", token.raw),
                    ))
                }
            },
            TokenKind::Bang => {
                self.advance();
                StmtKind::Shell(token.value())
            }
            TokenKind::Identifier if self.at_command() => return self.parse_command(out),
            _ => self.parse_expression_statement()?,
        };
        out.push(Stmt {
            id: self.next_id(),
            loc: self.span_from(&start),
            kind,
        });
        self.end_statement()
    }

    /// `break`/`continue` need a loop inside the current function.
    fn check_in_loop(&self, token: &Token) -> Result<(), ParseError> {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Loop => return Ok(()),
                Frame::Function => break,
                _ => {}
            }
        }
        Err(ParseError::syntax(
            token.location.clone(),
            format!("'{}' is only allowed inside a loop", token.raw),
        ))
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'if'"));
        };
        let mut actions = Vec::new();
        let mut branch = keyword;
        let mut guard = Some(self.parse_expression()?);
        loop {
            let body = self.parse_block(Frame::If)?;
            actions.push(Action {
                id: self.next_id(),
                loc: branch.location.clone(),
                guard,
                body,
            });
            if guard_is_else(&actions) {
                break;
            }
            if let Some(token) = self.eat_keyword("elseif") {
                branch = token;
                guard = Some(self.parse_expression()?);
            } else if let Some(token) = self.eat_keyword("else") {
                branch = token;
                guard = None;
            } else {
                break;
            }
        }
        self.expect_end(keyword)?;
        Ok(StmtKind::If { actions })
    }

    fn parse_switch(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'switch'"));
        };
        let subject = self.parse_expression()?;
        let mut cases = Vec::new();
        loop {
            self.skip_separators();
            let (token, value) = if let Some(token) = self.eat_keyword("case") {
                (token, Some(self.parse_expression()?))
            } else if let Some(token) = self.eat_keyword("otherwise") {
                (token, None)
            } else if self.check_keyword("end") {
                break;
            } else {
                return Err(self.unexpected("keyword 'case', 'otherwise' or 'end'"));
            };
            let body = self.parse_block(Frame::Switch)?;
            cases.push(Case {
                id: self.next_id(),
                loc: token.location.clone(),
                value,
                body,
            });
        }
        self.expect_end(keyword)?;
        Ok(StmtKind::Switch { subject, cases })
    }

    /// `var = range`, the common head of `for` and `parfor`.
    fn parse_loop_head(&mut self) -> Result<(Name, Expr), ParseError> {
        let var = self.parse_identifier()?;
        self.expect(TokenKind::Assignment, "'='")?;
        let range = self.parse_expression()?;
        Ok((var, range))
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'for'"));
        };
        let (var, range) = if self.eat(TokenKind::LParen).is_some() {
            let head = self.parse_loop_head()?;
            self.expect(TokenKind::RParen, "')'")?;
            head
        } else {
            self.parse_loop_head()?
        };
        let body = self.parse_block(Frame::Loop)?;
        self.expect_end(keyword)?;
        Ok(StmtKind::For { var, range, body })
    }

    fn parse_parfor(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'parfor'"));
        };
        let (var, range, workers) = if self.eat(TokenKind::LParen).is_some() {
            let (var, range) = self.parse_loop_head()?;
            let workers = if self.eat(TokenKind::Comma).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect(TokenKind::RParen, "')'")?;
            (var, range, workers)
        } else {
            let (var, range) = self.parse_loop_head()?;
            (var, range, None)
        };
        let body = self.parse_block(Frame::Loop)?;
        self.expect_end(keyword)?;
        Ok(StmtKind::ParFor {
            var,
            range,
            workers,
            body,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'while'"));
        };
        let guard = self.parse_expression()?;
        let body = self.parse_block(Frame::Loop)?;
        self.expect_end(keyword)?;
        Ok(StmtKind::While { guard, body })
    }

    fn parse_try(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'try'"));
        };
        let body = self.parse_block(Frame::Block)?;
        let mut catch_var = None;
        let mut handler = None;
        if self.eat_keyword("catch").is_some() {
            let names_variable = self.check(TokenKind::Identifier)
                && match self.peek(1) {
                    None => true,
                    Some(next) => {
                        matches!(
                            next.kind,
                            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Comma
                        ) || (next.kind == TokenKind::Keyword
                            && BLOCK_CLOSERS.contains(&next.raw.as_str()))
                    }
                };
            if names_variable {
                catch_var = Some(self.parse_identifier()?);
            }
            handler = Some(self.parse_block(Frame::Block)?);
        }
        self.expect_end(keyword)?;
        Ok(StmtKind::Try {
            body,
            catch_var,
            handler,
        })
    }

    fn parse_spmd(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'spmd'"));
        };
        let options = if self.check(TokenKind::LParen) {
            self.parse_arguments(TokenKind::RParen)?
        } else {
            Vec::new()
        };
        let body = self.parse_block(Frame::Block)?;
        self.expect_end(keyword)?;
        Ok(StmtKind::Spmd { options, body })
    }

    /// `global a b c` / `persistent a b c`.
    fn parse_declaration(&mut self) -> Result<StmtKind, ParseError> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("keyword 'global'"));
        };
        let mut names = vec![self.parse_identifier()?];
        while self.check(TokenKind::Identifier) {
            names.push(self.parse_identifier()?);
        }
        Ok(if keyword.raw == "global" {
            StmtKind::Global { names }
        } else {
            StmtKind::Persistent { names }
        })
    }

    /// A statement-initial (dotted) identifier followed by command words.
    fn at_command(&self) -> bool {
        let mut n = 1;
        while self.peek_kind(n) == Some(TokenKind::Selection)
            && self.peek_kind(n + 1) == Some(TokenKind::Identifier)
        {
            n += 2;
        }
        match self.peek_kind(n) {
            Some(TokenKind::CharArray) => true,
            Some(TokenKind::Directory) => n == 1,
            _ => false,
        }
    }

    /// `disp hello world` is `disp('hello', 'world')`; `import a.b.*` is an
    /// import.
    fn parse_command(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        let head = self.parse_dotted_name()?;
        let mut words: Vec<&'t Token> = Vec::new();
        while let Some(token) = self.current() {
            if !matches!(token.kind, TokenKind::CharArray | TokenKind::Directory) {
                break;
            }
            self.advance();
            words.push(token);
        }

        if head.identifier() == Some("import") {
            for word in words {
                let chain = word.value().split('.').map(String::from).collect();
                out.push(Stmt {
                    id: self.next_id(),
                    loc: word.location.clone(),
                    kind: StmtKind::Import { chain },
                });
            }
            return self.end_statement();
        }

        let args = words
            .into_iter()
            .map(|word| Expr {
                id: self.next_id(),
                loc: word.location.clone(),
                kind: ExprKind::CharArray(word.value()),
            })
            .collect();
        let start = head.loc.clone();
        let call = Name {
            id: self.next_id(),
            loc: self.span_from(&start),
            kind: NameKind::Reference {
                prefix: Box::new(head),
                args,
            },
        };
        out.push(Stmt {
            id: self.next_id(),
            loc: self.span_from(&start),
            kind: StmtKind::Expr(call.into_expr()),
        });
        self.end_statement()
    }

    /// Assignment, multiple assignment or a naked expression, told apart by
    /// what follows the leading expression.
    fn parse_expression_statement(&mut self) -> Result<StmtKind, ParseError> {
        self.allow_placeholder = self.check(TokenKind::LBracket);
        let expr = self.parse_expression()?;
        self.allow_placeholder = false;

        if self.eat(TokenKind::Assignment).is_none() {
            if has_placeholder(&expr) {
                return Err(ParseError::syntax(
                    expr.loc,
                    "'~' is only allowed on the left of an assignment",
                ));
            }
            return Ok(StmtKind::Expr(expr));
        }

        match expr.kind {
            ExprKind::Matrix(mut rows) if rows.len() == 1 => {
                let row = rows.remove(0);
                let mut lhs = Vec::with_capacity(row.items.len());
                for item in row.items {
                    match item.into_name() {
                        Ok(name) => lhs.push(name),
                        Err(other) => return Err(not_assignable(&other)),
                    }
                }
                let rhs = self.parse_expression()?;
                Ok(StmtKind::MultiAssign { lhs, rhs })
            }
            kind => {
                let expr = Expr { kind, ..expr };
                match expr.into_name() {
                    Ok(lhs) => {
                        let rhs = self.parse_expression()?;
                        Ok(StmtKind::Assign { lhs, rhs })
                    }
                    Err(other) => Err(not_assignable(&other)),
                }
            }
        }
    }
}

fn guard_is_else(actions: &[Action]) -> bool {
    actions.last().is_some_and(|a| a.guard.is_none())
}

/// A function whose body is still being read.
struct OpenFunction<'t> {
    keyword: &'t Token,
    /// Slot in the enclosing [`FunctionRun`].
    index: usize,
    id: NodeId,
    signature: FunctionSignature,
    validation: Vec<SpecialBlock>,
    body: Vec<Stmt>,
    in_method: bool,
}

impl OpenFunction<'_> {
    fn finish(self, terminated: bool) -> FunctionDef {
        FunctionDef {
            id: self.id,
            loc: self.keyword.location.clone(),
            signature: self.signature,
            validation: self.validation,
            body: self.body,
            nested: Vec::new(),
            terminated,
        }
    }
}

fn signature_name(signature: &FunctionSignature) -> String {
    signature
        .name
        .dotted()
        .unwrap_or_else(|| signature.name.kind.kind_name().to_string())
}

fn not_assignable(expr: &Expr) -> ParseError {
    ParseError::syntax(
        expr.loc.clone(),
        format!("Cannot assign to {}", expr.kind.kind_name()),
    )
    .with_hint("the left side of '=' must be a name, an index or a field")
}

/// Whether a statement-initial matrix holds a `~` placeholder.
fn has_placeholder(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Matrix(rows) => rows.iter().flat_map(|r| &r.items).any(|item| {
            matches!(&item.kind, ExprKind::Name(NameKind::Identifier(name)) if name == "~")
        }),
        _ => false,
    }
}
