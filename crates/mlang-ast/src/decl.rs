// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compilation units and definition nodes.

use crate::expr::{Expr, Name};
use crate::stmt::Stmt;
use crate::{InvariantViolation, Location, NodeId};

/// The parse result for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilationUnit {
    Script(ScriptFile),
    Function(FunctionFile),
    Class(ClassFile),
}

/// Statements, optionally followed by local functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFile {
    pub id: NodeId,
    pub loc: Location,
    pub body: Vec<Stmt>,
    pub functions: Vec<FunctionDef>,
}

/// A file that starts with `function`: sibling functions only.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionFile {
    pub id: NodeId,
    pub loc: Location,
    pub functions: Vec<FunctionDef>,
}

/// A `classdef` block followed by optional local functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub id: NodeId,
    pub loc: Location,
    pub class: ClassDef,
    pub functions: Vec<FunctionDef>,
}

impl CompilationUnit {
    pub fn id(&self) -> NodeId {
        match self {
            CompilationUnit::Script(s) => s.id,
            CompilationUnit::Function(f) => f.id,
            CompilationUnit::Class(c) => c.id,
        }
    }

    pub fn loc(&self) -> &Location {
        match self {
            CompilationUnit::Script(s) => &s.loc,
            CompilationUnit::Function(f) => &f.loc,
            CompilationUnit::Class(c) => &c.loc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CompilationUnit::Script(_) => "ScriptFile",
            CompilationUnit::Function(_) => "FunctionFile",
            CompilationUnit::Class(_) => "ClassFile",
        }
    }

    /// Top-level functions (local functions for scripts and class files).
    pub fn functions(&self) -> &[FunctionDef] {
        match self {
            CompilationUnit::Script(s) => &s.functions,
            CompilationUnit::Function(f) => &f.functions,
            CompilationUnit::Class(c) => &c.functions,
        }
    }
}

/// `function [outputs] = name(inputs)`, or the same without the keyword
/// inside a `methods` block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub id: NodeId,
    pub loc: Location,
    pub name: Name,
    pub inputs: Vec<Name>,
    pub outputs: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub id: NodeId,
    pub loc: Location,
    pub signature: FunctionSignature,
    /// `arguments` blocks preceding the body.
    pub validation: Vec<SpecialBlock>,
    pub body: Vec<Stmt>,
    pub nested: Vec<FunctionDef>,
    /// Whether the definition was closed by an explicit `end`.
    pub terminated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub id: NodeId,
    pub loc: Location,
    pub name: Name,
    pub attributes: Vec<Attribute>,
    pub superclasses: Vec<Name>,
    pub blocks: Vec<SpecialBlock>,
}

/// `Name`, `~Name` or `Name = value` in an attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: NodeId,
    pub loc: Location,
    pub name: String,
    pub negated: bool,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Properties,
    Methods,
    Events,
    Enumeration,
    Arguments,
}

impl BlockKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::Properties => "properties",
            BlockKind::Methods => "methods",
            BlockKind::Events => "events",
            BlockKind::Enumeration => "enumeration",
            BlockKind::Arguments => "arguments",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "properties" => BlockKind::Properties,
            "methods" => BlockKind::Methods,
            "events" => BlockKind::Events,
            "enumeration" => BlockKind::Enumeration,
            "arguments" => BlockKind::Arguments,
            _ => return None,
        })
    }

    fn accepts(&self, item: &BlockItem) -> bool {
        matches!(
            (self, item),
            (BlockKind::Properties | BlockKind::Arguments, BlockItem::Property(_))
                | (BlockKind::Methods, BlockItem::Method(_) | BlockItem::Signature(_))
                | (BlockKind::Events, BlockItem::Event(_))
                | (BlockKind::Enumeration, BlockItem::Enumeration(_))
        )
    }
}

/// A `properties`, `methods`, `events`, `enumeration` or `arguments`
/// block. Items are only added through [`SpecialBlock::add_item`], which
/// rejects items of the wrong kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialBlock {
    pub id: NodeId,
    pub loc: Location,
    pub kind: BlockKind,
    pub attributes: Vec<Attribute>,
    items: Vec<BlockItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Property(PropertyDef),
    Method(FunctionDef),
    Signature(FunctionSignature),
    Event(EventDef),
    Enumeration(EnumerationDef),
}

impl BlockItem {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BlockItem::Property(_) => "property",
            BlockItem::Method(_) => "method",
            BlockItem::Signature(_) => "method signature",
            BlockItem::Event(_) => "event",
            BlockItem::Enumeration(_) => "enumeration literal",
        }
    }
}

impl SpecialBlock {
    pub fn new(id: NodeId, loc: Location, kind: BlockKind, attributes: Vec<Attribute>) -> Self {
        Self {
            id,
            loc,
            kind,
            attributes,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: BlockItem) -> Result<(), InvariantViolation> {
        if !self.kind.accepts(&item) {
            return Err(InvariantViolation::new(format!(
                "{} block cannot hold a {}",
                self.kind.keyword(),
                item.kind_name()
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn items(&self) -> &[BlockItem] {
        &self.items
    }
}

/// A property declaration, or one argument in an `arguments` block.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub id: NodeId,
    pub loc: Location,
    pub name: Name,
    /// Size constraint, e.g. `(1,:)`.
    pub dimensions: Vec<Expr>,
    pub class_name: Option<Name>,
    /// Validator functions listed in `{...}`.
    pub validators: Vec<Expr>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub id: NodeId,
    pub loc: Location,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationDef {
    pub id: NodeId,
    pub loc: Location,
    pub name: Name,
    pub args: Vec<Expr>,
}
