// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement AST nodes.

use crate::expr::{Expr, Name};
use crate::{Location, NodeId};

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub loc: Location,
    pub kind: StmtKind,
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = value`
    Assign {
        lhs: Name,
        rhs: Expr,
    },
    /// `[a, b, ~] = value`
    MultiAssign {
        lhs: Vec<Name>,
        rhs: Expr,
    },
    /// `if` / `elseif` / `else` chain, one action per branch
    If {
        actions: Vec<Action>,
    },
    Switch {
        subject: Expr,
        cases: Vec<Case>,
    },
    For {
        var: Name,
        range: Expr,
        body: Vec<Stmt>,
    },
    /// `parfor (var = range, workers)`
    ParFor {
        var: Name,
        range: Expr,
        workers: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        guard: Expr,
        body: Vec<Stmt>,
    },
    /// `try ... catch err ... end`; `handler` is `None` when there is no
    /// `catch` clause at all.
    Try {
        body: Vec<Stmt>,
        catch_var: Option<Name>,
        handler: Option<Vec<Stmt>>,
    },
    Spmd {
        options: Vec<Expr>,
        body: Vec<Stmt>,
    },
    Global {
        names: Vec<Name>,
    },
    Persistent {
        names: Vec<Name>,
    },
    /// `import pkg.sub.*`, one entry per dotted component
    Import {
        chain: Vec<String>,
    },
    Break,
    Continue,
    Return,
    /// An expression evaluated for its effect, including command-syntax
    /// calls.
    Expr(Expr),
    /// `!command`, text after the bang
    Shell(String),
}

/// One guarded branch of an `if` statement. `guard` is `None` for `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: NodeId,
    pub loc: Location,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// One arm of a `switch`. `value` is `None` for `otherwise`.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: NodeId,
    pub loc: Location,
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
}

impl StmtKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            StmtKind::Assign { .. } => "Assignment",
            StmtKind::MultiAssign { .. } => "MultiAssignment",
            StmtKind::If { .. } => "If",
            StmtKind::Switch { .. } => "Switch",
            StmtKind::For { .. } => "For",
            StmtKind::ParFor { .. } => "ParFor",
            StmtKind::While { .. } => "While",
            StmtKind::Try { .. } => "Try",
            StmtKind::Spmd { .. } => "Spmd",
            StmtKind::Global { .. } => "Global",
            StmtKind::Persistent { .. } => "Persistent",
            StmtKind::Import { .. } => "Import",
            StmtKind::Break => "Break",
            StmtKind::Continue => "Continue",
            StmtKind::Return => "Return",
            StmtKind::Expr(_) => "NakedExpression",
            StmtKind::Shell(_) => "Shell",
        }
    }
}
