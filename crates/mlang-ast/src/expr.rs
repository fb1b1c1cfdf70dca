// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes.

use crate::{Location, NodeId};

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub loc: Location,
    pub kind: ExprKind,
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Identifier, reference, selection (see [`NameKind`])
    Name(NameKind),
    /// Number literal, kept as written
    Number(String),
    /// Single-quoted character array (value, quotes removed)
    CharArray(String),
    /// Double-quoted string (value, quotes removed)
    String(String),
    /// Prefix or postfix unary operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `start:stop` or `start:stride:stop`
    Range {
        start: Box<Expr>,
        stride: Option<Box<Expr>>,
        stop: Box<Expr>,
    },
    /// A lone `:` used as an index
    Reshape,
    /// The `end` keyword used inside an index
    End,
    /// `[...]`
    Matrix(Vec<Row>),
    /// `{...}`
    Cell(Vec<Row>),
    /// `@(params) body`
    Lambda {
        params: Vec<Name>,
        body: Box<Expr>,
    },
    /// `@name`
    FunctionHandle(Box<Name>),
    /// `?name`
    Metaclass(Box<Name>),
}

/// One row of a matrix or cell literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: NodeId,
    pub loc: Location,
    pub items: Vec<Expr>,
}

/// A name: something that can be assigned to or called.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub id: NodeId,
    pub loc: Location,
    pub kind: NameKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameKind {
    Identifier(String),
    /// `prefix(args)`: call or array index
    Reference {
        prefix: Box<Name>,
        args: Vec<Expr>,
    },
    /// `prefix{args}`
    CellReference {
        prefix: Box<Name>,
        args: Vec<Expr>,
    },
    /// `prefix.field`
    Selection {
        prefix: Box<Name>,
        field: String,
    },
    /// `prefix.(expr)`
    DynamicSelection {
        prefix: Box<Name>,
        field: Box<Expr>,
    },
    /// `method@Superclass`
    SuperclassReference {
        prefix: Box<Name>,
        reference: Box<Name>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    /// `'`
    ConjugateTranspose,
    /// `.'`
    Transpose,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "~",
            UnaryOp::ConjugateTranspose => "'",
            UnaryOp::Transpose => ".'",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::ConjugateTranspose | UnaryOp::Transpose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Power,
    ElemPower,
    Mul,
    ElemMul,
    Div,
    ElemDiv,
    LeftDiv,
    ElemLeftDiv,
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    ElemAnd,
    ElemOr,
    ShortAnd,
    ShortOr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Power => "^",
            BinaryOp::ElemPower => ".^",
            BinaryOp::Mul => "*",
            BinaryOp::ElemMul => ".*",
            BinaryOp::Div => "/",
            BinaryOp::ElemDiv => "./",
            BinaryOp::LeftDiv => "\\",
            BinaryOp::ElemLeftDiv => ".\\",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "~=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::ElemAnd => "&",
            BinaryOp::ElemOr => "|",
            BinaryOp::ShortAnd => "&&",
            BinaryOp::ShortOr => "||",
        }
    }

    /// Map operator text to a binary operator. `!=` is the Octave spelling
    /// of `~=`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "^" => BinaryOp::Power,
            ".^" => BinaryOp::ElemPower,
            "*" => BinaryOp::Mul,
            ".*" => BinaryOp::ElemMul,
            "/" => BinaryOp::Div,
            "./" => BinaryOp::ElemDiv,
            "\\" => BinaryOp::LeftDiv,
            ".\\" => BinaryOp::ElemLeftDiv,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "==" => BinaryOp::Eq,
            "~=" | "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&" => BinaryOp::ElemAnd,
            "|" => BinaryOp::ElemOr,
            "&&" => BinaryOp::ShortAnd,
            "||" => BinaryOp::ShortOr,
            _ => return None,
        })
    }
}

impl Name {
    pub fn into_expr(self) -> Expr {
        Expr {
            id: self.id,
            loc: self.loc,
            kind: ExprKind::Name(self.kind),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            NameKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// `a.b.c` for a chain of plain selections on an identifier.
    pub fn dotted(&self) -> Option<String> {
        match &self.kind {
            NameKind::Identifier(name) => Some(name.clone()),
            NameKind::Selection { prefix, field } => {
                prefix.dotted().map(|p| format!("{p}.{field}"))
            }
            _ => None,
        }
    }
}

impl Expr {
    /// Reinterpret a name expression as a [`Name`]. Hands the expression
    /// back unchanged when it is anything else.
    pub fn into_name(self) -> Result<Name, Expr> {
        match self.kind {
            ExprKind::Name(kind) => Ok(Name {
                id: self.id,
                loc: self.loc,
                kind,
            }),
            kind => Err(Expr { kind, ..self }),
        }
    }

    pub fn is_name(&self) -> bool {
        matches!(self.kind, ExprKind::Name(_))
    }
}

impl ExprKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprKind::Name(name) => name.kind_name(),
            ExprKind::Number(_) => "Number",
            ExprKind::CharArray(_) => "CharArray",
            ExprKind::String(_) => "String",
            ExprKind::Unary { .. } => "Unary",
            ExprKind::Binary { .. } => "Binary",
            ExprKind::Range { .. } => "Range",
            ExprKind::Reshape => "Reshape",
            ExprKind::End => "End",
            ExprKind::Matrix(_) => "Matrix",
            ExprKind::Cell(_) => "Cell",
            ExprKind::Lambda { .. } => "Lambda",
            ExprKind::FunctionHandle(_) => "FunctionHandle",
            ExprKind::Metaclass(_) => "Metaclass",
        }
    }
}

impl NameKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NameKind::Identifier(_) => "Identifier",
            NameKind::Reference { .. } => "Reference",
            NameKind::CellReference { .. } => "CellReference",
            NameKind::Selection { .. } => "Selection",
            NameKind::DynamicSelection { .. } => "DynamicSelection",
            NameKind::SuperclassReference { .. } => "SuperclassReference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: u32, name: &str) -> Name {
        Name {
            id: NodeId(id),
            loc: Location::file("t.m"),
            kind: NameKind::Identifier(name.to_string()),
        }
    }

    #[test]
    fn dotted_chain() {
        let sel = Name {
            id: NodeId(2),
            loc: Location::file("t.m"),
            kind: NameKind::Selection {
                prefix: Box::new(ident(1, "pkg")),
                field: "fn".to_string(),
            },
        };
        assert_eq!(sel.dotted().as_deref(), Some("pkg.fn"));
    }

    #[test]
    fn name_expr_round_trip_keeps_id() {
        let name = ident(7, "x");
        let expr = name.clone().into_expr();
        assert_eq!(expr.id, NodeId(7));
        assert_eq!(expr.into_name(), Ok(name));
    }

    #[test]
    fn non_name_expr_is_returned() {
        let expr = Expr {
            id: NodeId(0),
            loc: Location::file("t.m"),
            kind: ExprKind::Number("1".to_string()),
        };
        assert!(expr.clone().into_name().is_err());
    }

    #[test]
    fn operator_symbols_round_trip() {
        for op in [BinaryOp::Add, BinaryOp::ElemLeftDiv, BinaryOp::ShortOr, BinaryOp::Ne] {
            assert_eq!(BinaryOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinaryOp::from_symbol("!="), Some(BinaryOp::Ne));
        assert_eq!(BinaryOp::from_symbol("~"), None);
    }
}
