// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Depth-first traversal over the syntax tree.
//!
//! Every node kind is reachable through [`NodeRef`], a borrowed view that
//! exposes id, location, a display label and the ordered list of children.
//! [`walk`] drives a [`Visitor`] in pre-order: `enter` fires on the node,
//! then each child is walked with its relation label ("Body", "Guard",
//! "LHS", ...), then `exit` fires on the node.

use crate::decl::{
    Attribute, BlockItem, ClassDef, CompilationUnit, EnumerationDef, EventDef, FunctionDef,
    FunctionSignature, PropertyDef, SpecialBlock,
};
use crate::expr::{Expr, ExprKind, Name, NameKind, Row};
use crate::stmt::{Action, Case, Stmt, StmtKind};
use crate::token::enquote;
use crate::{Location, NodeId};

/// A borrowed reference to any node in the tree.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Unit(&'a CompilationUnit),
    Function(&'a FunctionDef),
    Signature(&'a FunctionSignature),
    Class(&'a ClassDef),
    Block(&'a SpecialBlock),
    Attribute(&'a Attribute),
    Property(&'a PropertyDef),
    Event(&'a EventDef),
    Enumeration(&'a EnumerationDef),
    Stmt(&'a Stmt),
    Action(&'a Action),
    Case(&'a Case),
    Expr(&'a Expr),
    Row(&'a Row),
    Name(&'a Name),
}

/// Callbacks fired while walking the tree.
///
/// `parent` is `None` for the node the walk started from.
pub trait Visitor {
    fn enter(&mut self, _node: NodeRef<'_>, _parent: Option<NodeRef<'_>>, _relation: &'static str) {}

    fn exit(&mut self, _node: NodeRef<'_>, _parent: Option<NodeRef<'_>>, _relation: &'static str) {}
}

/// Walk `node` and everything below it.
pub fn walk<'a, V: Visitor + ?Sized>(
    node: NodeRef<'a>,
    parent: Option<NodeRef<'a>>,
    relation: &'static str,
    visitor: &mut V,
) {
    visitor.enter(node, parent, relation);
    for (child_relation, child) in node.children() {
        walk(child, Some(node), child_relation, visitor);
    }
    visitor.exit(node, parent, relation);
}

impl CompilationUnit {
    /// Walk the whole file, starting with relation "Root".
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        walk(NodeRef::Unit(self), None, "Root", visitor);
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::Unit(n) => n.id(),
            NodeRef::Function(n) => n.id,
            NodeRef::Signature(n) => n.id,
            NodeRef::Class(n) => n.id,
            NodeRef::Block(n) => n.id,
            NodeRef::Attribute(n) => n.id,
            NodeRef::Property(n) => n.id,
            NodeRef::Event(n) => n.id,
            NodeRef::Enumeration(n) => n.id,
            NodeRef::Stmt(n) => n.id,
            NodeRef::Action(n) => n.id,
            NodeRef::Case(n) => n.id,
            NodeRef::Expr(n) => n.id,
            NodeRef::Row(n) => n.id,
            NodeRef::Name(n) => n.id,
        }
    }

    pub fn loc(&self) -> &'a Location {
        match *self {
            NodeRef::Unit(n) => n.loc(),
            NodeRef::Function(n) => &n.loc,
            NodeRef::Signature(n) => &n.loc,
            NodeRef::Class(n) => &n.loc,
            NodeRef::Block(n) => &n.loc,
            NodeRef::Attribute(n) => &n.loc,
            NodeRef::Property(n) => &n.loc,
            NodeRef::Event(n) => &n.loc,
            NodeRef::Enumeration(n) => &n.loc,
            NodeRef::Stmt(n) => &n.loc,
            NodeRef::Action(n) => &n.loc,
            NodeRef::Case(n) => &n.loc,
            NodeRef::Expr(n) => &n.loc,
            NodeRef::Row(n) => &n.loc,
            NodeRef::Name(n) => &n.loc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeRef::Unit(n) => n.kind_name(),
            NodeRef::Function(_) => "Function",
            NodeRef::Signature(_) => "Signature",
            NodeRef::Class(_) => "Classdef",
            NodeRef::Block(n) => match n.kind {
                crate::decl::BlockKind::Properties => "Properties",
                crate::decl::BlockKind::Methods => "Methods",
                crate::decl::BlockKind::Events => "Events",
                crate::decl::BlockKind::Enumeration => "Enumerations",
                crate::decl::BlockKind::Arguments => "Arguments",
            },
            NodeRef::Attribute(_) => "Attribute",
            NodeRef::Property(_) => "Property",
            NodeRef::Event(_) => "Event",
            NodeRef::Enumeration(_) => "EnumerationItem",
            NodeRef::Stmt(n) => n.kind.kind_name(),
            NodeRef::Action(n) if n.guard.is_none() => "Else",
            NodeRef::Action(_) => "Action",
            NodeRef::Case(n) if n.value.is_none() => "Otherwise",
            NodeRef::Case(_) => "Case",
            NodeRef::Expr(n) => n.kind.kind_name(),
            NodeRef::Row(_) => "Row",
            NodeRef::Name(n) => n.kind.kind_name(),
        }
    }

    /// Short payload shown next to the kind, if the node has one.
    pub fn detail(&self) -> Option<String> {
        match *self {
            NodeRef::Function(f) => f.signature.name.dotted(),
            NodeRef::Signature(s) => s.name.dotted(),
            NodeRef::Class(c) => c.name.dotted(),
            NodeRef::Attribute(a) if a.negated => Some(format!("~{}", a.name)),
            NodeRef::Attribute(a) => Some(a.name.clone()),
            NodeRef::Property(p) => p.name.dotted(),
            NodeRef::Event(e) => e.name.dotted(),
            NodeRef::Enumeration(e) => e.name.dotted(),
            NodeRef::Stmt(s) => match &s.kind {
                StmtKind::Import { chain } => Some(chain.join(".")),
                StmtKind::Shell(text) => Some(text.clone()),
                _ => None,
            },
            NodeRef::Expr(e) => match &e.kind {
                ExprKind::Name(kind) => name_detail(kind),
                ExprKind::Number(text) => Some(text.clone()),
                ExprKind::CharArray(text) => Some(enquote(text, '\'')),
                ExprKind::String(text) => Some(enquote(text, '"')),
                ExprKind::Unary { op, .. } => Some(op.symbol().to_string()),
                ExprKind::Binary { op, .. } => Some(op.symbol().to_string()),
                _ => None,
            },
            NodeRef::Name(n) => name_detail(&n.kind),
            _ => None,
        }
    }

    /// Kind and detail, e.g. `Binary +` or `Identifier x`.
    pub fn label(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{} {}", self.kind_name(), detail),
            None => self.kind_name().to_string(),
        }
    }

    /// Children in traversal order, each with its relation label.
    pub fn children(&self) -> Vec<(&'static str, NodeRef<'a>)> {
        let mut out = Children::default();
        match *self {
            NodeRef::Unit(unit) => match unit {
                CompilationUnit::Script(s) => {
                    out.stmts("Statement", &s.body);
                    out.functions("Function", &s.functions);
                }
                CompilationUnit::Function(f) => out.functions("Function", &f.functions),
                CompilationUnit::Class(c) => {
                    out.push("Class", NodeRef::Class(&c.class));
                    out.functions("Function", &c.functions);
                }
            },
            NodeRef::Function(f) => {
                out.push("Signature", NodeRef::Signature(&f.signature));
                for block in &f.validation {
                    out.push("Validation", NodeRef::Block(block));
                }
                out.stmts("Body", &f.body);
                out.functions("Nested", &f.nested);
            }
            NodeRef::Signature(s) => {
                out.names("Output", &s.outputs);
                out.push("Name", NodeRef::Name(&s.name));
                out.names("Input", &s.inputs);
            }
            NodeRef::Class(c) => {
                out.push("Name", NodeRef::Name(&c.name));
                out.attributes(&c.attributes);
                out.names("Superclass", &c.superclasses);
                for block in &c.blocks {
                    out.push("Block", NodeRef::Block(block));
                }
            }
            NodeRef::Block(b) => {
                out.attributes(&b.attributes);
                for item in b.items() {
                    match item {
                        BlockItem::Property(p) => out.push("Property", NodeRef::Property(p)),
                        BlockItem::Method(m) => out.push("Method", NodeRef::Function(m)),
                        BlockItem::Signature(s) => out.push("Declaration", NodeRef::Signature(s)),
                        BlockItem::Event(e) => out.push("Event", NodeRef::Event(e)),
                        BlockItem::Enumeration(e) => out.push("Item", NodeRef::Enumeration(e)),
                    }
                }
            }
            NodeRef::Attribute(a) => out.opt_expr("Value", a.value.as_ref()),
            NodeRef::Property(p) => {
                out.push("Name", NodeRef::Name(&p.name));
                out.exprs("Dimension", &p.dimensions);
                if let Some(class_name) = &p.class_name {
                    out.push("Class", NodeRef::Name(class_name));
                }
                out.exprs("Validator", &p.validators);
                out.opt_expr("Default", p.default.as_ref());
            }
            NodeRef::Event(e) => out.push("Name", NodeRef::Name(&e.name)),
            NodeRef::Enumeration(e) => {
                out.push("Name", NodeRef::Name(&e.name));
                out.exprs("Argument", &e.args);
            }
            NodeRef::Stmt(s) => stmt_children(&s.kind, &mut out),
            NodeRef::Action(a) => {
                out.opt_expr("Guard", a.guard.as_ref());
                out.stmts("Body", &a.body);
            }
            NodeRef::Case(c) => {
                out.opt_expr("Value", c.value.as_ref());
                out.stmts("Body", &c.body);
            }
            NodeRef::Expr(e) => expr_children(&e.kind, &mut out),
            NodeRef::Row(r) => out.exprs("Element", &r.items),
            NodeRef::Name(n) => name_children(&n.kind, &mut out),
        }
        out.0
    }
}

fn name_detail(kind: &NameKind) -> Option<String> {
    match kind {
        NameKind::Identifier(name) => Some(name.clone()),
        NameKind::Selection { field, .. } => Some(format!(".{field}")),
        _ => None,
    }
}

#[derive(Default)]
struct Children<'a>(Vec<(&'static str, NodeRef<'a>)>);

impl<'a> Children<'a> {
    fn push(&mut self, relation: &'static str, node: NodeRef<'a>) {
        self.0.push((relation, node));
    }

    fn stmts(&mut self, relation: &'static str, stmts: &'a [Stmt]) {
        self.0.extend(stmts.iter().map(|s| (relation, NodeRef::Stmt(s))));
    }

    fn exprs(&mut self, relation: &'static str, exprs: &'a [Expr]) {
        self.0.extend(exprs.iter().map(|e| (relation, NodeRef::Expr(e))));
    }

    fn opt_expr(&mut self, relation: &'static str, expr: Option<&'a Expr>) {
        if let Some(expr) = expr {
            self.push(relation, NodeRef::Expr(expr));
        }
    }

    fn names(&mut self, relation: &'static str, names: &'a [Name]) {
        self.0.extend(names.iter().map(|n| (relation, NodeRef::Name(n))));
    }

    fn functions(&mut self, relation: &'static str, functions: &'a [FunctionDef]) {
        self.0
            .extend(functions.iter().map(|f| (relation, NodeRef::Function(f))));
    }

    fn attributes(&mut self, attributes: &'a [Attribute]) {
        self.0
            .extend(attributes.iter().map(|a| ("Attribute", NodeRef::Attribute(a))));
    }
}

fn stmt_children<'a>(kind: &'a StmtKind, out: &mut Children<'a>) {
    match kind {
        StmtKind::Assign { lhs, rhs } => {
            out.push("LHS", NodeRef::Name(lhs));
            out.push("RHS", NodeRef::Expr(rhs));
        }
        StmtKind::MultiAssign { lhs, rhs } => {
            out.names("LHS", lhs);
            out.push("RHS", NodeRef::Expr(rhs));
        }
        StmtKind::If { actions } => {
            out.0
                .extend(actions.iter().map(|a| ("Action", NodeRef::Action(a))));
        }
        StmtKind::Switch { subject, cases } => {
            out.push("Subject", NodeRef::Expr(subject));
            out.0.extend(cases.iter().map(|c| ("Case", NodeRef::Case(c))));
        }
        StmtKind::For { var, range, body } => {
            out.push("Variable", NodeRef::Name(var));
            out.push("Range", NodeRef::Expr(range));
            out.stmts("Body", body);
        }
        StmtKind::ParFor {
            var,
            range,
            workers,
            body,
        } => {
            out.push("Variable", NodeRef::Name(var));
            out.push("Range", NodeRef::Expr(range));
            out.opt_expr("Workers", workers.as_ref());
            out.stmts("Body", body);
        }
        StmtKind::While { guard, body } => {
            out.push("Guard", NodeRef::Expr(guard));
            out.stmts("Body", body);
        }
        StmtKind::Try {
            body,
            catch_var,
            handler,
        } => {
            out.stmts("Body", body);
            if let Some(var) = catch_var {
                out.push("Identifier", NodeRef::Name(var));
            }
            if let Some(handler) = handler {
                out.stmts("Handler", handler);
            }
        }
        StmtKind::Spmd { options, body } => {
            out.exprs("Option", options);
            out.stmts("Body", body);
        }
        StmtKind::Global { names } | StmtKind::Persistent { names } => {
            out.names("Name", names);
        }
        StmtKind::Expr(expr) => out.push("Expression", NodeRef::Expr(expr)),
        StmtKind::Import { .. }
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Return
        | StmtKind::Shell(_) => {}
    }
}

fn expr_children<'a>(kind: &'a ExprKind, out: &mut Children<'a>) {
    match kind {
        ExprKind::Name(name) => name_children(name, out),
        ExprKind::Unary { operand, .. } => out.push("Operand", NodeRef::Expr(operand)),
        ExprKind::Binary { lhs, rhs, .. } => {
            out.push("LHS", NodeRef::Expr(lhs));
            out.push("RHS", NodeRef::Expr(rhs));
        }
        ExprKind::Range {
            start,
            stride,
            stop,
        } => {
            out.push("Start", NodeRef::Expr(start));
            out.opt_expr("Stride", stride.as_deref());
            out.push("Stop", NodeRef::Expr(stop));
        }
        ExprKind::Matrix(rows) | ExprKind::Cell(rows) => {
            out.0.extend(rows.iter().map(|r| ("Row", NodeRef::Row(r))));
        }
        ExprKind::Lambda { params, body } => {
            out.names("Parameter", params);
            out.push("Body", NodeRef::Expr(body));
        }
        ExprKind::FunctionHandle(name) => out.push("Function", NodeRef::Name(name)),
        ExprKind::Metaclass(name) => out.push("Class", NodeRef::Name(name)),
        ExprKind::Number(_)
        | ExprKind::CharArray(_)
        | ExprKind::String(_)
        | ExprKind::Reshape
        | ExprKind::End => {}
    }
}

fn name_children<'a>(kind: &'a NameKind, out: &mut Children<'a>) {
    match kind {
        NameKind::Identifier(_) => {}
        NameKind::Reference { prefix, args } | NameKind::CellReference { prefix, args } => {
            out.push("Prefix", NodeRef::Name(prefix));
            out.exprs("Argument", args);
        }
        NameKind::Selection { prefix, .. } => out.push("Prefix", NodeRef::Name(prefix)),
        NameKind::DynamicSelection { prefix, field } => {
            out.push("Prefix", NodeRef::Name(prefix));
            out.push("Field", NodeRef::Expr(field));
        }
        NameKind::SuperclassReference { prefix, reference } => {
            out.push("Method", NodeRef::Name(prefix));
            out.push("Superclass", NodeRef::Name(reference));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ScriptFile;
    use crate::expr::BinaryOp;

    fn loc() -> Location {
        Location::file("v.m")
    }

    fn ident(id: u32, text: &str) -> Name {
        Name {
            id: NodeId(id),
            loc: loc(),
            kind: NameKind::Identifier(text.to_string()),
        }
    }

    fn number(id: u32, text: &str) -> Expr {
        Expr {
            id: NodeId(id),
            loc: loc(),
            kind: ExprKind::Number(text.to_string()),
        }
    }

    /// `x = 1 + 2`
    fn sample() -> CompilationUnit {
        let rhs = Expr {
            id: NodeId(3),
            loc: loc(),
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(number(4, "1")),
                rhs: Box::new(number(5, "2")),
            },
        };
        CompilationUnit::Script(ScriptFile {
            id: NodeId(0),
            loc: loc(),
            body: vec![Stmt {
                id: NodeId(1),
                loc: loc(),
                kind: StmtKind::Assign {
                    lhs: ident(2, "x"),
                    rhs,
                },
            }],
            functions: vec![],
        })
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Visitor for Recorder {
        fn enter(&mut self, node: NodeRef<'_>, parent: Option<NodeRef<'_>>, relation: &'static str) {
            let parent = parent.map_or("-".to_string(), |p| p.id().0.to_string());
            self.events
                .push(format!("enter {} {} {}", node.label(), relation, parent));
        }

        fn exit(&mut self, node: NodeRef<'_>, _parent: Option<NodeRef<'_>>, _relation: &'static str) {
            self.events.push(format!("exit {}", node.id().0));
        }
    }

    #[test]
    fn walk_is_pre_order_with_relations() {
        let mut rec = Recorder::default();
        sample().visit(&mut rec);
        assert_eq!(
            rec.events,
            vec![
                "enter ScriptFile Root -",
                "enter Assignment Statement 0",
                "enter Identifier x LHS 1",
                "exit 2",
                "enter Binary + RHS 1",
                "enter Number 1 LHS 3",
                "exit 4",
                "enter Number 2 RHS 3",
                "exit 5",
                "exit 3",
                "exit 1",
                "exit 0",
            ]
        );
    }

    #[test]
    fn labels_quote_literals() {
        let expr = Expr {
            id: NodeId(0),
            loc: loc(),
            kind: ExprKind::CharArray("it's".to_string()),
        };
        assert_eq!(NodeRef::Expr(&expr).label(), "CharArray 'it''s'");
    }
}
