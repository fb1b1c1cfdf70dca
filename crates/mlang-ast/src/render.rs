// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Debug renderings of the tree: indented text and Graphviz.

use std::fmt::Write;

use crate::decl::CompilationUnit;
use crate::visit::{NodeRef, Visitor};

/// Indented listing, one node per line as `Relation: Kind detail`.
#[derive(Debug, Default)]
pub struct TreePrinter {
    out: String,
    depth: usize,
}

impl TreePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Visitor for TreePrinter {
    fn enter(&mut self, node: NodeRef<'_>, _parent: Option<NodeRef<'_>>, relation: &'static str) {
        let _ = writeln!(
            self.out,
            "{:indent$}{}: {}",
            "",
            relation,
            node.label(),
            indent = self.depth * 2
        );
        self.depth += 1;
    }

    fn exit(&mut self, _node: NodeRef<'_>, _parent: Option<NodeRef<'_>>, _relation: &'static str) {
        self.depth -= 1;
    }
}

/// Graphviz `digraph` with one node per AST node, keyed by node id.
#[derive(Debug, Default)]
pub struct DotExporter {
    body: String,
}

impl DotExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        format!("digraph ast {{\n  node [shape=box];\n{}}}\n", self.body)
    }
}

impl Visitor for DotExporter {
    fn enter(&mut self, node: NodeRef<'_>, parent: Option<NodeRef<'_>>, relation: &'static str) {
        let id = node.id().0;
        let _ = writeln!(self.body, "  n{id} [label=\"{}\"];", escape(&node.label()));
        if let Some(parent) = parent {
            let _ = writeln!(
                self.body,
                "  n{} -> n{id} [label=\"{relation}\"];",
                parent.id().0
            );
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a unit with [`TreePrinter`].
pub fn tree(unit: &CompilationUnit) -> String {
    let mut printer = TreePrinter::new();
    unit.visit(&mut printer);
    printer.finish()
}

/// Render a unit with [`DotExporter`].
pub fn dot(unit: &CompilationUnit) -> String {
    let mut exporter = DotExporter::new();
    unit.visit(&mut exporter);
    exporter.finish()
}
