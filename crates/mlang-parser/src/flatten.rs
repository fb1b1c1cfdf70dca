// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Fix-up for files whose functions are not closed by `end`.
//!
//! Without `end`, each `function` keyword starts a sibling rather than a
//! nested function, but the parser can only tell once the whole file is
//! read. It records every function together with the function it was read
//! inside of; this pass either rebuilds that nesting or, when no function
//! was closed by `end`, lays the functions out as siblings.

use mlang_ast::decl::FunctionDef;
use tracing::debug;

#[derive(Debug)]
struct Entry {
    parent: Option<usize>,
    function: Option<FunctionDef>,
}

/// Functions in the order their `function` keywords appear, each linked
/// to the function it was parsed inside of.
#[derive(Debug, Default)]
pub(crate) struct FunctionRun {
    entries: Vec<Entry>,
}

impl FunctionRun {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the slot for a function whose body is about to be read.
    pub(crate) fn open(&mut self, parent: Option<usize>) -> usize {
        self.entries.push(Entry {
            parent,
            function: None,
        });
        self.entries.len() - 1
    }

    pub(crate) fn close(&mut self, index: usize, function: FunctionDef) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.function = Some(function);
        }
    }
}

/// The functions of `run` as the file defines them: siblings in source
/// order when none was closed by `end`, otherwise nested as parsed.
pub(crate) fn resolve_end_optional(run: FunctionRun) -> Vec<FunctionDef> {
    let terminated = run
        .entries
        .iter()
        .filter_map(|e| e.function.as_ref())
        .any(|f| f.terminated);
    if !terminated {
        let flat: Vec<_> = run.entries.into_iter().filter_map(|e| e.function).collect();
        if flat.len() > 1 {
            debug!(count = flat.len(), "end-optional functions flattened");
        }
        return flat;
    }
    nest(run)
}

/// Children always come after their parent, so walking backwards finishes
/// every child before its parent is moved.
fn nest(run: FunctionRun) -> Vec<FunctionDef> {
    let parents: Vec<_> = run.entries.iter().map(|e| e.parent).collect();
    let mut slots: Vec<_> = run.entries.into_iter().map(|e| e.function).collect();
    let mut roots = Vec::new();
    for index in (0..slots.len()).rev() {
        let Some(mut function) = slots[index].take() else {
            continue;
        };
        function.nested.reverse();
        let parent = parents[index]
            .filter(|&p| p < index)
            .and_then(|p| slots[p].as_mut());
        match parent {
            Some(parent) => parent.nested.push(function),
            None => roots.push(function),
        }
    }
    roots.reverse();
    roots
}
