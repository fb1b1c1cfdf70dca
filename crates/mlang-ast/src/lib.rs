// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Syntax tree types for the MATLAB-family front end.
//!
//! This crate defines the pieces shared between the lexer, the parser and
//! the downstream consumers (style checkers, metric collectors): source
//! locations, tokens, AST nodes and the visitor traversal.

pub mod location;
pub mod token;
pub mod expr;
pub mod stmt;
pub mod decl;
pub mod visit;
pub mod render;

pub use location::{Columns, LineMap, Location, Position, Span};
pub use visit::{NodeRef, Visitor};

/// Unique identifier for AST nodes within one parse.
///
/// Used for graph rendering and debugging; carries no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// Hands out node ids for a single parse, in allocation order.
///
/// Each parser owns its own allocator, so files parsed concurrently never
/// share a counter.
#[derive(Debug, Default)]
pub struct NodeIds {
    next: u32,
}

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// A broken structural precondition on the tree.
///
/// Always a defect in whoever built the tree, never a property of the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvariantViolation {
    pub message: String,
}

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_monotonic() {
        let mut ids = NodeIds::new();
        let a = ids.fresh();
        let b = ids.fresh();
        assert!(a < b);
        assert_eq!(ids.allocated(), 2);
    }
}
