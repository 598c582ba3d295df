//! Tree-provider contract: the minimal node capability the query engine
//! depends on.
//!
//! The engine never owns nodes and never learns which front end produced
//! them. Any parser whose output can answer the questions on [`SyntaxNode`]
//! (kind tag, optional declared name, ordered children, parent link, source
//! span/text, named attributes) can be queried; [`crate::tree::SyntaxTree`]
//! is the built-in arena implementation, and [`crate::source`] adapts
//! tree-sitter parses of Rust source onto it.

use serde::Serialize;
use std::fmt;

/// Stable node identity within one tree.
///
/// Contract: ids are unique per tree and assigned in pre-order (document)
/// position, so sorting a candidate set by id yields document order. Both
/// built-in providers satisfy this by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte range of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether this span covers the given byte offset.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A provider-exposed attribute value.
///
/// Attributes carry the syntactic facts a front end chooses to surface
/// (modifier flags, operator text, visibility). Missing attributes are
/// defined as non-matches during evaluation, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    Num(f64),
}

impl AttrValue {
    /// Presence-style truthiness: `[@async]` is satisfied by `Bool(true)`,
    /// a non-empty string, or a nonzero number.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Str(s) => !s.is_empty(),
            AttrValue::Num(n) => *n != 0.0,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

/// Capability a tree-provider must satisfy for its nodes to be queryable.
///
/// Handles are cheap to clone (the built-in provider hands out
/// `Copy` arena references). Traversal is read-only: nothing in the engine
/// mutates a tree, and no engine state outlives a query call.
pub trait SyntaxNode: Clone {
    /// Kind tag, hyphenated by convention (`method`, `if-statement`).
    fn kind(&self) -> &str;

    /// Declared name, if this node declares one.
    fn name(&self) -> Option<&str>;

    /// Raw source text of the node.
    fn text(&self) -> &str;

    /// Byte span of the node in its source.
    fn span(&self) -> Span;

    /// Parent node; `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// Direct children in document order.
    fn children(&self) -> Vec<Self>;

    /// Named attribute lookup.
    fn attr(&self, key: &str) -> Option<AttrValue>;

    /// Identity for deduplication and document ordering; see [`NodeId`].
    fn id(&self) -> NodeId;

    /// Walks parent links to the root of this node's tree.
    fn root(&self) -> Self {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }
}
