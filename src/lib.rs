//! astpath: XPath-like structural queries over program syntax trees.
//!
//! An engine for locating tree elements (declarations, statements,
//! expressions) by structural position, declared name, node kind, or
//! exposed attribute, with boolean combinators, positional predicates,
//! and nested sub-path predicates. A matched node can be rendered back
//! into a canonical path string that re-resolves to it later without raw
//! line/column coordinates.
//!
//! # Architecture
//!
//! The engine sees trees only through the [`SyntaxNode`] capability trait
//! (kind tag, optional name, ordered children, parent link, span/text,
//! attribute lookup), so any AST-producing front end can be queried via an
//! adapter. [`tree::SyntaxTree`] is the built-in arena provider and
//! [`source::parse_rust`] adapts tree-sitter parses of Rust source onto
//! it. Parsed expressions are immutable and tree-independent; the bounded
//! [`PathCache`] shares them across calls and threads.
//!
//! # Example
//!
//! ```
//! use astpath::{Evaluator, PathCache, SyntaxNode};
//!
//! let tree = astpath::source::parse_rust(
//!     "pub async fn fetch() {}\nfn helper() {}",
//! ).unwrap();
//!
//! let cache = PathCache::default();
//! let evaluator = Evaluator::new(&cache);
//! let matches = evaluator
//!     .query("//function-item[@async]", &tree.root())
//!     .unwrap();
//!
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].name(), Some("fetch"));
//! ```

pub mod cache;
pub mod node;
pub mod path;
pub mod source;
pub mod tree;

// Re-exports
pub use cache::PathCache;
pub use node::{AttrValue, NodeId, Span, SyntaxNode};
pub use path::{
    parse, to_path_string, Anchor, Axis, EvalError, EvalOptions, Evaluator, LexError, NamePattern,
    NodeTest, ParseError, PathExpression, Predicate, QueryError, Step,
};
pub use source::{parse_rust, SourceError};
pub use tree::{NodeRef, SyntaxTree, TreeBuilder};
