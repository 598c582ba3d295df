//! The path query engine: lexer, parser, axis navigator, predicate
//! evaluator, and path stringifier.
//!
//! A path string like `//method[@async and @public]` is tokenized by
//! [`lexer`], parsed by [`parser`] into an [`ast::PathExpression`], and
//! applied to a tree by [`eval::Evaluator`]; [`stringify::to_path_string`]
//! goes the other way, rendering a canonical path for a matched node.
//!
//! Parsed expressions carry no tree reference and are shareable through
//! [`crate::cache::PathCache`].

pub mod ast;
pub mod axis;
pub mod errors;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod stringify;

pub use ast::{Anchor, Axis, NamePattern, NodeTest, PathExpression, Predicate, Step};
pub use errors::{EvalError, LexError, ParseError, QueryError};
pub use eval::{EvalOptions, Evaluator};
pub use parser::parse;
pub use stringify::to_path_string;
