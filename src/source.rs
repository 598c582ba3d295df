//! Rust source provider: adapts tree-sitter parses onto the arena tree.
//!
//! This is one concrete front end for the engine; the query side depends
//! only on [`crate::node::SyntaxNode`]. Kinds are the tree-sitter grammar
//! kinds with underscores hyphenated (`function_item` → `function-item`),
//! declared names come from the grammar's `name` field, and a small set of
//! syntactic facts is exposed as attributes:
//!
//! - `public` / `visibility` from a visibility modifier
//! - `async` / `unsafe` / `const` from function modifiers
//! - `modifiers`, the space-joined modifier list, for `~=` queries
//! - `operator`, `left-text`, `right-text` on binary expressions

use crate::tree::{SyntaxTree, TreeBuilder};
use ast_grep_language::{LanguageExt, SupportLang};
use thiserror::Error;
use tree_sitter::Node as TsNode;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error at byte {byte_start}..{byte_end}")]
    Syntax { byte_start: usize, byte_end: usize },
}

/// Parses Rust source into a queryable [`SyntaxTree`].
///
/// Sources containing ERROR or missing nodes are rejected: a tree with
/// holes would silently skew structural queries.
pub fn parse_rust(source: &str) -> Result<SyntaxTree, SourceError> {
    let mut parser = tree_sitter::Parser::new();
    let language = SupportLang::Rust.get_ts_language();
    parser
        .set_language(&language)
        .map_err(|_| SourceError::LanguageSet)?;
    let tree = parser.parse(source, None).ok_or(SourceError::ParseFailed)?;

    let root = tree.root_node();
    if let Some((byte_start, byte_end)) = first_error_node(root) {
        return Err(SourceError::Syntax {
            byte_start,
            byte_end,
        });
    }

    let mut builder = TreeBuilder::new("source-file");
    builder
        .span(root.start_byte(), root.end_byte())
        .text(source);
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        convert(child, source, &mut builder);
    }
    Ok(builder.build())
}

fn first_error_node(node: TsNode<'_>) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        return Some((node.start_byte(), node.end_byte()));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(range) = first_error_node(child) {
            return Some(range);
        }
    }
    None
}

fn convert(node: TsNode<'_>, source: &str, builder: &mut TreeBuilder) {
    let kind = node.kind().replace('_', "-");
    builder.open(&kind);
    builder
        .span(node.start_byte(), node.end_byte())
        .text(&source[node.byte_range()]);

    if let Some(name) = declared_name(node, source) {
        builder.name(name);
    }
    annotate(node, source, builder);

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        convert(child, source, builder);
    }
    builder.close();
}

/// The declared name of a node, when its grammar rule has one.
///
/// Impl blocks have no `name` field; the implemented type stands in so
/// `//impl-item[Widget]` reads naturally.
fn declared_name<'s>(node: TsNode<'_>, source: &'s str) -> Option<&'s str> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| (node.kind() == "impl_item").then(|| node.child_by_field_name("type")).flatten())?;
    Some(&source[name_node.byte_range()])
}

fn annotate(node: TsNode<'_>, source: &str, builder: &mut TreeBuilder) {
    let mut modifiers: Vec<&str> = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "visibility_modifier" => {
                let text = &source[child.byte_range()];
                builder.flag("public");
                builder.attr("visibility", text);
                modifiers.push(text);
            }
            "function_modifiers" => {
                for token in source[child.byte_range()].split_ascii_whitespace() {
                    match token {
                        "async" | "unsafe" | "const" => {
                            builder.flag(token);
                        }
                        _ => {}
                    }
                    modifiers.push(token);
                }
            }
            _ => {}
        }
    }

    if !modifiers.is_empty() {
        builder.attr("modifiers", modifiers.join(" "));
    }

    if node.kind() == "binary_expression" {
        if let Some(op) = node.child_by_field_name("operator") {
            builder.attr("operator", &source[op.byte_range()]);
        }
        if let Some(left) = node.child_by_field_name("left") {
            builder.attr("left-text", &source[left.byte_range()]);
        }
        if let Some(right) = node.child_by_field_name("right") {
            builder.attr("right-text", &source[right.byte_range()]);
        }
    }
}
