//! Axis expansion: from one node to its ordered candidate set.
//!
//! Pure function of `(node, axis)`; never mutates or caches tree state.
//! At the root, `parent` and the ancestor axes yield an empty set rather
//! than an error.

use crate::node::SyntaxNode;
use crate::path::ast::Axis;

/// Expands `node` along `axis` into an ordered candidate sequence.
///
/// Ordering per axis: children and descendants in document (pre-order)
/// order, ancestors nearest-first, siblings in document order. The driver
/// re-sorts merged candidate sets by node id, so per-axis order only needs
/// to be deterministic.
pub fn expand<N: SyntaxNode>(node: &N, axis: Axis) -> Vec<N> {
    match axis {
        Axis::Child => node.children(),
        Axis::Descendant => {
            let mut out = Vec::new();
            for child in node.children() {
                collect_preorder(&child, &mut out);
            }
            out
        }
        Axis::DescendantOrSelf => {
            let mut out = Vec::new();
            collect_preorder(node, &mut out);
            out
        }
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node.clone()];
            out.extend(ancestors(node));
            out
        }
        Axis::FollowingSibling => siblings(node, SiblingSide::Following),
        Axis::PrecedingSibling => siblings(node, SiblingSide::Preceding),
        Axis::SelfAxis => vec![node.clone()],
    }
}

fn collect_preorder<N: SyntaxNode>(node: &N, out: &mut Vec<N>) {
    out.push(node.clone());
    for child in node.children() {
        collect_preorder(&child, out);
    }
}

fn ancestors<N: SyntaxNode>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = node.parent();
    while let Some(ancestor) = current {
        current = ancestor.parent();
        out.push(ancestor);
    }
    out
}

enum SiblingSide {
    Following,
    Preceding,
}

fn siblings<N: SyntaxNode>(node: &N, side: SiblingSide) -> Vec<N> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    let children = parent.children();
    let Some(position) = children.iter().position(|c| c.id() == node.id()) else {
        return Vec::new();
    };
    match side {
        SiblingSide::Following => children[position + 1..].to_vec(),
        SiblingSide::Preceding => children[..position].to_vec(),
    }
}
