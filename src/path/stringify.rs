//! Canonical path rendering for a matched node.
//!
//! [`to_path_string`] produces a minimal absolute path that re-resolves to
//! exactly the given node when evaluated from its tree root, letting
//! callers re-address a node later without raw line/column coordinates.
//! The rendered path stays stable across edits that do not restructure the
//! node's ancestor chain.

use crate::node::SyntaxNode;

/// Renders `node` as an absolute path expression.
///
/// One step per ancestor level, disambiguated as cheaply as possible: the
/// bare kind when the node is the only sibling of its kind, a name
/// predicate when the declared name is unique among same-kind siblings,
/// and a positional predicate otherwise. The root renders as `/`.
pub fn to_path_string<N: SyntaxNode>(node: &N) -> String {
    let mut chain = vec![node.clone()];
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        chain.push(parent.clone());
        current = parent;
    }
    chain.reverse();

    if chain.len() == 1 {
        return "/".to_string();
    }

    let mut out = String::new();
    for pair in chain.windows(2) {
        let (parent, child) = (&pair[0], &pair[1]);
        out.push('/');
        out.push_str(child.kind());

        let same_kind: Vec<N> = parent
            .children()
            .into_iter()
            .filter(|sibling| sibling.kind() == child.kind())
            .collect();
        if same_kind.len() <= 1 {
            continue;
        }

        if let Some(disambiguator) = name_predicate(child, &same_kind) {
            out.push_str(&disambiguator);
            continue;
        }

        let position = same_kind
            .iter()
            .position(|sibling| sibling.id() == child.id())
            .expect("child is among its parent's children")
            + 1;
        out.push_str(&format!("[{position}]"));
    }
    out
}

/// A `[name]` or `[@name='…']` predicate when the child's name uniquely
/// identifies it among `same_kind` siblings; `None` otherwise.
fn name_predicate<N: SyntaxNode>(child: &N, same_kind: &[N]) -> Option<String> {
    let name = child.name().filter(|n| !n.is_empty())?;
    let unique = same_kind
        .iter()
        .filter(|sibling| sibling.name() == Some(name))
        .count()
        == 1;
    if !unique {
        return None;
    }

    if is_plain_identifier(name) {
        return Some(format!("[{name}]"));
    }
    // Quoted form for names the lexer would not read as one identifier.
    if !name.contains('\'') {
        return Some(format!("[@name='{name}']"));
    }
    if !name.contains('"') {
        return Some(format!("[@name=\"{name}\"]"));
    }
    // Both quote styles present and literals have no escapes; fall back to
    // the positional predicate.
    None
}

/// Whether `name` lexes back as a single `Name` token inside a predicate.
fn is_plain_identifier(name: &str) -> bool {
    if matches!(name, "and" | "or" | "not" | "last" | "contains") {
        return false;
    }
    let bytes = name.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return false;
    }
    for (i, &b) in rest.iter().enumerate() {
        let ok = b.is_ascii_alphanumeric()
            || b == b'_'
            || (b == b'-'
                && rest
                    .get(i + 1)
                    .is_some_and(|&next| next.is_ascii_alphanumeric()));
        if !ok {
            return false;
        }
    }
    true
}
