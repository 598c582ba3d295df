//! Arena-backed reference implementation of the tree-provider contract.
//!
//! [`SyntaxTree`] owns all node data in a flat `Vec`; [`NodeRef`] handles
//! are `(tree, index)` pairs and therefore `Copy`. Nodes are appended in
//! pre-order, which makes the arena index double as the document-order key
//! required by [`NodeId`]. [`TreeBuilder`] constructs trees imperatively
//! and is the workhorse of the test suites; [`crate::source`] uses it to
//! adapt tree-sitter parses.

use crate::node::{AttrValue, NodeId, Span, SyntaxNode};
use std::collections::HashMap;

/// Owned node record inside the arena.
#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    name: Option<String>,
    text: String,
    span: Span,
    parent: Option<usize>,
    children: Vec<usize>,
    attrs: HashMap<String, AttrValue>,
}

/// An owned syntax tree. Index 0 is always the root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Root handle of this tree.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            index: 0,
        }
    }

    /// Handle for an arbitrary node id, if it exists in this tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let index = id.0 as usize;
        (index < self.nodes.len()).then_some(NodeRef { tree: self, index })
    }

    /// Total node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Innermost node whose span covers the given byte offset.
    ///
    /// Descends from the root, preferring the deepest covering child; the
    /// root is returned when no child covers the offset.
    pub fn node_at_offset(&self, offset: usize) -> NodeRef<'_> {
        let mut current = 0usize;
        'descend: loop {
            for &child in &self.nodes[current].children {
                if self.nodes[child].span.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return NodeRef {
                tree: self,
                index: current,
            };
        }
    }
}

/// A cheap, copyable handle to one node of a [`SyntaxTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    index: usize,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for NodeRef<'_> {}

impl<'t> SyntaxNode for NodeRef<'t> {
    fn kind(&self) -> &str {
        &self.tree.nodes[self.index].kind
    }

    fn name(&self) -> Option<&str> {
        self.tree.nodes[self.index].name.as_deref()
    }

    fn text(&self) -> &str {
        &self.tree.nodes[self.index].text
    }

    fn span(&self) -> Span {
        self.tree.nodes[self.index].span
    }

    fn parent(&self) -> Option<Self> {
        self.tree.nodes[self.index].parent.map(|index| NodeRef {
            tree: self.tree,
            index,
        })
    }

    fn children(&self) -> Vec<Self> {
        self.tree.nodes[self.index]
            .children
            .iter()
            .map(|&index| NodeRef {
                tree: self.tree,
                index,
            })
            .collect()
    }

    fn attr(&self, key: &str) -> Option<AttrValue> {
        self.tree.nodes[self.index].attrs.get(key).cloned()
    }

    fn id(&self) -> NodeId {
        NodeId(self.index as u64)
    }
}

/// Imperative builder for [`SyntaxTree`].
///
/// `open` pushes a node and descends into it, `close` returns to its
/// parent. Because nodes are appended on `open`, arena order is pre-order.
///
/// ```
/// use astpath::tree::TreeBuilder;
///
/// let mut b = TreeBuilder::new("source-file");
/// b.open("class").name("Widget");
/// b.leaf("method").name("draw");
/// b.close();
/// let tree = b.build();
/// ```
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<usize>,
    /// Most recently appended node; `name`/`text`/`span`/`attr` target it.
    last: usize,
}

impl TreeBuilder {
    /// Starts a tree with the given root kind.
    pub fn new(root_kind: &str) -> Self {
        let root = NodeData {
            kind: root_kind.to_string(),
            name: None,
            text: String::new(),
            span: Span::new(0, 0),
            parent: None,
            children: Vec::new(),
            attrs: HashMap::new(),
        };
        Self {
            nodes: vec![root],
            stack: vec![0],
            last: 0,
        }
    }

    fn append(&mut self, kind: &str) -> usize {
        let parent = *self.stack.last().unwrap();
        let index = self.nodes.len();
        self.nodes.push(NodeData {
            kind: kind.to_string(),
            name: None,
            text: String::new(),
            // Synthetic spans keep positional helpers usable on hand-built
            // trees; providers overwrite them with real byte ranges.
            span: Span::new(index, index + 1),
            parent: Some(parent),
            children: Vec::new(),
            attrs: HashMap::new(),
        });
        self.nodes[parent].children.push(index);
        self.last = index;
        index
    }

    /// Appends a child of the given kind under the current scope and
    /// descends into it.
    pub fn open(&mut self, kind: &str) -> &mut Self {
        let index = self.append(kind);
        self.stack.push(index);
        self
    }

    /// Appends a childless node without descending.
    pub fn leaf(&mut self, kind: &str) -> &mut Self {
        self.append(kind);
        self
    }

    /// Closes the most recently opened scope. Closing past the root is a
    /// builder bug and panics.
    pub fn close(&mut self) -> &mut Self {
        assert!(self.stack.len() > 1, "close() without matching open()");
        self.stack.pop();
        self
    }

    /// Sets the declared name of the last appended node.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.nodes[self.last].name = Some(name.to_string());
        self
    }

    /// Sets the raw text of the last appended node.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.nodes[self.last].text = text.to_string();
        self
    }

    /// Sets the byte span of the last appended node.
    pub fn span(&mut self, start: usize, end: usize) -> &mut Self {
        self.nodes[self.last].span = Span::new(start, end);
        self
    }

    /// Sets an attribute on the last appended node.
    pub fn attr(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.nodes[self.last]
            .attrs
            .insert(key.to_string(), value.into());
        self
    }

    /// Shorthand for a boolean attribute set to `true`.
    pub fn flag(&mut self, key: &str) -> &mut Self {
        self.attr(key, true)
    }

    /// Finishes the tree. Any still-open nodes are closed implicitly.
    pub fn build(mut self) -> SyntaxTree {
        self.stack.clear();
        SyntaxTree { nodes: self.nodes }
    }
}
