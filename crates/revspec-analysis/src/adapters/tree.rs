//! Owned, immutable syntax tree shared by every adapter.
//!
//! Tree-sitter trees are copied into this arena so that SQL, Prisma, and the
//! tree-sitter grammars expose the same `find_all` / `text_of` surface and so
//! that trees can be moved across worker threads.

use smallvec::SmallVec;

use crate::language::SourceLanguage;

/// Index of a node inside its `SyntaxTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    start_byte: usize,
    end_byte: usize,
    start_row: u32,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

/// A parsed source unit.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    language: SourceLanguage,
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The root node. Every builder opens the root first, so index 0 always exists.
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        ((id.0 as usize) < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// All descendants of `node` (inclusive) with the given kind, pre-order.
    pub fn find_all<'t>(&'t self, node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
        node.find_all(kind)
    }

    /// Exact source text covered by `node`.
    pub fn text_of<'t>(&'t self, node: Node<'t>) -> &'t str {
        node.text()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }
}

/// A borrowed handle to one node of a `SyntaxTree`.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.tree.data(self.id).kind
    }

    /// Field name this node occupies in its parent, if any.
    pub fn field_name(&self) -> Option<&'static str> {
        self.tree.data(self.id).field
    }

    pub fn is_named(&self) -> bool {
        self.tree.data(self.id).named
    }

    pub fn start_byte(&self) -> usize {
        self.tree.data(self.id).start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.tree.data(self.id).end_byte
    }

    /// 1-based line of the node's first byte.
    pub fn line(&self) -> u32 {
        self.tree.data(self.id).start_row + 1
    }

    pub fn text(&self) -> &'t str {
        let data = self.tree.data(self.id);
        self.tree
            .source
            .get(data.start_byte..data.end_byte)
            .unwrap_or("")
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).parent.map(|id| Node {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn child_by_field(&self, field: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.field_name() == Some(field))
    }

    pub fn children_by_field(&self, field: &str) -> Vec<Node<'t>> {
        self.children()
            .filter(|c| c.field_name() == Some(field))
            .collect()
    }

    pub fn child_of_kind(&self, kind: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    pub fn children_of_kind(&self, kind: &str) -> Vec<Node<'t>> {
        self.children().filter(|c| c.kind() == kind).collect()
    }

    /// Pre-order walk over this node and every descendant.
    pub fn descendants(&self) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            out.push(Node {
                tree: self.tree,
                id,
            });
            // Reverse so the leftmost child is visited first.
            stack.extend(self.tree.data(id).children.iter().rev().copied());
        }
        out
    }

    /// Every node of `kind` in this subtree (inclusive), depth-first pre-order.
    pub fn find_all(&self, kind: &str) -> Vec<Node<'t>> {
        self.descendants()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    pub fn find_first(&self, kind: &str) -> Option<Node<'t>> {
        self.descendants().into_iter().find(|n| n.kind() == kind)
    }

    /// Nearest ancestor of the given kind.
    pub fn ancestor_of_kind(&self, kind: &str) -> Option<Node<'t>> {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.kind() == kind {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.kind(),
            self.start_byte(),
            self.end_byte()
        )
    }
}

/// Incremental builder used by every adapter.
///
/// Nodes are opened and closed in document order; `finish` closes anything
/// still open at the end of the source.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    /// Start a tree whose root has the given kind.
    pub fn new(root_kind: &'static str) -> Self {
        let mut builder = Self {
            nodes: Vec::new(),
            stack: Vec::new(),
        };
        builder.open(root_kind, None, true, 0, 0);
        builder
    }

    pub fn open(
        &mut self,
        kind: &'static str,
        field: Option<&'static str>,
        named: bool,
        start_byte: usize,
        start_row: u32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            field,
            named,
            start_byte,
            end_byte: start_byte,
            start_row,
            parent,
            children: SmallVec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(id);
        }
        self.stack.push(id);
        id
    }

    /// Close the innermost open node at `end_byte`.
    pub fn close(&mut self, end_byte: usize) {
        if self.stack.len() <= 1 {
            // The root stays open until `finish`.
            return;
        }
        if let Some(id) = self.stack.pop() {
            self.nodes[id.0 as usize].end_byte = end_byte;
        }
    }

    /// Add a childless node.
    pub fn leaf(
        &mut self,
        kind: &'static str,
        field: Option<&'static str>,
        start_byte: usize,
        end_byte: usize,
        start_row: u32,
    ) -> NodeId {
        let id = self.open(kind, field, true, start_byte, start_row);
        self.close(end_byte);
        id
    }

    /// Number of currently open nodes, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn finish(mut self, language: SourceLanguage, source: String) -> SyntaxTree {
        let end = source.len();
        while self.stack.len() > 1 {
            self.close(end);
        }
        if let Some(root) = self.nodes.first_mut() {
            root.end_byte = end;
        }
        SyntaxTree {
            language,
            source,
            nodes: self.nodes,
        }
    }
}
