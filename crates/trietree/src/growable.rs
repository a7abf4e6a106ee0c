// Growable trie: arena of nodes, children kept in per-node binary search trees.

use crate::automaton::Automaton;

/// Index of a node in a [`GrowableTrie`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node; always present.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One character position along some inserted key.
///
/// `child` points at the root of this node's sibling tree; `low`/`high` link
/// siblings ordered by `label`. All three are owning links within the arena.
/// `failure` is a plain reference to another node of the same trie.
#[derive(Debug, Clone)]
pub struct TrieNode {
    label: char,
    child: Option<NodeId>,
    low: Option<NodeId>,
    high: Option<NodeId>,
    edge_id: usize,
    depth: usize,
    failure: Option<NodeId>,
}

impl TrieNode {
    fn new(label: char) -> Self {
        Self {
            label,
            child: None,
            low: None,
            high: None,
            edge_id: 0,
            depth: 0,
            failure: None,
        }
    }

    /// The character consumed by the edge leading here. `'\0'` for the root.
    #[inline]
    pub fn label(&self) -> char {
        self.label
    }

    /// Id of the key ending here, or 0.
    #[inline]
    pub fn edge_id(&self) -> usize {
        self.edge_id
    }

    /// Length in characters of the key ending here.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn failure(&self) -> Option<NodeId> {
        self.failure
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.child.is_some()
    }

    #[inline]
    pub(crate) fn set_failure(&mut self, target: Option<NodeId>) {
        self.failure = target;
    }
}

/// Insert-only trie used while collecting keys.
///
/// Call [`build_failure_links`](Self::build_failure_links) after the last
/// insertion; until then [`is_finalized`](Automaton::is_finalized) is false and
/// scans only see keys reachable without failure transitions.
#[derive(Debug, Clone)]
pub struct GrowableTrie {
    pub(crate) nodes: Vec<TrieNode>,
    last_edge_id: usize,
    pub(crate) finalized: bool,
}

impl Default for GrowableTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowableTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new('\0')],
            last_edge_id: 0,
            finalized: true,
        }
    }

    /// Insert `key` and return its edge id.
    ///
    /// Ids start at 1 and follow first-insertion order. Re-inserting a key
    /// returns the id it already has and refreshes its recorded depth.
    pub fn insert(&mut self, key: &str) -> usize {
        let mut node = NodeId::ROOT;
        let mut depth = 0;
        for label in key.chars() {
            node = self.dig(node, label);
            depth += 1;
        }
        let last_edge_id = &mut self.last_edge_id;
        let n = &mut self.nodes[node.0];
        if n.edge_id == 0 {
            *last_edge_id += 1;
            n.edge_id = *last_edge_id;
        }
        n.depth = depth;
        n.edge_id
    }

    /// Child of `parent` labelled `label`, created if missing.
    fn dig(&mut self, parent: NodeId, label: char) -> NodeId {
        let Some(mut current) = self.nodes[parent.0].child else {
            let id = self.alloc(label);
            self.nodes[parent.0].child = Some(id);
            return id;
        };
        loop {
            let node = &self.nodes[current.0];
            if label == node.label {
                return current;
            }
            let next = if label < node.label { node.low } else { node.high };
            match next {
                Some(next) => current = next,
                None => {
                    let id = self.alloc(label);
                    let node = &mut self.nodes[current.0];
                    if label < node.label {
                        node.low = Some(id);
                    } else {
                        node.high = Some(id);
                    }
                    return id;
                }
            }
        }
    }

    fn alloc(&mut self, label: char) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TrieNode::new(label));
        self.finalized = false;
        id
    }

    /// Exact lookup of `key`; no failure transitions are followed.
    pub fn get(&self, key: &str) -> Option<&TrieNode> {
        self.lookup(key).map(|id| &self.nodes[id.0])
    }

    /// Access a node by id.
    ///
    /// # Panics
    /// If `id` does not belong to this trie.
    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no key other than possibly the empty key was inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Number of edge ids allocated so far (the largest id).
    pub fn edge_count(&self) -> usize {
        self.last_edge_id
    }

    /// Children of `parent` in ascending label order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            trie: self,
            stack: Vec::new(),
            cursor: self.nodes[parent.0].child,
        }
    }

    pub fn count_children(&self, parent: NodeId) -> usize {
        self.children(parent).count()
    }

    /// Number of nodes in the subtree rooted at `node`, `node` included.
    pub fn count_descendants(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            count += 1;
            pending.extend(self.children(id));
        }
        count
    }
}

/// In-order walk of a sibling tree.
pub struct Children<'a> {
    trie: &'a GrowableTrie,
    stack: Vec<NodeId>,
    cursor: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.cursor {
            self.stack.push(id);
            self.cursor = self.trie.nodes[id.0].low;
        }
        let id = self.stack.pop()?;
        self.cursor = self.trie.nodes[id.0].high;
        Some(id)
    }
}

impl Automaton for GrowableTrie {
    type Node = NodeId;

    #[inline]
    fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn child(&self, node: NodeId, label: char) -> Option<NodeId> {
        let mut current = self.nodes[node.0].child;
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            if label == n.label {
                return Some(id);
            }
            current = if label < n.label { n.low } else { n.high };
        }
        None
    }

    #[inline]
    fn failure(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].failure
    }

    #[inline]
    fn edge_id(&self, node: NodeId) -> usize {
        self.nodes[node.0].edge_id
    }

    #[inline]
    fn depth(&self, node: NodeId) -> usize {
        self.nodes[node.0].depth
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }
}
