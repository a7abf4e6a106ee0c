// Frozen automaton: flat node array with sorted child ranges.

use std::collections::VecDeque;
use std::ops::Range;

use tracing::debug;

use crate::automaton::Automaton;
use crate::failure::{self, FailureLinks};
use crate::growable::{GrowableTrie, NodeId};

/// Flattened trie node.
///
/// Children of a node occupy `start..end` in the node array, sorted by label.
/// `start == 0` means no children: index 0 is the root and never a child.
/// `fail == 0` means the failure target is the root (or, for the root itself,
/// that there is none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrozenNode {
    pub label: char,
    pub start: usize,
    pub end: usize,
    pub fail: usize,
    pub edge_id: usize,
}

impl FrozenNode {
    #[inline]
    pub fn children(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.start != 0
    }
}

/// Immutable, array-indexed copy of a trie and its failure links.
///
/// Safe to share between threads and scan concurrently. Serialized with
/// [`write`](Self::write) and restored with [`read`](Self::read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenAutomaton {
    pub(crate) nodes: Vec<FrozenNode>,
    /// Depth of each key, indexed by `edge_id - 1`.
    pub(crate) depths: Vec<usize>,
}

impl FrozenAutomaton {
    /// Flatten `trie` and recompute failure links over array indices.
    ///
    /// Nodes are laid out breadth-first, so every sibling group is one
    /// contiguous label-sorted range. The growable trie's own failure links
    /// are not read; it may be dropped afterwards.
    pub fn freeze(trie: &GrowableTrie) -> Self {
        let mut nodes = vec![FrozenNode::default(); trie.len()];
        let mut depths = vec![0; trie.edge_count()];

        let mut queue = VecDeque::from([(NodeId::ROOT, 0usize)]);
        let mut next_free = 1;
        while let Some((id, index)) = queue.pop_front() {
            let node = trie.node(id);
            let start = next_free;
            for child in trie.children(id) {
                queue.push_back((child, next_free));
                next_free += 1;
            }
            let (start, end) = if next_free > start {
                (start, next_free)
            } else {
                (0, 0)
            };
            nodes[index] = FrozenNode {
                label: node.label(),
                start,
                end,
                fail: 0,
                edge_id: node.edge_id(),
            };
            if node.edge_id() > 0 {
                depths[node.edge_id() - 1] = node.depth();
            }
        }

        let mut frozen = Self { nodes, depths };
        failure::build(&mut frozen);
        debug!(
            nodes = frozen.nodes.len(),
            edges = frozen.depths.len(),
            "froze trie"
        );
        frozen
    }

    pub(crate) fn from_parts(nodes: Vec<FrozenNode>, depths: Vec<usize>) -> Self {
        Self { nodes, depths }
    }

    pub fn nodes(&self) -> &[FrozenNode] {
        &self.nodes
    }

    /// Depth table indexed by `edge_id - 1`.
    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of edge ids, which is also the largest id.
    pub fn edge_count(&self) -> usize {
        self.depths.len()
    }

    /// Binary search `range` for a node labelled `label`.
    fn find(&self, range: Range<usize>, label: char) -> Option<usize> {
        let start = range.start;
        self.nodes[range]
            .binary_search_by(|n| n.label.cmp(&label))
            .ok()
            .map(|i| start + i)
    }
}

impl GrowableTrie {
    /// Shorthand for [`FrozenAutomaton::freeze`].
    pub fn freeze(&self) -> FrozenAutomaton {
        FrozenAutomaton::freeze(self)
    }
}

impl Automaton for FrozenAutomaton {
    type Node = usize;

    #[inline]
    fn root(&self) -> usize {
        0
    }

    fn child(&self, node: usize, label: char) -> Option<usize> {
        let n = &self.nodes[node];
        if !n.has_children() {
            return None;
        }
        self.find(n.children(), label)
    }

    #[inline]
    fn failure(&self, node: usize) -> Option<usize> {
        if node == 0 {
            None
        } else {
            Some(self.nodes[node].fail)
        }
    }

    #[inline]
    fn edge_id(&self, node: usize) -> usize {
        self.nodes[node].edge_id
    }

    fn depth(&self, node: usize) -> usize {
        match self.nodes[node].edge_id {
            0 => 0,
            id => self.depths.get(id - 1).copied().unwrap_or(0),
        }
    }
}

impl FailureLinks for FrozenAutomaton {
    fn children_into(&self, node: usize, out: &mut Vec<usize>) {
        let n = &self.nodes[node];
        if n.has_children() {
            out.extend(n.children());
        }
    }

    fn label(&self, node: usize) -> char {
        self.nodes[node].label
    }

    fn set_failure(&mut self, node: usize, target: Option<usize>) {
        self.nodes[node].fail = target.unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[&str]) -> GrowableTrie {
        let mut trie = GrowableTrie::new();
        for key in keys {
            trie.insert(key);
        }
        trie.build_failure_links();
        trie
    }

    #[test]
    fn layout_is_breadth_first() {
        let frozen = build(&["ab", "bc", "bab", "d", "abcde"]).freeze();
        let labels: String = frozen.nodes().iter().skip(1).map(|n| n.label).collect();
        assert_eq!(labels, "abdbaccbde");
        assert_eq!(frozen.len(), 11);
        assert_eq!(frozen.nodes()[0].children(), 1..4);
    }

    #[test]
    fn sibling_ranges_sorted_and_disjoint() {
        let frozen = build(&["zeta", "alpha", "mu", "beta", "alps", "zen"]).freeze();
        let mut covered = vec![false; frozen.len()];
        for node in frozen.nodes() {
            if !node.has_children() {
                assert_eq!(node.end, 0);
                continue;
            }
            let range = &frozen.nodes()[node.children()];
            assert!(range.windows(2).all(|w| w[0].label < w[1].label));
            for i in node.children() {
                assert!(!covered[i], "node {i} in two child ranges");
                covered[i] = true;
            }
        }
        assert!(covered.iter().skip(1).all(|&c| c));
    }

    #[test]
    fn depth_table_by_edge_id() {
        let frozen = build(&["ab", "bc", "bab", "d", "abcde"]).freeze();
        assert_eq!(frozen.depths(), &[2, 2, 3, 1, 5]);
        assert_eq!(frozen.edge_count(), 5);
    }

    #[test]
    fn failure_indices_match_growable() {
        let trie = build(&["ab", "bc", "bab", "d", "abcde", "abcd", "cd"]);
        let frozen = trie.freeze();
        for key in ["a", "ab", "abc", "abcd", "abcde", "b", "ba", "bab", "bc", "c", "cd", "d"] {
            let g = trie.lookup(key).unwrap();
            let f = frozen.lookup(key).unwrap();
            let g_fail = trie.failure(g).unwrap();
            let f_fail = frozen.failure(f).unwrap();
            assert_eq!(trie.node(g_fail).label(), frozen.nodes()[f_fail].label, "{key}");
            assert_eq!(trie.edge_id(g_fail), frozen.edge_id(f_fail), "{key}");
        }
    }

    #[test]
    fn freeze_ignores_stale_links() {
        let mut trie = GrowableTrie::new();
        trie.insert("ab");
        trie.insert("b");
        // links never built on the growable side
        let frozen = trie.freeze();
        let ab = frozen.lookup("ab").unwrap();
        assert_eq!(frozen.failure(ab), frozen.lookup("b"));
    }

    #[test]
    fn freeze_empty_trie() {
        let frozen = GrowableTrie::new().freeze();
        assert_eq!(frozen.len(), 1);
        assert!(frozen.is_empty());
        assert_eq!(frozen.nodes()[0], FrozenNode::default());
        assert_eq!(frozen.goto(0, 'a'), 0);
    }
}
