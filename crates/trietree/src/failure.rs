// Aho-Corasick failure function construction.
//
// Breadth-first: when a node's children are computed, every node at the same
// or a smaller depth already has its final failure link, so the goto calls
// made here only ever chase finished links.

use std::collections::VecDeque;

use tracing::debug;

use crate::automaton::Automaton;
use crate::growable::{GrowableTrie, NodeId};

/// Layout hooks the builder needs beyond [`Automaton`].
pub(crate) trait FailureLinks: Automaton {
    /// Append the children of `node` to `out`.
    fn children_into(&self, node: Self::Node, out: &mut Vec<Self::Node>);
    fn label(&self, node: Self::Node) -> char;
    fn set_failure(&mut self, node: Self::Node, target: Option<Self::Node>);
}

/// Fill in the failure link of every node.
///
/// The root points at itself while links are computed so that goto from the
/// root's failure target resolves to the root; it is cleared afterwards.
pub(crate) fn build<A: FailureLinks>(automaton: &mut A) {
    let root = automaton.root();
    automaton.set_failure(root, Some(root));

    let mut queue = VecDeque::from([root]);
    let mut children = Vec::new();
    while let Some(parent) = queue.pop_front() {
        let parent_failure = automaton.failure(parent).unwrap_or(root);
        children.clear();
        automaton.children_into(parent, &mut children);
        for &child in &children {
            let mut target = automaton.goto(parent_failure, automaton.label(child));
            // Only a child of the root can re-find itself.
            if target == child {
                target = root;
            }
            automaton.set_failure(child, Some(target));
            queue.push_back(child);
        }
    }

    automaton.set_failure(root, None);
}

impl FailureLinks for GrowableTrie {
    fn children_into(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.extend(self.children(node));
    }

    fn label(&self, node: NodeId) -> char {
        self.nodes[node.index()].label()
    }

    fn set_failure(&mut self, node: NodeId, target: Option<NodeId>) {
        self.nodes[node.index()].set_failure(target);
    }
}

impl GrowableTrie {
    /// Compute Aho-Corasick failure links for every node.
    ///
    /// Must be called after the last insertion and before scanning or
    /// predicting; calling it again after more insertions recomputes all links.
    pub fn build_failure_links(&mut self) {
        build(self);
        self.finalized = true;
        debug!(nodes = self.len(), edges = self.edge_count(), "built failure links");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_trie(keys: &[&str]) -> GrowableTrie {
        let mut trie = GrowableTrie::new();
        for key in keys {
            trie.insert(key);
        }
        trie.build_failure_links();
        trie
    }

    fn failure_of(trie: &GrowableTrie, key: &str) -> NodeId {
        let node = trie.lookup(key).unwrap();
        trie.failure(node).unwrap()
    }

    #[test]
    fn root_link_cleared() {
        let trie = build_trie(&["ab", "bc"]);
        assert_eq!(trie.failure(NodeId::ROOT), None);
    }

    #[test]
    fn first_level_fails_to_root() {
        let trie = build_trie(&["ab", "bc", "bab", "d", "abcde"]);
        for key in ["a", "b", "d"] {
            assert_eq!(failure_of(&trie, key), NodeId::ROOT, "{key}");
        }
    }

    #[test]
    fn classic_links() {
        let trie = build_trie(&["ab", "bc", "bab", "d", "abcde"]);
        assert_eq!(failure_of(&trie, "ab"), trie.lookup("b").unwrap());
        assert_eq!(failure_of(&trie, "abc"), trie.lookup("bc").unwrap());
        assert_eq!(failure_of(&trie, "abcd"), trie.lookup("d").unwrap());
        assert_eq!(failure_of(&trie, "abcde"), NodeId::ROOT);
        assert_eq!(failure_of(&trie, "ba"), trie.lookup("a").unwrap());
        assert_eq!(failure_of(&trie, "bab"), trie.lookup("ab").unwrap());
    }

    #[test]
    fn link_into_later_sibling_subtree() {
        // "abcd" must fail to "cd", which sits in a subtree visited after the
        // one holding "abcd" in depth-first order.
        let trie = build_trie(&["abcd", "bc", "cd"]);
        assert_eq!(failure_of(&trie, "abc"), trie.lookup("bc").unwrap());
        assert_eq!(failure_of(&trie, "bc"), trie.lookup("c").unwrap());
        assert_eq!(failure_of(&trie, "abcd"), trie.lookup("cd").unwrap());
    }

    #[test]
    fn repeated_characters() {
        let trie = build_trie(&["aaaa"]);
        assert_eq!(failure_of(&trie, "a"), NodeId::ROOT);
        assert_eq!(failure_of(&trie, "aa"), trie.lookup("a").unwrap());
        assert_eq!(failure_of(&trie, "aaa"), trie.lookup("aa").unwrap());
        assert_eq!(failure_of(&trie, "aaaa"), trie.lookup("aaa").unwrap());
    }

    #[test]
    fn rebuild_after_insert() {
        let mut trie = build_trie(&["ab"]);
        assert_eq!(failure_of(&trie, "ab"), NodeId::ROOT);
        trie.insert("b");
        trie.build_failure_links();
        assert_eq!(failure_of(&trie, "ab"), trie.lookup("b").unwrap());
    }
}
