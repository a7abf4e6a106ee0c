// Shared automaton contract for the growable and frozen node layouts.
//
// Scanning, prediction, exact lookup and longest-prefix matching are written
// once against this trait; each layout only supplies child lookup, failure
// links and the per-node edge id / depth.

use crate::TrieError;
use crate::predict::Predictions;
use crate::scan::{self, Cancel, Match, Never, ScanEvent};

/// Result of a longest-prefix lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'s> {
    /// The matched prefix of the query.
    pub prefix: &'s str,
    /// Edge id of the key equal to `prefix`.
    pub edge_id: usize,
}

/// A trie with failure links that can be scanned.
///
/// Implemented by [`GrowableTrie`](crate::GrowableTrie) (arena node ids) and
/// [`FrozenAutomaton`](crate::FrozenAutomaton) (dense array indices).
pub trait Automaton {
    /// Node handle. Cheap to copy; only meaningful for the automaton that
    /// produced it.
    type Node: Copy + Eq + std::fmt::Debug;

    fn root(&self) -> Self::Node;

    /// Direct child of `node` labelled `label`, without failure chasing.
    fn child(&self, node: Self::Node, label: char) -> Option<Self::Node>;

    /// Failure target of `node`. `None` for the root, and for nodes of a
    /// growable trie whose failure links have not been built.
    fn failure(&self, node: Self::Node) -> Option<Self::Node>;

    /// Edge id of the key ending at `node`, or 0.
    fn edge_id(&self, node: Self::Node) -> usize;

    /// Length in characters of the key ending at `node`. Only meaningful when
    /// `edge_id(node) > 0`.
    fn depth(&self, node: Self::Node) -> usize;

    /// Whether failure links reflect the current set of nodes.
    ///
    /// Scanning an automaton that is not finalized only finds keys reachable
    /// without failure transitions.
    fn is_finalized(&self) -> bool {
        true
    }

    /// Goto function: direct child, else retry from the failure target,
    /// bottoming out at the root.
    fn goto(&self, node: Self::Node, label: char) -> Self::Node {
        let root = self.root();
        let mut current = node;
        loop {
            if let Some(next) = self.child(current, label) {
                return next;
            }
            if current == root {
                return root;
            }
            current = self.failure(current).unwrap_or(root);
        }
    }

    /// Exact lookup by pure descent from the root.
    fn lookup(&self, key: &str) -> Option<Self::Node> {
        let mut node = self.root();
        for label in key.chars() {
            node = self.child(node, label)?;
        }
        Some(node)
    }

    /// Keys ending at `node`, longest first: `node` itself and every node on
    /// its failure chain with a positive edge id. The root is never reported.
    fn suffix_matches(&self, node: Self::Node) -> SuffixMatches<'_, Self>
    where
        Self: Sized,
    {
        SuffixMatches {
            automaton: self,
            node: Some(node),
        }
    }

    /// Longest stored key that is a prefix of `s`.
    ///
    /// Uses exact child lookup only; this answers "which key starts `s`",
    /// not "which keys occur inside `s`".
    fn longest_prefix<'s>(&self, s: &'s str) -> Option<PrefixMatch<'s>> {
        let mut node = self.root();
        let mut last = None;
        for (i, label) in s.char_indices() {
            let Some(next) = self.child(node, label) else {
                break;
            };
            let edge_id = self.edge_id(next);
            if edge_id > 0 {
                last = Some((i + label.len_utf8(), edge_id));
            }
            node = next;
        }
        last.map(|(end, edge_id)| PrefixMatch {
            prefix: &s[..end],
            edge_id,
        })
    }

    /// Scan `text`, reporting one [`ScanEvent`] per character.
    fn scan<F>(&self, text: &str, report: F) -> Result<(), TrieError>
    where
        Self: Sized,
        F: FnMut(&ScanEvent<'_>),
    {
        scan::run(self, text, &Never, report)
    }

    /// Like [`scan`](Self::scan), checking `cancel` after every event.
    ///
    /// Returns [`TrieError::Cancelled`] once cancellation is observed; events
    /// already reported stand.
    fn scan_with<C, F>(&self, text: &str, cancel: &C, report: F) -> Result<(), TrieError>
    where
        Self: Sized,
        C: Cancel + ?Sized,
        F: FnMut(&ScanEvent<'_>),
    {
        scan::run(self, text, cancel, report)
    }

    /// Lazily enumerate every key occurring in `query` with its byte span.
    fn predict<'a>(&'a self, query: &'a str) -> Predictions<'a, Self>
    where
        Self: Sized,
    {
        Predictions::new(self, query)
    }
}

/// Iterator over the keys ending at a node, walking its failure chain.
pub struct SuffixMatches<'a, A: Automaton> {
    automaton: &'a A,
    node: Option<A::Node>,
}

impl<A: Automaton> Iterator for SuffixMatches<'_, A> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        let root = self.automaton.root();
        loop {
            let node = self.node?;
            if node == root {
                self.node = None;
                return None;
            }
            self.node = Some(self.automaton.failure(node).unwrap_or(root));
            let edge_id = self.automaton.edge_id(node);
            if edge_id > 0 {
                return Some(Match {
                    edge_id,
                    depth: self.automaton.depth(node),
                });
            }
        }
    }
}

impl<A: Automaton> std::iter::FusedIterator for SuffixMatches<'_, A> {}
