// Prediction engine: lazy enumeration of key spans inside a query.

use std::iter::FusedIterator;

use tracing::warn;

use crate::automaton::{Automaton, SuffixMatches};

/// A stored key found inside a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    /// Byte offset where the key starts in the query.
    pub start: usize,
    /// Byte offset just past the key's last character.
    pub end: usize,
    pub edge_id: usize,
}

/// Iterator returned by [`Automaton::predict`].
///
/// Advances one query character at a time and yields the keys ending at that
/// character longest first, before consuming the next character. Dropping
/// the iterator is the stop signal; it holds nothing beyond borrows.
pub struct Predictions<'a, A: Automaton> {
    automaton: &'a A,
    query: &'a str,
    /// Byte offset of the next unconsumed character.
    end: usize,
    pivot: A::Node,
    pending: Option<SuffixMatches<'a, A>>,
}

impl<'a, A: Automaton> Predictions<'a, A> {
    pub(crate) fn new(automaton: &'a A, query: &'a str) -> Self {
        if !automaton.is_finalized() {
            warn!("predicting over a trie with stale failure links; only root-reachable keys will match");
        }
        Self {
            automaton,
            query,
            end: 0,
            pivot: automaton.root(),
            pending: None,
        }
    }

    /// The query being enumerated.
    pub fn query(&self) -> &'a str {
        self.query
    }
}

impl<A: Automaton> Iterator for Predictions<'_, A> {
    type Item = Prediction;

    fn next(&mut self) -> Option<Prediction> {
        loop {
            if let Some(m) = self.pending.as_mut().and_then(Iterator::next) {
                return Some(Prediction {
                    start: trailing_index(&self.query[..self.end], m.depth),
                    end: self.end,
                    edge_id: m.edge_id,
                });
            }
            let label = self.query[self.end..].chars().next()?;
            self.end += label.len_utf8();
            self.pivot = self.automaton.goto(self.pivot, label);
            self.pending = Some(self.automaton.suffix_matches(self.pivot));
        }
    }
}

impl<A: Automaton> FusedIterator for Predictions<'_, A> {}

/// Byte offset of the `n`th character counted back from the end of `s`.
fn trailing_index(s: &str, n: usize) -> usize {
    if n == 0 {
        return s.len();
    }
    s.char_indices().rev().take(n).last().map_or(0, |(i, _)| i)
}
