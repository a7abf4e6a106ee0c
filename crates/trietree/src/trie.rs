// Lifecycle wrapper: one handle that starts growable and ends frozen.

use std::io::{Read, Write};

use crate::TrieError;
use crate::automaton::{Automaton, PrefixMatch};
use crate::frozen::FrozenAutomaton;
use crate::growable::GrowableTrie;
use crate::predict::{Prediction, Predictions};
use crate::scan::{Cancel, ScanEvent};

#[derive(Debug, Clone)]
enum State {
    Growable(GrowableTrie),
    Frozen(FrozenAutomaton),
}

/// A trie that is built, frozen and persisted through a single value.
///
/// Queries dispatch to whichever form is currently held. Once frozen, the
/// key set is fixed and [`insert`](Self::insert) fails with
/// [`TrieError::Frozen`].
#[derive(Debug, Clone)]
pub struct Trie {
    state: State,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl From<GrowableTrie> for Trie {
    fn from(trie: GrowableTrie) -> Self {
        Self {
            state: State::Growable(trie),
        }
    }
}

impl From<FrozenAutomaton> for Trie {
    fn from(frozen: FrozenAutomaton) -> Self {
        Self {
            state: State::Frozen(frozen),
        }
    }
}

impl Trie {
    pub fn new() -> Self {
        GrowableTrie::new().into()
    }

    pub fn insert(&mut self, key: &str) -> Result<usize, TrieError> {
        match &mut self.state {
            State::Growable(trie) => Ok(trie.insert(key)),
            State::Frozen(_) => Err(TrieError::Frozen),
        }
    }

    /// Rebuild failure links. A no-op once frozen.
    pub fn build_failure_links(&mut self) {
        if let State::Growable(trie) = &mut self.state {
            trie.build_failure_links();
        }
    }

    /// Replace the growable form by its frozen form.
    pub fn freeze(&mut self) -> Result<(), TrieError> {
        let State::Growable(trie) = &self.state else {
            return Err(TrieError::Frozen);
        };
        self.state = State::Frozen(trie.freeze());
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, State::Frozen(_))
    }

    pub fn as_growable(&self) -> Option<&GrowableTrie> {
        match &self.state {
            State::Growable(trie) => Some(trie),
            State::Frozen(_) => None,
        }
    }

    pub fn as_frozen(&self) -> Option<&FrozenAutomaton> {
        match &self.state {
            State::Frozen(frozen) => Some(frozen),
            State::Growable(_) => None,
        }
    }

    /// Edge id of `key` if it was inserted.
    pub fn lookup(&self, key: &str) -> Option<usize> {
        let id = match &self.state {
            State::Growable(trie) => trie.lookup(key).map(|n| trie.edge_id(n)),
            State::Frozen(frozen) => frozen.lookup(key).map(|n| frozen.edge_id(n)),
        };
        id.filter(|&id| id > 0)
    }

    pub fn longest_prefix<'s>(&self, s: &'s str) -> Option<PrefixMatch<'s>> {
        match &self.state {
            State::Growable(trie) => trie.longest_prefix(s),
            State::Frozen(frozen) => frozen.longest_prefix(s),
        }
    }

    pub fn scan<F>(&self, text: &str, report: F) -> Result<(), TrieError>
    where
        F: FnMut(&ScanEvent<'_>),
    {
        match &self.state {
            State::Growable(trie) => trie.scan(text, report),
            State::Frozen(frozen) => frozen.scan(text, report),
        }
    }

    pub fn scan_with<C, F>(&self, text: &str, cancel: &C, report: F) -> Result<(), TrieError>
    where
        C: Cancel + ?Sized,
        F: FnMut(&ScanEvent<'_>),
    {
        match &self.state {
            State::Growable(trie) => trie.scan_with(text, cancel, report),
            State::Frozen(frozen) => frozen.scan_with(text, cancel, report),
        }
    }

    pub fn predict<'a>(&'a self, query: &'a str) -> TriePredictions<'a> {
        match &self.state {
            State::Growable(trie) => TriePredictions::Growable(trie.predict(query)),
            State::Frozen(frozen) => TriePredictions::Frozen(frozen.predict(query)),
        }
    }

    /// Serialize the frozen form. A growable trie is frozen into a temporary
    /// copy first and stays growable. Issues many small writes, so pass a
    /// `BufWriter` rather than a bare file.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), TrieError> {
        match &self.state {
            State::Growable(trie) => trie.freeze().write(w),
            State::Frozen(frozen) => frozen.write(w),
        }
    }

    /// Deserialize into a frozen wrapper.
    pub fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self, TrieError> {
        FrozenAutomaton::read(r).map(Self::from)
    }
}

/// Iterator returned by [`Trie::predict`].
pub enum TriePredictions<'a> {
    Growable(Predictions<'a, GrowableTrie>),
    Frozen(Predictions<'a, FrozenAutomaton>),
}

impl Iterator for TriePredictions<'_> {
    type Item = Prediction;

    fn next(&mut self) -> Option<Prediction> {
        match self {
            TriePredictions::Growable(it) => it.next(),
            TriePredictions::Frozen(it) => it.next(),
        }
    }
}

impl std::iter::FusedIterator for TriePredictions<'_> {}
