// Scanning engine: one event per input character, cooperative cancellation.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, warn};

use crate::TrieError;
use crate::automaton::Automaton;

/// A key ending at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub edge_id: usize,
    /// Key length in characters.
    pub depth: usize,
}

/// Report for one scanned character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEvent<'a> {
    /// Byte offset of `label` in the scanned text.
    pub index: usize,
    pub label: char,
    /// Keys ending at this character, longest first. Empty when none.
    pub matches: &'a [Match],
}

/// Cancellation source polled once per scanned character.
pub trait Cancel {
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Cancel for Never {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancel for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl Cancel for Cell<bool> {
    fn is_cancelled(&self) -> bool {
        self.get()
    }
}

impl<C: Cancel + ?Sized> Cancel for &C {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<C: Cancel + ?Sized> Cancel for Arc<C> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Cloneable flag shared between a scanner and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Cancel for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancels once the wall clock passes the given instant.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(pub Instant);

impl Cancel for Deadline {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.0
    }
}

pub(crate) fn run<A, C, F>(
    automaton: &A,
    text: &str,
    cancel: &C,
    mut report: F,
) -> Result<(), TrieError>
where
    A: Automaton,
    C: Cancel + ?Sized,
    F: FnMut(&ScanEvent<'_>),
{
    if !automaton.is_finalized() {
        warn!("scanning a trie with stale failure links; only root-reachable keys will match");
    }

    let mut matches = Vec::new();
    let mut current = automaton.root();
    for (index, label) in text.char_indices() {
        let next = automaton.goto(current, label);
        matches.clear();
        matches.extend(automaton.suffix_matches(next));
        report(&ScanEvent {
            index,
            label,
            matches: &matches,
        });
        if cancel.is_cancelled() {
            debug!(index, "scan cancelled");
            return Err(TrieError::Cancelled);
        }
        current = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrozenAutomaton, GrowableTrie};

    type Report = (usize, char, Vec<(usize, usize)>);

    fn build(keys: &[&str]) -> GrowableTrie {
        let mut trie = GrowableTrie::new();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(trie.insert(key), i + 1);
        }
        trie.build_failure_links();
        trie
    }

    fn collect<A: Automaton>(automaton: &A, text: &str) -> Vec<Report> {
        let mut reports = Vec::new();
        automaton
            .scan(text, |ev| {
                let ms = ev.matches.iter().map(|m| (m.edge_id, m.depth)).collect();
                reports.push((ev.index, ev.label, ms));
            })
            .unwrap();
        reports
    }

    fn check_basic<A: Automaton>(automaton: &A) {
        assert_eq!(
            collect(automaton, "ab"),
            vec![(0, 'a', vec![]), (1, 'b', vec![(1, 2)])]
        );
        assert_eq!(
            collect(automaton, "bc"),
            vec![(0, 'b', vec![]), (1, 'c', vec![(2, 2)])]
        );
        assert_eq!(
            collect(automaton, "bab"),
            vec![(0, 'b', vec![]), (1, 'a', vec![]), (2, 'b', vec![(3, 3), (1, 2)])]
        );
        assert_eq!(collect(automaton, "d"), vec![(0, 'd', vec![(4, 1)])]);
        assert_eq!(
            collect(automaton, "abcde"),
            vec![
                (0, 'a', vec![]),
                (1, 'b', vec![(1, 2)]),
                (2, 'c', vec![(2, 2)]),
                (3, 'd', vec![(4, 1)]),
                (4, 'e', vec![(5, 5)]),
            ]
        );
    }

    #[test]
    fn basic_growable() {
        check_basic(&build(&["ab", "bc", "bab", "d", "abcde"]));
    }

    #[test]
    fn basic_frozen() {
        check_basic(&build(&["ab", "bc", "bab", "d", "abcde"]).freeze());
    }

    #[test]
    fn single_char_keys() {
        let trie = build(&["1", "2", "3", "4", "5"]);
        let reports = collect(&trie, "1234567890");
        assert_eq!(reports.len(), 10);
        for (i, (index, _, ms)) in reports.iter().enumerate() {
            assert_eq!(*index, i);
            if i < 5 {
                assert_eq!(ms, &vec![(i + 1, 1)]);
            } else {
                assert!(ms.is_empty());
            }
        }
    }

    #[test]
    fn unmatched_characters_still_reported() {
        let trie = build(&["a", "ab", "abc", "d", "de"]);
        assert_eq!(
            collect(&trie, "azd"),
            vec![(0, 'a', vec![(1, 1)]), (1, 'z', vec![]), (2, 'd', vec![(4, 1)])]
        );
    }

    #[test]
    fn index_is_byte_offset() {
        let trie = build(&["語"]);
        let reports = collect(&trie, "日本語");
        assert_eq!(reports[2], (6, '語', vec![(1, 1)]));
    }

    #[test]
    fn empty_text_reports_nothing() {
        let trie = build(&["a"]);
        assert!(collect(&trie, "").is_empty());
    }

    #[test]
    fn cancel_after_first_event() {
        let trie = build(&["ab", "bc", "bab", "d", "abcde"]);
        let cancel = Cell::new(false);
        let mut events = 0;
        let result = trie.scan_with("abcde", &cancel, |_| {
            events += 1;
            cancel.set(true);
        });
        assert!(matches!(result, Err(TrieError::Cancelled)));
        assert_eq!(events, 1);
    }

    #[test]
    fn cancel_token_on_frozen() {
        let frozen: FrozenAutomaton = build(&["a"]).freeze();
        let token = CancelToken::new();
        let remote = token.clone();
        let mut indexes = Vec::new();
        let result = frozen.scan_with("aaaa", &token, |ev| {
            indexes.push(ev.index);
            if ev.index == 1 {
                remote.cancel();
            }
        });
        assert!(matches!(result, Err(TrieError::Cancelled)));
        assert_eq!(indexes, vec![0, 1]);
    }

    #[test]
    fn expired_deadline_stops_after_one_event() {
        let trie = build(&["a"]);
        let deadline = Deadline(Instant::now());
        let mut events = 0;
        let result = trie.scan_with("aaa", &deadline, |_| events += 1);
        assert!(matches!(result, Err(TrieError::Cancelled)));
        assert_eq!(events, 1);
    }

    #[test]
    fn stale_links_only_find_root_reachable_keys() {
        let mut trie = GrowableTrie::new();
        trie.insert("ab");
        trie.insert("b");
        // "b" inside "ab" needs a failure transition from "a"
        let reports = collect(&trie, "xab");
        assert_eq!(reports[2].2, vec![(1, 2)]);
        trie.build_failure_links();
        let reports = collect(&trie, "xab");
        assert_eq!(reports[2].2, vec![(1, 2), (2, 1)]);
    }
}
