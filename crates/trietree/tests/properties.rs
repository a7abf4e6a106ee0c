//! Property tests over random key sets.
//!
//! Alphabets are kept small so that keys share prefixes and suffixes heavily,
//! which is where failure links get interesting.

use hashbrown::{HashMap, HashSet};
use proptest::prelude::*;
use trietree::{Automaton, FrozenAutomaton, GrowableTrie};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build(keys: &[String]) -> (GrowableTrie, HashMap<String, usize>) {
    let mut trie = GrowableTrie::new();
    let mut ids = HashMap::new();
    for key in keys {
        let id = trie.insert(key);
        ids.insert(key.clone(), id);
    }
    trie.build_failure_links();
    (trie, ids)
}

/// Every non-empty prefix of every key: the paths of all non-root nodes.
fn paths(keys: &[String]) -> HashSet<String> {
    let mut out = HashSet::new();
    for key in keys {
        for (i, c) in key.char_indices() {
            out.insert(key[..i + c.len_utf8()].to_string());
        }
    }
    out
}

/// Longest proper suffix of `path` that is itself a path, or "".
fn expected_failure<'a>(path: &'a str, all: &HashSet<String>) -> &'a str {
    path.char_indices()
        .skip(1)
        .map(|(i, _)| &path[i..])
        .find(|suffix| all.contains(*suffix))
        .unwrap_or("")
}

fn scan_events<A: Automaton>(automaton: &A, text: &str) -> Vec<(usize, char, Vec<(usize, usize)>)> {
    let mut events = Vec::new();
    automaton
        .scan(text, |ev| {
            let ms = ev.matches.iter().map(|m| (m.edge_id, m.depth)).collect();
            events.push((ev.index, ev.label, ms));
        })
        .unwrap();
    events
}

fn predictions<A: Automaton>(automaton: &A, query: &str) -> Vec<(usize, usize, usize)> {
    automaton
        .predict(query)
        .map(|p| (p.start, p.end, p.edge_id))
        .collect()
}

fn keys_strategy() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        prop::collection::vec("[ab]{1,6}", 1..12),
        prop::collection::vec("[a-dあい]{1,5}", 1..16),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn failure_links_point_at_longest_suffix(keys in keys_strategy()) {
        let (trie, _) = build(&keys);
        let frozen = trie.freeze();
        let all = paths(&keys);
        for path in &all {
            let want = expected_failure(path, &all);

            let node = trie.lookup(path).unwrap();
            prop_assert_eq!(trie.failure(node), trie.lookup(want), "growable {}", path);

            let node = frozen.lookup(path).unwrap();
            prop_assert_eq!(frozen.failure(node), frozen.lookup(want), "frozen {}", path);
        }
    }

    #[test]
    fn failure_chains_reach_root(keys in keys_strategy()) {
        let (trie, _) = build(&keys);
        for path in paths(&keys) {
            let mut node = trie.lookup(&path).unwrap();
            let mut steps = 0;
            while let Some(next) = trie.failure(node) {
                node = next;
                steps += 1;
                prop_assert!(steps <= path.chars().count(), "cycle from {}", path);
            }
            prop_assert_eq!(node, trie.root());
        }
    }

    #[test]
    fn frozen_scans_like_growable(keys in keys_strategy(), text in "[a-dあいz]{0,24}") {
        let (trie, _) = build(&keys);
        let frozen = trie.freeze();
        prop_assert_eq!(scan_events(&trie, &text), scan_events(&frozen, &text));
        prop_assert_eq!(predictions(&trie, &text), predictions(&frozen, &text));
    }

    #[test]
    fn predictions_are_exactly_the_occurrences(keys in keys_strategy(), query in "[a-dあい]{0,16}") {
        let (trie, ids) = build(&keys);
        let mut got = predictions(&trie, &query);

        let bounds: Vec<usize> = query
            .char_indices()
            .map(|(i, _)| i)
            .chain([query.len()])
            .collect();
        let mut want = Vec::new();
        for (a, &start) in bounds.iter().enumerate() {
            for &end in &bounds[a + 1..] {
                if let Some(&id) = ids.get(&query[start..end]) {
                    want.push((start, end, id));
                }
            }
        }

        for &(start, end, id) in &got {
            prop_assert_eq!(ids.get(&query[start..end]), Some(&id));
        }
        got.sort_unstable();
        want.sort_unstable();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn codec_round_trip(keys in keys_strategy()) {
        let (trie, _) = build(&keys);
        let frozen = trie.freeze();
        let bytes = frozen.to_bytes();
        let back = FrozenAutomaton::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, frozen);
    }

    #[test]
    fn longest_prefix_is_a_stored_key(keys in keys_strategy(), query in "[a-dあい]{0,12}") {
        let (trie, ids) = build(&keys);
        let got = trie.longest_prefix(&query);
        let want = ids
            .iter()
            .filter(|(k, _)| query.starts_with(k.as_str()))
            .max_by_key(|(k, _)| k.len())
            .map(|(k, &id)| (k.as_str(), id));
        prop_assert_eq!(got.map(|m| (m.prefix, m.edge_id)), want);
    }
}
