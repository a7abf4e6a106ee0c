//! Multi-pattern string matching over a trie with Aho-Corasick failure links.
//!
//! Keys are inserted into a [`GrowableTrie`]; once its failure links are
//! built, a single pass over an input string reports every key ending at
//! every position. The trie can be frozen into a [`FrozenAutomaton`], a flat
//! array form that scans the same way and serializes to a compact varint
//! byte stream.
//!
//! # Architecture
//!
//! - [`growable`] -- Insert-only trie with per-node binary search trees over children
//! - [`failure`] -- Aho-Corasick failure function, shared by both node layouts
//! - [`frozen`] -- Flattened, binary-searchable automaton produced by freezing
//! - [`automaton`] -- The [`Automaton`] trait: goto, exact lookup, longest prefix
//! - [`scan`] -- Per-character multi-match reporting with cooperative cancellation
//! - [`predict`] -- Lazy prediction iterator yielding key spans inside a query
//! - [`codec`] -- Signed varint encoding and the frozen automaton wire format
//! - [`trie`] -- Lifecycle wrapper that holds either form
//! - [`keyed`] -- Wrapper that attaches a value to every key
//!
//! # Quick start
//!
//! ```
//! use trietree::{Automaton, GrowableTrie};
//!
//! let mut trie = GrowableTrie::new();
//! let ab = trie.insert("ab");
//! let bab = trie.insert("bab");
//! trie.build_failure_links();
//!
//! let mut found = Vec::new();
//! trie.scan("bab", |ev| {
//!     for m in ev.matches {
//!         found.push((ev.index, m.edge_id));
//!     }
//! })
//! .unwrap();
//! assert_eq!(found, vec![(2, bab), (2, ab)]);
//! ```

pub mod automaton;
pub mod codec;
pub mod failure;
pub mod frozen;
pub mod growable;
pub mod keyed;
pub mod predict;
pub mod scan;
pub mod trie;

use std::fmt;

pub use automaton::{Automaton, PrefixMatch};
pub use frozen::{FrozenAutomaton, FrozenNode};
pub use growable::{GrowableTrie, NodeId, TrieNode};
pub use keyed::{
    FrozenKeyedTrie, JsonCodec, KeyedPrediction, KeyedPredictions, KeyedTrie, ValueCodec,
};
pub use predict::{Prediction, Predictions};
pub use scan::{Cancel, CancelToken, Deadline, Match, Never, ScanEvent};
pub use trie::{Trie, TriePredictions};

/// Names the part of a serialized automaton that failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NodeCount,
    Node(usize),
    DepthCount,
    Depth(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::NodeCount => write!(f, "node count"),
            Field::Node(i) => write!(f, "node {i}"),
            Field::DepthCount => write!(f, "depth table length"),
            Field::Depth(i) => write!(f, "depth {i}"),
        }
    }
}

/// Error type for trie construction, scanning and (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("trie is frozen and cannot accept new keys")]
    Frozen,
    #[error("scan cancelled")]
    Cancelled,
    #[error("failed to decode {field}: {source}")]
    Decode {
        field: Field,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {field}: {value}")]
    InvalidValue { field: Field, value: i64 },
    #[error("{field} of {size} cannot be addressed on this platform")]
    UnrepresentableSize { field: Field, size: i64 },
    #[error("malformed node {index}: {reason}")]
    MalformedNode { index: usize, reason: &'static str },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("value count mismatch: {values} values for {edges} edge ids")]
    ValueCountMismatch { values: usize, edges: usize },
    #[error("value codec failed: {0}")]
    Values(#[source] Box<dyn std::error::Error + Send + Sync>),
}
