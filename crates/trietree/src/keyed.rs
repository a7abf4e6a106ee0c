// Value-pairing wrapper: one value per key, indexed by edge id.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::TrieError;
use crate::automaton::Automaton;
use crate::codec::{read_varint, write_varint};
use crate::frozen::FrozenAutomaton;
use crate::growable::GrowableTrie;
use crate::predict::Predictions;

/// Encoding of the value array stored after a frozen automaton.
///
/// `decode` must consume exactly the bytes `encode` produced so that a
/// stream may carry further data after the trie.
pub trait ValueCodec<V> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode<W: Write + ?Sized>(&self, w: &mut W, values: &[V]) -> Result<(), Self::Error>;

    /// Decode the value array; `count` is the number of edge ids.
    fn decode<R: Read + ?Sized>(&self, r: &mut R, count: usize) -> Result<Vec<V>, Self::Error>;
}

/// Default value codec: varint byte length, then a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V: Serialize + DeserializeOwned> ValueCodec<V> for JsonCodec {
    type Error = serde_json::Error;

    fn encode<W: Write + ?Sized>(&self, w: &mut W, values: &[V]) -> Result<(), Self::Error> {
        write_json(w, values)
    }

    fn decode<R: Read + ?Sized>(&self, r: &mut R, _count: usize) -> Result<Vec<V>, Self::Error> {
        read_json(r)
    }
}

fn write_json<W: Write + ?Sized, V: Serialize>(
    w: &mut W,
    values: &[V],
) -> Result<(), serde_json::Error> {
    let json = serde_json::to_vec(values)?;
    write_varint(w, json.len() as i64).map_err(serde_json::Error::io)?;
    w.write_all(&json).map_err(serde_json::Error::io)
}

fn read_json<R: Read + ?Sized, V: DeserializeOwned>(r: &mut R) -> Result<Vec<V>, serde_json::Error> {
    use serde::de::Error as _;

    let len = read_varint(r).map_err(serde_json::Error::io)?;
    let len = u64::try_from(len)
        .map_err(|_| serde_json::Error::custom(format!("negative value block length {len}")))?;
    let mut json = Vec::new();
    r.take(len)
        .read_to_end(&mut json)
        .map_err(serde_json::Error::io)?;
    if json.len() as u64 != len {
        return Err(serde_json::Error::io(io::ErrorKind::UnexpectedEof.into()));
    }
    serde_json::from_slice(&json)
}

fn codec_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> TrieError {
    TrieError::Values(Box::new(err))
}

/// A key found inside a query together with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedPrediction<'a, V> {
    pub start: usize,
    pub end: usize,
    /// `query[start..end]`.
    pub key: &'a str,
    pub value: &'a V,
}

/// Iterator returned by the keyed `predict` methods.
pub struct KeyedPredictions<'a, A: Automaton, V> {
    inner: Predictions<'a, A>,
    values: &'a [V],
}

impl<'a, A: Automaton, V> Iterator for KeyedPredictions<'a, A, V> {
    type Item = KeyedPrediction<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let query = self.inner.query();
        let values = self.values;
        self.inner.find_map(|p| {
            value_at(values, p.edge_id).map(|value| KeyedPrediction {
                start: p.start,
                end: p.end,
                key: &query[p.start..p.end],
                value,
            })
        })
    }
}

fn value_at<V>(values: &[V], edge_id: usize) -> Option<&V> {
    edge_id.checked_sub(1).and_then(|i| values.get(i))
}

/// Growable trie that stores one value per key.
#[derive(Debug, Clone)]
pub struct KeyedTrie<V> {
    trie: GrowableTrie,
    values: Vec<V>,
}

impl<V> Default for KeyedTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KeyedTrie<V> {
    pub fn new() -> Self {
        Self {
            trie: GrowableTrie::new(),
            values: Vec::new(),
        }
    }

    /// Insert `key` with `value`, returning the key's edge id. Re-inserting
    /// a key replaces its value and keeps its id.
    pub fn insert(&mut self, key: &str, value: V) -> usize {
        let id = self.trie.insert(key);
        match self.values.get_mut(id - 1) {
            Some(slot) => *slot = value,
            None => self.values.push(value),
        }
        id
    }

    pub fn build_failure_links(&mut self) {
        self.trie.build_failure_links();
    }

    pub fn trie(&self) -> &GrowableTrie {
        &self.trie
    }

    /// Values in edge id order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let node = self.trie.lookup(key)?;
        value_at(&self.values, self.trie.edge_id(node))
    }

    /// Longest stored key that prefixes `s`, with its value.
    pub fn longest_prefix<'s>(&self, s: &'s str) -> Option<(&'s str, &V)> {
        let m = self.trie.longest_prefix(s)?;
        value_at(&self.values, m.edge_id).map(|v| (m.prefix, v))
    }

    pub fn predict<'a>(&'a self, query: &'a str) -> KeyedPredictions<'a, GrowableTrie, V> {
        KeyedPredictions {
            inner: self.trie.predict(query),
            values: &self.values,
        }
    }

    /// Freeze, cloning the values.
    pub fn freeze(&self) -> FrozenKeyedTrie<V>
    where
        V: Clone,
    {
        FrozenKeyedTrie {
            automaton: self.trie.freeze(),
            values: self.values.clone(),
        }
    }

    /// Freeze, moving the values.
    pub fn into_frozen(self) -> FrozenKeyedTrie<V> {
        FrozenKeyedTrie {
            automaton: self.trie.freeze(),
            values: self.values,
        }
    }
}

/// Frozen automaton paired with its value array; the persistable form.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenKeyedTrie<V> {
    automaton: FrozenAutomaton,
    values: Vec<V>,
}

impl<V> FrozenKeyedTrie<V> {
    /// Pair an automaton with values indexed by `edge_id - 1`.
    ///
    /// Fails with [`TrieError::ValueCountMismatch`] unless there is exactly
    /// one value per edge id.
    pub fn from_parts(automaton: FrozenAutomaton, values: Vec<V>) -> Result<Self, TrieError> {
        let edges = automaton.edge_count();
        if values.len() != edges {
            return Err(TrieError::ValueCountMismatch {
                values: values.len(),
                edges,
            });
        }
        Ok(Self { automaton, values })
    }

    /// Split back into the automaton and its values.
    pub fn into_parts(self) -> (FrozenAutomaton, Vec<V>) {
        (self.automaton, self.values)
    }

    pub fn automaton(&self) -> &FrozenAutomaton {
        &self.automaton
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let node = self.automaton.lookup(key)?;
        value_at(&self.values, self.automaton.edge_id(node))
    }

    pub fn longest_prefix<'s>(&self, s: &'s str) -> Option<(&'s str, &V)> {
        let m = self.automaton.longest_prefix(s)?;
        value_at(&self.values, m.edge_id).map(|v| (m.prefix, v))
    }

    pub fn predict<'a>(&'a self, query: &'a str) -> KeyedPredictions<'a, FrozenAutomaton, V> {
        KeyedPredictions {
            inner: self.automaton.predict(query),
            values: &self.values,
        }
    }

    /// Write the automaton followed by the values encoded with `codec`.
    /// Buffer file handles, as for [`write`](Self::write).
    pub fn write_with<W, C>(&self, w: &mut W, codec: &C) -> Result<(), TrieError>
    where
        W: Write + ?Sized,
        C: ValueCodec<V>,
    {
        self.write_parts(w, |w, values| codec.encode(w, values).map_err(codec_error))
    }

    /// Read an automaton and the value array that follows it.
    pub fn read_with<R, C>(r: &mut R, codec: &C) -> Result<Self, TrieError>
    where
        R: Read + ?Sized,
        C: ValueCodec<V>,
    {
        Self::read_parts(r, |r, count| codec.decode(r, count).map_err(codec_error))
    }

    fn write_parts<W, F>(&self, w: &mut W, encode: F) -> Result<(), TrieError>
    where
        W: Write + ?Sized,
        F: FnOnce(&mut W, &[V]) -> Result<(), TrieError>,
    {
        self.automaton.write(w)?;
        encode(w, &self.values)?;
        debug!(values = self.values.len(), "wrote values");
        Ok(())
    }

    fn read_parts<R, F>(r: &mut R, decode: F) -> Result<Self, TrieError>
    where
        R: Read + ?Sized,
        F: FnOnce(&mut R, usize) -> Result<Vec<V>, TrieError>,
    {
        let automaton = FrozenAutomaton::read(r)?;
        let values = decode(r, automaton.edge_count())?;
        debug!(values = values.len(), "read values");
        Self::from_parts(automaton, values)
    }
}

impl<V: Serialize> FrozenKeyedTrie<V> {
    /// Write with the JSON value encoding of [`JsonCodec`].
    ///
    /// The automaton goes out one varint at a time; wrap file handles in a
    /// `BufWriter`.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), TrieError> {
        self.write_parts(w, |w, values| write_json(w, values).map_err(codec_error))
    }
}

impl<V: DeserializeOwned> FrozenKeyedTrie<V> {
    /// Read data written by [`write`](Self::write).
    pub fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self, TrieError> {
        Self::read_parts(r, |r, _| read_json(r).map_err(codec_error))
    }
}
