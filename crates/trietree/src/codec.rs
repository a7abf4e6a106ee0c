// Wire format for the frozen automaton.
//
// Every integer is a zigzag-encoded LEB128 varint (at most 10 bytes for an
// i64), so small indices and ids take one byte. Layout, in order:
//
//   node count
//   per node: label (code point), children start, children end, fail, edge id
//   depth table length
//   per edge id (from 1): depth

use std::io::{self, Read, Write};

use tracing::debug;

use crate::frozen::{FrozenAutomaton, FrozenNode};
use crate::{Field, TrieError};

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` into `buf`, returning the number of bytes used.
pub fn encode_varint(value: i64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut ux = (value as u64) << 1;
    if value < 0 {
        ux = !ux;
    }
    let mut i = 0;
    while ux >= 0x80 {
        buf[i] = (ux as u8) | 0x80;
        ux >>= 7;
        i += 1;
    }
    buf[i] = ux as u8;
    i + 1
}

pub fn write_varint<W: Write + ?Sized>(w: &mut W, value: i64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(value, &mut buf);
    w.write_all(&buf[..n])
}

/// Read one varint, consuming exactly its bytes from `r`.
///
/// A source that ends before the first byte yields `UnexpectedEof`, as does
/// one that ends mid-value; an encoding longer than 64 bits is `InvalidData`.
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> io::Result<i64> {
    let mut ux: u64 = 0;
    let mut shift = 0;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        let b = byte[0];
        if b < 0x80 {
            if i == MAX_VARINT_LEN - 1 && b > 1 {
                break;
            }
            ux |= (b as u64) << shift;
            let x = (ux >> 1) as i64;
            return Ok(if ux & 1 != 0 { !x } else { x });
        }
        ux |= ((b & 0x7f) as u64) << shift;
        shift += 7;
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "varint overflows a 64-bit integer",
    ))
}

/// Container lengths and indices always fit in i64.
#[inline]
fn int(v: usize) -> i64 {
    v as i64
}

fn read_field<R: Read + ?Sized>(r: &mut R, field: Field) -> Result<i64, TrieError> {
    read_varint(r).map_err(|source| TrieError::Decode { field, source })
}

/// Read a non-negative integer that must fit in `usize`.
fn read_size<R: Read + ?Sized>(r: &mut R, field: Field) -> Result<usize, TrieError> {
    let value = read_field(r, field)?;
    if value < 0 {
        return Err(TrieError::InvalidValue { field, value });
    }
    usize::try_from(value).map_err(|_| TrieError::UnrepresentableSize { field, size: value })
}

/// Upper bound on speculative allocation for counts read from untrusted input.
const PREALLOC_LIMIT: usize = 1 << 16;

impl FrozenAutomaton {
    /// Serialize to `w`. On error, whatever was already written stays written.
    ///
    /// Each integer is a separate small write; wrap file handles in a
    /// `BufWriter`.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), TrieError> {
        write_varint(w, int(self.nodes.len()))?;
        for node in &self.nodes {
            write_varint(w, node.label as i64)?;
            write_varint(w, int(node.start))?;
            write_varint(w, int(node.end))?;
            write_varint(w, int(node.fail))?;
            write_varint(w, int(node.edge_id))?;
        }
        write_varint(w, int(self.depths.len()))?;
        for &depth in &self.depths {
            write_varint(w, int(depth))?;
        }
        debug!(
            nodes = self.nodes.len(),
            edges = self.depths.len(),
            "wrote automaton"
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write(&mut buf);
        buf
    }

    /// Deserialize from `r`, consuming exactly the automaton's bytes.
    ///
    /// Bytes are pulled one at a time; wrap file handles in a `BufReader`.
    /// The decoded structure is validated so that scanning it cannot index
    /// out of bounds or loop forever.
    pub fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self, TrieError> {
        let count = read_size(r, Field::NodeCount)?;
        if count == 0 {
            return Err(TrieError::InvalidValue {
                field: Field::NodeCount,
                value: 0,
            });
        }
        let mut nodes = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for index in 0..count {
            nodes.push(read_node(r, index)?);
        }

        let depth_count = read_size(r, Field::DepthCount)?;
        let mut depths = Vec::with_capacity(depth_count.min(PREALLOC_LIMIT));
        for i in 0..depth_count {
            depths.push(read_size(r, Field::Depth(i))?);
        }

        validate(&nodes, depths.len())?;
        debug!(nodes = nodes.len(), edges = depths.len(), "read automaton");
        Ok(Self::from_parts(nodes, depths))
    }

    /// Deserialize from the front of `bytes`; trailing bytes are ignored.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, TrieError> {
        Self::read(&mut bytes)
    }
}

fn read_node<R: Read + ?Sized>(r: &mut R, index: usize) -> Result<FrozenNode, TrieError> {
    let field = Field::Node(index);
    let code = read_field(r, field)?;
    let label = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or(TrieError::InvalidValue { field, value: code })?;
    Ok(FrozenNode {
        label,
        start: read_size(r, field)?,
        end: read_size(r, field)?,
        fail: read_size(r, field)?,
        edge_id: read_size(r, field)?,
    })
}

/// Check that `nodes` form a tree rooted at 0 with sorted, in-bounds child
/// ranges, failure targets strictly closer to the root, and edge ids covered
/// by the depth table.
fn validate(nodes: &[FrozenNode], edge_count: usize) -> Result<(), TrieError> {
    let malformed = |index, reason| TrieError::MalformedNode { index, reason };

    let mut level = vec![usize::MAX; nodes.len()];
    level[0] = 0;
    let mut pending = vec![0usize];
    while let Some(index) = pending.pop() {
        let node = &nodes[index];
        if !node.has_children() {
            if node.end != 0 {
                return Err(malformed(index, "child range end without start"));
            }
            continue;
        }
        if node.start > node.end || node.end > nodes.len() {
            return Err(malformed(index, "child range out of bounds"));
        }
        let children = &nodes[node.children()];
        if children.windows(2).any(|w| w[0].label >= w[1].label) {
            return Err(malformed(index, "child labels not strictly ascending"));
        }
        for child in node.children() {
            if level[child] != usize::MAX {
                return Err(malformed(child, "node reachable twice"));
            }
            level[child] = level[index] + 1;
            pending.push(child);
        }
    }

    for (index, node) in nodes.iter().enumerate() {
        if level[index] == usize::MAX {
            return Err(malformed(index, "node unreachable from root"));
        }
        if node.fail >= nodes.len() {
            return Err(malformed(index, "failure index out of bounds"));
        }
        if index != 0 && level[node.fail] >= level[index] {
            return Err(malformed(index, "failure target not shallower than node"));
        }
        if node.edge_id > edge_count {
            return Err(malformed(index, "edge id beyond depth table"));
        }
    }
    Ok(())
}
