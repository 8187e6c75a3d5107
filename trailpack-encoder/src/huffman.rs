//! Canonical Huffman codebook over grams, field stats and serialization.
//!
//! The codebook maps grams to canonical prefix codes of at most 32 bits.
//! On the wire every symbol starts with a 1-bit discriminator: `1` is
//! followed by a codebook code, `0` escapes to a fixed-width literal (the
//! field id, then the value id in the field's stats width). A bigram that
//! carries no codebook entry degrades to its two items encoded
//! independently, so the stream stays decodable whatever the codebook
//! contains.
//!
//! Construction is deterministic: entries are sorted by (frequency, gram)
//! before the tree build and by (length, gram) for canonical assignment,
//! so the same frequencies always yield the same codebook.

use std::collections::HashMap;
use std::io::{Read, Write};
use trailpack_core::bitstream::{BitBuffer, bits_needed};
use trailpack_core::error::{Result, TrailError};
use trailpack_core::item::{field_of, gram_first, gram_second, is_bigram, unigram, value_of};

/// Maximum code length in bits.
pub const MAX_CODE_LENGTH: u8 = 32;

/// Maximum number of codebook entries; rarer grams take the escape path.
pub const CODEBOOK_MAX_ENTRIES: usize = 65536;

/// Codebook file magic.
pub const CODEBOOK_MAGIC: [u8; 4] = *b"TPCB";

/// Codebook file format version.
pub const CODEBOOK_VERSION: u32 = 1;

/// One canonical code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    /// The code bits, MSB-aligned to `length` (value `< 2^length`).
    pub bits: u32,
    /// Code length in bits, `1..=32`.
    pub length: u8,
}

/// A gram-to-code mapping.
#[derive(Debug, Default)]
pub struct CodeMap {
    codes: HashMap<u64, Code>,
}

impl CodeMap {
    /// Build a canonical codebook from gram frequencies.
    ///
    /// Keeps the [`CODEBOOK_MAX_ENTRIES`] most frequent grams; the rest
    /// fall back to escape literals at encode time.
    pub fn build(freqs: &HashMap<u64, u64>) -> Result<Self> {
        let mut entries: Vec<(u64, u64)> = freqs
            .iter()
            .filter(|&(_, &f)| f > 0)
            .map(|(&g, &f)| (g, f))
            .collect();
        if entries.is_empty() {
            return Ok(Self::default());
        }
        // Most frequent first for the cap, then ascending for the build.
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(CODEBOOK_MAX_ENTRIES);
        entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let lengths = code_lengths(&entries)?;
        Ok(Self::from_lengths(
            entries.iter().map(|&(g, _)| g).zip(lengths),
        ))
    }

    /// Assemble a codebook from (gram, length) pairs via canonical
    /// assignment in (length, gram) order.
    fn from_lengths(pairs: impl IntoIterator<Item = (u64, u8)>) -> Self {
        let mut sorted: Vec<(u64, u8)> = pairs.into_iter().collect();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut codes = HashMap::with_capacity(sorted.len());
        let mut next_code = 0u64;
        let mut prev_len = 0u8;
        for (gram, len) in sorted {
            next_code <<= len - prev_len;
            codes.insert(
                gram,
                Code {
                    bits: next_code as u32,
                    length: len,
                },
            );
            next_code += 1;
            prev_len = len;
        }
        Self { codes }
    }

    /// Look up the code for a gram.
    #[inline]
    pub fn get(&self, gram: u64) -> Option<Code> {
        self.codes.get(&gram).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if the codebook has no entries.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over `(gram, code)` entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Code)> + '_ {
        self.codes.iter().map(|(&g, &c)| (g, c))
    }

    /// Serialize: magic, version, entry count, then entries sorted by
    /// (length, gram) as `gram: u64`, `code: u32`, `length: u8`, all
    /// little-endian.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut entries: Vec<(u64, Code)> = self.iter().collect();
        entries.sort_by(|a, b| a.1.length.cmp(&b.1.length).then(a.0.cmp(&b.0)));

        writer.write_all(&CODEBOOK_MAGIC)?;
        writer.write_all(&CODEBOOK_VERSION.to_le_bytes())?;
        writer.write_all(&(entries.len() as u32).to_le_bytes())?;
        for (gram, code) in entries {
            writer.write_all(&gram.to_le_bytes())?;
            writer.write_all(&code.bits.to_le_bytes())?;
            writer.write_all(&[code.length])?;
        }
        Ok(())
    }

    /// Read back a serialized codebook.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;
        if header[0..4] != CODEBOOK_MAGIC {
            return Err(TrailError::invalid_input("bad codebook magic"));
        }
        let version = u32::from_le_bytes(header[4..8].try_into().expect("4 bytes"));
        if version != CODEBOOK_VERSION {
            return Err(TrailError::invalid_input(format!(
                "unsupported codebook version {version}"
            )));
        }
        let count = u32::from_le_bytes(header[8..12].try_into().expect("4 bytes"));

        let mut codes = HashMap::with_capacity(count as usize);
        let mut entry = [0u8; 13];
        for _ in 0..count {
            reader.read_exact(&mut entry)?;
            let gram = u64::from_le_bytes(entry[0..8].try_into().expect("8 bytes"));
            let bits = u32::from_le_bytes(entry[8..12].try_into().expect("4 bytes"));
            let length = entry[12];
            if length == 0 || length > MAX_CODE_LENGTH {
                return Err(TrailError::invalid_input(format!(
                    "codebook entry with length {length}"
                )));
            }
            codes.insert(gram, Code { bits, length });
        }
        Ok(Self { codes })
    }
}

/// Code lengths for entries sorted ascending by (frequency, gram).
///
/// Two-queue Huffman merge, lengths limited to [`MAX_CODE_LENGTH`] with an
/// integer Kraft repair pass.
fn code_lengths(entries: &[(u64, u64)]) -> Result<Vec<u8>> {
    let n = entries.len();
    if n == 1 {
        return Ok(vec![1]);
    }

    // weights[0..n] are the sorted leaves, internal nodes are appended.
    let mut weights: Vec<u64> = entries.iter().map(|&(_, f)| f).collect();
    let mut parent = vec![usize::MAX; 2 * n - 1];
    let mut leaf_head = 0usize;
    let mut node_head = n;
    for next in n..2 * n - 1 {
        let mut total = 0u64;
        for _ in 0..2 {
            // Prefer the leaf queue on ties; both queues are ascending.
            let pick = if leaf_head < n
                && (node_head >= weights.len() || weights[leaf_head] <= weights[node_head])
            {
                let i = leaf_head;
                leaf_head += 1;
                i
            } else {
                let i = node_head;
                node_head += 1;
                i
            };
            parent[pick] = next;
            total = total.saturating_add(weights[pick]);
        }
        weights.push(total);
    }

    let mut lengths = vec![0u8; n];
    for (i, len) in lengths.iter_mut().enumerate() {
        let mut node = i;
        while parent[node] != usize::MAX {
            node = parent[node];
            *len += 1;
        }
    }

    if lengths.iter().any(|&l| l > MAX_CODE_LENGTH) {
        for l in lengths.iter_mut() {
            *l = (*l).min(MAX_CODE_LENGTH);
        }
        // Integer Kraft repair: terms are 2^(MAX-len); the sum must not
        // exceed 2^MAX. Lengthening the shortest (most frequent) code
        // sheds the most weight per step and cannot push it past MAX
        // while any over-subscription remains.
        let target = 1u64 << MAX_CODE_LENGTH;
        let mut sum: u64 = lengths
            .iter()
            .map(|&l| 1u64 << (MAX_CODE_LENGTH - l))
            .sum();
        while sum > target {
            let shortest = (0..n)
                .filter(|&i| lengths[i] < MAX_CODE_LENGTH)
                .min_by_key(|&i| lengths[i])
                .ok_or_else(|| {
                    TrailError::codebook_build("cannot limit code lengths to 32 bits")
                })?;
            sum -= 1u64 << (MAX_CODE_LENGTH - lengths[shortest] - 1);
            lengths[shortest] += 1;
        }
    }
    Ok(lengths)
}

/// Per-field bit widths for escape literals.
#[derive(Debug, Clone)]
pub struct FieldStats {
    widths: Vec<u8>,
    field_bits: u8,
}

impl FieldStats {
    /// Compute widths from field cardinalities and the largest timestamp
    /// delta (field 0 literals hold deltas, not value ids).
    pub fn new(field_cardinalities: &[u64], num_fields: u32, max_timestamp_delta: u32) -> Self {
        let mut widths = vec![0u8; num_fields as usize];
        widths[0] = bits_needed(max_timestamp_delta as u64);
        for f in 1..num_fields as usize {
            widths[f] = bits_needed(field_cardinalities[f]);
        }
        Self {
            widths,
            field_bits: bits_needed(num_fields as u64 - 1),
        }
    }

    /// Width of a literal value for `field`.
    #[inline]
    pub fn value_bits(&self, field: u32) -> u8 {
        self.widths[field as usize]
    }

    /// Width of the field id preceding a literal value.
    #[inline]
    pub fn field_bits(&self) -> u8 {
        self.field_bits
    }
}

/// Reverse the low `length` bits of `code`.
///
/// Canonical codes compare MSB-first; the trail stream is LSB-first, so
/// codes are written bit-reversed to arrive MSB-first on the wire.
#[inline]
pub fn reverse_bits(mut code: u32, length: u8) -> u32 {
    let mut reversed = 0u32;
    for _ in 0..length {
        reversed = (reversed << 1) | (code & 1);
        code >>= 1;
    }
    reversed
}

/// Huffman-encode one event's grams into the trail bit buffer.
pub fn encode_grams(codemap: &CodeMap, grams: &[u64], buf: &mut BitBuffer, fstats: &FieldStats) {
    for &gram in grams {
        if let Some(code) = codemap.get(gram) {
            buf.write_bits(1, 1);
            buf.write_bits(reverse_bits(code.bits, code.length), code.length);
        } else if is_bigram(gram) {
            encode_item(codemap, gram_first(gram), buf, fstats);
            encode_item(codemap, gram_second(gram), buf, fstats);
        } else {
            encode_item(codemap, gram_first(gram), buf, fstats);
        }
    }
}

fn encode_item(codemap: &CodeMap, item: u64, buf: &mut BitBuffer, fstats: &FieldStats) {
    if let Some(code) = codemap.get(unigram(item)) {
        buf.write_bits(1, 1);
        buf.write_bits(reverse_bits(code.bits, code.length), code.length);
    } else {
        buf.write_bits(0, 1);
        let field = field_of(item);
        buf.write_bits(field, fstats.field_bits());
        buf.write_bits(value_of(item), fstats.value_bits(field));
    }
}
