//! Trail emission: the third pass over the grouped file.
//!
//! `trails.data` starts with a table of contents of `num_cookies + 1`
//! little-endian `u32` byte offsets (the last entry is one past the end,
//! so `len(c) = toc[c + 1] - toc[c]`), followed by one bit-packed trail
//! per actor. Each trail leads with a 3-bit residual naming the unused
//! trailing bits of its last byte, then the Huffman-coded grams of its
//! events in order.
//!
//! All offsets are 32-bit by format definition. A corpus that would push
//! the file past that limit fails the encode rather than rolling over.

use crate::edge::EdgeEncoder;
use crate::grams::GramTable;
use crate::grouper::{GroupedRecord, read_record};
use crate::huffman::{CodeMap, FieldStats, encode_grams};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use trailpack_core::bitstream::BitBuffer;
use trailpack_core::error::{Result, TrailError};

/// Offsets must stay strictly below this.
pub const MAX_TRAILS_OFFSET: u64 = u32::MAX as u64;

/// Number of bits in the per-trail length residual.
const RESIDUAL_BITS: u8 = 3;

/// Write `trails.data` from the grouped stream.
///
/// `grouped` must be positioned at the start of the grouped file and
/// carry exactly `num_events` records in actor order.
#[allow(clippy::too_many_arguments)]
pub fn write_trails<R: Read>(
    path: &Path,
    grouped: &mut R,
    num_cookies: u64,
    num_events: u64,
    items: &[u64],
    num_fields: u32,
    codemap: &CodeMap,
    gram_table: &GramTable,
    fstats: &FieldStats,
) -> Result<()> {
    let mut file = File::create(path)?;
    let mut file_offs = 4 * (num_cookies + 1);
    if file_offs >= MAX_TRAILS_OFFSET {
        return Err(TrailError::trails_too_large(file_offs));
    }

    let mut edge = EdgeEncoder::new(num_fields);
    let mut edge_items = Vec::new();
    let mut grams = Vec::new();
    // One trail's bits; cleared and reused across actors.
    let mut buf = BitBuffer::new();
    let mut pending: Option<GroupedRecord> = None;
    let mut events_read = 0u64;

    for cookie_id in 0..num_cookies {
        file.seek(SeekFrom::Start(4 * cookie_id))?;
        file.write_all(&(file_offs as u32).to_le_bytes())?;

        buf.clear();
        buf.write_bits(0, RESIDUAL_BITS);
        edge.reset();

        loop {
            if pending.is_none() && events_read < num_events {
                pending = Some(read_record(grouped)?);
                events_read += 1;
            }
            match pending {
                Some(record) if record.cookie_id as u64 == cookie_id => {
                    pending = None;
                    edge.encode(items, &record, &mut edge_items);
                    if !edge_items.is_empty() {
                        gram_table.choose_grams(&edge_items, &mut grams);
                        encode_grams(codemap, &grams, &mut buf, fstats);
                    }
                }
                _ => break,
            }
        }

        let offs = buf.bit_len();
        let residual = if offs % 8 != 0 { 8 - (offs % 8) as u32 } else { 0 };
        buf.patch_bits(0, residual, RESIDUAL_BITS);

        let trail = buf.as_bytes();
        file.seek(SeekFrom::Start(file_offs))?;
        file.write_all(trail)?;
        file_offs += trail.len() as u64;
        if file_offs >= MAX_TRAILS_OFFSET {
            return Err(TrailError::trails_too_large(file_offs));
        }
    }

    file.seek(SeekFrom::Start(4 * num_cookies))?;
    file.write_all(&(file_offs as u32).to_le_bytes())?;
    file.flush()?;
    Ok(())
}
