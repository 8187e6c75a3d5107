//! Grouping and delta encoding of the event arena.
//!
//! The input keeps each actor's trail as a reverse-linked list anchored at
//! the actor's last event. The grouper materializes the forward order
//! once: it walks every chain, sorts each actor's events by timestamp,
//! delta-encodes the timestamps, and spills the result as a flat record
//! stream so downstream passes never revisit the back-links.
//!
//! The encoded timestamp carries the record's validity in its low byte:
//! `0` means valid (the delta sits in the upper 24 bits), `1` marks a
//! record whose delta exceeded the encodable range. Invalid records are
//! skipped by every downstream encoder but still consume a record slot.

use crate::input::Event;
use std::io::Write;
use trailpack_core::error::{Result, TrailError};

/// Largest encodable timestamp delta (24 bits).
pub const MAX_TIMESTAMP_DELTA: u32 = (1 << 24) - 1;

/// Largest tolerated ratio of invalid records to total records.
pub const MAX_INVALID_RATIO: f64 = 0.005;

/// Low-byte marker of an invalid record.
pub const INVALID_MARKER: u32 = 1;

/// Size of one serialized grouped record.
pub const GROUPED_RECORD_SIZE: usize = 20;

/// One record of the grouped intermediate file.
///
/// Records of the same actor are contiguous and sorted ascending by
/// original timestamp; `timestamp` holds the encoded delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupedRecord {
    /// Dense actor id.
    pub cookie_id: u32,
    /// Index of the event's first item in the item arena.
    pub item_zero: u64,
    /// Number of items belonging to the event.
    pub num_items: u32,
    /// Encoded timestamp: `delta << 8`, or `1` for an invalid record.
    pub timestamp: u32,
}

impl GroupedRecord {
    /// True unless the record's delta exceeded the encodable range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.timestamp & 0xFF == 0
    }

    /// The timestamp delta of a valid record.
    #[inline]
    pub fn delta(&self) -> u32 {
        self.timestamp >> 8
    }

    /// Serialize to the on-disk layout (little-endian).
    pub fn to_bytes(&self) -> [u8; GROUPED_RECORD_SIZE] {
        let mut buf = [0u8; GROUPED_RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.cookie_id.to_le_bytes());
        buf[4..12].copy_from_slice(&self.item_zero.to_le_bytes());
        buf[12..16].copy_from_slice(&self.num_items.to_le_bytes());
        buf[16..20].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Deserialize from the on-disk layout.
    pub fn from_bytes(buf: &[u8; GROUPED_RECORD_SIZE]) -> Self {
        Self {
            cookie_id: u32::from_le_bytes(buf[0..4].try_into().expect("4 bytes")),
            item_zero: u64::from_le_bytes(buf[4..12].try_into().expect("8 bytes")),
            num_items: u32::from_le_bytes(buf[12..16].try_into().expect("4 bytes")),
            timestamp: u32::from_le_bytes(buf[16..20].try_into().expect("4 bytes")),
        }
    }
}

/// Statistics produced by grouping.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupStats {
    /// Largest valid timestamp delta seen.
    pub max_timestamp_delta: u32,
    /// Number of records marked invalid.
    pub invalid_records: u64,
    /// Total number of records written.
    pub total_records: u64,
}

/// Minimum and maximum timestamp over the event arena.
///
/// An empty arena yields `(u32::MAX, 0)`; callers pass non-empty input, so
/// that edge is a documented convention rather than a runtime error.
pub fn timestamp_range(events: &[Event]) -> (u32, u32) {
    let mut min_ts = u32::MAX;
    let mut max_ts = 0;
    for ev in events {
        min_ts = min_ts.min(ev.timestamp);
        max_ts = max_ts.max(ev.timestamp);
    }
    (min_ts, max_ts)
}

/// Group, sort and delta-encode all trails into `sink`.
///
/// For each actor the back-link chain is walked into a scratch buffer,
/// stable-sorted by timestamp (ties keep walk order), delta-encoded
/// against a running previous timestamp seeded with `base_timestamp`, and
/// appended to `sink`. A delta that does not fit 24 bits yields an invalid
/// record and does not advance the previous timestamp.
///
/// Fails with [`TrailError::TooManyInvalid`] when the invalid ratio over
/// all written records exceeds [`MAX_INVALID_RATIO`].
pub fn group_events<W: Write>(
    events: &[Event],
    cookie_pointers: &[u64],
    base_timestamp: u32,
    sink: &mut W,
) -> Result<GroupStats> {
    let mut stats = GroupStats::default();
    // Scratch holds (original timestamp, item_zero, num_items); reused and
    // never shrunk across actors.
    let mut scratch: Vec<(u32, u64, u32)> = Vec::new();

    for (cookie_id, &anchor) in cookie_pointers.iter().enumerate() {
        scratch.clear();
        let mut idx = anchor;
        loop {
            let ev = &events[idx as usize];
            scratch.push((ev.timestamp, ev.item_zero, ev.num_items));
            if ev.prev_event_idx == 0 {
                break;
            }
            idx = ev.prev_event_idx - 1;
        }

        scratch.sort_by_key(|&(ts, _, _)| ts);

        let mut prev_ts = base_timestamp;
        for &(ts, item_zero, num_items) in scratch.iter() {
            let delta = ts.wrapping_sub(prev_ts);
            let encoded = if delta <= MAX_TIMESTAMP_DELTA {
                stats.max_timestamp_delta = stats.max_timestamp_delta.max(delta);
                prev_ts = ts;
                delta << 8
            } else {
                stats.invalid_records += 1;
                INVALID_MARKER
            };
            let record = GroupedRecord {
                cookie_id: cookie_id as u32,
                item_zero,
                num_items,
                timestamp: encoded,
            };
            sink.write_all(&record.to_bytes())?;
            stats.total_records += 1;
        }
    }

    if stats.total_records > 0 {
        let ratio = stats.invalid_records as f64 / stats.total_records as f64;
        if ratio > MAX_INVALID_RATIO {
            return Err(TrailError::too_many_invalid(
                stats.invalid_records,
                stats.total_records,
            ));
        }
    }
    Ok(stats)
}

/// Read back one grouped record from a stream.
pub fn read_record<R: std::io::Read>(reader: &mut R) -> Result<GroupedRecord> {
    let mut buf = [0u8; GROUPED_RECORD_SIZE];
    reader.read_exact(&mut buf)?;
    Ok(GroupedRecord::from_bytes(&buf))
}
