//! Unigram frequency analysis and bigram selection.
//!
//! Two streaming passes over the grouped file feed the codebook. The first
//! tallies every edge-encoded item (unigrams). The second counts adjacent
//! field-disjoint item pairs as bigram candidates and selects the pairs
//! that co-occur often enough to be worth a joint code, greedily by
//! descending `count / (freq(a) + freq(b))`.
//!
//! Candidates are restricted to *adjacent* pairs in edge-encoded order.
//! This keeps candidate counting linear per event and, more importantly,
//! makes the per-event covering order-preserving: expanding the chosen
//! grams left to right reproduces the items in their original order, with
//! the timestamp item first.

use crate::edge::EdgeEncoder;
use crate::grouper::{GroupedRecord, read_record};
use std::collections::HashMap;
use std::io::Read;
use trailpack_core::error::Result;
use trailpack_core::item::{bigram, field_of, gram_first, gram_second, unigram};

/// Minimum co-occurrence count before a bigram is considered.
pub const MIN_BIGRAM_COUNT: u64 = 8;

/// Minimum `count / (freq(a) + freq(b))` score for a bigram.
pub const MIN_BIGRAM_SCORE: f64 = 0.25;

/// Maximum number of selected bigrams.
pub const MAX_BIGRAMS: usize = 65536;

/// Stream the grouped file once and tally edge-encoded item frequencies.
///
/// `stream` must be positioned at the start of the grouped file; records
/// are read in actor order and the edge state resets at actor boundaries.
pub fn collect_unigrams<R: Read>(
    stream: &mut R,
    num_events: u64,
    items: &[u64],
    num_fields: u32,
) -> Result<HashMap<u64, u64>> {
    let mut freqs = HashMap::new();
    let mut edge = EdgeEncoder::new(num_fields);
    let mut edge_items = Vec::new();
    let mut prev_cookie = None;

    for _ in 0..num_events {
        let record = read_record(stream)?;
        if prev_cookie != Some(record.cookie_id) {
            edge.reset();
            prev_cookie = Some(record.cookie_id);
        }
        edge.encode(items, &record, &mut edge_items);
        for &it in &edge_items {
            *freqs.entry(it).or_insert(0) += 1;
        }
    }
    Ok(freqs)
}

/// The gram frequency table: selected bigrams plus residual unigrams.
#[derive(Debug, Default)]
pub struct GramTable {
    freqs: HashMap<u64, u64>,
    selected: HashMap<u64, u64>,
}

impl GramTable {
    /// Gram frequencies for codebook construction.
    pub fn freqs(&self) -> &HashMap<u64, u64> {
        &self.freqs
    }

    /// Number of selected bigrams.
    pub fn num_bigrams(&self) -> usize {
        self.selected.len()
    }

    /// Cover one edge-encoded item sequence with grams.
    ///
    /// Deterministic left-to-right scan: a selected adjacent pair becomes
    /// a bigram, everything else a unigram. Every item is covered by
    /// exactly one gram, bigrams only pair items of different fields, and
    /// the first gram carries the timestamp item.
    pub fn choose_grams(&self, edge_items: &[u64], out: &mut Vec<u64>) {
        out.clear();
        let mut i = 0;
        while i < edge_items.len() {
            if i + 1 < edge_items.len() {
                let a = edge_items[i];
                let b = edge_items[i + 1];
                if field_of(a) != field_of(b) {
                    let key = bigram(a, b);
                    if self.selected.contains_key(&key) {
                        out.push(key);
                        i += 2;
                        continue;
                    }
                }
            }
            out.push(unigram(edge_items[i]));
            i += 1;
        }
    }
}

/// Stream the grouped file a second time and build the gram table.
///
/// Counts adjacent field-disjoint pairs per event, then selects bigrams
/// greedily by descending score until the count, score or table cap stops
/// it. The resulting frequency table seeds every selected bigram with its
/// co-occurrence count and debits that count from its items' unigram
/// frequencies (floored at 1, so every item keeps a codebook entry).
pub fn make_grams<R: Read>(
    stream: &mut R,
    num_events: u64,
    items: &[u64],
    num_fields: u32,
    unigram_freqs: &HashMap<u64, u64>,
) -> Result<GramTable> {
    let mut candidates: HashMap<u64, u64> = HashMap::new();
    let mut edge = EdgeEncoder::new(num_fields);
    let mut edge_items = Vec::new();
    let mut prev_cookie = None;

    for _ in 0..num_events {
        let record = read_record(stream)?;
        if prev_cookie != Some(record.cookie_id) {
            edge.reset();
            prev_cookie = Some(record.cookie_id);
        }
        edge.encode(items, &record, &mut edge_items);
        for pair in edge_items.windows(2) {
            if field_of(pair[0]) != field_of(pair[1]) {
                *candidates.entry(bigram(pair[0], pair[1])).or_insert(0) += 1;
            }
        }
    }

    // Score and rank candidates; the sort key makes selection
    // deterministic regardless of hash order.
    let mut ranked: Vec<(u64, u64, f64)> = candidates
        .into_iter()
        .filter(|&(_, count)| count >= MIN_BIGRAM_COUNT)
        .map(|(gram, count)| {
            let a = unigram_freqs.get(&gram_first(gram)).copied().unwrap_or(1);
            let b = unigram_freqs.get(&gram_second(gram)).copied().unwrap_or(1);
            let score = count as f64 / (a + b) as f64;
            (gram, count, score)
        })
        .filter(|&(_, _, score)| score >= MIN_BIGRAM_SCORE)
        .collect();
    ranked.sort_by(|x, y| {
        y.2.partial_cmp(&x.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(y.1.cmp(&x.1))
            .then(x.0.cmp(&y.0))
    });
    ranked.truncate(MAX_BIGRAMS);

    let mut table = GramTable {
        freqs: unigram_freqs
            .iter()
            .map(|(&it, &f)| (unigram(it), f))
            .collect(),
        selected: HashMap::with_capacity(ranked.len()),
    };
    for &(gram, count, _) in &ranked {
        table.selected.insert(gram, count);
        table.freqs.insert(gram, count);
        for it in [gram_first(gram), gram_second(gram)] {
            if let Some(f) = table.freqs.get_mut(&unigram(it)) {
                *f = f.saturating_sub(count).max(1);
            }
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::GROUPED_RECORD_SIZE;
    use trailpack_core::item::{gram_first, gram_second, is_bigram, item};

    /// Serialize single-actor records over `items`, one event per entry of
    /// `(delta, item_zero, num_items)`.
    fn stream_of(events: &[(u32, u64, u32)]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(events.len() * GROUPED_RECORD_SIZE);
        for &(delta, item_zero, num_items) in events {
            let rec = GroupedRecord {
                cookie_id: 0,
                item_zero,
                num_items,
                timestamp: delta << 8,
            };
            buf.extend_from_slice(&rec.to_bytes());
        }
        buf
    }

    #[test]
    fn test_unigram_conservation() {
        // Each event emits ts item + its one (changing) field item.
        let items: Vec<u64> = (1..=4).map(|v| item(1, v)).collect();
        let events: Vec<(u32, u64, u32)> = (0..4).map(|i| (10, i as u64, 1)).collect();
        let data = stream_of(&events);

        let freqs = collect_unigrams(&mut &data[..], 4, &items, 2).unwrap();
        let total: u64 = freqs.values().sum();
        // 4 timestamp items + 4 field items.
        assert_eq!(total, 8);
        assert_eq!(freqs[&item(0, 10)], 4);
    }

    #[test]
    fn test_bigram_selected_when_cooccurring() {
        // 16 single-event actors, all with delta 5 and the same field-1
        // value: the (timestamp, field-1) pair co-occurs on every event.
        let items = vec![item(1, 3)];
        let mut data = Vec::new();
        for i in 0..16u32 {
            let rec = GroupedRecord {
                cookie_id: i,
                item_zero: 0,
                num_items: 1,
                timestamp: 5 << 8,
            };
            data.extend_from_slice(&rec.to_bytes());
        }

        let unigrams = collect_unigrams(&mut &data[..], 16, &items, 2).unwrap();
        let table = make_grams(&mut &data[..], 16, &items, 2, &unigrams).unwrap();

        assert_eq!(table.num_bigrams(), 1);
        let mut out = Vec::new();
        table.choose_grams(&[item(0, 5), item(1, 3)], &mut out);
        assert_eq!(out.len(), 1);
        assert!(is_bigram(out[0]));
        assert_eq!(gram_first(out[0]), item(0, 5));
        assert_eq!(gram_second(out[0]), item(1, 3));
    }

    #[test]
    fn test_rare_pairs_stay_unigrams() {
        let items = vec![item(1, 7)];
        let events = vec![(0u32, 0u64, 1u32)];
        let data = stream_of(&events);

        let unigrams = collect_unigrams(&mut &data[..], 1, &items, 2).unwrap();
        let table = make_grams(&mut &data[..], 1, &items, 2, &unigrams).unwrap();

        assert_eq!(table.num_bigrams(), 0);
        let mut out = Vec::new();
        table.choose_grams(&[item(0, 0), item(1, 7)], &mut out);
        assert_eq!(out, vec![unigram(item(0, 0)), unigram(item(1, 7))]);
    }

    #[test]
    fn test_covering_is_exact_and_ordered() {
        let table = GramTable::default();
        let edge_items = vec![item(0, 1), item(1, 2), item(2, 3), item(3, 4)];
        let mut out = Vec::new();
        table.choose_grams(&edge_items, &mut out);

        // No selected bigrams: one unigram per item, in order.
        let expanded: Vec<u64> = out
            .iter()
            .flat_map(|&g| {
                if is_bigram(g) {
                    vec![gram_first(g), gram_second(g)]
                } else {
                    vec![gram_first(g)]
                }
            })
            .collect();
        assert_eq!(expanded, edge_items);
    }

    #[test]
    fn test_covering_never_pairs_same_field() {
        let mut table = GramTable::default();
        // Force-select a bigram, then feed a same-field adjacency.
        table.selected.insert(bigram(item(1, 1), item(2, 2)), 100);
        let edge_items = vec![item(1, 1), item(1, 5), item(2, 2)];
        let mut out = Vec::new();
        table.choose_grams(&edge_items, &mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|&g| !is_bigram(g)));
    }

    #[test]
    fn test_empty_event_covering() {
        let table = GramTable::default();
        let mut out = vec![1, 2, 3];
        table.choose_grams(&[], &mut out);
        assert!(out.is_empty());
    }
}
