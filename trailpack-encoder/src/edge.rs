//! Edge encoding: emit only the items whose field value changed.
//!
//! Within one actor's trail, consecutive events tend to repeat most field
//! values. The edge encoder keeps a per-field vector of the last emitted
//! item and outputs only the items that differ from it, resetting at actor
//! boundaries so the first event of every trail emits all of its items.

use crate::grouper::GroupedRecord;
use trailpack_core::item::field_of;

/// Per-actor edge-encoding state.
#[derive(Debug)]
pub struct EdgeEncoder {
    /// Last emitted item per field; all zeros at an actor boundary.
    prev_items: Vec<u64>,
}

impl EdgeEncoder {
    /// Create state for `num_fields` fields.
    pub fn new(num_fields: u32) -> Self {
        Self {
            prev_items: vec![0; num_fields as usize],
        }
    }

    /// Reset at an actor boundary.
    pub fn reset(&mut self) {
        self.prev_items.fill(0);
    }

    /// Edge-encode one grouped record into `out`.
    ///
    /// Invalid records produce an empty output. For a valid record the
    /// synthesized timestamp item (the encoded delta is itself the field-0
    /// item) is emitted unconditionally, so every event's delta is
    /// recoverable and every event starts with a field-0 gram; the event's
    /// own items follow, filtered down to those whose field value changed.
    pub fn encode(&mut self, items: &[u64], record: &GroupedRecord, out: &mut Vec<u64>) {
        out.clear();
        if !record.is_valid() {
            return;
        }

        let ts_item = record.timestamp as u64;
        out.push(ts_item);
        self.prev_items[0] = ts_item;

        let start = record.item_zero as usize;
        let end = start + record.num_items as usize;
        for &it in &items[start..end] {
            let field = field_of(it) as usize;
            if self.prev_items[field] != it {
                out.push(it);
                self.prev_items[field] = it;
            }
        }
    }
}
