//! The packed event graph the encoder consumes, and a builder for it.
//!
//! The encoder input is a flat arena: one `events` array, one `items`
//! array, and one back-link index per actor. Per-actor trails are
//! represented as reverse-linked lists anchored at the actor's *last*
//! event: `cookie_pointers[c]` is the index of that event, and each
//! event's `prev_event_idx` is either `0` (no predecessor) or `1 +` the
//! index of the previous event of the same actor. Events of different
//! actors may be freely interleaved in the arena.

use std::collections::HashMap;
use trailpack_core::error::{Result, TrailError};
use trailpack_core::item;

/// One event in the input arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Absolute timestamp.
    pub timestamp: u32,
    /// Index of the event's first item in the item arena.
    pub item_zero: u64,
    /// Number of items belonging to this event.
    pub num_items: u32,
    /// `0`, or `1 +` the index of the actor's previous event.
    pub prev_event_idx: u64,
}

/// The packed encoder input: events, items and per-actor anchors.
#[derive(Debug, Clone, Default)]
pub struct EventGraph {
    /// Per actor, the index of the actor's last event.
    pub cookie_pointers: Vec<u64>,
    /// The event arena.
    pub events: Vec<Event>,
    /// The item arena; events reference contiguous slices of it.
    pub items: Vec<u64>,
    /// Number of fields, timestamp field included.
    pub num_fields: u32,
    /// Per field, the maximum value id in use. Entry 0 (timestamp) is 0.
    pub field_cardinalities: Vec<u64>,
}

impl EventGraph {
    /// Number of actors.
    pub fn num_cookies(&self) -> u64 {
        self.cookie_pointers.len() as u64
    }

    /// Number of events.
    pub fn num_events(&self) -> u64 {
        self.events.len() as u64
    }
}

/// Incremental constructor for an [`EventGraph`].
///
/// Collects `(cookie, timestamp, field values)` triples in arrival order.
/// Cookies are interned to dense actor ids in first-seen order; string
/// values are interned per field to value ids starting at 1 (0 is the null
/// value and is never stored as an item). `finish` yields the packed graph
/// with back-links wired the way the encoder expects.
#[derive(Debug)]
pub struct EventGraphBuilder {
    field_names: Vec<String>,
    lexicons: Vec<HashMap<String, u32>>,
    cookies: HashMap<String, u32>,
    /// Per actor: `1 +` index of the actor's last event, `0` if none.
    last_event: Vec<u64>,
    events: Vec<Event>,
    items: Vec<u64>,
}

impl EventGraphBuilder {
    /// Create a builder for the given non-timestamp field names.
    ///
    /// The timestamp field is implicit, so at most 255 names are accepted.
    pub fn new<S: Into<String>>(field_names: impl IntoIterator<Item = S>) -> Result<Self> {
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        if field_names.len() + 1 > item::MAX_FIELDS as usize {
            return Err(TrailError::invalid_input(format!(
                "{} fields exceed the maximum of {}",
                field_names.len(),
                item::MAX_FIELDS - 1
            )));
        }
        let lexicons = field_names.iter().map(|_| HashMap::new()).collect();
        Ok(Self {
            field_names,
            lexicons,
            cookies: HashMap::new(),
            last_event: Vec::new(),
            events: Vec::new(),
            items: Vec::new(),
        })
    }

    /// The non-timestamp field names, in field-id order (field 1 first).
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of events added so far.
    pub fn num_events(&self) -> u64 {
        self.events.len() as u64
    }

    /// Add one event.
    ///
    /// `values[i]` belongs to field `i + 1`; an empty string is the null
    /// value and contributes no item. Missing trailing values are null.
    pub fn add_event(&mut self, cookie: &str, timestamp: u32, values: &[&str]) -> Result<()> {
        if values.len() > self.field_names.len() {
            return Err(TrailError::invalid_input(format!(
                "event carries {} values but only {} fields are declared",
                values.len(),
                self.field_names.len()
            )));
        }

        let num_cookies = self.cookies.len() as u32;
        let cookie_id = *self.cookies.entry(cookie.to_string()).or_insert(num_cookies);
        if cookie_id as usize == self.last_event.len() {
            self.last_event.push(0);
        }

        let item_zero = self.items.len() as u64;
        for (i, &value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let field = i as u32 + 1;
            let lexicon = &mut self.lexicons[i];
            let next_id = lexicon.len() as u32 + 1;
            if next_id > item::MAX_VALUE && !lexicon.contains_key(value) {
                return Err(TrailError::invalid_input(format!(
                    "field '{}' exceeds {} distinct values",
                    self.field_names[i],
                    item::MAX_VALUE
                )));
            }
            let value_id = *lexicon.entry(value.to_string()).or_insert(next_id);
            self.items.push(item::item(field, value_id));
        }

        let idx = self.events.len() as u64;
        self.events.push(Event {
            timestamp,
            item_zero,
            num_items: (self.items.len() as u64 - item_zero) as u32,
            prev_event_idx: self.last_event[cookie_id as usize],
        });
        self.last_event[cookie_id as usize] = idx + 1;
        Ok(())
    }

    /// Finish construction and yield the packed graph.
    pub fn finish(self) -> EventGraph {
        let num_fields = self.field_names.len() as u32 + 1;
        let mut field_cardinalities = vec![0u64; num_fields as usize];
        for (i, lexicon) in self.lexicons.iter().enumerate() {
            field_cardinalities[i + 1] = lexicon.len() as u64;
        }
        // last_event entries are biased by 1 and every interned cookie has
        // at least one event, so the subtraction cannot underflow.
        let cookie_pointers = self.last_event.iter().map(|&e| e - 1).collect();
        EventGraph {
            cookie_pointers,
            events: self.events,
            items: self.items,
            num_fields,
            field_cardinalities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailpack_core::item::{field_of, value_of};

    #[test]
    fn test_builder_interning() {
        let mut b = EventGraphBuilder::new(["author", "channel"]).unwrap();
        b.add_event("alice", 100, &["alice", "dev"]).unwrap();
        b.add_event("bob", 110, &["bob", "dev"]).unwrap();
        b.add_event("alice", 120, &["alice", "ops"]).unwrap();
        let graph = b.finish();

        assert_eq!(graph.num_cookies(), 2);
        assert_eq!(graph.num_events(), 3);
        assert_eq!(graph.num_fields, 3);
        // Two authors, two channels.
        assert_eq!(graph.field_cardinalities, vec![0, 2, 2]);

        // alice's trail: event 2 links back to event 0.
        assert_eq!(graph.cookie_pointers[0], 2);
        assert_eq!(graph.events[2].prev_event_idx, 1);
        assert_eq!(graph.events[0].prev_event_idx, 0);
        // bob's trail is a single event.
        assert_eq!(graph.cookie_pointers[1], 1);
        assert_eq!(graph.events[1].prev_event_idx, 0);
    }

    #[test]
    fn test_builder_null_values() {
        let mut b = EventGraphBuilder::new(["a", "b"]).unwrap();
        b.add_event("c", 1, &["", "x"]).unwrap();
        b.add_event("c", 2, &["y"]).unwrap();
        let graph = b.finish();

        assert_eq!(graph.events[0].num_items, 1);
        assert_eq!(field_of(graph.items[0]), 2);
        assert_eq!(graph.events[1].num_items, 1);
        assert_eq!(field_of(graph.items[1]), 1);
        assert_eq!(value_of(graph.items[1]), 1);
    }

    #[test]
    fn test_builder_value_ids_start_at_one() {
        let mut b = EventGraphBuilder::new(["f"]).unwrap();
        b.add_event("c", 1, &["first"]).unwrap();
        b.add_event("c", 2, &["second"]).unwrap();
        b.add_event("c", 3, &["first"]).unwrap();
        let graph = b.finish();

        assert_eq!(value_of(graph.items[0]), 1);
        assert_eq!(value_of(graph.items[1]), 2);
        assert_eq!(value_of(graph.items[2]), 1);
        assert_eq!(graph.field_cardinalities[1], 2);
    }

    #[test]
    fn test_builder_rejects_too_many_values() {
        let mut b = EventGraphBuilder::new(["only"]).unwrap();
        let err = b.add_event("c", 1, &["a", "b"]).unwrap_err();
        assert!(matches!(err, TrailError::InvalidInput { .. }));
    }
}
