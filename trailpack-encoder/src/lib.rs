//! # trailpack encoder
//!
//! Builds the compact, immutable on-disk representation of time-ordered
//! event trails: per-actor sequences of categorical events, each carrying
//! a timestamp and a set of `(field, value)` items.
//!
//! The pipeline, in order:
//!
//! 1. [`grouper`]: walk each actor's back-linked event chain, sort by
//!    time, delta-encode timestamps, spill a flat record stream to a
//!    temporary file.
//! 2. [`edge`]: per event, keep only the items whose field value changed
//!    since the actor's previous event.
//! 3. [`grams`]: tally unigram frequencies, then discover bigrams worth a
//!    joint code and cover each event's items with grams.
//! 4. [`huffman`]: build the canonical codebook and per-field literal
//!    widths.
//! 5. [`trails`]: emit one bit-packed trail per actor behind a table of
//!    contents of 32-bit offsets.
//!
//! [`encode`](encode::encode) drives the whole pipeline; the result is
//! three files under the output root: `trails.data`, `trails.codebook`
//! and `info`.
//!
//! ## Example
//!
//! ```no_run
//! use trailpack_encoder::{EventGraphBuilder, encode};
//!
//! let mut builder = EventGraphBuilder::new(["author", "channel"])?;
//! builder.add_event("cookie-1", 1609459200, &["alice", "dev"])?;
//! builder.add_event("cookie-1", 1609459260, &["alice", "ops"])?;
//! builder.add_event("cookie-2", 1609459230, &["bob", "dev"])?;
//! encode(builder.finish(), std::path::Path::new("out"))?;
//! # Ok::<(), trailpack_core::TrailError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge;
pub mod encode;
pub mod grams;
pub mod grouper;
pub mod huffman;
pub mod input;
pub mod meta;
pub mod trails;

// Re-exports for convenience
pub use encode::{CODEBOOK_FILE, INFO_FILE, TRAILS_FILE, encode};
pub use input::{Event, EventGraph, EventGraphBuilder};
pub use meta::EncodeInfo;
