//! # trailpack core
//!
//! Core components for the trailpack trail encoder:
//!
//! - [`bitstream`]: LSB-first bit I/O ([`BitBuffer`], [`BitReader`])
//! - [`item`]: packed `(field, value)` items and unigram/bigram grams
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! trailpack is layered: this crate is the bottom layer, the encoder
//! pipeline (`trailpack-encoder`) sits on top of it, and the CLI drives
//! the encoder.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ trailpack-cli                                 │
//! │     encode / info subcommands                 │
//! ├───────────────────────────────────────────────┤
//! │ trailpack-encoder                             │
//! │     grouping, edge encoding, gram selection,  │
//! │     Huffman codebook, trail emission          │
//! ├───────────────────────────────────────────────┤
//! │ trailpack-core (this crate)                   │
//! │     BitBuffer/BitReader, items, errors        │
//! └───────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitstream;
pub mod error;
pub mod item;

// Re-exports for convenience
pub use bitstream::{BitBuffer, BitReader, bits_needed};
pub use error::{Result, TrailError};
