//! The encode orchestrator.
//!
//! Drives the pipeline in fixed order: timestamp range scan, grouping into
//! a temporary file, metadata emission, then three sequential passes over
//! the grouped file (unigram tally, gram building, trail emission),
//! codebook construction in between, and codebook serialization last.
//!
//! The temporary grouped file lives at `<root>/tmp.grouped.<pid>`, is
//! created exclusive-write, and is removed on every exit path by a drop
//! guard. The input event arena is released as soon as grouping has
//! spilled it; peak memory thereafter is proportional to the frequency
//! tables, not to the number of events.

use crate::grams::{collect_unigrams, make_grams};
use crate::grouper::{group_events, timestamp_range};
use crate::huffman::{CodeMap, FieldStats};
use crate::input::EventGraph;
use crate::meta::EncodeInfo;
use crate::trails::write_trails;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use trailpack_core::error::{Result, TrailError};

/// Name of the metadata file under the output root.
pub const INFO_FILE: &str = "info";

/// Name of the trails file under the output root.
pub const TRAILS_FILE: &str = "trails.data";

/// Name of the codebook file under the output root.
pub const CODEBOOK_FILE: &str = "trails.codebook";

/// Read-ahead buffer capacity for the grouped-file passes.
pub const READ_BUFFER_SIZE: usize = 8 << 20;

/// Exclusive temp file removed on drop, success and error paths alike.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn create(path: &Path) -> Result<(Self, File)> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok((
            Self {
                path: path.to_path_buf(),
            },
            file,
        ))
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Encode an event graph into `root/info`, `root/trails.data` and
/// `root/trails.codebook`.
///
/// Consumes the graph; the event arena is dropped once it has been
/// grouped. All failures are fatal to the invocation; partial outputs may
/// remain under `root`, but the temporary grouped file is always removed.
pub fn encode(graph: EventGraph, root: &Path) -> Result<()> {
    let EventGraph {
        cookie_pointers,
        events,
        items,
        num_fields,
        field_cardinalities,
    } = graph;
    if num_fields == 0 || field_cardinalities.len() != num_fields as usize {
        return Err(TrailError::invalid_input(
            "event graph must declare the timestamp field and one cardinality per field",
        ));
    }
    let num_cookies = cookie_pointers.len() as u64;
    let num_events = events.len() as u64;

    let (min_timestamp, max_timestamp) = timestamp_range(&events);

    let tmp_path = root.join(format!("tmp.grouped.{}", std::process::id()));
    let (tmp_guard, tmp_file) = TempFile::create(&tmp_path)?;
    let mut sink = BufWriter::new(tmp_file);
    let stats = group_events(&events, &cookie_pointers, min_timestamp, &mut sink)?;
    sink.flush()?;
    drop(sink);
    drop(events);

    EncodeInfo {
        num_cookies,
        num_events,
        min_timestamp,
        max_timestamp,
        max_timestamp_delta: stats.max_timestamp_delta,
    }
    .write_to(&root.join(INFO_FILE))?;

    let mut grouped = BufReader::with_capacity(READ_BUFFER_SIZE, File::open(&tmp_path)?);
    let unigram_freqs = collect_unigrams(&mut grouped, num_events, &items, num_fields)?;

    grouped.rewind()?;
    let gram_table = make_grams(&mut grouped, num_events, &items, num_fields, &unigram_freqs)?;
    drop(unigram_freqs);

    let codemap = CodeMap::build(gram_table.freqs())?;
    let fstats = FieldStats::new(&field_cardinalities, num_fields, stats.max_timestamp_delta);

    grouped.rewind()?;
    write_trails(
        &root.join(TRAILS_FILE),
        &mut grouped,
        num_cookies,
        num_events,
        &items,
        num_fields,
        &codemap,
        &gram_table,
        &fstats,
    )?;

    let mut codebook = BufWriter::new(File::create(root.join(CODEBOOK_FILE))?);
    codemap.write_to(&mut codebook)?;
    codebook.flush()?;

    drop(tmp_guard);
    Ok(())
}
