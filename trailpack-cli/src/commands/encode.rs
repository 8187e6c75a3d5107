//! Encode command implementation.

use crate::utils::{event_progress, human_bytes};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use trailpack_encoder::{CODEBOOK_FILE, EventGraphBuilder, INFO_FILE, TRAILS_FILE, encode};

/// The input corpus: declared field names plus events in arrival order.
#[derive(Debug, Deserialize)]
struct Corpus {
    /// Non-timestamp field names, field 1 first.
    fields: Vec<String>,
    events: Vec<CorpusEvent>,
}

#[derive(Debug, Deserialize)]
struct CorpusEvent {
    cookie: String,
    timestamp: u32,
    /// One value per declared field; missing or empty values are null.
    #[serde(default)]
    values: Vec<String>,
}

pub fn cmd_encode(
    input: &PathBuf,
    output: &PathBuf,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let corpus: Corpus = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let num_events = corpus.events.len() as u64;

    let mut builder = EventGraphBuilder::new(corpus.fields)?;
    let pb = event_progress(num_events, progress);
    pb.set_message("collecting");
    for event in &corpus.events {
        let values: Vec<&str> = event.values.iter().map(String::as_str).collect();
        builder.add_event(&event.cookie, event.timestamp, &values)?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    let graph = builder.finish();
    let num_cookies = graph.num_cookies();

    fs::create_dir_all(output)?;
    let started = Instant::now();
    encode(graph, output)?;
    let elapsed = started.elapsed();

    println!("Encoded {} events from {} actors in {:.2?}", num_events, num_cookies, elapsed);
    for name in [INFO_FILE, TRAILS_FILE, CODEBOOK_FILE] {
        let size = fs::metadata(output.join(name))?.len();
        println!("  {:<16} {}", name, human_bytes(size));
    }

    Ok(())
}
