//! Info command implementation.

use crate::utils::human_bytes;
use std::fs;
use std::path::PathBuf;
use trailpack_encoder::huffman::CodeMap;
use trailpack_encoder::{CODEBOOK_FILE, EncodeInfo, INFO_FILE, TRAILS_FILE};

pub fn cmd_info(root: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let info = EncodeInfo::read_from(&root.join(INFO_FILE))?;
    let trails_size = fs::metadata(root.join(TRAILS_FILE))?.len();
    let codebook_blob = fs::read(root.join(CODEBOOK_FILE))?;
    let codemap = CodeMap::read_from(&mut &codebook_blob[..])?;

    if json {
        let out = serde_json::json!({
            "root": root.display().to_string(),
            "num_cookies": info.num_cookies,
            "num_events": info.num_events,
            "min_timestamp": info.min_timestamp,
            "max_timestamp": info.max_timestamp,
            "max_timestamp_delta": info.max_timestamp_delta,
            "trails_bytes": trails_size,
            "codebook_entries": codemap.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Trail Directory Information");
    println!("===========================");
    println!("Root: {}", root.display());
    println!("Actors: {}", info.num_cookies);
    println!("Events: {}", info.num_events);
    println!(
        "Timestamps: {} .. {} (max delta {})",
        info.min_timestamp, info.max_timestamp, info.max_timestamp_delta
    );
    println!();
    println!("Artifacts:");
    println!(
        "  {:<16} {}",
        TRAILS_FILE,
        human_bytes(trails_size)
    );
    println!(
        "  {:<16} {} ({} entries)",
        CODEBOOK_FILE,
        human_bytes(codebook_blob.len() as u64),
        codemap.len()
    );
    if info.num_events > 0 {
        println!();
        println!(
            "Bytes per event: {:.2}",
            trails_size as f64 / info.num_events as f64
        );
    }

    Ok(())
}
