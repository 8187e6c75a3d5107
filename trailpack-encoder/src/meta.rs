//! The `info` metadata file: counts and timestamp range.

use std::fs;
use std::path::Path;
use trailpack_core::error::{Result, TrailError};

/// Contents of the `info` file, one ASCII line of space-separated
/// decimals: `num_cookies num_events min_ts max_ts max_delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeInfo {
    /// Number of actors.
    pub num_cookies: u64,
    /// Number of events, invalid records included.
    pub num_events: u64,
    /// Smallest timestamp in the corpus.
    pub min_timestamp: u32,
    /// Largest timestamp in the corpus.
    pub max_timestamp: u32,
    /// Largest valid timestamp delta after grouping.
    pub max_timestamp_delta: u32,
}

impl EncodeInfo {
    /// Write the info line to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(
            path,
            format!(
                "{} {} {} {} {}\n",
                self.num_cookies,
                self.num_events,
                self.min_timestamp,
                self.max_timestamp,
                self.max_timestamp_delta
            ),
        )?;
        Ok(())
    }

    /// Parse an info file back.
    pub fn read_from(path: &Path) -> Result<Self> {
        let line = fs::read_to_string(path)?;
        let mut fields = line.split_whitespace();
        let mut next = |name: &str| -> Result<u64> {
            fields
                .next()
                .ok_or_else(|| TrailError::invalid_input(format!("info file missing {name}")))?
                .parse()
                .map_err(|_| TrailError::invalid_input(format!("info file has malformed {name}")))
        };
        Ok(Self {
            num_cookies: next("num_cookies")?,
            num_events: next("num_events")?,
            min_timestamp: next("min_timestamp")? as u32,
            max_timestamp: next("max_timestamp")? as u32,
            max_timestamp_delta: next("max_timestamp_delta")? as u32,
        })
    }
}
