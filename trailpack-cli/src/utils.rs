//! Shared helpers for the CLI commands.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over a known number of events.
pub fn event_progress(num_events: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(num_events);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {wide_bar:.green/dim} {pos}/{len} events ({eta})")
            .expect("progress template is valid")
            .progress_chars("=> "),
    );
    pb
}

/// Render a byte count with a binary-unit suffix.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
