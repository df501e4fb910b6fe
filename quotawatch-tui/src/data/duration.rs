use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to seconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[("ms", 0.001), ("s", 1.0), ("m", 60.0)];

/// Parse interval strings like "10s", "500ms", "1m", "1.5m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.parse()?;
            if val < 0.0 {
                bail!("Duration cannot be negative: {}", s);
            }
            return Ok(Duration::from_secs_f64(val * multiplier));
        }
    }

    bail!("Unknown duration format: {} (try \"10s\", \"500ms\", \"1m\")", s)
}

/// Format a whole-second duration for display
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
