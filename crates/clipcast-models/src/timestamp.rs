//! Timestamp parsing and formatting helpers.
//!
//! Pipeline entities carry offsets as fractional seconds; the API surface and
//! transcript excerpts present them as `HH:MM:SS` strings.

use crate::error::{ModelError, ModelResult};

/// Parse a timestamp string (`HH:MM:SS(.mmm)`, `MM:SS(.mmm)`, or `SS(.mmm)`)
/// into total seconds.
pub fn parse_timestamp(ts: &str) -> ModelResult<f64> {
    let parts: Vec<&str> = ts.split(':').collect();
    let invalid = || ModelError::InvalidTimestamp(ts.to_string());

    let seconds = match parts.len() {
        1 => parts[0].parse::<f64>().map_err(|_| invalid())?,
        2 => {
            let minutes: f64 = parts[0].parse().map_err(|_| invalid())?;
            let seconds: f64 = parts[1].parse().map_err(|_| invalid())?;
            minutes * 60.0 + seconds
        }
        3 => {
            let hours: f64 = parts[0].parse().map_err(|_| invalid())?;
            let minutes: f64 = parts[1].parse().map_err(|_| invalid())?;
            let seconds: f64 = parts[2].parse().map_err(|_| invalid())?;
            hours * 3600.0 + minutes * 60.0 + seconds
        }
        _ => return Err(invalid()),
    };

    if seconds < 0.0 {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Format fractional seconds as `HH:MM:SS` (millisecond precision dropped).
pub fn format_seconds(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
