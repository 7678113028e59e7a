//! Human-readable sizes and durations.
//!
//! Sizes use binary multiples: `K`, `KB` and `KiB` all mean 1024 bytes.

use crate::error::{Error, Result};
use std::time::Duration;

pub const KIBIBYTE: u64 = 1024;
pub const MEBIBYTE: u64 = 1024 * KIBIBYTE;
pub const GIBIBYTE: u64 = 1024 * MEBIBYTE;
pub const TEBIBYTE: u64 = 1024 * GIBIBYTE;
pub const PEBIBYTE: u64 = 1024 * TEBIBYTE;
pub const EXBIBYTE: u64 = 1024 * PEBIBYTE;

const UNITS: [(u64, &str); 6] = [
    (EXBIBYTE, "E"),
    (PEBIBYTE, "P"),
    (TEBIBYTE, "T"),
    (GIBIBYTE, "G"),
    (MEBIBYTE, "M"),
    (KIBIBYTE, "K"),
];

/// Parses a byte count: either a plain integer (`"1024"`) or a number with
/// a unit suffix (`"1G"`, `"1.5MiB"`, `"512kb"`). Unit letters are case-insensitive.
pub fn parse_size(input: &str) -> Result<u64> {
    let invalid = |reason: &str| Error::InvalidSize {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid("empty size"));
    }
    if !s.chars().any(|c| c.is_alphabetic()) {
        return s.parse::<u64>().map_err(|e| invalid(&e.to_string()));
    }

    let split = s
        .find(|c: char| c.is_alphabetic())
        .ok_or_else(|| invalid("missing unit"))?;
    let (number, unit) = s.split_at(split);
    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "B" => 1,
        "K" | "KB" | "KIB" => KIBIBYTE,
        "M" | "MB" | "MIB" => MEBIBYTE,
        "G" | "GB" | "GIB" => GIBIBYTE,
        "T" | "TB" | "TIB" => TEBIBYTE,
        "P" | "PB" | "PIB" => PEBIBYTE,
        "E" | "EB" | "EIB" => EXBIBYTE,
        _ => return Err(invalid("unknown unit; expected B, K, M, G, T, P or E")),
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| invalid("expected a positive number before the unit"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("expected a positive number before the unit"));
    }
    let bytes = value * multiplier as f64;
    if bytes > i64::MAX as f64 {
        return Err(invalid(&format!("exceeds maximum {} bytes", i64::MAX)));
    }
    Ok(bytes as u64)
}

/// Formats a byte count with the largest binary unit that fits, e.g. `"1.5M"`.
pub fn format_bytes(bytes: u64) -> String {
    for (size, suffix) in UNITS {
        if bytes >= size {
            let value = bytes as f64 / size as f64;
            let text = format!("{:.1}", value);
            let text = text.strip_suffix(".0").unwrap_or(&text);
            return format!("{}{}", text, suffix);
        }
    }
    format!("{}B", bytes)
}

/// Formats an elapsed duration compactly: `"850ms"`, `"2.345s"`, `"3m12.5s"`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{:.1}µs", nanos as f64 / 1_000.0);
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", nanos / 1_000_000);
    }
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        return format!("{:.3}s", secs);
    }
    let minutes = (secs / 60.0).floor();
    let rem = secs - minutes * 60.0;
    if minutes < 60.0 {
        return format!("{}m{:.1}s", minutes as u64, rem);
    }
    let hours = (minutes / 60.0).floor();
    format!("{}h{}m{:.0}s", hours as u64, (minutes - hours * 60.0) as u64, rem)
}
