use sysinfo::System;

use crate::config::{SYSTEM_MEMORY_MAX_GB, SYSTEM_MEMORY_MIN_GB, SYSTEM_MEMORY_STEP_GB};

/// Parse a human-readable memory size string into gigabytes.
/// Accepts formats: "32G", "32g", "32GB", "32gb", "32000M", "32000m", "32000MB", etc.
/// A bare number is taken as gigabytes.
/// Returns `None` if the input is malformed.
pub fn parse_memory_size(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Split into numeric part and suffix
    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;
    if value <= 0.0 {
        return None;
    }

    let suffix = suffix.trim().to_lowercase();
    match suffix.as_str() {
        "g" | "gb" | "gib" | "" => Some(value),
        "m" | "mb" | "mib" => Some(value / 1024.0),
        "t" | "tb" | "tib" => Some(value * 1024.0),
        _ => None,
    }
}

/// Total installed RAM in GB. Only system memory is read; GPUs are never probed.
pub fn detect_total_memory_gb() -> f64 {
    let mut sys = System::new();
    sys.refresh_memory();
    let total_gb = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    tracing::debug!(total_gb, "detected system memory");
    total_gb
}

/// Snap a raw RAM figure onto the selectable grid (multiples of 8 GB,
/// 8..=512). Rounds to nearest, since firmware reservations make a 16 GB
/// machine report a little under 16.
pub fn snap_system_memory_gb(raw_gb: f64) -> f64 {
    if !raw_gb.is_finite() {
        return SYSTEM_MEMORY_MIN_GB;
    }
    let snapped = (raw_gb / SYSTEM_MEMORY_STEP_GB).round() * SYSTEM_MEMORY_STEP_GB;
    snapped.clamp(SYSTEM_MEMORY_MIN_GB, SYSTEM_MEMORY_MAX_GB)
}
