//! Time and duration conversion utilities.
//!
//! Workout timings are whole seconds held as `u32`. This module provides the
//! saturating conversions from [`Duration`] and the clock-style formatting used
//! by the player and the dashboard.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to whole seconds as u32, saturating at `u32::MAX`.
    ///
    /// Sub-second remainders are truncated.
    fn as_secs_u32(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Format seconds as a countdown clock (`m:ss`).
#[must_use]
pub fn format_clock(total_secs: u32) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes}:{seconds:02}")
}

/// Format seconds as a compact summary (`1h 2m 3s`, `2m 3s` or `3s`).
#[must_use]
pub fn format_summary(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
