//! General time utility functions

use std::time::Duration;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Convert a chrono duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the period of a given frequency truncated to whole nanoseconds.
///
/// Returns `None` if the frequency is not strictly positive and finite, or if
/// the period would be shorter than one nanosecond.
pub fn frequency_to_period(frequency_hz: f64) -> Option<Duration> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }

    let nanos = (NANOS_PER_SECOND as f64 / frequency_hz) as u64;

    match nanos {
        0 => None,
        n => Some(Duration::from_nanos(n))
    }
}
