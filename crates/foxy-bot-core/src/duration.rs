//! Pipeline duration rendering.
//!
//! GitLab reports pipeline durations as elapsed seconds (integer or float,
//! `null` while the pipeline is still running).

/// Seconds in one hour. Durations wrap at this boundary.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Seconds in one minute.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Render elapsed seconds as `"<m>m <s>s"`, or `"<s>s"` under one minute.
///
/// Absent, zero, negative and non-finite values render as an empty string.
///
/// The hour component is discarded: 3601 seconds renders as `"1s"`. Existing
/// chat histories rely on this format, so long pipelines keep wrapping.
///
/// # Examples
///
/// ```rust
/// use foxy_bot_core::format_duration;
///
/// assert_eq!(format_duration(Some(45.0)), "45s");
/// assert_eq!(format_duration(Some(125.0)), "2m 5s");
/// assert_eq!(format_duration(None), "");
/// ```
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite() && *s > 0.0) else {
        return String::new();
    };

    let minutes = ((seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE).floor() as u64;
    let secs = (seconds % SECONDS_PER_MINUTE).floor() as u64;

    if minutes < 1 {
        format!("{secs}s")
    } else {
        format!("{minutes}m {secs}s")
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
