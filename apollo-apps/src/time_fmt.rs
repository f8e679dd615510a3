//! Clock-time labels for epoch timestamps.

use chrono::{DateTime, Local, TimeZone};

/// Label used when a timestamp is outside the representable range.
pub const INVALID_TIME_LABEL: &str = "--:--:--";

/// Formats epoch seconds as a local `HH:MM:SS` label.
pub fn clock_label(epoch_secs: i64) -> String {
    match Local.timestamp_opt(epoch_secs, 0).single() {
        Some(dt) => format_local(dt),
        None => INVALID_TIME_LABEL.to_string(),
    }
}

/// Formats fractional epoch seconds as a local `HH:MM:SS` label.
pub fn clock_label_f64(epoch_secs: f64) -> String {
    if !epoch_secs.is_finite() {
        return INVALID_TIME_LABEL.to_string();
    }
    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1e9) as u32;
    match Local.timestamp_opt(secs as i64, nanos).single() {
        Some(dt) => format_local(dt),
        None => INVALID_TIME_LABEL.to_string(),
    }
}

fn format_local(dt: DateTime<Local>) -> String {
    dt.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_label_shape() {
        let label = clock_label(1_700_000_000);
        assert_eq!(label.len(), 8);
        assert_eq!(label.as_bytes()[2], b':');
        assert_eq!(label.as_bytes()[5], b':');
    }

    #[test]
    fn test_fractional_label_matches_whole_second() {
        assert_eq!(clock_label_f64(1_700_000_000.75), clock_label(1_700_000_000));
    }

    #[test]
    fn test_out_of_range_timestamps() {
        assert_eq!(clock_label(i64::MAX), INVALID_TIME_LABEL);
        assert_eq!(clock_label_f64(f64::NAN), INVALID_TIME_LABEL);
    }
}
