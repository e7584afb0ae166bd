//! Lenient duration parsing.
//!
//! Duration is advisory metadata, so malformed values collapse to `0`
//! (unknown) instead of failing the surrounding record.

use serde_json::Value;
use tracing::debug;

/// Seconds from a JSON value: a non-negative integer, or an `"MM:SS"` string.
pub fn parse_duration(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .map(|secs| secs.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        Value::String(s) => parse_duration_str(s),
        _ => 0,
    }
}

/// Seconds from `"MM:SS"`; anything that is not exactly two colon-separated
/// integers yields `0`.
pub fn parse_duration_str(raw: &str) -> u32 {
    let mut parts = raw.split(':');
    let parsed = match (parts.next(), parts.next(), parts.next()) {
        (Some(minutes), Some(seconds), None) => minutes
            .trim()
            .parse::<u32>()
            .ok()
            .zip(seconds.trim().parse::<u32>().ok()),
        _ => None,
    };

    match parsed {
        Some((minutes, seconds)) => minutes.saturating_mul(60).saturating_add(seconds),
        None => {
            debug!(duration = raw, "Invalid duration format");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(parse_duration_str("3:45"), 225);
        assert_eq!(parse_duration_str("0:07"), 7);
        assert_eq!(parse_duration(&json!("12:00")), 720);
    }

    #[test]
    fn test_integer_seconds() {
        assert_eq!(parse_duration(&json!(200)), 200);
        assert_eq!(parse_duration(&json!(0)), 0);
    }

    #[test]
    fn test_malformed_values_are_zero() {
        assert_eq!(parse_duration_str("bad"), 0);
        assert_eq!(parse_duration_str("1:2:3"), 0);
        assert_eq!(parse_duration_str("-1:30"), 0);
        assert_eq!(parse_duration_str("200"), 0);
        assert_eq!(parse_duration(&json!(-5)), 0);
        assert_eq!(parse_duration(&json!(null)), 0);
        assert_eq!(parse_duration(&json!(["3:45"])), 0);
    }

    #[test]
    fn test_float_seconds_truncate() {
        assert_eq!(parse_duration(&json!(187.9)), 187);
    }
}
