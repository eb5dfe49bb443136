//! Compact duration strings: `"45s"`, `"30m"`, `"24h"`, `"7d"`.

use std::time::Duration;

/// Fallback used when an expiry string cannot be parsed (24 hours)
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Parse `<digits><unit>` where unit is one of `s`, `m`, `h`, `d`.
///
/// Returns `None` for anything else, including whitespace, signs, fractions,
/// a missing unit, or a value that overflows.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let unit = input.chars().last()?;
    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return None,
    };

    // unit is ASCII, so this is a char boundary
    let digits = &input[..input.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier).map(Duration::from_secs)
}

/// Parse a duration string, falling back to [`DEFAULT_EXPIRY`] when it is
/// not recognized.
pub fn parse_duration_lenient(input: &str) -> Duration {
    parse_duration(input).unwrap_or_else(|| {
        tracing::warn!(input, "unrecognized duration, using 24h");
        DEFAULT_EXPIRY
    })
}
