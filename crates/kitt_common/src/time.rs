//! Femtosecond time constants, duration parsing and formatting.
//!
//! Waveform timestamps are normalized to femtoseconds, the finest VCD
//! timescale unit, so any dump can be compared against the model's clock.

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = 1_000_000_000_000_000;

/// Error returned by [`parse_duration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDurationError {
    /// The input was empty.
    #[error("empty duration string")]
    Empty,
    /// No leading digits.
    #[error("invalid duration: no numeric value in '{0}'")]
    NoNumber(String),
    /// A number without a unit.
    #[error("missing unit in duration '{0}' (use fs, ps, ns, us, ms, or s)")]
    MissingUnit(String),
    /// An unrecognized unit suffix.
    #[error("unknown duration unit '{0}' (use fs, ps, ns, us, ms, or s)")]
    UnknownUnit(String),
    /// The value does not fit in 64-bit femtoseconds.
    #[error("duration '{0}' is too large")]
    Overflow(String),
}

/// Femtoseconds per unit for a unit suffix.
pub fn unit_fs(unit: &str) -> Option<u64> {
    match unit {
        "fs" => Some(1),
        "ps" => Some(FS_PER_PS),
        "ns" => Some(FS_PER_NS),
        "us" => Some(FS_PER_US),
        "ms" => Some(FS_PER_MS),
        "s" => Some(FS_PER_S),
        _ => None,
    }
}

/// Parses a duration such as `"100ns"` or `"10ms"` into femtoseconds.
pub fn parse_duration(s: &str) -> Result<u64, ParseDurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digit_end == 0 {
        return Err(ParseDurationError::NoNumber(s.to_string()));
    }

    let number: u64 = s[..digit_end]
        .parse()
        .map_err(|_| ParseDurationError::Overflow(s.to_string()))?;

    let unit = s[digit_end..].trim();
    if unit.is_empty() {
        return Err(ParseDurationError::MissingUnit(s.to_string()));
    }
    let multiplier =
        unit_fs(unit).ok_or_else(|| ParseDurationError::UnknownUnit(unit.to_string()))?;

    number
        .checked_mul(multiplier)
        .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))
}

/// Formats femtoseconds with the largest unit that divides the value evenly.
pub fn format_fs(fs: u64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (FS_PER_S, "s"),
        (FS_PER_MS, "ms"),
        (FS_PER_US, "us"),
        (FS_PER_NS, "ns"),
        (FS_PER_PS, "ps"),
    ];
    if fs == 0 {
        return "0 fs".to_string();
    }
    for (scale, unit) in UNITS {
        if fs % scale == 0 {
            return format!("{} {unit}", fs / scale);
        }
    }
    format!("{fs} fs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_nanoseconds() {
        assert_eq!(parse_duration("100ns").unwrap(), 100 * FS_PER_NS);
    }

    #[test]
    fn parse_duration_milliseconds() {
        assert_eq!(parse_duration("10ms").unwrap(), 10 * FS_PER_MS);
    }

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("1s").unwrap(), FS_PER_S);
    }

    #[test]
    fn parse_duration_with_whitespace() {
        assert_eq!(parse_duration("  50 us ").unwrap(), 50 * FS_PER_US);
    }

    #[test]
    fn parse_duration_invalid_unit() {
        let err = parse_duration("100xyz").unwrap_err();
        assert!(err.to_string().contains("unknown duration unit"));
    }

    #[test]
    fn parse_duration_no_number() {
        let err = parse_duration("ns").unwrap_err();
        assert!(err.to_string().contains("no numeric value"));
    }

    #[test]
    fn parse_duration_empty() {
        assert_eq!(parse_duration(""), Err(ParseDurationError::Empty));
    }

    #[test]
    fn parse_duration_missing_unit() {
        let err = parse_duration("100").unwrap_err();
        assert!(err.to_string().contains("missing unit"));
    }

    #[test]
    fn parse_duration_overflow() {
        assert!(matches!(
            parse_duration("100000s"),
            Err(ParseDurationError::Overflow(_))
        ));
    }

    #[test]
    fn format_picks_even_unit() {
        assert_eq!(format_fs(0), "0 fs");
        assert_eq!(format_fs(100 * FS_PER_NS), "100 ns");
        assert_eq!(format_fs(3 * FS_PER_MS), "3 ms");
        assert_eq!(format_fs(1_500 * FS_PER_PS), "1500 ps");
        assert_eq!(format_fs(7), "7 fs");
    }
}
