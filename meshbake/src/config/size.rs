//! Byte sizes written like `500MB` or `4GB`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid size '{0}', expected a form like '4GB', '500MB' or '1024KB'")]
pub struct SizeParseError(String);

/// Binary units, longest suffix first so `MB` wins over `B`.
const UNITS: &[(&str, u64)] = &[
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
    ("G", 1 << 30),
    ("M", 1 << 20),
    ("K", 1 << 10),
    ("B", 1),
];

/// Parses a byte count with an optional binary unit suffix.
///
/// Units are case-insensitive and may be separated from the number by
/// whitespace. A bare number is a byte count.
///
/// ```
/// use meshbake::config::parse_size;
///
/// assert_eq!(parse_size("512").unwrap(), 512);
/// assert_eq!(parse_size("500 mb").unwrap(), 500 * 1024 * 1024);
/// assert_eq!(parse_size("4GB").unwrap(), 4 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeParseError(trimmed.to_string()));
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(trimmed.to_string()))
}

/// Formats a byte count with the largest unit that divides it exactly.
pub fn format_size(bytes: u64) -> String {
    for (suffix, multiplier) in &UNITS[..3] {
        if bytes >= *multiplier && bytes.is_multiple_of(*multiplier) {
            return format!("{}{}", bytes / multiplier, suffix);
        }
    }
    bytes.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("10B").unwrap(), 10);
        assert_eq!(parse_size("1k").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("4gb").unwrap(), 4 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_size("  2 GB ").unwrap(), 2 << 30);
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "GB", "abc", "-1MB", "1.5GB", "2TB", "99999999999999999999GB"] {
            assert!(parse_size(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(4 << 30), "4GB");
        assert_eq!(format_size(500 << 20), "500MB");
        assert_eq!(format_size(1024), "1KB");
        assert_eq!(format_size(1000), "1000");
        assert_eq!(format_size(0), "0");
    }

    #[test]
    fn test_format_parses_back() {
        for bytes in [0, 7, 3 << 10, 512 << 20, 4 << 30] {
            assert_eq!(parse_size(&format_size(bytes)).unwrap(), bytes);
        }
    }
}
