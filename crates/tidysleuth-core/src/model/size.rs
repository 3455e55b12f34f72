/// Size formatting and parsing for human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used at the
/// display / command-line boundary.
use crate::error::{Error, Result};

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// Format a byte count into a human-readable string with appropriate unit.
///
/// Binary multiples labelled with the short forms users expect (KB, MB, …).
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TB)
    }
}

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Parse a size such as `512`, `4KB`, `1.5 mb`, or `2G` into bytes.
///
/// Units are case-insensitive binary multiples; a trailing `B` / `iB` is
/// optional. Bare numbers are bytes.
pub fn parse_size(input: &str) -> Result<u64> {
    let invalid = |reason: &str| Error::InvalidSize {
        input: input.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number.parse().map_err(|_| invalid("not a number"))?;

    let unit = unit.trim().to_ascii_lowercase();
    let unit = unit
        .strip_suffix("ib")
        .or_else(|| unit.strip_suffix('b'))
        .unwrap_or(&unit);
    let multiplier = match unit {
        "" => 1.0,
        "k" => KB,
        "m" => MB,
        "g" => GB,
        "t" => TB,
        _ => return Err(invalid("unknown unit")),
    };

    let bytes = value * multiplier;
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(invalid("out of range"));
    }
    Ok(bytes.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_size_accepts_common_spellings() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("4KB").unwrap(), 4096);
        assert_eq!(parse_size("4 kib").unwrap(), 4096);
        assert_eq!(parse_size("1.5m").unwrap(), 1_572_864);
        assert_eq!(parse_size("2G").unwrap(), 2 * 1_073_741_824);
        assert_eq!(parse_size("10b").unwrap(), 10);
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("10 parsecs").is_err());
        assert!(parse_size("1.2.3MB").is_err());
    }
}
