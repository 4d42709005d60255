//! Conversions between byte counts and the human-readable size labels shown
//! in the key table.

const UNIT: f64 = 1024.0;
const FORMAT_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Parse a size label such as `"1.2 KB"` into a byte count.
///
/// Suffixes are matched case-insensitively as powers of 1024 (KB, MB, GB,
/// TB). Without a recognised suffix the number is taken as bytes. Empty or
/// unparseable input yields 0. The result may be fractional; callers that
/// need an integer count round it.
pub fn parse_size(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let number = leading_number(trimmed);
    let lower = trimmed.to_ascii_lowercase();

    let multiplier = if lower.contains("kb") {
        UNIT
    } else if lower.contains("mb") {
        UNIT.powi(2)
    } else if lower.contains("gb") {
        UNIT.powi(3)
    } else if lower.contains("tb") {
        UNIT.powi(4)
    } else {
        1.0
    };

    number * multiplier
}

/// Byte count of a size label, rounded to a whole number of bytes.
pub fn parse_size_bytes(text: &str) -> u64 {
    let bytes = parse_size(text);
    if bytes.is_finite() && bytes > 0.0 {
        bytes.round() as u64
    } else {
        0
    }
}

/// Render a byte count as `"<value> <unit>"` with at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let raw = bytes as f64;
    let mut index = ((raw.ln() / UNIT.ln()).floor() as usize).min(FORMAT_UNITS.len() - 1);
    let mut value = round2(raw / UNIT.powi(index as i32));

    // 1048575 bytes would otherwise print as "1024 KB".
    if value >= UNIT && index < FORMAT_UNITS.len() - 1 {
        index += 1;
        value = round2(raw / UNIT.powi(index as i32));
    }

    format!("{} {}", value, FORMAT_UNITS[index])
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Longest prefix that reads as a decimal number, like `parseFloat`.
fn leading_number(text: &str) -> f64 {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (idx, ch) in text.char_indices() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            '-' | '+' if idx == 0 => {}
            _ => break,
        }
        end = idx + ch.len_utf8();
    }

    if !seen_digit {
        return 0.0;
    }

    text[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units_as_powers_of_1024() {
        assert_eq!(parse_size("2.5 MB"), 2621440.0);
        assert_eq!(parse_size("1 KB"), 1024.0);
        assert_eq!(parse_size("3 gb"), 3.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(parse_size("1 TB"), 1024f64.powi(4));
        assert_eq!(parse_size("512 Bytes"), 512.0);
        assert_eq!(parse_size("77"), 77.0);
    }

    #[test]
    fn empty_and_garbage_parse_to_zero() {
        assert_eq!(parse_size(""), 0.0);
        assert_eq!(parse_size("   "), 0.0);
        assert_eq!(parse_size("N/A"), 0.0);
        assert_eq!(parse_size_bytes("n/a"), 0);
    }

    #[test]
    fn fractional_bytes_survive_parsing() {
        assert_eq!(parse_size("1.2 KB"), 1228.8);
        assert_eq!(parse_size_bytes("1.2 KB"), 1229);
    }

    #[test]
    fn formats_with_two_decimals_and_no_trailing_zeros() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1234), "1.21 KB");
        assert_eq!(format_bytes(2621440), "2.5 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn gigabytes_are_the_largest_unit() {
        assert_eq!(format_bytes(2 * 1024u64.pow(4)), "2048 GB");
    }

    #[test]
    fn rounding_up_to_1024_moves_to_next_unit() {
        assert_eq!(format_bytes(1048575), "1 MB");
        assert_eq!(format_bytes(1023 * 1024 + 1020), "1 MB");
    }

    #[test]
    fn format_parse_format_is_idempotent() {
        let mut samples: Vec<u64> = (0..5000).collect();
        samples.extend((0..2000u64).map(|i| i * 997 + 1_000_000));
        samples.extend((0..2000u64).map(|i| i * 1_048_573 + 7));
        samples.extend([1048575, 1073741823, 1073741824, 5_000_000_000_000]);

        for n in samples {
            let label = format_bytes(n);
            let reparsed = format_bytes(parse_size_bytes(&label));
            assert_eq!(reparsed, label, "round trip failed for {}", n);
        }
    }
}
