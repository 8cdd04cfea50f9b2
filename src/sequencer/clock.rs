// Clock - conversions between seconds and the labels shown to users

use chrono::{DateTime, TimeZone};

/// Render seconds as `m:ss` (minutes are not wrapped into hours)
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Parse `m:ss`, `h:mm:ss` or a bare number of seconds
pub fn parse_clock(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part.trim().parse().ok()?;
        // Every field after the first is a base-60 digit
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }

    Some(total)
}

/// Wall clock label attached to pause checkpoints (`HH:MM`)
pub fn pause_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(6), "0:06");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("1:05"), Some(65));
        assert_eq!(parse_clock("1:00:00"), Some(3600));
        assert_eq!(parse_clock("42"), Some(42));
        assert_eq!(parse_clock("1:75"), None);
        assert_eq!(parse_clock("N/A"), None);
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
    }

    #[test]
    fn test_format_parse_agree() {
        for seconds in [0, 59, 60, 61, 599, 3599] {
            assert_eq!(parse_clock(&format_clock(seconds)), Some(seconds));
        }
    }

    #[test]
    fn test_pause_label() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 4, 30).unwrap();
        assert_eq!(pause_label(&at), "07:04");
    }
}
