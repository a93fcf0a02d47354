//! Display formatting for dates, sizes and quantities.

use chrono::{DateTime, Utc};

/// `Jan 5, 2024`
pub fn date(value: &DateTime<Utc>) -> String {
    value.format("%b %-d, %Y").to_string()
}

/// `Jan 5, 2024, 09:30 AM`
pub fn date_time(value: &DateTime<Utc>) -> String {
    value.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Like [`date`], rendering a missing value as `-`.
pub fn optional_date(value: Option<&DateTime<Utc>>) -> String {
    value.map(date).unwrap_or_else(|| "-".to_string())
}

/// Human readable byte count: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn bytes(value: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if value < KB {
        format!("{} B", value)
    } else if value < MB {
        format!("{:.1} KB", value as f64 / KB as f64)
    } else {
        format!("{:.1} MB", value as f64 / MB as f64)
    }
}

/// Quantity without a trailing `.0` for whole numbers.
pub fn quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dates() {
        let value = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        assert_eq!(date(&value), "Jan 5, 2024");
        assert_eq!(date_time(&value), "Jan 5, 2024, 09:30 AM");
        assert_eq!(optional_date(None), "-");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(bytes(512), "512 B");
        assert_eq!(bytes(1536), "1.5 KB");
        assert_eq!(bytes(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity(12.0), "12");
        assert_eq!(quantity(0.25), "0.25");
    }
}
