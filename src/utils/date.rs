use chrono::{Datelike, NaiveDateTime, Utc};

/// Format som används för tidsstämplar i databasen
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Innevarande år
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Formatera en tidsstämpel för lagring
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Tolka en tidsstämpel från databasen (SQLite datetime() eller RFC 3339)
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(ts);
    }

    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Rimlighetskontroll för ett räkenskapsår
pub fn is_valid_fiscal_year(year: i32) -> bool {
    (1900..=2999).contains(&year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-03-01 10:15:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-01 10:15:00");

        assert!(parse_timestamp("2024-03-01T10:15:00Z").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("igår").is_none());
    }

    #[test]
    fn test_valid_fiscal_year() {
        assert!(is_valid_fiscal_year(2024));
        assert!(!is_valid_fiscal_year(0));
        assert!(!is_valid_fiscal_year(-2024));
    }
}
