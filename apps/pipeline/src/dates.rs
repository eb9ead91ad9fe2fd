//! Best-effort parsing of the free-form date strings found in work history.
//!
//! Anything that cannot be read yields `None`; callers decide what a missing
//! date means (a missing end date is "still employed").

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Month-precision formats. Parsed by pinning the day to the 1st.
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%m/%Y", "%m-%Y", "%B %Y", "%b %Y", "%B, %Y"];

/// Parses a free-form date into a naive timestamp. Timezone offsets are
/// folded into UTC so every result is comparable with every other.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    let pinned = format!("{trimmed} 01");
    for format in MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&pinned, &format!("{format} %d")) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    if trimmed.len() == 4 {
        if let Ok(year) = trimmed.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        }
    }

    None
}

/// Like [`parse_date`], for optional JSON leaves.
pub fn parse_optional(value: Option<&str>) -> Option<NaiveDateTime> {
    value.and_then(parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_date("2020-01-01"), Some(ymd(2020, 1, 1)));
    }

    #[test]
    fn test_rfc3339_is_folded_to_utc() {
        let parsed = parse_date("2021-06-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed, ymd(2021, 6, 1));
    }

    #[test]
    fn test_us_and_written_formats() {
        assert_eq!(parse_date("03/15/2019"), Some(ymd(2019, 3, 15)));
        assert_eq!(parse_date("15 March 2019"), Some(ymd(2019, 3, 15)));
        assert_eq!(parse_date("Mar 15, 2019"), Some(ymd(2019, 3, 15)));
    }

    #[test]
    fn test_month_precision_pins_first_day() {
        assert_eq!(parse_date("2018-07"), Some(ymd(2018, 7, 1)));
        assert_eq!(parse_date("July 2018"), Some(ymd(2018, 7, 1)));
        assert_eq!(parse_date("Jul 2018"), Some(ymd(2018, 7, 1)));
    }

    #[test]
    fn test_bare_year() {
        assert_eq!(parse_date("2016"), Some(ymd(2016, 1, 1)));
    }

    #[test]
    fn test_garbage_and_blank_yield_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("present"), None);
        assert_eq!(parse_date("2020-13-45"), None);
        assert_eq!(parse_optional(None), None);
    }
}
