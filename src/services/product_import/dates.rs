//! Permissive expiry date parsing.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Date formats tried in order. Day-first wins for ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Formats without a day; the first of the month is assumed.
const MONTH_FORMATS: &[&str] = &["%m/%Y", "%Y-%m", "%b %Y", "%B %Y"];

/// Largest serial day number a workbook date can carry (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Converts a workbook serial day number to a date (1900 date system).
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Parses a free-form date string as typed into a spreadsheet.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }

    for fmt in MONTH_FORMATS {
        let with_day = format!("01 {}", value);
        let fmt_with_day = format!("%d {}", fmt);
        if let Ok(date) = NaiveDate::parse_from_str(&with_day, &fmt_with_day) {
            return Some(date);
        }
    }

    // bare serial numbers exported as text
    if value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        if let Ok(serial) = value.parse::<f64>() {
            return from_excel_serial(serial);
        }
    }

    None
}
