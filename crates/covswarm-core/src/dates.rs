//! Archive date-string parsing.
//!
//! Archive exports mix ISO (`YYYY-MM-DD`, `YYYY/MM/DD`) and UK day-first
//! (`DD/MM/YYYY`, `DD-MM-YYYY`) forms, plus a handful of "no date" sentinel
//! spellings. Parsing distinguishes "explicitly unknown" from "present but
//! unparseable" because ingestion substitutes differently for each.

use chrono::{Datelike, NaiveDate};

/// Outcome of parsing one date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Date(NaiveDate),
    /// A recognized "no date" sentinel (`""`, `"unknown"`, `"n/a"`, ...).
    Unknown,
    /// Non-empty text that matches no recognized format or fails calendar
    /// validation (e.g. `31/02/2021`).
    Invalid,
}

impl ParsedDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ParsedDate::Unknown)
    }
}

const SENTINELS: &[&str] = &["", "unknown", "n/a", "na", "null", "undefined"];

/// Years outside this window are treated as data errors, not dates.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2030;

fn split_three(s: &str) -> Option<(&str, &str, &str)> {
    let mut parts = s.split(['/', '-']);
    let a = parts.next()?;
    let b = parts.next()?;
    let c = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((a, b, c))
}

fn digits(s: &str, min: usize, max: usize) -> Option<u32> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn build(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    // from_ymd_opt rejects impossible calendar dates (Feb 30 etc.).
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses one archive date field. ISO year-first is tried before the UK
/// day-first form, so `2020-03-05` is never read as day 2020.
pub fn parse_archive_date(raw: &str) -> ParsedDate {
    let cleaned = raw.trim().to_lowercase();
    if SENTINELS.contains(&cleaned.as_str()) {
        return ParsedDate::Unknown;
    }

    let Some((a, b, c)) = split_three(&cleaned) else {
        return ParsedDate::Invalid;
    };

    // ISO: 4-digit year first, 1-2 digit month/day.
    if let (Some(y), Some(m), Some(d)) = (digits(a, 4, 4), digits(b, 1, 2), digits(c, 1, 2)) {
        if let Some(date) = build(y as i32, m, d) {
            return ParsedDate::Date(date);
        }
    }

    // UK: 1-2 digit day/month, 4-digit year.
    if let (Some(d), Some(m), Some(y)) = (digits(a, 1, 2), digits(b, 1, 2), digits(c, 4, 4)) {
        if let Some(date) = build(y as i32, m, d) {
            return ParsedDate::Date(date);
        }
    }

    ParsedDate::Invalid
}

pub fn format_iso(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn format_uk(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Timeline cursor label, e.g. "March 2020".
pub fn format_month_year(date: NaiveDate) -> String {
    format!(
        "{} {}",
        MONTH_NAMES[(date.month0()) as usize],
        date.year()
    )
}
