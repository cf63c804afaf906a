//! Free-form deadline parsing.
//!
//! Full timestamps are tried first, most specific layout first, so a date-only
//! layout never swallows a string that carries a time. Layouts without a year
//! fall back to the current year, or the next one when that date has already
//! passed.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const FORMAT_EXAMPLES: [&str; 5] = [
    "2025-12-31T23:59 (full date-time)",
    "2025-12-31 (date only, defaults to 23:59)",
    "12-31 (month-day, infers year)",
    "31 Dec (day-month, infers year)",
    "31 December (day-month with full name, infers year)",
];

const FULL_LAYOUTS: [&str; 5] = [
    r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})$",
    r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2})$",
    r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})$",
    r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2})$",
    r"^(\d{4})-(\d{2})-(\d{2})$",
];

const DATE_ONLY_LAYOUT: usize = 4;

#[derive(Clone, Copy)]
enum MonthStyle {
    Full,
    Short,
    Numeric,
}

const YEARLESS_LAYOUTS: [(&str, MonthStyle); 6] = [
    (r"^(\d{1,2}) ([A-Za-z]+)$", MonthStyle::Full),
    (r"^(\d{1,2})-([A-Za-z]+)$", MonthStyle::Full),
    (r"^(\d{1,2}) ([A-Za-z]+)$", MonthStyle::Short),
    (r"^(\d{1,2})-([A-Za-z]+)$", MonthStyle::Short),
    (r"^(\d{1,2})-(\d{1,2})$", MonthStyle::Numeric),
    (r"^(\d{1,2})/(\d{1,2})$", MonthStyle::Numeric),
];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateTimeParseError {
    #[error(
        "Unable to parse date-time '{input}'. Supported formats include: {}",
        FORMAT_EXAMPLES.join(", ")
    )]
    Format { input: String },
    #[error("Invalid date: '{input}' does not exist in the calendar")]
    InvalidDate { input: String },
}

enum Attempt {
    NoMatch,
    Found(NaiveDateTime),
    Invalid,
}

fn compile(patterns: impl IntoIterator<Item = &'static str>) -> Vec<Regex> {
    patterns
        .into_iter()
        .map(|p| Regex::new(p).expect("date layouts are valid regexes"))
        .collect()
}

fn full_layouts() -> &'static [Regex] {
    static LAYOUTS: OnceLock<Vec<Regex>> = OnceLock::new();
    LAYOUTS.get_or_init(|| compile(FULL_LAYOUTS))
}

fn yearless_layouts() -> &'static [Regex] {
    static LAYOUTS: OnceLock<Vec<Regex>> = OnceLock::new();
    LAYOUTS.get_or_init(|| compile(YEARLESS_LAYOUTS.iter().map(|(p, _)| *p)))
}

/// End-of-day time used whenever the input carries no time.
pub fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

/// Today at the default time.
pub fn default_date_time() -> NaiveDateTime {
    today().and_time(default_time())
}

pub fn parse(text: &str) -> Result<NaiveDateTime, DateTimeParseError> {
    parse_relative_to(text, today())
}

/// Same as [`parse`], inferring missing years relative to `today`.
pub fn parse_relative_to(text: &str, today: NaiveDate) -> Result<NaiveDateTime, DateTimeParseError> {
    let trimmed = text.trim();
    let format_error = || DateTimeParseError::Format {
        input: trimmed.to_string(),
    };
    let invalid = || DateTimeParseError::InvalidDate {
        input: trimmed.to_string(),
    };
    if trimmed.is_empty() {
        return Err(format_error());
    }

    for regex in full_layouts() {
        match match_full(regex, trimmed) {
            Attempt::Found(dt) => return Ok(dt),
            Attempt::Invalid => return Err(invalid()),
            Attempt::NoMatch => {}
        }
    }

    for (regex, (_, style)) in yearless_layouts().iter().zip(YEARLESS_LAYOUTS) {
        match match_yearless(regex, style, trimmed, today) {
            Attempt::Found(dt) => return Ok(dt),
            Attempt::Invalid => return Err(invalid()),
            Attempt::NoMatch => {}
        }
    }

    Err(format_error())
}

/// Strict `yyyy-MM-dd` calendar date, as used by the deadline filter.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate, DateTimeParseError> {
    let trimmed = text.trim();
    match match_full(&full_layouts()[DATE_ONLY_LAYOUT], trimmed) {
        Attempt::Found(dt) => Ok(dt.date()),
        Attempt::Invalid => Err(DateTimeParseError::InvalidDate {
            input: trimmed.to_string(),
        }),
        Attempt::NoMatch => Err(DateTimeParseError::Format {
            input: trimmed.to_string(),
        }),
    }
}

/// `yyyy-MM-ddTHH:mm[:ss]` as written to the data file.
pub fn parse_iso_date_time(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    full_layouts()[..2]
        .iter()
        .find_map(|regex| match match_full(regex, trimmed) {
            Attempt::Found(dt) => Some(dt),
            _ => None,
        })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx).and_then(|m| m.as_str().parse().ok())
}

fn match_full(regex: &Regex, text: &str) -> Attempt {
    let Some(caps) = regex.captures(text) else {
        return Attempt::NoMatch;
    };
    let (Some(year), Some(month), Some(day)) = (
        number::<i32>(&caps, 1),
        number::<u32>(&caps, 2),
        number::<u32>(&caps, 3),
    ) else {
        return Attempt::NoMatch;
    };
    let time = if caps.len() > 4 {
        let hour = number::<u32>(&caps, 4).unwrap_or(u32::MAX);
        let minute = number::<u32>(&caps, 5).unwrap_or(u32::MAX);
        let second = number::<u32>(&caps, 6).unwrap_or(0);
        match NaiveTime::from_hms_opt(hour, minute, second) {
            Some(time) => time,
            None => return Attempt::NoMatch,
        }
    } else {
        default_time()
    };
    if !field_in_range(month, day) {
        return Attempt::NoMatch;
    }
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Attempt::Found(date.and_time(time)),
        None => Attempt::Invalid,
    }
}

fn match_yearless(regex: &Regex, style: MonthStyle, text: &str, today: NaiveDate) -> Attempt {
    let Some(caps) = regex.captures(text) else {
        return Attempt::NoMatch;
    };
    let parts = match style {
        MonthStyle::Numeric => number::<u32>(&caps, 1).zip(number::<u32>(&caps, 2)),
        MonthStyle::Full | MonthStyle::Short => caps
            .get(2)
            .and_then(|m| month_from_name(m.as_str(), style))
            .zip(number::<u32>(&caps, 1)),
    };
    let Some((month, day)) = parts else {
        return Attempt::NoMatch;
    };
    if !field_in_range(month, day) {
        return Attempt::NoMatch;
    }

    let this_year = today.year();
    let Some(candidate) = NaiveDate::from_ymd_opt(this_year, month, day) else {
        return Attempt::Invalid;
    };
    let date = if candidate < today {
        match NaiveDate::from_ymd_opt(this_year + 1, month, day) {
            Some(date) => date,
            None => return Attempt::Invalid,
        }
    } else {
        candidate
    };
    Attempt::Found(date.and_time(default_time()))
}

fn month_from_name(name: &str, style: MonthStyle) -> Option<u32> {
    let wanted = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|month| match style {
            MonthStyle::Full => *month == wanted,
            MonthStyle::Short => month[..3] == wanted,
            MonthStyle::Numeric => false,
        })
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

// An out-of-range field means the layout did not match; an in-range day
// missing from its month (30 Feb) is an invalid date instead.
fn field_in_range(month: u32, day: u32) -> bool {
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    fn parse_on(text: &str, today: NaiveDate) -> Result<NaiveDateTime, DateTimeParseError> {
        parse_relative_to(text, today)
    }

    #[test]
    fn full_layouts_parse_in_precedence_order() {
        let today = date(2025, 6, 1);
        assert_eq!(parse_on("2025-12-31T23:59:59", today), Ok(dt(2025, 12, 31, 23, 59, 59)));
        assert_eq!(parse_on("2025-12-31T10:15", today), Ok(dt(2025, 12, 31, 10, 15, 0)));
        assert_eq!(parse_on("2025-12-31 08:30:05", today), Ok(dt(2025, 12, 31, 8, 30, 5)));
        assert_eq!(parse_on("2025-12-31 08:30", today), Ok(dt(2025, 12, 31, 8, 30, 0)));
        assert_eq!(parse_on("2025-12-31", today), Ok(dt(2025, 12, 31, 23, 59, 0)));
    }

    #[test]
    fn date_only_equals_explicit_end_of_day() {
        assert_eq!(parse("2025-12-31"), parse("2025-12-31T23:59"));
        assert_eq!(parse("  2025-12-31  "), Ok(dt(2025, 12, 31, 23, 59, 0)));
    }

    #[test]
    fn past_dates_keep_their_explicit_year() {
        assert_eq!(parse_on("2020-01-01", date(2026, 10, 19)), Ok(dt(2020, 1, 1, 23, 59, 0)));
    }

    #[test]
    fn yearless_layouts_infer_the_current_year() {
        let today = date(2026, 2, 15);
        let expected = Ok(dt(2026, 12, 31, 23, 59, 0));
        for text in ["31 December", "31-December", "31 Dec", "31-Dec", "12-31", "12/31", "31 dec"] {
            assert_eq!(parse_on(text, today), expected, "{text}");
        }
    }

    #[test]
    fn passed_dates_roll_to_next_year() {
        let today = date(2026, 2, 15);
        assert_eq!(parse_on("1 Jan", today), Ok(dt(2027, 1, 1, 23, 59, 0)));
        assert_eq!(parse_on("2/14", today), Ok(dt(2027, 2, 14, 23, 59, 0)));
        // today itself is not in the past
        assert_eq!(parse_on("15 Feb", today), Ok(dt(2026, 2, 15, 23, 59, 0)));
    }

    #[test]
    fn impossible_calendar_dates_are_invalid() {
        let today = date(2026, 2, 15);
        for text in ["30 Feb", "30 February", "31 Apr", "2025-02-30", "2025-04-31", "4/31"] {
            assert_eq!(
                parse_on(text, today),
                Err(DateTimeParseError::InvalidDate { input: text.to_string() }),
                "{text}"
            );
        }
    }

    #[test]
    fn leap_day_depends_on_the_inferred_year() {
        assert!(matches!(
            parse_on("29 Feb", date(2027, 1, 10)),
            Err(DateTimeParseError::InvalidDate { .. })
        ));
        assert_eq!(parse_on("29 Feb", date(2028, 1, 10)), Ok(dt(2028, 2, 29, 23, 59, 0)));
    }

    #[test]
    fn unsupported_text_is_a_format_error() {
        let today = date(2026, 2, 15);
        for text in ["", "   ", "invalid-date", "2025-13-01", "2025-1-5", "31 Foo", "32 Dec", "2025-12-31T25:00"] {
            assert!(
                matches!(parse_on(text, today), Err(DateTimeParseError::Format { .. })),
                "{text:?}"
            );
        }
    }

    #[test]
    fn format_error_lists_examples() {
        let message = parse("nonsense").unwrap_err().to_string();
        for example in FORMAT_EXAMPLES {
            assert!(message.contains(example));
        }
    }

    #[test]
    fn default_is_today_at_end_of_day() {
        let default = default_date_time();
        assert_eq!(default.date(), Local::now().date_naive());
        assert_eq!(default.time(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn iso_helpers() {
        assert_eq!(parse_iso_date("2025-12-31"), Ok(date(2025, 12, 31)));
        assert!(matches!(parse_iso_date("31 Dec"), Err(DateTimeParseError::Format { .. })));
        assert!(matches!(parse_iso_date("2025-02-30"), Err(DateTimeParseError::InvalidDate { .. })));
        assert_eq!(parse_iso_date_time("2025-12-31T23:59"), Some(dt(2025, 12, 31, 23, 59, 0)));
        assert_eq!(parse_iso_date_time("2025-12-31T23:59:30"), Some(dt(2025, 12, 31, 23, 59, 30)));
        assert_eq!(parse_iso_date_time("2025-12-31"), None);
    }
}
