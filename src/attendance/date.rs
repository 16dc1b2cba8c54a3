//! Date extraction from sheet text.
//!
//! Patterns are tried in order: `DD-MM-YYYY`, `YYYY-MM-DD` (either with `-`
//! or `/`), then `DD <Indonesian month> YYYY`. Candidates that are not real
//! calendar dates are skipped.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

static DAY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{4})\b").unwrap());

static YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b").unwrap());

static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+(januari|februari|pebruari|maret|april|mei|juni|juli|agustus|september|oktober|nopember|november|desember|jan|feb|mar|apr|jun|jul|agu|agt|sep|okt|nov|nop|des)\.?\s+(\d{4})\b",
    )
    .unwrap()
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Two-digit month for an Indonesian month name or abbreviation.
fn month_number(name: &str) -> Option<&'static str> {
    let month = match name.to_lowercase().as_str() {
        "januari" | "jan" => "01",
        "februari" | "pebruari" | "feb" => "02",
        "maret" | "mar" => "03",
        "april" | "apr" => "04",
        "mei" => "05",
        "juni" | "jun" => "06",
        "juli" | "jul" => "07",
        "agustus" | "agu" | "agt" => "08",
        "september" | "sep" => "09",
        "oktober" | "okt" => "10",
        "november" | "nopember" | "nov" | "nop" => "11",
        "desember" | "des" => "12",
        _ => return None,
    };
    Some(month)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// First valid date in `text`, if any.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    let day_first = DAY_FIRST
        .captures_iter(text)
        .find_map(|c| ymd(&c[3], &c[2], &c[1]));
    if day_first.is_some() {
        return day_first;
    }

    let year_first = YEAR_FIRST
        .captures_iter(text)
        .find_map(|c| ymd(&c[1], &c[2], &c[3]));
    if year_first.is_some() {
        return year_first;
    }

    MONTH_NAME
        .captures_iter(text)
        .find_map(|c| ymd(&c[3], month_number(&c[2])?, &c[1]))
}

/// Date in `text` as `YYYY-MM-DD`, or `today` when none is found.
pub fn extract_date(text: &str, today: NaiveDate) -> String {
    find_date(text).unwrap_or(today).format("%Y-%m-%d").to_string()
}

/// Today's local date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accept `value` only if it is a real `YYYY-MM-DD` date.
pub fn normalize_iso_date(value: &str) -> Option<String> {
    let value = value.trim();
    if !ISO_DATE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Whether `value` has the `YYYY-MM-DD` shape.
pub fn is_iso_date(value: &str) -> bool {
    ISO_DATE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn test_indonesian_month_name() {
        assert_eq!(extract_date("30 Januari 2026", fixed_today()), "2026-01-30");
        assert_eq!(
            extract_date("Tanggal: 5 agustus 2025", fixed_today()),
            "2025-08-05"
        );
        assert_eq!(extract_date("1 Des. 2025", fixed_today()), "2025-12-01");
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(extract_date("30-01-2026", fixed_today()), "2026-01-30");
        assert_eq!(extract_date("tgl 3/2/2026", fixed_today()), "2026-02-03");
    }

    #[test]
    fn test_year_first_numeric() {
        assert_eq!(extract_date("2026/01/30", fixed_today()), "2026-01-30");
        assert_eq!(extract_date("2026-1-5", fixed_today()), "2026-01-05");
    }

    #[test]
    fn test_unparsable_falls_back_to_today() {
        assert_eq!(extract_date("no date here", fixed_today()), "2026-10-15");
        assert_eq!(extract_date("", fixed_today()), "2026-10-15");
    }

    #[test]
    fn test_invalid_calendar_dates_are_skipped() {
        // 31-02 is not a date; the month-name date later in the text is
        assert_eq!(
            extract_date("31-02-2026 / 12 Maret 2026", fixed_today()),
            "2026-03-12"
        );
    }

    #[test]
    fn test_day_first_wins_over_month_name() {
        assert_eq!(
            extract_date("1 Januari 2026 dicetak 02-02-2026", fixed_today()),
            "2026-02-02"
        );
    }

    #[test]
    fn test_normalize_iso_date() {
        assert_eq!(normalize_iso_date("2026-01-30"), Some("2026-01-30".to_string()));
        assert_eq!(normalize_iso_date(" 2026-01-30 "), Some("2026-01-30".to_string()));
        assert_eq!(normalize_iso_date("2026-02-30"), None);
        assert_eq!(normalize_iso_date("30-01-2026"), None);
        assert_eq!(normalize_iso_date(""), None);
    }
}
