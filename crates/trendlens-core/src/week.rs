//! ISO-8601 week identifiers (`YYYY-Www`, Thursday-anchored, UTC).

use chrono::{Datelike, NaiveDate};

/// Format a calendar day as its ISO week identifier, e.g. `2024-W17`.
/// The ISO year can differ from the calendar year around January 1st.
#[must_use]
pub fn iso_week_str(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Extract the calendar day from an ISO-8601 timestamp by taking its first
/// 10 characters. Returns `None` when the prefix is not a valid date.
#[must_use]
pub fn day_from_iso(ts_iso: &str) -> Option<NaiveDate> {
    let prefix = ts_iso.get(0..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn midyear_week_matches_iso() {
        assert_eq!(iso_week_str(day(2024, 4, 25)), "2024-W17");
    }

    #[test]
    fn january_first_can_belong_to_previous_iso_year() {
        // 2023-01-01 is a Sunday; its ISO week is the last of 2022.
        assert_eq!(iso_week_str(day(2023, 1, 1)), "2022-W52");
        // 2021-01-01 falls in ISO week 53 of 2020.
        assert_eq!(iso_week_str(day(2021, 1, 1)), "2020-W53");
    }

    #[test]
    fn late_december_can_belong_to_next_iso_year() {
        // 2024-12-30 is a Monday of week 1 of 2025.
        assert_eq!(iso_week_str(day(2024, 12, 30)), "2025-W01");
    }

    #[test]
    fn week_numbers_are_zero_padded() {
        assert_eq!(iso_week_str(day(2024, 1, 4)), "2024-W01");
    }

    #[test]
    fn day_from_iso_takes_the_date_prefix() {
        assert_eq!(
            day_from_iso("2024-04-25T09:30:00Z"),
            Some(day(2024, 4, 25))
        );
        assert_eq!(day_from_iso("2024-04-25"), Some(day(2024, 4, 25)));
    }

    #[test]
    fn day_from_iso_rejects_garbage() {
        assert_eq!(day_from_iso("not-a-date"), None);
        assert_eq!(day_from_iso("2024"), None);
    }
}
