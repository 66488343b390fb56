//! Shared calendar utilities for StateMod binary output crates.

/// Year conventions and date arithmetic.
pub mod dates {
    use chrono::{Datelike, NaiveDate};
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Calendar month abbreviations, January first.
    pub const MONTH_ABBREVIATIONS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];

    /// The 12-month period a model year covers.
    ///
    /// - Calendar year: January through December
    /// - Water year: October through September
    /// - Irrigation year: November through October
    ///
    /// Water and irrigation years are labeled by the calendar year they end in,
    /// e.g. water year 1990 runs Oct 1 1989 through Sep 30 1990.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum YearType {
        Calendar,
        Water,
        Irrigation,
    }

    impl YearType {
        /// Detect the year type from the first month name stored in a file.
        pub fn from_first_month(name: &str) -> Option<YearType> {
            match name.trim().to_ascii_uppercase().as_str() {
                "JAN" => Some(YearType::Calendar),
                "OCT" => Some(YearType::Water),
                "NOV" => Some(YearType::Irrigation),
                _ => None,
            }
        }

        /// Calendar month (1-12) that starts the year.
        pub fn first_month(&self) -> u32 {
            match self {
                YearType::Calendar => 1,
                YearType::Water => 10,
                YearType::Irrigation => 11,
            }
        }

        /// Calendar month (1-12) for the zero-based position within the year.
        pub fn calendar_month(&self, position: usize) -> u32 {
            ((self.first_month() - 1 + position as u32 % 12) % 12) + 1
        }

        /// First day of the model year labeled `year`.
        pub fn year_start(&self, year: i32) -> Option<NaiveDate> {
            match self {
                YearType::Calendar => NaiveDate::from_ymd_opt(year, 1, 1),
                _ => NaiveDate::from_ymd_opt(year.checked_sub(1)?, self.first_month(), 1),
            }
        }

        /// Last day of the model year labeled `year`.
        pub fn year_end(&self, year: i32) -> Option<NaiveDate> {
            let next = self.year_start(year.checked_add(1)?)?;
            next.pred_opt()
        }
    }

    impl fmt::Display for YearType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let label = match self {
                YearType::Calendar => "Calendar",
                YearType::Water => "Water",
                YearType::Irrigation => "Irrigation",
            };
            write!(f, "{}", label)
        }
    }

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a NaiveDate as "YYYY-MM"
    pub fn format_month(date: &NaiveDate) -> String {
        date.format("%Y-%m").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse "YYYY-MM-DD" or "YYYY-MM" (day defaults to the first).
    pub fn parse_date_or_month(s: &str) -> anyhow::Result<NaiveDate> {
        let s = s.trim();
        if s.len() <= 7 {
            return Ok(NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")?);
        }
        parse_date(s)
    }

    /// True calendar length of a month, Feb 29 included in leap years.
    pub fn days_in_month(year: i32, month: u32) -> u32 {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        match (
            NaiveDate::from_ymd_opt(year, month, 1),
            NaiveDate::from_ymd_opt(next_year, next_month, 1),
        ) {
            (Some(start), Some(end)) => (end - start).num_days() as u32,
            _ => 0,
        }
    }

    /// First day of the month containing `date`.
    pub fn first_of_month(date: &NaiveDate) -> NaiveDate {
        date.with_day(1).unwrap_or(*date)
    }

    /// Last day of the month containing `date`.
    pub fn last_of_month(date: &NaiveDate) -> NaiveDate {
        let days = days_in_month(date.year(), date.month());
        date.with_day(days).unwrap_or(*date)
    }

    /// Whole months from `from` to `to`, ignoring the day of month.
    pub fn months_between(from: &NaiveDate, to: &NaiveDate) -> i64 {
        (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64
    }

    pub fn is_feb_29(date: &NaiveDate) -> bool {
        date.month() == 2 && date.day() == 29
    }

    /// Days from `from` to `to` on a 365-day calendar: every Feb 29 crossed
    /// (after `from`, up to and including `to`) is not counted.
    pub fn days_between_no_leap(from: &NaiveDate, to: &NaiveDate) -> i64 {
        if to < from {
            return -days_between_no_leap(to, from);
        }
        let raw = (*to - *from).num_days();
        let leap_days = (from.year()..=to.year())
            .filter_map(|year| NaiveDate::from_ymd_opt(year, 2, 29))
            .filter(|feb29| feb29 > from && feb29 <= to)
            .count() as i64;
        raw - leap_days
    }

}
