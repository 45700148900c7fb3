//! Reporting period an output batch is filed under.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{RedactorError, RedactorResult};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FULL_MONTH_NAMES: [&str; 12] = [
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

/// Earliest year accepted for a batch.
pub const MIN_YEAR: i32 = 1900;

/// Month and year of a statement batch, e.g. `Mar-2025`.
///
/// Periods are never in the future relative to the day they are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportingPeriod {
    month: u32,
    year: i32,
}

impl ReportingPeriod {
    /// Builds a period, rejecting years before 1900 and months after `today`.
    pub fn new(month: u32, year: i32, today: NaiveDate) -> RedactorResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(RedactorError::invalid_input(
                "month",
                format!("month {month} is outside 1..=12"),
            ));
        }
        if year < MIN_YEAR {
            return Err(RedactorError::invalid_input(
                "year",
                format!("year {year} is before {MIN_YEAR}"),
            ));
        }
        if year > today.year() || (year == today.year() && month > today.month()) {
            return Err(RedactorError::invalid_input(
                "month",
                format!(
                    "{}-{year} is in the future",
                    MONTH_NAMES[(month - 1) as usize]
                ),
            ));
        }
        Ok(Self { month, year })
    }

    /// Parses a month given as `Mar`, `march` or `3`.
    pub fn parse(month: &str, year: i32, today: NaiveDate) -> RedactorResult<Self> {
        let month = parse_month(month).ok_or_else(|| {
            RedactorError::invalid_input("month", format!("unrecognised month '{month}'"))
        })?;
        Self::new(month, year, today)
    }

    /// Period for the current calendar month.
    pub fn current(today: NaiveDate) -> Self {
        Self {
            month: today.month(),
            year: today.year(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// File name of the master archive for this period.
    pub fn archive_name(&self) -> String {
        format!("{self}.zip")
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.month_name(), self.year)
    }
}

fn parse_month(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(number) = text.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    let lower = text.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .zip(FULL_MONTH_NAMES)
        .position(|(short, full)| lower == short.to_ascii_lowercase() || lower == full)
        .map(|idx| idx as u32 + 1)
}
