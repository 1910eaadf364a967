//! Attendance date keys and the Monday/Wednesday/Friday school calendar.
//!
//! A date key displays as `"<MonthName> <Day> <Year>"` with no zero padding
//! (`"March 3 2025"`). Parsing also takes the zero-padded form produced by the
//! attendance service and plain ISO dates.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

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

/// First and last month (inclusive) of the academic window.
const WINDOW_MONTHS: (u32, u32) = (1, 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(DateKey)
    }

    pub fn today() -> Self {
        DateKey(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`, the form the attendance service takes in query strings.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn is_school_day(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Mon | Weekday::Wed | Weekday::Fri)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = MONTH_NAMES[self.0.month0() as usize];
        write!(f, "{} {} {}", month, self.0.day(), self.0.year())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date key: {0}")]
pub struct DateKeyError(String);

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
            return Ok(DateKey(d));
        }
        let parts: Vec<&str> = t.split_whitespace().collect();
        let [month, day, year] = parts.as_slice() else {
            return Err(DateKeyError(s.to_string()));
        };
        let month_num = MONTH_NAMES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(month))
            .ok_or_else(|| DateKeyError(s.to_string()))? as u32
            + 1;
        let day = day
            .trim_end_matches(',')
            .parse::<u32>()
            .map_err(|_| DateKeyError(s.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| DateKeyError(s.to_string()))?;
        NaiveDate::from_ymd_opt(year, month_num, day)
            .map(DateKey)
            .ok_or_else(|| DateKeyError(s.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

/// Every Monday, Wednesday and Friday of the academic window, oldest first.
pub fn school_days(year: i32) -> Vec<DateKey> {
    let (first, last) = WINDOW_MONTHS;
    let mut out = Vec::new();
    for month in first..=last {
        let mut day = 1;
        while let Some(key) = DateKey::from_ymd(year, month, day) {
            if key.is_school_day() {
                out.push(key);
            }
            day += 1;
        }
    }
    out
}
