//! Reporting periods.
//!
//! A period is a year with an optional month. Uploads carry periods in a few
//! shapes (`2024`, `2024-03`, `2024-03-15`, `15/03/2024`, or split across
//! `year` + `month` columns); they all normalize to the same ordered value.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A reporting period. Orders chronologically; a bare year sorts before the
/// months of that year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period '{0}'. Expected YYYY, YYYY-MM, YYYY-MM-DD or DD/MM/YYYY.")]
pub struct PeriodParseError(pub String);

impl Period {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    /// Returns `None` when `month` is outside `1..=12` or `year` outside
    /// `1..=9999`.
    pub fn year_month(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && valid_year(i64::from(year)).is_some() {
            Some(Self {
                year,
                month: Some(month),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{:04}-{:02}", self.year, m),
            None => write!(f, "{:04}", self.year),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || PeriodParseError(s.to_string());

        if s.is_empty() {
            return Err(err());
        }

        // Bare year. Spreadsheet exports sometimes write it as `2024.0`.
        if let Some(year) = parse_whole_number(s) {
            return valid_year(year).map(Period::year).ok_or_else(err);
        }

        // Full dates collapse to their month.
        const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
        for fmt in DATE_FMTS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Period::year_month(d.year(), d.month()).ok_or_else(err);
            }
        }

        // Year-month.
        let (year, month) = s
            .split_once('-')
            .or_else(|| s.split_once('/'))
            .ok_or_else(err)?;
        let year: i32 = year.trim().parse().map_err(|_| err())?;
        let month: u32 = month.trim().parse().map_err(|_| err())?;
        Period::year_month(year, month).ok_or_else(err)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calendar years a period may carry.
pub(crate) fn valid_year(year: i64) -> Option<i32> {
    if (1..=9999).contains(&year) {
        i32::try_from(year).ok()
    } else {
        None
    }
}

/// Parse `"2024"` / `"2024.0"` into an integer; anything fractional is rejected.
pub(crate) fn parse_whole_number(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    whole_number(v)
}

pub(crate) fn whole_number(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
