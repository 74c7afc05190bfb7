//! Query string parameters that select a calendar month or year.
//!
//! Budgets and reports share the same rules: the month must be a number from
//! 1 to 12 and the year a number no earlier than [MIN_YEAR].

use serde::Deserialize;

use crate::Error;

/// The earliest year budgets and reports may refer to.
pub const MIN_YEAR: i32 = 2020;

/// The query string `?month=M&year=Y`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    /// The month number as sent by the client.
    pub month: Option<String>,
    /// The year as sent by the client.
    pub year: Option<String>,
}

/// The query string `?year=Y`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearQuery {
    /// The year as sent by the client.
    pub year: Option<String>,
}

/// A validated month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPeriod {
    /// 1 to 12.
    pub month: u8,
    /// [MIN_YEAR] or later.
    pub year: i32,
}

impl MonthQuery {
    /// Validate the month and year.
    ///
    /// # Errors
    /// Returns [Error::InvalidParameter] if either is missing, not a number or out of range.
    pub fn period(&self) -> Result<MonthPeriod, Error> {
        Ok(MonthPeriod {
            month: parse_month(self.month.as_deref())?,
            year: parse_year(self.year.as_deref())?,
        })
    }
}

impl YearQuery {
    /// Validate the year.
    ///
    /// # Errors
    /// Returns [Error::InvalidParameter] if it is missing, not a number or before [MIN_YEAR].
    pub fn year(&self) -> Result<i32, Error> {
        parse_year(self.year.as_deref())
    }
}

fn parse_month(text: Option<&str>) -> Result<u8, Error> {
    text.and_then(|text| text.trim().parse::<u8>().ok())
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| Error::InvalidParameter("El mes debe ser un número entre 1 y 12".to_owned()))
}

fn parse_year(text: Option<&str>) -> Result<i32, Error> {
    text.and_then(|text| text.trim().parse::<i32>().ok())
        .filter(|year| *year >= MIN_YEAR)
        .ok_or_else(|| {
            Error::InvalidParameter(format!("El año debe ser un número válido (>= {MIN_YEAR})"))
        })
}
